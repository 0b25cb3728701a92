#![forbid(unsafe_code)]

//! Risk-matrix analysis reveal.
//!
//! Once its section becomes visible the matrix seeds a fixed number of random
//! risk points, then marks them analyzed one per interval while highlighting
//! the newest. The interval after the last point clears the highlight and
//! completes. Like the walkthrough, it runs once per mount.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::millis;
use crate::controller::{Controller, ControllerKind, Input, Snapshot};
use crate::error::ConfigError;
use crate::random::RandomSource;
use crate::sequence::VisibilityTrigger;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskMatrixConfig {
    pub point_count: usize,
    /// Category labels; each point draws one uniformly.
    pub categories: Vec<String>,
    #[serde(with = "millis")]
    pub analyze_interval: Duration,
    pub visibility_threshold: f64,
}

impl Default for RiskMatrixConfig {
    fn default() -> Self {
        Self {
            point_count: 12,
            categories: ["Market", "Financial", "Operational", "Strategic"]
                .map(String::from)
                .to_vec(),
            analyze_interval: Duration::from_millis(800),
            visibility_threshold: 0.3,
        }
    }
}

impl RiskMatrixConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.categories.is_empty() {
            return Err(ConfigError::Empty {
                field: "risk_matrix.categories",
            });
        }
        if self.analyze_interval.is_zero() {
            return Err(ConfigError::ZeroDuration {
                field: "risk_matrix.analyze_interval",
            });
        }
        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return Err(ConfigError::Probability {
                field: "risk_matrix.visibility_threshold",
                value: self.visibility_threshold,
            });
        }
        Ok(())
    }
}

/// One plotted risk.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskPoint {
    /// Impact score in `[0, 100)`.
    pub impact: f64,
    /// Probability score in `[0, 100)`.
    pub probability: f64,
    /// Overall severity in `[0, 1)`.
    pub risk: f64,
    pub category: String,
    pub analyzed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskPhase {
    Waiting,
    /// Triggered; points are drawn on the next transition.
    Seeding,
    Analyzing { next: usize },
    Complete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskMatrixView {
    pub phase: RiskPhase,
    pub points: Vec<RiskPoint>,
    pub highlighted: Option<usize>,
    pub analyzed: usize,
    pub started: bool,
}

#[derive(Debug, Clone)]
pub struct RiskMatrix {
    config: RiskMatrixConfig,
    trigger: VisibilityTrigger,
    phase: RiskPhase,
    points: Vec<RiskPoint>,
    highlighted: Option<usize>,
}

impl RiskMatrix {
    pub fn new(config: RiskMatrixConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            trigger: VisibilityTrigger::new(config.visibility_threshold),
            config,
            phase: RiskPhase::Waiting,
            points: Vec::new(),
            highlighted: None,
        })
    }

    #[must_use]
    pub fn phase(&self) -> RiskPhase {
        self.phase
    }

    #[must_use]
    pub fn points(&self) -> &[RiskPoint] {
        &self.points
    }

    #[must_use]
    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    fn seed(&mut self, rng: &mut dyn RandomSource) {
        let categories = &self.config.categories;
        self.points = (0..self.config.point_count)
            .map(|_| RiskPoint {
                impact: rng.uniform(0.0, 100.0),
                probability: rng.uniform(0.0, 100.0),
                risk: rng.next_unit(),
                category: categories[rng.pick(categories.len())].clone(),
                analyzed: false,
            })
            .collect();
        crate::debug!(points = self.points.len(), "risk points seeded");
    }

    #[must_use]
    pub fn view(&self) -> RiskMatrixView {
        RiskMatrixView {
            phase: self.phase,
            points: self.points.clone(),
            highlighted: self.highlighted,
            analyzed: self.points.iter().filter(|p| p.analyzed).count(),
            started: self.trigger.has_fired(),
        }
    }
}

impl Controller for RiskMatrix {
    fn kind(&self) -> ControllerKind {
        ControllerKind::RiskMatrix
    }

    fn next_delay(&self) -> Option<Duration> {
        match self.phase {
            RiskPhase::Waiting | RiskPhase::Complete => None,
            RiskPhase::Seeding => Some(Duration::ZERO),
            RiskPhase::Analyzing { .. } => Some(self.config.analyze_interval),
        }
    }

    fn fire(&mut self, rng: &mut dyn RandomSource) {
        self.phase = match self.phase {
            RiskPhase::Seeding => {
                self.seed(rng);
                RiskPhase::Analyzing { next: 0 }
            }
            RiskPhase::Analyzing { next } if next < self.points.len() => {
                self.points[next].analyzed = true;
                self.highlighted = Some(next);
                RiskPhase::Analyzing { next: next + 1 }
            }
            RiskPhase::Analyzing { .. } => {
                self.highlighted = None;
                crate::debug!("risk analysis complete");
                RiskPhase::Complete
            }
            other => other,
        };
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::RiskMatrix(self.view())
    }

    fn handle(&mut self, input: &Input) -> bool {
        match input {
            Input::Visibility(ratio) if self.trigger.observe(*ratio) => {
                self.phase = RiskPhase::Seeding;
                true
            }
            _ => false,
        }
    }
}

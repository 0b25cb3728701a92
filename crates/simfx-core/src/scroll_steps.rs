#![forbid(unsafe_code)]

//! Scroll-driven step sequencer.
//!
//! Maps the page scroll position onto the highlighted step of the "how it
//! works" explainer. The mapping is a pure function of its input; the
//! [`StepSequencer`] only remembers the last result so renderers can read it.
//!
//! ```text
//! adjusted = scroll - section_start + lead * viewport
//! raw      = adjusted / (step_height * viewport)
//! index    = clamp(floor(raw), 0, N)
//! progress = frac(raw)
//! ```
//!
//! # Invariants
//!
//! 1. `step_index ∈ [0, N]`.
//! 2. `fractional_progress ∈ [0, 1)`.
//! 3. `step_index` is monotonically non-decreasing in the scroll offset.
//! 4. `adjusted == 0` yields `(0, 0.0)`.
//!
//! # Failure Modes
//!
//! - Non-positive viewport or step height: index 0, progress 0.
//! - Index clamped on either side: progress is reported as 0.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::controller::{Controller, ControllerKind, Input, Snapshot};
use crate::error::ConfigError;
use crate::random::RandomSource;

/// Geometry of the viewport relative to the explainer section, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollInput {
    /// Current vertical scroll offset of the page.
    pub scroll_offset: f64,
    /// Offset of the explainer section from the top of the page.
    pub section_start: f64,
    /// Height of the viewport.
    pub viewport_height: f64,
}

/// Mapping parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    /// Highest step index (the explainer shows `N + 1` stages).
    pub step_count: u32,
    /// One title per stage; exactly `step_count + 1` of them.
    pub titles: Vec<String>,
    /// Height of one step as a fraction of the viewport.
    pub step_height: f64,
    /// How far ahead of the section top the first step begins, as a
    /// fraction of the viewport.
    pub lead: f64,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            step_count: 6,
            titles: [
                "Load Diverse Data Sources",
                "Request Simulation Queries",
                "Retrieve Real-Time Industry Data",
                "Toggle Parameters",
                "Review Insights",
                "Gain Valuable Strategies",
                "Iterate and Refine",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            step_height: 0.9,
            lead: 0.2,
        }
    }
}

impl StepConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.step_height > 0.0 && self.step_height.is_finite()) {
            return Err(ConfigError::NonPositive {
                field: "steps.step_height",
                value: self.step_height,
            });
        }
        if !self.lead.is_finite() {
            return Err(ConfigError::NonPositive {
                field: "steps.lead",
                value: self.lead,
            });
        }
        let stages = self.step_count as usize + 1;
        if self.titles.len() != stages {
            return Err(ConfigError::CountMismatch {
                field: "steps.titles",
                expected: stages,
                found: self.titles.len(),
            });
        }
        Ok(())
    }
}

/// The highlighted step and how far through it the reader is.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollStep {
    pub step_index: u32,
    pub fractional_progress: f64,
}

impl ScrollStep {
    /// Compute the step for `input` under `config`.
    #[must_use]
    pub fn compute(input: &ScrollInput, config: &StepConfig) -> Self {
        let step_px = input.viewport_height * config.step_height;
        if !(step_px > 0.0) || !step_px.is_finite() {
            return Self::default();
        }
        let adjusted =
            input.scroll_offset - input.section_start + input.viewport_height * config.lead;
        let raw = adjusted / step_px;
        if !raw.is_finite() || raw < 0.0 {
            return Self::default();
        }
        let floor = raw.floor();
        if floor > f64::from(config.step_count) {
            return Self {
                step_index: config.step_count,
                fractional_progress: 0.0,
            };
        }
        Self {
            step_index: floor as u32,
            fractional_progress: (raw - floor).clamp(0.0, 1.0 - f64::EPSILON),
        }
    }
}

/// Remembers the last computed [`ScrollStep`].
#[derive(Debug, Clone, Default)]
pub struct StepSequencer {
    config: StepConfig,
    current: ScrollStep,
}

impl StepSequencer {
    pub fn new(config: StepConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            current: ScrollStep::default(),
        })
    }

    /// Recompute from new geometry. Returns `true` if the result changed.
    pub fn on_scroll(&mut self, input: &ScrollInput) -> bool {
        let next = ScrollStep::compute(input, &self.config);
        let changed = next != self.current;
        if next.step_index != self.current.step_index {
            crate::trace!(from = self.current.step_index, to = next.step_index, "step changed");
        }
        self.current = next;
        changed
    }

    #[must_use]
    pub fn current(&self) -> ScrollStep {
        self.current
    }

    #[must_use]
    pub fn config(&self) -> &StepConfig {
        &self.config
    }
}

impl Controller for StepSequencer {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Steps
    }

    /// Purely input-driven; never schedules a transition.
    fn next_delay(&self) -> Option<Duration> {
        None
    }

    fn fire(&mut self, _rng: &mut dyn RandomSource) {}

    fn snapshot(&self) -> Snapshot {
        Snapshot::Steps(self.current)
    }

    fn handle(&mut self, input: &Input) -> bool {
        match input {
            Input::Scroll(scroll) => self.on_scroll(scroll),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(scroll: f64) -> ScrollInput {
        ScrollInput {
            scroll_offset: scroll,
            section_start: 1000.0,
            viewport_height: 1000.0,
        }
    }

    #[test]
    fn zero_adjusted_scroll_is_step_zero() {
        // adjusted = 800 - 1000 + 200 = 0
        let step = ScrollStep::compute(&at(800.0), &StepConfig::default());
        assert_eq!(step.step_index, 0);
        assert_eq!(step.fractional_progress, 0.0);
    }

    #[test]
    fn halfway_through_second_step() {
        // raw = 1.5
        let scroll = 800.0 + 1.5 * 900.0;
        let step = ScrollStep::compute(&at(scroll), &StepConfig::default());
        assert_eq!(step.step_index, 1);
        assert!((step.fractional_progress - 0.5).abs() < 1e-9);
    }

    #[test]
    fn before_section_clamps_to_zero() {
        let step = ScrollStep::compute(&at(0.0), &StepConfig::default());
        assert_eq!(step, ScrollStep::default());
    }

    #[test]
    fn past_section_clamps_to_last() {
        let step = ScrollStep::compute(&at(50_000.0), &StepConfig::default());
        assert_eq!(step.step_index, 6);
        assert_eq!(step.fractional_progress, 0.0);
    }

    #[test]
    fn last_step_still_reports_progress() {
        let scroll = 800.0 + 6.25 * 900.0;
        let step = ScrollStep::compute(&at(scroll), &StepConfig::default());
        assert_eq!(step.step_index, 6);
        assert!((step.fractional_progress - 0.25).abs() < 1e-9);
    }

    #[test]
    fn zero_viewport_is_step_zero() {
        let input = ScrollInput {
            scroll_offset: 5000.0,
            section_start: 0.0,
            viewport_height: 0.0,
        };
        assert_eq!(
            ScrollStep::compute(&input, &StepConfig::default()),
            ScrollStep::default()
        );
    }

    #[test]
    fn sequencer_reports_changes() {
        let mut seq = StepSequencer::new(StepConfig::default()).unwrap();
        assert!(!seq.on_scroll(&at(0.0)));
        assert!(seq.on_scroll(&at(800.0 + 900.0)));
        assert_eq!(seq.current().step_index, 1);
        assert!(seq.handle(&Input::Scroll(at(800.0 + 2.0 * 900.0))));
        assert!(!seq.handle(&Input::Start));
    }

    #[test]
    fn title_count_must_match_stages() {
        let cfg = StepConfig {
            step_count: 9,
            ..StepConfig::default()
        };
        assert_eq!(
            StepSequencer::new(cfg).unwrap_err(),
            ConfigError::CountMismatch {
                field: "steps.titles",
                expected: 10,
                found: 7,
            }
        );
    }

    #[test]
    fn invalid_step_height_rejected() {
        let cfg = StepConfig {
            step_height: 0.0,
            ..StepConfig::default()
        };
        assert!(StepSequencer::new(cfg).is_err());
    }
}

#![forbid(unsafe_code)]

//! Dashboard metric drift.
//!
//! Every invocation bumps the primary counter by exactly one, then gives each
//! secondary metric an independent chance to move one step up or down. Moves
//! are clamped to the metric's domain and recorded as a [`Trend`].
//!
//! Draw order per secondary metric is fixed: first the trigger draw, then
//! (only when triggered) the direction draw. Tests rely on this order.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::random::RandomSource;

/// Direction of the last recorded change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    #[default]
    None,
}

/// Last recorded change of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Trend {
    /// Magnitude of the applied change (always non-negative).
    pub delta: f64,
    pub direction: Direction,
}

impl Trend {
    fn from_change(change: f64) -> Self {
        let direction = if change > 0.0 {
            Direction::Up
        } else if change < 0.0 {
            Direction::Down
        } else {
            Direction::None
        };
        Self {
            delta: change.abs(),
            direction,
        }
    }
}

/// A metric value plus its last trend.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DashboardStat {
    pub value: f64,
    pub trend: Trend,
}

/// How one secondary metric drifts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub name: String,
    pub initial: f64,
    /// Chance per invocation that the metric moves at all.
    pub probability: f64,
    /// Given a move, chance that it is upward.
    pub up_probability: f64,
    /// Size of one move.
    pub step: f64,
    pub min: f64,
    /// `None` means unbounded above.
    pub max: Option<f64>,
}

impl MetricSpec {
    fn clamp(&self, value: f64) -> f64 {
        let value = value.max(self.min);
        match self.max {
            Some(max) => value.min(max),
            None => value,
        }
    }
}

/// Metric drift parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub primary_name: String,
    pub primary_initial: u64,
    pub metrics: Vec<MetricSpec>,
}

fn spec(
    name: &str,
    initial: f64,
    probability: f64,
    up_probability: f64,
    step: f64,
    max: Option<f64>,
) -> MetricSpec {
    MetricSpec {
        name: name.to_string(),
        initial,
        probability,
        up_probability,
        step,
        min: 0.0,
        max,
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            primary_name: "Total Runs".into(),
            primary_initial: 1284,
            metrics: vec![
                spec("Avg Run Time", 20.2, 0.0, 0.5, 0.0, None),
                spec("Scenarios", 847.0, 0.15, 1.0, 1.0, None),
                spec("Confidence", 92.0, 0.2, 0.5, 0.1, Some(100.0)),
                spec("Risk Exposure", 4.2, 0.25, 0.4, 0.1, Some(100.0)),
                spec("Favorable Scenarios", 76.0, 0.3, 0.6, 0.2, Some(100.0)),
                spec("Financial Gain", 8.4, 0.25, 0.55, 0.1, None),
                spec("High Severity Risks", 12.0, 0.1, 0.7, 1.0, None),
            ],
        }
    }
}

impl MetricsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for metric in &self.metrics {
            for (field, value) in [
                ("metrics[].probability", metric.probability),
                ("metrics[].up_probability", metric.up_probability),
            ] {
                if !(0.0..=1.0).contains(&value) {
                    return Err(ConfigError::Probability { field, value });
                }
            }
            if let Some(max) = metric.max
                && max < metric.min
            {
                return Err(ConfigError::InvertedRange {
                    field: "metrics[].max",
                    lo: metric.min,
                    hi: max,
                });
            }
            if !(metric.min..=metric.max.unwrap_or(f64::INFINITY)).contains(&metric.initial) {
                return Err(ConfigError::OutOfBounds {
                    field: "metrics[].initial",
                    value: metric.initial,
                });
            }
        }
        Ok(())
    }
}

/// A metric as shown on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricView {
    pub name: String,
    pub stat: DashboardStat,
}

/// The dashboard statistics block.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDrift {
    config: MetricsConfig,
    primary: u64,
    primary_trend: Trend,
    stats: Vec<DashboardStat>,
}

impl MetricDrift {
    pub fn new(config: MetricsConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let stats = config
            .metrics
            .iter()
            .map(|m| DashboardStat {
                value: m.initial,
                trend: Trend::default(),
            })
            .collect();
        Ok(Self {
            primary: config.primary_initial,
            primary_trend: Trend::default(),
            stats,
            config,
        })
    }

    /// Apply one drift update. Returns how many secondary metrics moved.
    pub fn update(&mut self, rng: &mut dyn RandomSource) -> usize {
        self.primary = self.primary.saturating_add(1);
        self.primary_trend = Trend::from_change(1.0);

        let mut moved = 0;
        for (spec, stat) in self.config.metrics.iter().zip(&mut self.stats) {
            if !rng.chance(spec.probability) {
                continue;
            }
            let signed = if rng.chance(spec.up_probability) {
                spec.step
            } else {
                -spec.step
            };
            let next = spec.clamp(stat.value + signed);
            stat.trend = Trend::from_change(next - stat.value);
            stat.value = next;
            moved += 1;
        }
        crate::trace!(primary = self.primary, moved, "metric drift applied");
        moved
    }

    /// The primary counter (total runs).
    #[must_use]
    pub fn primary(&self) -> u64 {
        self.primary
    }

    #[must_use]
    pub fn primary_trend(&self) -> Trend {
        self.primary_trend
    }

    /// Secondary metric by name.
    #[must_use]
    pub fn stat(&self, name: &str) -> Option<DashboardStat> {
        self.config
            .metrics
            .iter()
            .position(|m| m.name == name)
            .map(|idx| self.stats[idx])
    }

    /// Every secondary metric with its name.
    #[must_use]
    pub fn views(&self) -> Vec<MetricView> {
        self.config
            .metrics
            .iter()
            .zip(&self.stats)
            .map(|(spec, stat)| MetricView {
                name: spec.name.clone(),
                stat: *stat,
            })
            .collect()
    }

    /// Whether every value is inside its declared domain.
    #[must_use]
    pub fn within_bounds(&self) -> bool {
        self.config
            .metrics
            .iter()
            .zip(&self.stats)
            .all(|(spec, stat)| spec.clamp(stat.value) == stat.value)
    }

    #[must_use]
    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }
}

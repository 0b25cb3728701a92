#![forbid(unsafe_code)]

//! Parameter-tuning cycle.
//!
//! Optimizes a fixed list of parameters one after another: each one spends
//! `optimize_time` in the optimizing state, then snaps to its target value.
//! After the last parameter the cycle holds for `reset_delay` and starts
//! again, until `cycles` passes have completed. A reset clears the status
//! flags but keeps the tuned values.
//!
//! ```text
//! Idle ──start_delay──▶ Optimizing(0) ─▶ … ─▶ Optimizing(n-1) ──▶ Optimized
//!   ▲                                                                │
//!   └──────────────reset_delay (while cycles remain)─────────────────┘
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::millis;
use crate::controller::{Controller, ControllerKind, Snapshot};
use crate::error::ConfigError;
use crate::random::RandomSource;

/// One tunable parameter and the value it converges to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningParam {
    pub name: String,
    pub initial: f64,
    pub min: f64,
    pub max: f64,
    pub target: f64,
}

impl TuningParam {
    pub fn new(name: impl Into<String>, initial: f64, (min, max): (f64, f64), target: f64) -> Self {
        Self {
            name: name.into(),
            initial,
            min,
            max,
            target,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    pub params: Vec<TuningParam>,
    /// Wait before the first parameter of each pass.
    #[serde(with = "millis")]
    pub start_delay: Duration,
    /// Time each parameter spends optimizing.
    #[serde(with = "millis")]
    pub optimize_time: Duration,
    /// Hold on the finished pass before the next one.
    #[serde(with = "millis")]
    pub reset_delay: Duration,
    /// Total passes, the first included.
    pub cycles: u32,
}

impl Default for TuningConfig {
    fn default() -> Self {
        let ms = Duration::from_millis;
        Self {
            params: vec![
                TuningParam::new("Learning Rate", 0.01, (0.001, 0.1), 0.005),
                TuningParam::new("Batch Size", 64.0, (16.0, 256.0), 128.0),
                TuningParam::new("Epochs", 100.0, (10.0, 500.0), 250.0),
            ],
            start_delay: ms(1000),
            optimize_time: ms(2000),
            reset_delay: ms(3000),
            cycles: 3,
        }
    }
}

impl TuningConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.params.is_empty() {
            return Err(ConfigError::Empty {
                field: "tuning.params",
            });
        }
        for (field, d) in [
            ("tuning.start_delay", self.start_delay),
            ("tuning.optimize_time", self.optimize_time),
            ("tuning.reset_delay", self.reset_delay),
        ] {
            if d.is_zero() {
                return Err(ConfigError::ZeroDuration { field });
            }
        }
        if self.cycles == 0 {
            return Err(ConfigError::NonPositive {
                field: "tuning.cycles",
                value: 0.0,
            });
        }
        for p in &self.params {
            if !(p.min < p.max) {
                return Err(ConfigError::InvertedRange {
                    field: "tuning.params[].min",
                    lo: p.min,
                    hi: p.max,
                });
            }
            for (field, value) in [
                ("tuning.params[].initial", p.initial),
                ("tuning.params[].target", p.target),
            ] {
                if !(p.min..=p.max).contains(&value) {
                    return Err(ConfigError::OutOfBounds { field, value });
                }
            }
        }
        Ok(())
    }
}

/// Where the current pass is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuningPhase {
    Idle,
    Optimizing { index: usize },
    Optimized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamStatus {
    Waiting,
    Optimizing,
    Optimized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamView {
    pub name: String,
    pub value: f64,
    /// Position of `value` inside `[min, max]`, in `[0, 1]`.
    pub position: f64,
    pub status: ParamStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TuningView {
    pub phase: TuningPhase,
    pub params: Vec<ParamView>,
    /// Zero-based pass number.
    pub cycle: u32,
}

#[derive(Debug, Clone)]
pub struct ParameterTuner {
    config: TuningConfig,
    values: Vec<f64>,
    optimized: Vec<bool>,
    phase: TuningPhase,
    cycle: u32,
}

impl ParameterTuner {
    pub fn new(config: TuningConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            values: config.params.iter().map(|p| p.initial).collect(),
            optimized: vec![false; config.params.len()],
            config,
            phase: TuningPhase::Idle,
            cycle: 0,
        })
    }

    #[must_use]
    pub fn phase(&self) -> TuningPhase {
        self.phase
    }

    #[must_use]
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn status(&self, idx: usize) -> ParamStatus {
        if self.phase == (TuningPhase::Optimizing { index: idx }) {
            ParamStatus::Optimizing
        } else if self.optimized.get(idx).copied().unwrap_or(false) {
            ParamStatus::Optimized
        } else {
            ParamStatus::Waiting
        }
    }

    fn has_next_cycle(&self) -> bool {
        self.cycle + 1 < self.config.cycles
    }

    #[must_use]
    pub fn view(&self) -> TuningView {
        TuningView {
            phase: self.phase,
            params: self
                .config
                .params
                .iter()
                .zip(&self.values)
                .enumerate()
                .map(|(idx, (p, value))| ParamView {
                    name: p.name.clone(),
                    value: *value,
                    position: ((value - p.min) / (p.max - p.min)).clamp(0.0, 1.0),
                    status: self.status(idx),
                })
                .collect(),
            cycle: self.cycle,
        }
    }
}

impl Controller for ParameterTuner {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Tuning
    }

    fn next_delay(&self) -> Option<Duration> {
        match self.phase {
            TuningPhase::Idle => Some(self.config.start_delay),
            TuningPhase::Optimizing { .. } => Some(self.config.optimize_time),
            TuningPhase::Optimized => self.has_next_cycle().then_some(self.config.reset_delay),
        }
    }

    fn fire(&mut self, _rng: &mut dyn RandomSource) {
        self.phase = match self.phase {
            TuningPhase::Idle => TuningPhase::Optimizing { index: 0 },
            TuningPhase::Optimizing { index } => {
                self.values[index] = self.config.params[index].target;
                self.optimized[index] = true;
                crate::trace!(index, value = self.values[index], "parameter optimized");
                if index + 1 < self.config.params.len() {
                    TuningPhase::Optimizing { index: index + 1 }
                } else {
                    crate::debug!(cycle = self.cycle, "tuning pass complete");
                    TuningPhase::Optimized
                }
            }
            TuningPhase::Optimized if self.has_next_cycle() => {
                self.optimized.fill(false);
                self.cycle += 1;
                TuningPhase::Idle
            }
            TuningPhase::Optimized => TuningPhase::Optimized,
        };
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::Tuning(self.view())
    }
}

#![forbid(unsafe_code)]

//! Progress/metric drift engine.
//!
//! Simulates a run that creeps from 0 to 100 percent at a jittery pace,
//! occasionally "sticking" for a while. When a run completes, the dashboard
//! metrics drift and (every few runs) the charts extend by one point.
//!
//! Per tick, in order:
//!
//! 1. **Stuck** at the current percent: count the tick; once the count
//!    exceeds the threshold drawn on entry, unstick and advance. Otherwise
//!    hold.
//! 2. **Stick**: below the stick ceiling, a small chance to stick and hold.
//! 3. **Complete** at 100: drift metrics, maybe drift the series, count the
//!    run, reset to 0 and draw a new tick interval.
//! 4. **Advance** by a random increment.
//!
//! # Invariants
//!
//! 1. `percent ∈ [0, 100]` after every tick.
//! 2. A run that reached 100 resets to 0 on the next tick and the run
//!    counter grows by exactly 1.
//! 3. While stuck, `percent` does not change until the threshold is
//!    exceeded.
//! 4. The tick interval is fixed for the duration of one run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::millis;
use crate::controller::{Controller, ControllerKind, Snapshot};
use crate::error::ConfigError;
use crate::metrics::{MetricDrift, MetricView, MetricsConfig, Trend};
use crate::random::RandomSource;
use crate::series::{NamedSeries, SeriesConfig, SeriesDrift};

/// Pacing of a progress run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Shortest tick interval, in milliseconds (inclusive).
    pub interval_min_ms: u64,
    /// Longest tick interval, in milliseconds (inclusive).
    pub interval_max_ms: u64,
    pub increment_min: f64,
    pub increment_max: f64,
    /// Chance per tick of sticking.
    pub stick_probability: f64,
    /// Sticking is only possible below this percent.
    pub stick_ceiling: f64,
    pub stuck_ticks_min: f64,
    pub stuck_ticks_max: f64,
    /// Series drift when `runs % series_every == 0` (before counting the run).
    pub series_every: u64,
    /// Used for the remaining-time estimate.
    #[serde(with = "millis")]
    pub time_per_percent: Duration,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            interval_min_ms: 150,
            interval_max_ms: 300,
            increment_min: 0.5,
            increment_max: 2.5,
            stick_probability: 0.05,
            stick_ceiling: 95.0,
            stuck_ticks_min: 5.0,
            stuck_ticks_max: 15.0,
            series_every: 3,
            time_per_percent: Duration::from_millis(250),
        }
    }
}

impl ProgressConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_min_ms == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "progress.interval_min_ms",
            });
        }
        for (field, lo, hi) in [
            (
                "progress.interval",
                self.interval_min_ms as f64,
                self.interval_max_ms as f64,
            ),
            ("progress.increment", self.increment_min, self.increment_max),
            (
                "progress.stuck_ticks",
                self.stuck_ticks_min,
                self.stuck_ticks_max,
            ),
        ] {
            if hi < lo {
                return Err(ConfigError::InvertedRange { field, lo, hi });
            }
        }
        if self.increment_min <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "progress.increment_min",
                value: self.increment_min,
            });
        }
        if !(0.0..=1.0).contains(&self.stick_probability) {
            return Err(ConfigError::Probability {
                field: "progress.stick_probability",
                value: self.stick_probability,
            });
        }
        if self.series_every == 0 {
            return Err(ConfigError::Empty {
                field: "progress.series_every",
            });
        }
        Ok(())
    }
}

/// State of the current run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressRun {
    pub percent: f64,
    /// Percent at which the run is stuck, if it is.
    pub stuck_at: Option<f64>,
    pub stuck_ticks: u32,
    /// Ticks to wait before unsticking, drawn on entering the stuck state.
    pub stuck_threshold: f64,
}

impl ProgressRun {
    #[must_use]
    pub fn is_stuck(&self) -> bool {
        self.stuck_at == Some(self.percent)
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Advanced,
    Held,
    Stuck,
    Resumed,
    Completed { series_updated: bool },
}

/// Everything the dashboard renders.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftSnapshot {
    pub progress: ProgressRun,
    pub runs: u64,
    pub eta: Duration,
    pub tick_interval: Duration,
    pub primary: u64,
    pub primary_trend: Trend,
    pub metrics: Vec<MetricView>,
    pub series: Vec<NamedSeries>,
}

impl DriftSnapshot {
    /// Remaining-time estimate as `"{m}m {s}s"`.
    #[must_use]
    pub fn eta_label(&self) -> String {
        format_eta(self.eta)
    }
}

/// Format a duration the way the dashboard shows the ETA.
#[must_use]
pub fn format_eta(eta: Duration) -> String {
    let ms = eta.as_millis();
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    format!("{minutes}m {seconds}s")
}

/// The progress engine plus the dashboard data it perturbs.
#[derive(Debug, Clone)]
pub struct DriftEngine {
    config: ProgressConfig,
    run: ProgressRun,
    runs: u64,
    tick_interval: Duration,
    metrics: MetricDrift,
    series: SeriesDrift,
}

impl DriftEngine {
    /// Build the engine, seeding the series and the first tick interval.
    pub fn new(
        config: ProgressConfig,
        metrics: MetricsConfig,
        series: &SeriesConfig,
        rng: &mut dyn RandomSource,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let metrics = MetricDrift::new(metrics)?;
        let series = SeriesDrift::seeded(series, rng)?;
        let tick_interval = draw_interval(&config, rng);
        Ok(Self {
            config,
            run: ProgressRun::default(),
            runs: 0,
            tick_interval,
            metrics,
            series,
        })
    }

    /// Apply one tick of the progress state machine.
    pub fn tick(&mut self, rng: &mut dyn RandomSource) -> TickOutcome {
        let cfg = &self.config;

        if self.run.is_stuck() {
            self.run.stuck_ticks += 1;
            if f64::from(self.run.stuck_ticks) > self.run.stuck_threshold {
                self.run.stuck_at = None;
                self.run.stuck_ticks = 0;
                let inc = rng.uniform(cfg.increment_min, cfg.increment_max);
                self.run.percent = (self.run.percent + inc).min(100.0);
                crate::trace!(percent = self.run.percent, "progress resumed");
                return TickOutcome::Resumed;
            }
            return TickOutcome::Held;
        }

        if self.run.percent < cfg.stick_ceiling && rng.chance(cfg.stick_probability) {
            self.run.stuck_at = Some(self.run.percent);
            self.run.stuck_ticks = 0;
            self.run.stuck_threshold = rng.uniform(cfg.stuck_ticks_min, cfg.stuck_ticks_max);
            crate::trace!(
                percent = self.run.percent,
                threshold = self.run.stuck_threshold,
                "progress stuck"
            );
            return TickOutcome::Stuck;
        }

        if self.run.percent >= 100.0 {
            self.metrics.update(rng);
            let series_updated = self.runs % cfg.series_every == 0;
            if series_updated {
                self.series.step(rng);
            }
            self.runs += 1;
            self.run = ProgressRun::default();
            self.tick_interval = draw_interval(cfg, rng);
            crate::debug!(
                runs = self.runs,
                series_updated,
                interval_ms = self.tick_interval.as_millis() as u64,
                "simulation run completed"
            );
            return TickOutcome::Completed { series_updated };
        }

        let inc = rng.uniform(cfg.increment_min, cfg.increment_max);
        self.run.percent = (self.run.percent + inc).min(100.0);
        TickOutcome::Advanced
    }

    /// Remaining-time estimate for the current percent.
    #[must_use]
    pub fn eta(&self) -> Duration {
        let remaining = (100.0 - self.run.percent).clamp(0.0, 100.0);
        self.config.time_per_percent.mul_f64(remaining)
    }

    #[must_use]
    pub fn run(&self) -> &ProgressRun {
        &self.run
    }

    /// Completed runs since mount.
    #[must_use]
    pub fn runs(&self) -> u64 {
        self.runs
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    #[must_use]
    pub fn metrics(&self) -> &MetricDrift {
        &self.metrics
    }

    #[must_use]
    pub fn series(&self) -> &SeriesDrift {
        &self.series
    }

    /// Place the run at `percent` (clamped), clearing any stuck state.
    pub fn set_percent(&mut self, percent: f64) {
        self.run = ProgressRun {
            percent: percent.clamp(0.0, 100.0),
            ..ProgressRun::default()
        };
    }

    #[must_use]
    pub fn drift_snapshot(&self) -> DriftSnapshot {
        DriftSnapshot {
            progress: self.run,
            runs: self.runs,
            eta: self.eta(),
            tick_interval: self.tick_interval,
            primary: self.metrics.primary(),
            primary_trend: self.metrics.primary_trend(),
            metrics: self.metrics.views(),
            series: self.series.named(),
        }
    }
}

fn draw_interval(config: &ProgressConfig, rng: &mut dyn RandomSource) -> Duration {
    Duration::from_millis(rng.uniform_inclusive(config.interval_min_ms, config.interval_max_ms))
}

impl Controller for DriftEngine {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Drift
    }

    fn next_delay(&self) -> Option<Duration> {
        Some(self.tick_interval)
    }

    fn fire(&mut self, rng: &mut dyn RandomSource) {
        self.tick(rng);
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::Drift(self.drift_snapshot())
    }
}

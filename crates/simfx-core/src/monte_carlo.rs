#![forbid(unsafe_code)]

//! Monte-Carlo run animation for the analyst panel.
//!
//! Idle until started. While running, each tick nudges progress forward,
//! sometimes drops a scatter point and sometimes prints a log line. The run
//! stops itself at 100 percent; starting again after that begins from zero.

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::millis;
use crate::controller::{Controller, ControllerKind, Input, Snapshot};
use crate::error::ConfigError;
use crate::random::RandomSource;

const INFO_LINES: [&str; 3] = [
    "Processing batch of data points",
    "Calculating convergence metrics",
    "Updating simulation parameters",
];
const WARNING_LINES: [&str; 3] = [
    "Potential outlier detected",
    "Convergence slower than expected",
    "High variance in results",
];
const SUCCESS_LINES: [&str; 3] = [
    "Batch processed successfully",
    "Convergence criteria met",
    "Optimal solution found",
];

/// Line appended when a run reaches 100 percent.
pub const COMPLETION_LINE: &str = "Simulation completed successfully";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    #[serde(with = "millis")]
    pub tick: Duration,
    pub increment_min: f64,
    pub increment_max: f64,
    pub point_probability: f64,
    pub max_points: usize,
    pub log_probability: f64,
    pub max_log: usize,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(200),
            increment_min: 1.0,
            increment_max: 3.0,
            point_probability: 0.5,
            max_points: 50,
            log_probability: 0.15,
            max_log: 5,
        }
    }
}

impl MonteCarloConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick.is_zero() {
            return Err(ConfigError::ZeroDuration {
                field: "monte_carlo.tick",
            });
        }
        if self.increment_max < self.increment_min {
            return Err(ConfigError::InvertedRange {
                field: "monte_carlo.increment",
                lo: self.increment_min,
                hi: self.increment_max,
            });
        }
        if self.increment_min <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "monte_carlo.increment_min",
                value: self.increment_min,
            });
        }
        for (field, value) in [
            ("monte_carlo.point_probability", self.point_probability),
            ("monte_carlo.log_probability", self.log_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { field, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Success,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub level: LogLevel,
    pub message: String,
}

/// A point in the scatter plot; both coordinates in `[0, 100)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloView {
    pub running: bool,
    pub progress: f64,
    pub iteration: u64,
    pub points: Vec<ScatterPoint>,
    pub log: Vec<LogLine>,
}

#[derive(Debug, Clone)]
pub struct MonteCarloRun {
    config: MonteCarloConfig,
    running: bool,
    progress: f64,
    iteration: u64,
    points: VecDeque<ScatterPoint>,
    log: VecDeque<LogLine>,
}

impl MonteCarloRun {
    pub fn new(config: MonteCarloConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            running: false,
            progress: 0.0,
            iteration: 0,
            points: VecDeque::new(),
            log: VecDeque::new(),
        })
    }

    /// Toggle the run. Starting a finished run clears it first.
    ///
    /// Returns `true` when the run is now running.
    pub fn toggle(&mut self) -> bool {
        if self.running {
            self.running = false;
            return false;
        }
        if self.progress >= 100.0 {
            self.progress = 0.0;
            self.iteration = 0;
            self.points.clear();
            self.log.clear();
        }
        self.running = true;
        crate::debug!("monte carlo run started");
        true
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn progress(&self) -> f64 {
        self.progress
    }

    fn push_log(&mut self, level: LogLevel, message: &str) {
        if self.config.max_log == 0 {
            return;
        }
        while self.log.len() >= self.config.max_log {
            self.log.pop_front();
        }
        self.log.push_back(LogLine {
            level,
            message: message.to_string(),
        });
    }

    fn step(&mut self, rng: &mut dyn RandomSource) {
        let inc = rng.uniform(self.config.increment_min, self.config.increment_max);
        self.progress = (self.progress + inc).min(100.0);

        if rng.chance(self.config.point_probability) && self.config.max_points > 0 {
            let point = ScatterPoint {
                x: rng.next_unit() * 100.0,
                y: rng.next_unit() * 100.0,
            };
            while self.points.len() >= self.config.max_points {
                self.points.pop_front();
            }
            self.points.push_back(point);
        }

        self.iteration += 1;

        if rng.chance(self.config.log_probability) {
            let (level, pool) = match rng.pick(3) {
                0 => (LogLevel::Info, &INFO_LINES),
                1 => (LogLevel::Warning, &WARNING_LINES),
                _ => (LogLevel::Success, &SUCCESS_LINES),
            };
            let message = pool[rng.pick(pool.len())];
            self.push_log(level, message);
        }

        if self.progress >= 100.0 {
            self.running = false;
            self.push_log(LogLevel::Success, COMPLETION_LINE);
            crate::debug!(iterations = self.iteration, "monte carlo run finished");
        }
    }

    #[must_use]
    pub fn view(&self) -> MonteCarloView {
        MonteCarloView {
            running: self.running,
            progress: self.progress,
            iteration: self.iteration,
            points: self.points.iter().copied().collect(),
            log: self.log.iter().cloned().collect(),
        }
    }
}

impl Controller for MonteCarloRun {
    fn kind(&self) -> ControllerKind {
        ControllerKind::MonteCarlo
    }

    fn next_delay(&self) -> Option<Duration> {
        self.running.then_some(self.config.tick)
    }

    fn fire(&mut self, rng: &mut dyn RandomSource) {
        if self.running {
            self.step(rng);
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::MonteCarlo(self.view())
    }

    fn handle(&mut self, input: &Input) -> bool {
        match input {
            Input::Start => {
                self.toggle();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Timed;
    use crate::random::ScriptedRandom;

    fn run() -> Timed<MonteCarloRun> {
        Timed::new(MonteCarloRun::new(MonteCarloConfig::default()).unwrap())
    }

    #[test]
    fn idle_until_started() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut t = run();
        t.advance(Duration::from_secs(5), &mut rng);
        assert_eq!(t.inner().progress(), 0.0);
        assert!(t.handle(&Input::Start));
        assert!(t.inner().is_running());
    }

    #[test]
    fn tick_advances_and_records() {
        let mut rng = ScriptedRandom::new([
            0.5, // increment -> 2.0
            0.1, // point hit
            0.2, 0.4, // point x, y
            0.05, // log hit
            0.5, // level -> warning
            0.0, // first warning line
        ]);
        let mut t = run();
        t.handle(&Input::Start);
        t.advance(Duration::from_millis(200), &mut rng);

        let view = t.inner().view();
        assert_eq!(view.progress, 2.0);
        assert_eq!(view.iteration, 1);
        assert_eq!(view.points, vec![ScatterPoint { x: 20.0, y: 40.0 }]);
        assert_eq!(view.log[0].level, LogLevel::Warning);
        assert_eq!(view.log[0].message, "Potential outlier detected");
    }

    #[test]
    fn stops_at_one_hundred_with_completion_line() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut t = run();
        t.handle(&Input::Start);
        t.advance(Duration::from_secs(60), &mut rng);

        let view = t.inner().view();
        assert!(!view.running);
        assert_eq!(view.progress, 100.0);
        assert!(view.log.len() <= 5);
        assert_eq!(view.log.last().unwrap().message, COMPLETION_LINE);
        assert!(view.points.len() <= 50);
    }

    #[test]
    fn restart_after_completion_resets() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut t = run();
        t.handle(&Input::Start);
        t.advance(Duration::from_secs(60), &mut rng);
        t.handle(&Input::Start);

        let view = t.inner().view();
        assert!(view.running);
        assert_eq!(view.progress, 0.0);
        assert_eq!(view.iteration, 0);
        assert!(view.points.is_empty());
        assert!(view.log.is_empty());
    }

    #[test]
    fn pause_keeps_progress() {
        let mut rng = ScriptedRandom::constant(0.9);
        let mut t = run();
        t.handle(&Input::Start);
        t.advance(Duration::from_millis(400), &mut rng);
        let progress = t.inner().progress();
        t.handle(&Input::Start);
        assert!(!t.inner().is_running());
        t.advance(Duration::from_secs(1), &mut rng);
        assert_eq!(t.inner().progress(), progress);
    }
}

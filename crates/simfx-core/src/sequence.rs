#![forbid(unsafe_code)]

//! Multi-stage scripted sequence ("analyzing query…" walkthrough).
//!
//! Waits for its section to become visible, then walks an ordered list of
//! fixed-duration steps, then fills a completion bar one percent at a time
//! and holds at 100. It never replays.
//!
//! ```text
//! Waiting ──(visibility ≥ threshold, once)──▶ Running(0) ─▶ … ─▶ Running(n-1)
//!                                                                  │
//!                       Complete ◀──(percent == 100)── Finishing ◀─┘
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::millis;
use crate::controller::{Controller, ControllerKind, Input, Snapshot};
use crate::error::ConfigError;
use crate::random::RandomSource;

/// One labelled stage of the walkthrough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationStep {
    pub text: String,
    #[serde(with = "millis")]
    pub duration: Duration,
}

impl AnimationStep {
    pub fn new(text: impl Into<String>, duration: Duration) -> Self {
        Self {
            text: text.into(),
            duration,
        }
    }
}

/// Walkthrough parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub steps: Vec<AnimationStep>,
    /// Fraction of the section that must be visible to start.
    pub visibility_threshold: f64,
    /// Interval between completion-bar increments.
    #[serde(with = "millis")]
    pub finish_tick: Duration,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        let ms = Duration::from_millis;
        Self {
            steps: vec![
                AnimationStep::new("Analyzing query", ms(3000)),
                AnimationStep::new("Selecting simulation model", ms(2000)),
                AnimationStep::new("Parsing data sources", ms(3000)),
                AnimationStep::new("Developing industry model", ms(6000)),
                AnimationStep::new("Searching for external data sources", ms(5000)),
                AnimationStep::new("Parsing external data sources", ms(3000)),
                AnimationStep::new("Refining parameters", ms(2000)),
                AnimationStep::new("Verifying details", ms(5000)),
            ],
            visibility_threshold: 0.3,
            finish_tick: ms(50),
        }
    }
}

impl SequenceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps.is_empty() {
            return Err(ConfigError::Empty {
                field: "sequence.steps",
            });
        }
        if self.steps.iter().any(|s| s.duration.is_zero()) {
            return Err(ConfigError::ZeroDuration {
                field: "sequence.steps[].duration",
            });
        }
        if self.finish_tick.is_zero() {
            return Err(ConfigError::ZeroDuration {
                field: "sequence.finish_tick",
            });
        }
        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return Err(ConfigError::Probability {
                field: "sequence.visibility_threshold",
                value: self.visibility_threshold,
            });
        }
        Ok(())
    }
}

/// Where the walkthrough is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencePhase {
    Waiting,
    Running { step: usize },
    Finishing { percent: u8 },
    Complete,
}

/// Visual state of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Upcoming,
    Active,
    Completed,
}

/// Display state of the walkthrough.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceView {
    pub phase: SequencePhase,
    pub steps: Vec<(String, StepStatus)>,
    /// Completion-bar percent, 0 until the steps are done.
    pub completion: u8,
}

/// One-shot visibility trigger.
///
/// Fires the first time an observed ratio reaches the threshold and never
/// again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityTrigger {
    threshold: f64,
    fired: bool,
}

impl VisibilityTrigger {
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            fired: false,
        }
    }

    /// Observe a visibility ratio. Returns `true` only on the firing call.
    pub fn observe(&mut self, ratio: f64) -> bool {
        if self.fired || !(ratio >= self.threshold) {
            return false;
        }
        self.fired = true;
        true
    }

    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

/// The scripted walkthrough controller.
#[derive(Debug, Clone)]
pub struct ScriptedSequence {
    config: SequenceConfig,
    trigger: VisibilityTrigger,
    phase: SequencePhase,
}

impl ScriptedSequence {
    pub fn new(config: SequenceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            trigger: VisibilityTrigger::new(config.visibility_threshold),
            config,
            phase: SequencePhase::Waiting,
        })
    }

    /// Report how much of the section is visible.
    ///
    /// Starts the walkthrough the first time the threshold is reached.
    pub fn observe_visibility(&mut self, ratio: f64) -> bool {
        if !self.trigger.observe(ratio) {
            return false;
        }
        self.phase = SequencePhase::Running { step: 0 };
        crate::debug!(ratio, "scripted sequence triggered");
        true
    }

    #[must_use]
    pub fn phase(&self) -> SequencePhase {
        self.phase
    }

    /// Status of step `idx` in the current phase.
    #[must_use]
    pub fn status(&self, idx: usize) -> StepStatus {
        match self.phase {
            SequencePhase::Waiting => StepStatus::Upcoming,
            SequencePhase::Running { step } if idx < step => StepStatus::Completed,
            SequencePhase::Running { step } if idx == step => StepStatus::Active,
            SequencePhase::Running { .. } => StepStatus::Upcoming,
            SequencePhase::Finishing { .. } | SequencePhase::Complete => StepStatus::Completed,
        }
    }

    /// Completion-bar percent.
    #[must_use]
    pub fn completion(&self) -> u8 {
        match self.phase {
            SequencePhase::Finishing { percent } => percent,
            SequencePhase::Complete => 100,
            _ => 0,
        }
    }

    #[must_use]
    pub fn view(&self) -> SequenceView {
        SequenceView {
            phase: self.phase,
            steps: self
                .config
                .steps
                .iter()
                .enumerate()
                .map(|(idx, s)| (s.text.clone(), self.status(idx)))
                .collect(),
            completion: self.completion(),
        }
    }
}

impl Controller for ScriptedSequence {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Sequence
    }

    fn next_delay(&self) -> Option<Duration> {
        match self.phase {
            SequencePhase::Waiting | SequencePhase::Complete => None,
            SequencePhase::Running { step } => Some(self.config.steps[step].duration),
            SequencePhase::Finishing { .. } => Some(self.config.finish_tick),
        }
    }

    fn fire(&mut self, _rng: &mut dyn RandomSource) {
        self.phase = match self.phase {
            SequencePhase::Running { step } if step + 1 < self.config.steps.len() => {
                SequencePhase::Running { step: step + 1 }
            }
            SequencePhase::Running { .. } => {
                crate::debug!("scripted steps done, filling completion bar");
                SequencePhase::Finishing { percent: 0 }
            }
            SequencePhase::Finishing { percent } if percent + 1 >= 100 => SequencePhase::Complete,
            SequencePhase::Finishing { percent } => SequencePhase::Finishing {
                percent: percent + 1,
            },
            other => other,
        };
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::Sequence(self.view())
    }

    fn handle(&mut self, input: &Input) -> bool {
        match input {
            Input::Visibility(ratio) => self.observe_visibility(*ratio),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Timed;
    use crate::random::ScriptedRandom;

    fn short() -> SequenceConfig {
        SequenceConfig {
            steps: vec![
                AnimationStep::new("one", Duration::from_millis(100)),
                AnimationStep::new("two", Duration::from_millis(200)),
            ],
            visibility_threshold: 0.3,
            finish_tick: Duration::from_millis(10),
        }
    }

    #[test]
    fn waits_for_visibility() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut t = Timed::new(ScriptedSequence::new(short()).unwrap());
        t.advance(Duration::from_secs(10), &mut rng);
        assert_eq!(t.inner().phase(), SequencePhase::Waiting);

        assert!(!t.handle(&Input::Visibility(0.29)));
        assert!(t.handle(&Input::Visibility(0.3)));
        assert_eq!(t.inner().phase(), SequencePhase::Running { step: 0 });
    }

    #[test]
    fn trigger_fires_once() {
        let mut seq = ScriptedSequence::new(short()).unwrap();
        assert!(seq.observe_visibility(1.0));
        assert!(!seq.observe_visibility(1.0));
        assert!(!seq.observe_visibility(f64::NAN));
    }

    #[test]
    fn steps_advance_on_their_own_durations() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut t = Timed::new(ScriptedSequence::new(short()).unwrap());
        t.handle(&Input::Visibility(0.5));

        t.advance(Duration::from_millis(99), &mut rng);
        assert_eq!(t.inner().status(0), StepStatus::Active);
        assert_eq!(t.inner().status(1), StepStatus::Upcoming);

        t.advance(Duration::from_millis(1), &mut rng);
        assert_eq!(t.inner().status(0), StepStatus::Completed);
        assert_eq!(t.inner().status(1), StepStatus::Active);

        t.advance(Duration::from_millis(200), &mut rng);
        assert_eq!(t.inner().phase(), SequencePhase::Finishing { percent: 0 });
        assert_eq!(t.inner().status(1), StepStatus::Completed);
    }

    #[test]
    fn completion_bar_fills_then_holds() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut t = Timed::new(ScriptedSequence::new(short()).unwrap());
        t.handle(&Input::Visibility(1.0));
        t.advance(Duration::from_millis(300), &mut rng);

        t.advance(Duration::from_millis(500), &mut rng);
        assert_eq!(t.inner().completion(), 50);

        t.advance(Duration::from_millis(500), &mut rng);
        assert_eq!(t.inner().phase(), SequencePhase::Complete);
        assert_eq!(t.inner().completion(), 100);

        t.advance(Duration::from_secs(60), &mut rng);
        assert_eq!(t.inner().phase(), SequencePhase::Complete);
        assert!(!t.handle(&Input::Visibility(1.0)));
    }

    #[test]
    fn view_lists_every_step() {
        let seq = ScriptedSequence::new(SequenceConfig::default()).unwrap();
        let view = seq.view();
        assert_eq!(view.steps.len(), 8);
        assert!(view.steps.iter().all(|(_, s)| *s == StepStatus::Upcoming));
        assert_eq!(view.steps[3].0, "Developing industry model");
    }

    #[test]
    fn total_default_duration() {
        let total: Duration = SequenceConfig::default()
            .steps
            .iter()
            .map(|s| s.duration)
            .sum();
        assert_eq!(total, Duration::from_secs(29));
    }
}

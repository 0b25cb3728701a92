#![forbid(unsafe_code)]

//! On/off switch with a processing delay on the way up.
//!
//! Drives the hero's market-intelligence switch: turning it on passes
//! through `Processing` for a fixed time, turning it off is immediate, and
//! presses while processing are ignored.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::millis;
use crate::controller::{Controller, ControllerKind, Input, Snapshot};
use crate::error::ConfigError;
use crate::random::RandomSource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToggleConfig {
    pub label: String,
    #[serde(with = "millis")]
    pub processing: Duration,
}

impl Default for ToggleConfig {
    fn default() -> Self {
        Self {
            label: "Market Intelligence".into(),
            processing: Duration::from_millis(2000),
        }
    }
}

impl ToggleConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.is_zero() {
            return Err(ConfigError::ZeroDuration {
                field: "intel.processing",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    Off,
    Processing,
    On,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToggleView {
    pub label: String,
    pub state: ToggleState,
}

#[derive(Debug, Clone)]
pub struct ProcessingToggle {
    config: ToggleConfig,
    state: ToggleState,
}

impl ProcessingToggle {
    pub fn new(config: ToggleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: ToggleState::Off,
        })
    }

    #[must_use]
    pub fn state(&self) -> ToggleState {
        self.state
    }

    /// Flip the switch. Returns `false` while processing.
    pub fn toggle(&mut self) -> bool {
        self.state = match self.state {
            ToggleState::Off => ToggleState::Processing,
            ToggleState::On => ToggleState::Off,
            ToggleState::Processing => return false,
        };
        crate::debug!(state = ?self.state, "toggle flipped");
        true
    }
}

impl Controller for ProcessingToggle {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Toggle
    }

    fn next_delay(&self) -> Option<Duration> {
        (self.state == ToggleState::Processing).then_some(self.config.processing)
    }

    fn fire(&mut self, _rng: &mut dyn RandomSource) {
        if self.state == ToggleState::Processing {
            self.state = ToggleState::On;
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::Toggle(ToggleView {
            label: self.config.label.clone(),
            state: self.state,
        })
    }

    fn handle(&mut self, input: &Input) -> bool {
        matches!(input, Input::Start) && self.toggle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Timed;
    use crate::random::ScriptedRandom;

    fn toggle() -> Timed<ProcessingToggle> {
        Timed::new(ProcessingToggle::new(ToggleConfig::default()).unwrap())
    }

    #[test]
    fn turning_on_passes_through_processing() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut t = toggle();
        assert_eq!(t.until_next(), None);
        assert!(t.handle(&Input::Start));
        assert_eq!(t.inner().state(), ToggleState::Processing);

        t.advance(Duration::from_millis(1999), &mut rng);
        assert_eq!(t.inner().state(), ToggleState::Processing);
        t.advance(Duration::from_millis(1), &mut rng);
        assert_eq!(t.inner().state(), ToggleState::On);
    }

    #[test]
    fn presses_while_processing_are_ignored() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut t = toggle();
        t.handle(&Input::Start);
        t.advance(Duration::from_millis(1500), &mut rng);
        assert!(!t.handle(&Input::Start));
        // The ignored press does not restart the wait.
        t.advance(Duration::from_millis(500), &mut rng);
        assert_eq!(t.inner().state(), ToggleState::On);
    }

    #[test]
    fn turning_off_is_immediate() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut t = toggle();
        t.handle(&Input::Start);
        t.advance(Duration::from_secs(2), &mut rng);
        assert!(t.handle(&Input::Start));
        assert_eq!(t.inner().state(), ToggleState::Off);
        assert!(!t.handle(&Input::Visibility(1.0)));
    }
}

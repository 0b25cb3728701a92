#![forbid(unsafe_code)]

//! Typing-text animator.
//!
//! Cycles through a list of example queries, typing one character at a time,
//! pausing on the full text, deleting it again and moving on to the next
//! query.
//!
//! ```text
//! Typing ──(text == source)──▶ PausedAtFull ──(pause)──▶ Deleting
//!    ▲                                                       │
//!    └──────────── (text == "", index = index + 1 mod N) ◀───┘
//! ```
//!
//! # Invariants
//!
//! 1. `text` is always a prefix of `sources[source_index]`.
//! 2. After the deletion of source `i` completes, `source_index == (i + 1) % N`.
//! 3. Characters are Unicode scalar values; a multi-byte character is typed
//!    and deleted in a single transition.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::controller::{Controller, ControllerKind, Snapshot};
use crate::error::ConfigError;
use crate::random::RandomSource;

/// Hero-section queries cycled by default.
pub const HERO_QUERIES: [&str; 4] = [
    "Simulate market volatility impact on our derivatives portfolio over next 6 months",
    "Project patient readmission rates based on historical treatment outcomes",
    "Optimize inventory levels across 12 distribution centers considering demand patterns",
    "Forecast seasonal demand variations for new product line launch",
];

/// Queries cycled by the forecast step of the explainer.
pub const FORECAST_QUERIES: [&str; 9] = [
    "Will our new product be successful?",
    "How will market trends affect revenue?",
    "What if we increase prices by 10%?",
    "Best expansion regions for Q3 2024?",
    "Customer churn prediction next quarter",
    "Supply chain optimization strategies",
    "Marketing budget allocation ROI",
    "Employee retention impact analysis",
    "New product launch timing simulation",
];

/// Timing and content for a [`TypingAnimator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingConfig {
    pub sources: Vec<String>,
    #[serde(with = "crate::config::millis")]
    pub type_delay: Duration,
    #[serde(with = "crate::config::millis")]
    pub delete_delay: Duration,
    #[serde(with = "crate::config::millis")]
    pub pause: Duration,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            sources: HERO_QUERIES.iter().map(|s| (*s).to_string()).collect(),
            type_delay: Duration::from_millis(25),
            delete_delay: Duration::from_millis(20),
            pause: Duration::from_millis(2000),
        }
    }
}

impl TypingConfig {
    /// The slower cadence used by the explainer's forecast query box.
    #[must_use]
    pub fn forecast() -> Self {
        Self {
            sources: FORECAST_QUERIES.iter().map(|s| (*s).to_string()).collect(),
            type_delay: Duration::from_millis(40),
            delete_delay: Duration::from_millis(50),
            pause: Duration::from_millis(12_000),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::Empty { field: "typing.sources" });
        }
        if self.sources.iter().any(String::is_empty) {
            return Err(ConfigError::Empty {
                field: "typing.sources[]",
            });
        }
        for (field, value) in [
            ("typing.type_delay", self.type_delay),
            ("typing.delete_delay", self.delete_delay),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration { field });
            }
        }
        Ok(())
    }
}

/// Where the animator is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypingPhase {
    Typing,
    PausedAtFull,
    Deleting,
}

/// Display state of the animator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingState {
    text: String,
    source_index: usize,
    phase: TypingPhase,
}

impl TypingState {
    /// The visible text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Index of the source currently being typed or deleted.
    #[must_use]
    pub fn source_index(&self) -> usize {
        self.source_index
    }

    #[must_use]
    pub fn phase(&self) -> TypingPhase {
        self.phase
    }

    /// Whether characters are being removed.
    #[must_use]
    pub fn is_deleting(&self) -> bool {
        self.phase == TypingPhase::Deleting
    }
}

/// Typing-text animator.
#[derive(Debug, Clone)]
pub struct TypingAnimator {
    config: TypingConfig,
    state: TypingState,
    /// Characters of the current source that are visible.
    visible_chars: usize,
}

impl TypingAnimator {
    /// Validate `config` and start typing the first source from empty.
    pub fn new(config: TypingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: TypingState {
                text: String::new(),
                source_index: 0,
                phase: TypingPhase::Typing,
            },
            visible_chars: 0,
        })
    }

    #[must_use]
    pub fn state(&self) -> &TypingState {
        &self.state
    }

    #[must_use]
    pub fn config(&self) -> &TypingConfig {
        &self.config
    }

    fn source(&self) -> &str {
        &self.config.sources[self.state.source_index]
    }

    fn set_visible(&mut self, chars: usize) {
        let source = &self.config.sources[self.state.source_index];
        let end = source
            .char_indices()
            .nth(chars)
            .map_or(source.len(), |(idx, _)| idx);
        self.visible_chars = chars;
        self.state.text.clear();
        self.state.text.push_str(&source[..end]);
    }
}

impl Controller for TypingAnimator {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Typing
    }

    fn next_delay(&self) -> Option<Duration> {
        Some(match self.state.phase {
            TypingPhase::Typing => self.config.type_delay,
            TypingPhase::PausedAtFull => self.config.pause,
            TypingPhase::Deleting => self.config.delete_delay,
        })
    }

    fn fire(&mut self, _rng: &mut dyn RandomSource) {
        match self.state.phase {
            TypingPhase::Typing => {
                self.set_visible(self.visible_chars + 1);
                if self.state.text.len() == self.source().len() {
                    self.state.phase = TypingPhase::PausedAtFull;
                    crate::trace!(index = self.state.source_index, "typing paused at full text");
                }
            }
            TypingPhase::PausedAtFull => {
                self.state.phase = TypingPhase::Deleting;
            }
            TypingPhase::Deleting => {
                self.set_visible(self.visible_chars.saturating_sub(1));
                if self.state.text.is_empty() {
                    self.state.source_index =
                        (self.state.source_index + 1) % self.config.sources.len();
                    self.state.phase = TypingPhase::Typing;
                    crate::trace!(index = self.state.source_index, "typing next source");
                }
            }
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::Typing(self.state.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Timed;
    use crate::random::ScriptedRandom;

    const MS_10: Duration = Duration::from_millis(10);

    fn animator(sources: &[&str], pause: Duration) -> Timed<TypingAnimator> {
        let config = TypingConfig {
            sources: sources.iter().map(|s| (*s).to_string()).collect(),
            type_delay: MS_10,
            delete_delay: MS_10,
            pause,
        };
        Timed::new(TypingAnimator::new(config).unwrap())
    }

    #[test]
    fn types_then_pauses_then_deletes() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut t = animator(&["ab"], Duration::from_millis(100));

        t.advance(MS_10, &mut rng);
        assert_eq!(t.inner().state().text(), "a");
        t.advance(MS_10, &mut rng);
        assert_eq!(t.inner().state().text(), "ab");
        assert_eq!(t.inner().state().phase(), TypingPhase::PausedAtFull);

        t.advance(Duration::from_millis(99), &mut rng);
        assert_eq!(t.inner().state().phase(), TypingPhase::PausedAtFull);
        t.advance(Duration::from_millis(1), &mut rng);
        assert!(t.inner().state().is_deleting());
        assert_eq!(t.inner().state().text(), "ab");

        t.advance(MS_10, &mut rng);
        assert_eq!(t.inner().state().text(), "a");
        t.advance(MS_10, &mut rng);
        assert_eq!(t.inner().state().text(), "");
        assert_eq!(t.inner().state().source_index(), 0);
        assert_eq!(t.inner().state().phase(), TypingPhase::Typing);

        // Steady-state: the second cycle is identical.
        t.advance(MS_10, &mut rng);
        assert_eq!(t.inner().state().text(), "a");
    }

    #[test]
    fn deletion_advances_index_modulo_len() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut t = animator(&["x", "yz", "w"], MS_10);
        let mut seen = Vec::new();
        for _ in 0..200 {
            t.advance(Duration::from_millis(1), &mut rng);
            let idx = t.inner().state().source_index();
            if seen.last() != Some(&idx) {
                seen.push(idx);
            }
        }
        assert_eq!(&seen[..4], &[0, 1, 2, 0]);
    }

    #[test]
    fn multibyte_characters_are_typed_whole() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut t = animator(&["né✓"], MS_10);
        t.advance(Duration::from_millis(20), &mut rng);
        assert_eq!(t.inner().state().text(), "né");
        t.advance(MS_10, &mut rng);
        assert_eq!(t.inner().state().text(), "né✓");
        assert_eq!(t.inner().state().phase(), TypingPhase::PausedAtFull);
    }

    #[test]
    fn empty_sources_rejected() {
        let config = TypingConfig {
            sources: Vec::new(),
            ..TypingConfig::default()
        };
        assert!(matches!(
            TypingAnimator::new(config),
            Err(ConfigError::Empty { .. })
        ));
    }

    #[test]
    fn zero_type_delay_rejected() {
        let config = TypingConfig {
            type_delay: Duration::ZERO,
            ..TypingConfig::default()
        };
        assert!(matches!(
            TypingAnimator::new(config),
            Err(ConfigError::ZeroDuration { field: "typing.type_delay" })
        ));
    }

    #[test]
    fn defaults_match_hero_cadence() {
        let cfg = TypingConfig::default();
        assert_eq!(cfg.sources.len(), 4);
        assert_eq!(cfg.type_delay, Duration::from_millis(25));
        assert_eq!(cfg.delete_delay, Duration::from_millis(20));
        assert_eq!(cfg.pause, Duration::from_millis(2000));
        assert_eq!(TypingConfig::forecast().sources.len(), 9);
    }
}

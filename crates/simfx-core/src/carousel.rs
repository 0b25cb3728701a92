#![forbid(unsafe_code)]

//! Looping carousel ticker.
//!
//! Spotlights one item at a time: processing, then completed, then the next
//! item slides in. Unlike the sequential loader it loops forever. Renderers
//! show a small window of neighbours around the focused item.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::millis;
use crate::controller::{Controller, ControllerKind, Snapshot};
use crate::error::ConfigError;
use crate::random::RandomSource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselConfig {
    pub items: Vec<String>,
    #[serde(with = "millis")]
    pub processing: Duration,
    /// How long the completed state stays on screen before advancing.
    #[serde(with = "millis")]
    pub hold: Duration,
    /// Neighbours shown on each side of the focused item.
    pub radius: usize,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            items: [
                "Documents",
                "Databases",
                "Images",
                "Spreadsheets",
                "Servers",
                "Calendars",
                "Contacts",
                "Cloud Storage",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            processing: Duration::from_millis(1500),
            hold: Duration::from_millis(2500),
            radius: 2,
        }
    }
}

impl CarouselConfig {
    /// The external-research ticker of the market-vision panel.
    #[must_use]
    pub fn market_sites() -> Self {
        Self {
            items: [
                "Bloomberg.com",
                "Reuters.com",
                "Harvard.edu",
                "JSTOR.org",
                "ScienceDirect.com",
                "MarketWatch.com",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            processing: Duration::from_millis(2000),
            hold: Duration::from_millis(2000),
            radius: 1,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.items.is_empty() {
            return Err(ConfigError::Empty {
                field: "carousel.items",
            });
        }
        if self.processing.is_zero() || self.hold.is_zero() {
            return Err(ConfigError::ZeroDuration {
                field: "carousel.processing/hold",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselPhase {
    Processing,
    Completed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CarouselView {
    pub index: usize,
    pub phase: CarouselPhase,
    /// `(offset, item)` pairs from `-radius` to `+radius`.
    pub window: Vec<(isize, String)>,
    pub cycles: u64,
}

#[derive(Debug, Clone)]
pub struct Carousel {
    config: CarouselConfig,
    index: usize,
    phase: CarouselPhase,
    cycles: u64,
}

impl Carousel {
    pub fn new(config: CarouselConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            index: 0,
            phase: CarouselPhase::Processing,
            cycles: 0,
        })
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn phase(&self) -> CarouselPhase {
        self.phase
    }

    /// Item at `offset` from the focused one, wrapping both ways.
    #[must_use]
    pub fn item_at(&self, offset: isize) -> &str {
        let len = self.config.items.len() as isize;
        let idx = (self.index as isize + offset).rem_euclid(len) as usize;
        &self.config.items[idx]
    }

    #[must_use]
    pub fn view(&self) -> CarouselView {
        let radius = self.config.radius as isize;
        CarouselView {
            index: self.index,
            phase: self.phase,
            window: (-radius..=radius)
                .map(|off| (off, self.item_at(off).to_string()))
                .collect(),
            cycles: self.cycles,
        }
    }
}

impl Controller for Carousel {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Carousel
    }

    fn next_delay(&self) -> Option<Duration> {
        Some(match self.phase {
            CarouselPhase::Processing => self.config.processing,
            CarouselPhase::Completed => self.config.hold,
        })
    }

    fn fire(&mut self, _rng: &mut dyn RandomSource) {
        match self.phase {
            CarouselPhase::Processing => self.phase = CarouselPhase::Completed,
            CarouselPhase::Completed => {
                self.phase = CarouselPhase::Processing;
                self.index = (self.index + 1) % self.config.items.len();
                if self.index == 0 {
                    self.cycles += 1;
                }
            }
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::Carousel(self.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Timed;
    use crate::random::ScriptedRandom;

    #[test]
    fn processing_then_completed_then_next() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut t = Timed::new(Carousel::new(CarouselConfig::default()).unwrap());
        t.advance(Duration::from_millis(1500), &mut rng);
        assert_eq!(t.inner().phase(), CarouselPhase::Completed);
        assert_eq!(t.inner().index(), 0);
        t.advance(Duration::from_millis(2500), &mut rng);
        assert_eq!(t.inner().phase(), CarouselPhase::Processing);
        assert_eq!(t.inner().index(), 1);
    }

    #[test]
    fn wraps_modulo_len() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut t = Timed::new(Carousel::new(CarouselConfig::market_sites()).unwrap());
        t.advance(Duration::from_millis(4000 * 6), &mut rng);
        assert_eq!(t.inner().index(), 0);
        assert_eq!(t.inner().view().cycles, 1);
    }

    #[test]
    fn window_wraps_around_the_ends() {
        let c = Carousel::new(CarouselConfig::default()).unwrap();
        let view = c.view();
        assert_eq!(view.window.len(), 5);
        assert_eq!(view.window[0], (-2, "Contacts".to_string()));
        assert_eq!(view.window[2], (0, "Documents".to_string()));
        assert_eq!(c.item_at(9), "Databases");
    }

    #[test]
    fn empty_items_rejected() {
        let cfg = CarouselConfig {
            items: Vec::new(),
            ..CarouselConfig::default()
        };
        assert!(Carousel::new(cfg).is_err());
    }
}

#![forbid(unsafe_code)]

//! Sliding-window time series and their random-walk drift.
//!
//! A [`SlidingWindow`] has a fixed capacity chosen at construction; every
//! push evicts the oldest point once full. [`SeriesDrift`] keeps one window
//! per charted series and extends each with a bounded random step from its
//! own newest value.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::random::RandomSource;

/// Fixed-capacity ordered series; insertion evicts the oldest element.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidingWindow {
    points: VecDeque<f64>,
    capacity: usize,
}

impl SlidingWindow {
    /// A window pre-populated from `points`; its capacity is their count.
    pub fn from_points(points: impl IntoIterator<Item = f64>) -> Self {
        let points: VecDeque<f64> = points.into_iter().collect();
        let capacity = points.len();
        Self { points, capacity }
    }

    /// Append `value`, evicting the oldest point when at capacity.
    ///
    /// Returns the evicted point, if any.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        if self.capacity == 0 {
            return None;
        }
        let evicted = if self.points.len() >= self.capacity {
            self.points.pop_front()
        } else {
            None
        };
        self.points.push_back(value);
        evicted
    }

    #[must_use]
    pub fn newest(&self) -> Option<f64> {
        self.points.back().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Points from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().copied()
    }

    /// Points from oldest to newest, copied into a `Vec`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }
}

/// How one series is seeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    pub name: String,
    /// Seed points are `floor(base + r * spread)`.
    pub base: f64,
    pub spread: f64,
}

/// Series parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesConfig {
    pub window: usize,
    /// Each step moves by at most this much in either direction.
    pub amplitude: f64,
    pub series: Vec<SeriesSpec>,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            window: 14,
            amplitude: 1.0,
            series: vec![
                SeriesSpec {
                    name: "Upside Potential".into(),
                    base: 85.0,
                    spread: 10.0,
                },
                SeriesSpec {
                    name: "Downside Risk".into(),
                    base: 15.0,
                    spread: 10.0,
                },
            ],
        }
    }
}

impl SeriesConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window == 0 {
            return Err(ConfigError::Empty {
                field: "series.window",
            });
        }
        if !(self.amplitude >= 0.0 && self.amplitude.is_finite()) {
            return Err(ConfigError::NonPositive {
                field: "series.amplitude",
                value: self.amplitude,
            });
        }
        Ok(())
    }
}

/// A named window, as handed to chart renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSeries {
    pub name: String,
    pub points: Vec<f64>,
}

/// A set of sliding windows drifting as bounded random walks.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesDrift {
    names: Vec<String>,
    windows: Vec<SlidingWindow>,
    amplitude: f64,
}

impl SeriesDrift {
    /// Seed every configured series with `window` random points.
    pub fn seeded(config: &SeriesConfig, rng: &mut dyn RandomSource) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut names = Vec::with_capacity(config.series.len());
        let mut windows = Vec::with_capacity(config.series.len());
        for spec in &config.series {
            let points: Vec<f64> = (0..config.window)
                .map(|_| (spec.base + rng.next_unit() * spec.spread).floor())
                .collect();
            names.push(spec.name.clone());
            windows.push(SlidingWindow::from_points(points));
        }
        Ok(Self {
            names,
            windows,
            amplitude: config.amplitude,
        })
    }

    /// Extend every window by one step of its own random walk.
    pub fn step(&mut self, rng: &mut dyn RandomSource) {
        for window in &mut self.windows {
            let last = window.newest().unwrap_or(0.0);
            let noise = (rng.next_unit() - 0.5) * 2.0 * self.amplitude;
            window.push(last + noise);
        }
    }

    #[must_use]
    pub fn windows(&self) -> &[SlidingWindow] {
        &self.windows
    }

    /// Named copies of every window.
    #[must_use]
    pub fn named(&self) -> Vec<NamedSeries> {
        self.names
            .iter()
            .zip(&self.windows)
            .map(|(name, window)| NamedSeries {
                name: name.clone(),
                points: window.to_vec(),
            })
            .collect()
    }
}

#![forbid(unsafe_code)]

//! Sequential loader simulation.
//!
//! Reveals a fixed list of data sources one at a time: item `i` is
//! processing for a fixed delay, then loaded, then item `i + 1` starts.
//! Stops once everything is loaded.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::millis;
use crate::controller::{Controller, ControllerKind, Snapshot};
use crate::error::ConfigError;
use crate::random::RandomSource;

/// Kind of data source, used for the icon next to its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Spreadsheet,
    Pdf,
    Database,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderItem {
    pub name: String,
    pub kind: SourceKind,
}

impl LoaderItem {
    pub fn new(name: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub items: Vec<LoaderItem>,
    /// How long each item stays in the processing state.
    #[serde(with = "millis")]
    pub delay: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        use SourceKind::{Database, Pdf, Spreadsheet};
        let items = [
            ("Q4_Financial_Report.xlsx", Spreadsheet),
            ("Market_Analysis_2024.pdf", Pdf),
            ("Customer_Database", Database),
            ("Sales_Metrics_2023.xlsx", Spreadsheet),
            ("Industry_Report.pdf", Pdf),
            ("Competitor_Analysis.pdf", Pdf),
            ("Historical_Data.xlsx", Spreadsheet),
            ("API_Endpoints.json", Database),
            ("Market_Trends.xlsx", Spreadsheet),
            ("Risk_Analysis.pdf", Pdf),
        ]
        .into_iter()
        .map(|(name, kind)| LoaderItem::new(name, kind))
        .collect();
        Self {
            items,
            delay: Duration::from_millis(1000),
        }
    }
}

impl LoaderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.delay.is_zero() {
            return Err(ConfigError::ZeroDuration {
                field: "loader.delay",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Pending,
    Processing,
    Loaded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoaderView {
    pub items: Vec<(LoaderItem, ItemStatus)>,
    pub loaded: usize,
}

impl LoaderView {
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.loaded == self.items.len()
    }
}

/// Loads items strictly in order.
#[derive(Debug, Clone)]
pub struct SequentialLoader {
    config: LoaderConfig,
    /// Number of loaded items; item `loaded` is processing while any remain.
    loaded: usize,
}

impl SequentialLoader {
    /// Start processing the first item immediately.
    pub fn new(config: LoaderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, loaded: 0 })
    }

    #[must_use]
    pub fn status(&self, idx: usize) -> ItemStatus {
        if idx < self.loaded {
            ItemStatus::Loaded
        } else if idx == self.loaded {
            ItemStatus::Processing
        } else {
            ItemStatus::Pending
        }
    }

    /// Index of the item being processed, if any.
    #[must_use]
    pub fn processing(&self) -> Option<usize> {
        (self.loaded < self.config.items.len()).then_some(self.loaded)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.loaded >= self.config.items.len()
    }

    #[must_use]
    pub fn view(&self) -> LoaderView {
        LoaderView {
            items: self
                .config
                .items
                .iter()
                .enumerate()
                .map(|(idx, item)| (item.clone(), self.status(idx)))
                .collect(),
            loaded: self.loaded,
        }
    }
}

impl Controller for SequentialLoader {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Loader
    }

    fn next_delay(&self) -> Option<Duration> {
        (!self.is_finished()).then_some(self.config.delay)
    }

    fn fire(&mut self, _rng: &mut dyn RandomSource) {
        if self.is_finished() {
            return;
        }
        self.loaded += 1;
        crate::trace!(loaded = self.loaded, "data source loaded");
        if self.is_finished() {
            crate::debug!(count = self.loaded, "all data sources loaded");
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::Loader(self.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Timed;
    use crate::random::ScriptedRandom;

    #[test]
    fn first_item_processing_on_mount() {
        let loader = SequentialLoader::new(LoaderConfig::default()).unwrap();
        assert_eq!(loader.processing(), Some(0));
        assert_eq!(loader.status(0), ItemStatus::Processing);
        assert_eq!(loader.status(1), ItemStatus::Pending);
    }

    #[test]
    fn loads_one_item_per_delay() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut t = Timed::new(SequentialLoader::new(LoaderConfig::default()).unwrap());
        t.advance(Duration::from_millis(2500), &mut rng);
        let view = t.inner().view();
        assert_eq!(view.loaded, 2);
        assert_eq!(view.items[1].1, ItemStatus::Loaded);
        assert_eq!(view.items[2].1, ItemStatus::Processing);
        assert_eq!(view.items[3].1, ItemStatus::Pending);
    }

    #[test]
    fn terminates_without_looping() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut t = Timed::new(SequentialLoader::new(LoaderConfig::default()).unwrap());
        assert_eq!(t.advance(Duration::from_secs(60), &mut rng), 10);
        assert!(t.inner().is_finished());
        assert_eq!(t.inner().processing(), None);
        assert_eq!(t.until_next(), None);
        assert!(t.inner().view().is_finished());
    }

    #[test]
    fn empty_list_is_finished_immediately() {
        let loader = SequentialLoader::new(LoaderConfig {
            items: Vec::new(),
            ..LoaderConfig::default()
        })
        .unwrap();
        assert!(loader.is_finished());
        assert_eq!(loader.next_delay(), None);
    }
}

#![forbid(unsafe_code)]

//! Showcase configuration.
//!
//! [`ShowcaseConfig`] bundles one section per controller. Every section
//! carries `#[serde(default)]`, so a partial JSON document only overrides the
//! fields it names and an empty document `{}` yields the stock landing page.
//!
//! # Failure Modes
//!
//! [`ShowcaseConfig::validate`] reports the first invalid field it finds.
//! Controllers validate their own section again on construction, so an
//! unvalidated config can never start a broken controller.

use serde::{Deserialize, Serialize};

use crate::carousel::CarouselConfig;
use crate::error::ConfigError;
use crate::loader::LoaderConfig;
use crate::metrics::MetricsConfig;
use crate::monte_carlo::MonteCarloConfig;
use crate::progress::ProgressConfig;
use crate::risk_matrix::RiskMatrixConfig;
use crate::scroll_steps::StepConfig;
use crate::sequence::SequenceConfig;
use crate::series::SeriesConfig;
use crate::theme::Theme;
use crate::toggle::ToggleConfig;
use crate::tuning::TuningConfig;
use crate::typing::TypingConfig;

/// `Duration` as integer milliseconds.
///
/// Use with `#[serde(with = "simfx_core::config::millis")]`.
pub mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let ms = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Everything the showcase needs to mount its sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowcaseConfig {
    pub theme: Theme,
    /// Hero typing animation.
    pub typing: TypingConfig,
    /// Forecast search-bar typing animation. Fields missing from a partial
    /// section fall back to the hero defaults, not the forecast ones.
    pub forecast: TypingConfig,
    pub steps: StepConfig,
    pub progress: ProgressConfig,
    pub metrics: MetricsConfig,
    pub series: SeriesConfig,
    pub sequence: SequenceConfig,
    pub loader: LoaderConfig,
    pub carousel: CarouselConfig,
    pub market: CarouselConfig,
    pub monte_carlo: MonteCarloConfig,
    pub tuning: TuningConfig,
    pub risk_matrix: RiskMatrixConfig,
    /// Hero market-intelligence switch.
    pub intel: ToggleConfig,
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            typing: TypingConfig::default(),
            forecast: TypingConfig::forecast(),
            steps: StepConfig::default(),
            progress: ProgressConfig::default(),
            metrics: MetricsConfig::default(),
            series: SeriesConfig::default(),
            sequence: SequenceConfig::default(),
            loader: LoaderConfig::default(),
            carousel: CarouselConfig::default(),
            market: CarouselConfig::market_sites(),
            monte_carlo: MonteCarloConfig::default(),
            tuning: TuningConfig::default(),
            risk_matrix: RiskMatrixConfig::default(),
            intel: ToggleConfig::default(),
        }
    }
}

impl ShowcaseConfig {
    /// Check every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.typing.validate()?;
        self.forecast.validate()?;
        self.steps.validate()?;
        self.progress.validate()?;
        self.metrics.validate()?;
        self.series.validate()?;
        self.sequence.validate()?;
        self.loader.validate()?;
        self.carousel.validate()?;
        self.market.validate()?;
        self.monte_carlo.validate()?;
        self.tuning.validate()?;
        self.risk_matrix.validate()?;
        self.intel.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(ShowcaseConfig::default().validate(), Ok(()));
    }

    #[test]
    fn empty_document_fills_defaults() {
        let cfg: ShowcaseConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, ShowcaseConfig::default());
    }

    #[test]
    fn partial_section_overrides_named_fields_only() {
        let cfg: ShowcaseConfig =
            serde_json::from_str(r#"{"typing": {"type_delay": 40}, "theme": "research"}"#)
                .unwrap();
        assert_eq!(cfg.theme, Theme::Research);
        assert_eq!(cfg.typing.type_delay, Duration::from_millis(40));
        assert_eq!(cfg.typing.pause, TypingConfig::default().pause);
        assert_eq!(cfg.typing.sources, TypingConfig::default().sources);
    }

    #[test]
    fn durations_serialize_as_millis() {
        let json = serde_json::to_value(ShowcaseConfig::default()).unwrap();
        assert_eq!(json["loader"]["delay"], 1000);
        assert_eq!(json["progress"]["time_per_percent"], 250);
        assert_eq!(json["risk_matrix"]["analyze_interval"], 800);
        assert_eq!(json["intel"]["processing"], 2000);
    }

    #[test]
    fn step_titles_follow_step_count() {
        let cfg: ShowcaseConfig = serde_json::from_str(r#"{"steps": {"step_count": 9}}"#).unwrap();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::CountMismatch {
                field: "steps.titles",
                expected: 10,
                found: 7,
            })
        ));
    }

    #[test]
    fn validate_reports_bad_section() {
        let mut cfg = ShowcaseConfig::default();
        cfg.monte_carlo.log_probability = 1.5;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Probability {
                field: "monte_carlo.log_probability",
                ..
            })
        ));
    }
}

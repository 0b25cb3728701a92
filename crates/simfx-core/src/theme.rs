#![forbid(unsafe_code)]

//! Visual skins of the landing page.
//!
//! The active theme is a plain value handed to renderers; nothing reads it
//! from global state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Business,
    Analyst,
    Developer,
    Research,
}

impl Theme {
    pub const ALL: [Theme; 4] = [
        Theme::Business,
        Theme::Analyst,
        Theme::Developer,
        Theme::Research,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Business => "Business",
            Self::Analyst => "Analyst",
            Self::Developer => "Developer",
            Self::Research => "Research",
        }
    }

    /// Hero headline.
    #[must_use]
    pub const fn headline(self) -> &'static str {
        match self {
            Self::Business => "Simulate Scenarios, Unlock Insights, Drive Success.",
            Self::Analyst => "Strategies You Know, Our AI-Powered Enhancements.",
            Self::Developer => {
                "Flexible API integration, custom simulation models, and scalable infrastructure, built for developers."
            }
            Self::Research => {
                "Advanced research tools, collaborative simulations, and comprehensive analysis, empowering academia."
            }
        }
    }

    /// Hue rotation applied to the background art, in degrees.
    #[must_use]
    pub const fn hue_rotation(self) -> i16 {
        match self {
            Self::Business => 0,
            Self::Analyst => -90,
            Self::Developer => -170,
            Self::Research => -230,
        }
    }

    /// Accent colour after applying [`Theme::hue_rotation`] to the base blue.
    #[must_use]
    pub fn accent_rgb(self) -> (u8, u8, u8) {
        rotate_hue((37, 99, 235), f64::from(self.hue_rotation()))
    }

    /// Next theme in sidebar order, wrapping.
    #[must_use]
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Parse a case-insensitive theme name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(name.trim()))
    }
}

/// Rotate the hue of an sRGB colour, matching the CSS `hue-rotate()` filter matrix.
fn rotate_hue((r, g, b): (u8, u8, u8), degrees: f64) -> (u8, u8, u8) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let m = [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ];
    let src = [f64::from(r), f64::from(g), f64::from(b)];
    let channel = |row: [f64; 3]| -> u8 {
        let v = row[0] * src[0] + row[1] * src[1] + row[2] * src[2];
        v.round().clamp(0.0, 255.0) as u8
    };
    (channel(m[0]), channel(m[1]), channel(m[2]))
}

#![forbid(unsafe_code)]

//! Core: deterministic animation controllers for the simulation landing page.
//!
//! Each controller is an explicit state machine over an injected
//! [`random::RandomSource`]; elapsed time is fed in through
//! [`controller::Timed`]. Nothing here reads a clock, spawns a thread or
//! touches a terminal.

pub mod carousel;
pub mod config;
pub mod controller;
pub mod error;
pub mod loader;
pub mod logging;
pub mod metrics;
pub mod monte_carlo;
pub mod progress;
pub mod random;
pub mod risk_matrix;
pub mod scroll_steps;
pub mod sequence;
pub mod series;
pub mod theme;
pub mod toggle;
pub mod tuning;
pub mod typing;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, info, trace, warn};

pub use config::ShowcaseConfig;
pub use controller::{Controller, ControllerKind, Input, Snapshot, Timed};
pub use error::ConfigError;
pub use random::{RandomSource, ScriptedRandom, SeededRandom};
pub use theme::Theme;

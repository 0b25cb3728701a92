#![forbid(unsafe_code)]

//! Runtime: hosts mounted controllers and feeds them time.
//!
//! # Key Components
//!
//! - [`Stage`] - mounted sections addressed by generation-checked tokens
//! - [`Clock`] - injected time source ([`SystemClock`], [`ManualClock`])
//! - [`SubscriptionManager`] - background timer and input threads with teardown
//! - [`StageSimulator`] - deterministic virtual-time harness for tests

pub mod clock;
pub mod simulator;
pub mod stage;
pub mod subscription;

pub use clock::{Clock, ManualClock, SystemClock};
pub use simulator::StageSimulator;
pub use stage::{SectionInfo, SectionToken, Stage, StageError};
pub use subscription::{Every, StopSignal, Subscription, SubscriptionManager};

#![forbid(unsafe_code)]

//! Logging shims for controller transitions.
//!
//! With the `tracing` feature the standard `tracing` macros are re-exported
//! here and at the crate root. Without it, every macro expands to nothing so
//! controllers can log transitions unconditionally at zero cost.
//!
//! Controllers only ever log at `debug`/`trace` level: a transition happens
//! many times per second and is never interesting at `info`.

#[cfg(feature = "tracing")]
pub use tracing::{debug, info, trace, warn};

#[cfg(not(feature = "tracing"))]
mod noop_macros {
    /// No-op `debug!` when tracing is disabled.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// No-op `info!` when tracing is disabled.
    #[macro_export]
    macro_rules! info {
        ($($arg:tt)*) => {};
    }

    /// No-op `trace!` when tracing is disabled.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// No-op `warn!` when tracing is disabled.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }
}

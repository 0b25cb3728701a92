#![forbid(unsafe_code)]

//! The controller contract and the time driver shared by every animation.
//!
//! A [`Controller`] is an explicit state machine: it reports how long until
//! its next scheduled transition ([`Controller::next_delay`]) and applies one
//! transition when asked ([`Controller::fire`]). It never reads a clock.
//!
//! [`Timed`] owns a controller and converts elapsed time into transitions.
//! Time left over after a transition is carried into the next one, so a
//! single `advance(300ms)` fires exactly the same transitions as thirty
//! `advance(10ms)` calls.
//!
//! ```
//! use std::time::Duration;
//! use simfx_core::controller::{Controller, Timed};
//! use simfx_core::random::ScriptedRandom;
//! use simfx_core::typing::{TypingAnimator, TypingConfig};
//!
//! let config = TypingConfig {
//!     sources: vec!["ab".into()],
//!     type_delay: Duration::from_millis(10),
//!     ..TypingConfig::default()
//! };
//! let mut typing = Timed::new(TypingAnimator::new(config).unwrap());
//! let mut rng = ScriptedRandom::constant(0.5);
//! typing.advance(Duration::from_millis(20), &mut rng);
//! assert_eq!(typing.inner().state().text(), "ab");
//! ```

use std::time::Duration;

use crate::carousel::CarouselView;
use crate::loader::LoaderView;
use crate::monte_carlo::MonteCarloView;
use crate::progress::DriftSnapshot;
use crate::random::RandomSource;
use crate::risk_matrix::RiskMatrixView;
use crate::scroll_steps::{ScrollInput, ScrollStep};
use crate::sequence::SequenceView;
use crate::toggle::ToggleView;
use crate::tuning::TuningView;
use crate::typing::TypingState;

/// Upper bound on transitions applied by one [`Timed::advance`] call.
///
/// Protects the caller from a controller that reports a zero delay forever.
pub const MAX_TRANSITIONS_PER_ADVANCE: u32 = 10_000;

/// Which kind of controller produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerKind {
    Typing,
    Steps,
    Drift,
    Sequence,
    Loader,
    Carousel,
    MonteCarlo,
    Tuning,
    RiskMatrix,
    Toggle,
}

impl ControllerKind {
    /// Stable lowercase name, used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Typing => "typing",
            Self::Steps => "steps",
            Self::Drift => "drift",
            Self::Sequence => "sequence",
            Self::Loader => "loader",
            Self::Carousel => "carousel",
            Self::MonteCarlo => "monte_carlo",
            Self::Tuning => "tuning",
            Self::RiskMatrix => "risk_matrix",
            Self::Toggle => "toggle",
        }
    }
}

/// External input routed to a controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    /// Scroll or resize; carries the full geometry.
    Scroll(ScrollInput),
    /// Fraction of the owning section currently inside the viewport.
    Visibility(f64),
    /// User pressed the section's start or toggle control.
    Start,
}

/// Display state of a controller, the only thing renderers ever see.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Typing(TypingState),
    Steps(ScrollStep),
    Drift(DriftSnapshot),
    Sequence(SequenceView),
    Loader(LoaderView),
    Carousel(CarouselView),
    MonteCarlo(MonteCarloView),
    Tuning(TuningView),
    RiskMatrix(RiskMatrixView),
    Toggle(ToggleView),
}

/// A timer-driven animation state machine.
pub trait Controller {
    /// What this controller is.
    fn kind(&self) -> ControllerKind;

    /// Time until the next scheduled transition, measured from the previous
    /// one. `None` means the controller is idle (waiting on input) or done.
    fn next_delay(&self) -> Option<Duration>;

    /// Apply exactly one scheduled transition.
    fn fire(&mut self, rng: &mut dyn RandomSource);

    /// Current display state.
    fn snapshot(&self) -> Snapshot;

    /// Route an external input. Returns `true` if state changed.
    fn handle(&mut self, _input: &Input) -> bool {
        false
    }
}

impl<C: Controller + ?Sized> Controller for Box<C> {
    fn kind(&self) -> ControllerKind {
        (**self).kind()
    }

    fn next_delay(&self) -> Option<Duration> {
        (**self).next_delay()
    }

    fn fire(&mut self, rng: &mut dyn RandomSource) {
        (**self).fire(rng);
    }

    fn snapshot(&self) -> Snapshot {
        (**self).snapshot()
    }

    fn handle(&mut self, input: &Input) -> bool {
        (**self).handle(input)
    }
}

/// Drives a [`Controller`] from elapsed time.
#[derive(Debug, Clone)]
pub struct Timed<C> {
    inner: C,
    /// Time accumulated since the last transition.
    pending: Duration,
    transitions: u64,
}

impl<C: Controller> Timed<C> {
    /// Wrap a freshly constructed controller.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            pending: Duration::ZERO,
            transitions: 0,
        }
    }

    /// Advance by `dt`, firing every transition that falls due.
    ///
    /// Returns the number of transitions applied.
    pub fn advance(&mut self, dt: Duration, rng: &mut dyn RandomSource) -> u32 {
        self.pending = self.pending.saturating_add(dt);
        let mut fired = 0;
        loop {
            let Some(delay) = self.inner.next_delay() else {
                // Idle time is not banked for later.
                self.pending = Duration::ZERO;
                break;
            };
            if self.pending < delay {
                break;
            }
            if fired >= MAX_TRANSITIONS_PER_ADVANCE {
                crate::warn!(
                    kind = self.inner.kind().as_str(),
                    dropped_ms = self.pending.as_millis() as u64,
                    "transition cap reached, dropping pending time"
                );
                self.pending = Duration::ZERO;
                break;
            }
            self.pending -= delay;
            self.inner.fire(rng);
            fired += 1;
        }
        self.transitions += u64::from(fired);
        fired
    }

    /// Route an input to the controller.
    ///
    /// A change of state restarts the wait for the next transition.
    pub fn handle(&mut self, input: &Input) -> bool {
        let changed = self.inner.handle(input);
        if changed {
            self.pending = Duration::ZERO;
        }
        changed
    }

    /// Time remaining until the next transition, if one is scheduled.
    #[must_use]
    pub fn until_next(&self) -> Option<Duration> {
        self.inner
            .next_delay()
            .map(|d| d.saturating_sub(self.pending))
    }

    /// Total transitions applied since construction.
    #[must_use]
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Borrow the wrapped controller.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Mutably borrow the wrapped controller.
    pub fn inner_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    /// Current display state.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;

    /// Counts up every `step`; stops at `limit`.
    struct Counter {
        step: Duration,
        count: u32,
        limit: u32,
    }

    impl Controller for Counter {
        fn kind(&self) -> ControllerKind {
            ControllerKind::Loader
        }

        fn next_delay(&self) -> Option<Duration> {
            (self.count < self.limit).then_some(self.step)
        }

        fn fire(&mut self, _rng: &mut dyn RandomSource) {
            self.count += 1;
        }

        fn snapshot(&self) -> Snapshot {
            Snapshot::Steps(ScrollStep::default())
        }

        fn handle(&mut self, input: &Input) -> bool {
            if matches!(input, Input::Start) {
                self.count = 0;
                return true;
            }
            false
        }
    }

    fn counter(limit: u32) -> Timed<Counter> {
        Timed::new(Counter {
            step: Duration::from_millis(10),
            count: 0,
            limit,
        })
    }

    #[test]
    fn advance_fires_due_transitions() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut t = counter(100);
        assert_eq!(t.advance(Duration::from_millis(9), &mut rng), 0);
        assert_eq!(t.advance(Duration::from_millis(1), &mut rng), 1);
        assert_eq!(t.advance(Duration::from_millis(35), &mut rng), 3);
        assert_eq!(t.inner().count, 4);
        assert_eq!(t.until_next(), Some(Duration::from_millis(5)));
    }

    #[test]
    fn one_large_step_equals_many_small_steps() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut big = counter(100);
        let mut small = counter(100);
        big.advance(Duration::from_millis(257), &mut rng);
        for _ in 0..257 {
            small.advance(Duration::from_millis(1), &mut rng);
        }
        assert_eq!(big.inner().count, small.inner().count);
        assert_eq!(big.transitions(), 25);
    }

    #[test]
    fn idle_controller_does_not_bank_time() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut t = counter(2);
        t.advance(Duration::from_secs(5), &mut rng);
        assert_eq!(t.inner().count, 2);
        assert_eq!(t.until_next(), None);

        t.handle(&Input::Start);
        assert_eq!(t.advance(Duration::from_millis(5), &mut rng), 0);
    }

    #[test]
    fn input_change_restarts_wait() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut t = counter(10);
        t.advance(Duration::from_millis(7), &mut rng);
        assert!(t.handle(&Input::Start));
        assert_eq!(t.until_next(), Some(Duration::from_millis(10)));
        assert!(!t.handle(&Input::Visibility(1.0)));
    }

    #[test]
    fn zero_delay_is_capped() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut t = Timed::new(Counter {
            step: Duration::ZERO,
            count: 0,
            limit: u32::MAX,
        });
        assert_eq!(
            t.advance(Duration::from_millis(1), &mut rng),
            MAX_TRANSITIONS_PER_ADVANCE
        );
    }

    #[test]
    fn boxed_controller_forwards() {
        let mut rng = ScriptedRandom::constant(0.0);
        let boxed: Box<dyn Controller> = Box::new(Counter {
            step: Duration::from_millis(1),
            count: 0,
            limit: 3,
        });
        let mut t = Timed::new(boxed);
        assert_eq!(t.advance(Duration::from_millis(10), &mut rng), 3);
        assert_eq!(t.inner().kind(), ControllerKind::Loader);
    }
}

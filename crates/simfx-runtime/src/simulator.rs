#![forbid(unsafe_code)]

//! Deterministic stage simulator for testing.
//!
//! `StageSimulator` drives a [`Stage`] from a [`ManualClock`] with a
//! scripted or seeded random source, so a whole landing page can be played
//! forward in virtual time and its snapshots captured at chosen instants.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use simfx_core::loader::{LoaderConfig, SequentialLoader};
//! use simfx_core::random::ScriptedRandom;
//! use simfx_runtime::simulator::StageSimulator;
//!
//! let mut sim = StageSimulator::new(ScriptedRandom::constant(0.5));
//! let loader = sim.mount("loader", SequentialLoader::new(LoaderConfig::default()).unwrap());
//! sim.run_for(Duration::from_secs(3), Duration::from_millis(100));
//! let frame = sim.capture();
//! assert_eq!(frame.at, Duration::from_secs(3));
//! assert!(sim.stage().is_mounted(loader));
//! ```

use std::time::Duration;

use simfx_core::controller::{Controller, Input, Snapshot};
use simfx_core::random::RandomSource;

use crate::clock::{Clock, ManualClock};
use crate::stage::{SectionInfo, SectionToken, Stage, StageError};

/// Something the simulator did, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SimRecord {
    Mount { token: SectionToken, name: String },
    Unmount { token: SectionToken },
    Input { token: SectionToken, changed: bool },
    Broadcast { changed: usize },
    Rejected { error: StageError },
    Advance { dt: Duration, transitions: u64 },
}

/// Every section's snapshot at one virtual instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub at: Duration,
    pub sections: Vec<(SectionInfo, Snapshot)>,
}

impl Frame {
    /// Snapshot of the section with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Snapshot> {
        self.sections
            .iter()
            .find(|(info, _)| info.name == name)
            .map(|(_, snap)| snap)
    }
}

pub struct StageSimulator {
    stage: Stage,
    clock: ManualClock,
    log: Vec<SimRecord>,
    frames: Vec<Frame>,
}

impl StageSimulator {
    pub fn new(rng: impl RandomSource + 'static) -> Self {
        let clock = ManualClock::new();
        let mut stage = Stage::new(rng);
        stage.sync(&clock);
        Self {
            stage,
            clock,
            log: Vec::new(),
            frames: Vec::new(),
        }
    }

    pub fn mount(&mut self, name: &str, controller: impl Controller + 'static) -> SectionToken {
        let token = self.stage.mount(name, controller);
        self.log.push(SimRecord::Mount {
            token,
            name: name.to_string(),
        });
        token
    }

    pub fn unmount(&mut self, token: SectionToken) -> Result<(), StageError> {
        let result = self.stage.unmount(token);
        self.record(result.clone().map(|()| SimRecord::Unmount { token }));
        result
    }

    pub fn send(&mut self, token: SectionToken, input: Input) -> Result<bool, StageError> {
        let result = self.stage.handle(token, &input);
        self.record(
            result
                .clone()
                .map(|changed| SimRecord::Input { token, changed }),
        );
        result
    }

    pub fn broadcast(&mut self, input: Input) -> usize {
        let changed = self.stage.broadcast(&input);
        self.log.push(SimRecord::Broadcast { changed });
        changed
    }

    /// Move virtual time forward by `dt` in one step.
    pub fn advance(&mut self, dt: Duration) -> u64 {
        self.clock.advance(dt);
        let transitions = self.stage.sync(&self.clock);
        self.log.push(SimRecord::Advance { dt, transitions });
        transitions
    }

    /// Move virtual time forward by `total` in increments of at most `step`.
    pub fn run_for(&mut self, total: Duration, step: Duration) -> u64 {
        if step.is_zero() {
            return self.advance(total);
        }
        let mut left = total;
        let mut transitions = 0;
        while !left.is_zero() {
            let dt = left.min(step);
            transitions += self.advance(dt);
            left -= dt;
        }
        transitions
    }

    /// Record the current snapshots of every section.
    pub fn capture(&mut self) -> &Frame {
        self.frames.push(Frame {
            at: self.clock.now(),
            sections: self.stage.snapshots(),
        });
        &self.frames[self.frames.len() - 1]
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    #[must_use]
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    #[must_use]
    pub fn log(&self) -> &[SimRecord] {
        &self.log
    }

    fn record(&mut self, result: Result<SimRecord, StageError>) {
        self.log.push(match result {
            Ok(record) => record,
            Err(error) => SimRecord::Rejected { error },
        });
    }
}

#![forbid(unsafe_code)]

//! Hosts mounted controllers and drives them from a clock.
//!
//! Each mounted section lives in a slot addressed by a [`SectionToken`]. A
//! token carries the slot's generation at mount time; unmounting bumps the
//! generation, so a token kept past teardown can never reach the slot's
//! next occupant.
//!
//! # Invariants
//!
//! 1. A section is only mutated through a token whose generation matches.
//! 2. Unmounting drops the controller together with its pending time; no
//!    transition for it fires afterwards.
//! 3. Sections never observe each other. Each draws from its own random
//!    stream, forked from the stage source at mount by slot and generation,
//!    so one section's activity never shifts another's draws.
//!
//! # Failure Modes
//!
//! Every token-taking call returns [`StageError::Unmounted`] for a stale or
//! foreign token and leaves the stage untouched.

use std::fmt;
use std::time::Duration;

use simfx_core::controller::{Controller, ControllerKind, Input, Snapshot, Timed};
use simfx_core::random::RandomSource;
use thiserror::Error;

use crate::clock::Clock;

/// Handle to a mounted section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionToken {
    slot: u32,
    generation: u32,
}

impl fmt::Display for SectionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.slot, self.generation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    /// The token's section has been torn down (or never belonged to this stage).
    #[error("section {token} is not mounted")]
    Unmounted { token: SectionToken },
}

struct Section {
    name: String,
    timed: Timed<Box<dyn Controller>>,
    rng: Box<dyn RandomSource>,
}

struct Slot {
    generation: u32,
    section: Option<Section>,
}

/// Summary of one mounted section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionInfo {
    pub token: SectionToken,
    pub name: String,
    pub kind: ControllerKind,
}

/// The set of mounted sections plus the source their random streams fork from.
pub struct Stage {
    slots: Vec<Slot>,
    free: Vec<u32>,
    rng: Box<dyn RandomSource>,
    /// Clock reading at the last [`Stage::sync`].
    last_sync: Option<Duration>,
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("mounted", &self.len())
            .field("slots", &self.slots.len())
            .field("last_sync", &self.last_sync)
            .finish()
    }
}

impl Stage {
    pub fn new(rng: impl RandomSource + 'static) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            rng: Box::new(rng),
            last_sync: None,
        }
    }

    /// Mount a controller under a display name.
    pub fn mount(
        &mut self,
        name: impl Into<String>,
        controller: impl Controller + 'static,
    ) -> SectionToken {
        self.mount_boxed(name, Box::new(controller))
    }

    pub fn mount_boxed(
        &mut self,
        name: impl Into<String>,
        controller: Box<dyn Controller>,
    ) -> SectionToken {
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    section: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let generation = self.slots[slot as usize].generation;
        let token = SectionToken { slot, generation };
        let section = Section {
            name: name.into(),
            rng: self.rng.fork(stream_id(token)),
            timed: Timed::new(controller),
        };
        tracing::debug!(
            %token,
            name = %section.name,
            kind = section.timed.inner().kind().as_str(),
            "section mounted"
        );
        self.slots[slot as usize].section = Some(section);
        token
    }

    /// Tear a section down. Its token, and every copy of it, goes stale.
    pub fn unmount(&mut self, token: SectionToken) -> Result<(), StageError> {
        self.section(token)?;
        self.teardown(token.slot);
        Ok(())
    }

    /// Unmount everything.
    pub fn clear(&mut self) {
        for slot in 0..self.slots.len() {
            if self.slots[slot].section.is_some() {
                self.teardown(slot as u32);
            }
        }
    }

    /// Drop the slot's section, bump its generation and free it.
    fn teardown(&mut self, slot: u32) {
        let entry = &mut self.slots[slot as usize];
        if let Some(section) = entry.section.take() {
            let token = SectionToken {
                slot,
                generation: entry.generation,
            };
            tracing::debug!(%token, name = %section.name, "section unmounted");
        }
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(slot);
    }

    #[must_use]
    pub fn is_mounted(&self, token: SectionToken) -> bool {
        self.lookup(token).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.section.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Route an input to one section. Returns whether its state changed.
    pub fn handle(&mut self, token: SectionToken, input: &Input) -> Result<bool, StageError> {
        let section = self.section_mut(token)?;
        let changed = section.timed.handle(input);
        tracing::trace!(%token, changed, "input routed");
        Ok(changed)
    }

    /// Route an input to every section. Returns how many changed.
    pub fn broadcast(&mut self, input: &Input) -> usize {
        let mut changed = 0;
        for section in self.slots.iter_mut().filter_map(|s| s.section.as_mut()) {
            if section.timed.handle(input) {
                changed += 1;
            }
        }
        changed
    }

    pub fn snapshot(&self, token: SectionToken) -> Result<Snapshot, StageError> {
        Ok(self.section(token)?.timed.snapshot())
    }

    /// Snapshots of every mounted section in slot order.
    #[must_use]
    pub fn snapshots(&self) -> Vec<(SectionInfo, Snapshot)> {
        self.live()
            .map(|(token, section)| (info(token, section), section.timed.snapshot()))
            .collect()
    }

    #[must_use]
    pub fn sections(&self) -> Vec<SectionInfo> {
        self.live().map(|(token, section)| info(token, section)).collect()
    }

    /// Transitions applied to one section since it was mounted.
    pub fn transitions(&self, token: SectionToken) -> Result<u64, StageError> {
        Ok(self.section(token)?.timed.transitions())
    }

    /// Advance every section by `dt`. Returns the total transitions fired.
    pub fn advance(&mut self, dt: Duration) -> u64 {
        let mut fired = 0u64;
        for section in self.slots.iter_mut().filter_map(|s| s.section.as_mut()) {
            fired += u64::from(section.timed.advance(dt, &mut *section.rng));
        }
        fired
    }

    /// Advance by the time elapsed on `clock` since the previous sync.
    ///
    /// The first sync only records the reading.
    pub fn sync(&mut self, clock: &dyn Clock) -> u64 {
        let now = clock.now();
        let dt = match self.last_sync {
            Some(prev) => now.saturating_sub(prev),
            None => Duration::ZERO,
        };
        self.last_sync = Some(now);
        if dt.is_zero() {
            return 0;
        }
        self.advance(dt)
    }

    /// Soonest scheduled transition across all sections, if any.
    #[must_use]
    pub fn until_next(&self) -> Option<Duration> {
        self.live()
            .filter_map(|(_, section)| section.timed.until_next())
            .min()
    }

    fn live(&self) -> impl Iterator<Item = (SectionToken, &Section)> {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            slot.section.as_ref().map(|section| {
                (
                    SectionToken {
                        slot: idx as u32,
                        generation: slot.generation,
                    },
                    section,
                )
            })
        })
    }

    fn lookup(&self, token: SectionToken) -> Option<&Section> {
        self.slots
            .get(token.slot as usize)
            .filter(|slot| slot.generation == token.generation)
            .and_then(|slot| slot.section.as_ref())
    }

    fn section(&self, token: SectionToken) -> Result<&Section, StageError> {
        self.lookup(token).ok_or_else(|| stale(token))
    }

    fn section_mut(&mut self, token: SectionToken) -> Result<&mut Section, StageError> {
        self.slots
            .get_mut(token.slot as usize)
            .filter(|slot| slot.generation == token.generation)
            .and_then(|slot| slot.section.as_mut())
            .ok_or_else(|| stale(token))
    }
}

/// Random stream id for a mount: slot in the high half, generation in the low.
fn stream_id(token: SectionToken) -> u64 {
    (u64::from(token.slot) << 32) | u64::from(token.generation)
}

fn info(token: SectionToken, section: &Section) -> SectionInfo {
    SectionInfo {
        token,
        name: section.name.clone(),
        kind: section.timed.inner().kind(),
    }
}

fn stale(token: SectionToken) -> StageError {
    tracing::warn!(%token, "rejected stale section token");
    StageError::Unmounted { token }
}

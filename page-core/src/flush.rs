//! Flush decision machine for an editing session.
//!
//! This module decides *when* a session persists its document. It is a
//! pure state machine: events go in, a new state and a list of actions come
//! out. Timers, locks and storage calls are performed by `page-sync`, which
//! interprets the actions.
//!
//! ## Save lane
//!
//! The session serializes writes through a single lane. A background save
//! first asks for the lane ([`FlushAction::RequestSave`]); once held, the
//! session reports [`FlushEvent::LaneAcquired`] and the machine either
//! answers with [`FlushAction::Write`] or, if the document became clean in
//! the meantime, with nothing. Requests that arrive while a write is running
//! are coalesced into one follow-up write issued when it completes.

use std::time::Duration;

/// What caused a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    /// Quiet period after an edit elapsed.
    Debounce,
    /// Periodic flush tick.
    Periodic,
    /// Explicit save; always writes.
    Force,
    /// Coalesced request that arrived during the previous write.
    FollowUp,
}

/// Inputs to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushEvent {
    /// Session opened.
    Started,
    /// The in-memory document changed.
    Edited,
    /// A debounce timer fired.
    DebounceElapsed {
        /// Generation the timer was armed with.
        generation: u64,
    },
    /// The periodic timer fired.
    PeriodicTick,
    /// A caller asked for an immediate save.
    ForceRequested,
    /// The session now holds the save lane.
    LaneAcquired {
        /// Why the lane was requested.
        trigger: SaveTrigger,
    },
    /// Storage acknowledged a write.
    SaveSucceeded {
        /// Revision of the snapshot that was written.
        revision: u64,
    },
    /// A write failed.
    SaveFailed,
    /// Session closed.
    Closed,
}

/// Instructions for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushAction {
    /// (Re)arm the debounce timer, replacing any earlier one.
    ArmDebounce {
        /// Generation to report back in [`FlushEvent::DebounceElapsed`].
        generation: u64,
        /// Quiet period.
        delay: Duration,
    },
    /// Cancel the debounce timer.
    CancelDebounce,
    /// Arm the next periodic tick.
    ArmPeriodic {
        /// Time until the tick.
        delay: Duration,
    },
    /// Cancel all timers.
    CancelTimers,
    /// Acquire the save lane in the background.
    RequestSave {
        /// Why.
        trigger: SaveTrigger,
    },
    /// Snapshot the document and write it now (the lane is held).
    Write {
        /// Revision of the snapshot to take.
        revision: u64,
        /// Why.
        trigger: SaveTrigger,
    },
}

/// Timing for the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushTiming {
    /// Quiet period after the last edit.
    pub debounce: Duration,
    /// Interval between periodic flushes.
    pub flush_interval: Duration,
}

impl Default for FlushTiming {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(2),
            flush_interval: Duration::from_secs(30),
        }
    }
}

/// Save scheduling state - NO I/O, just transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushMachine {
    timing: FlushTiming,
    /// Bumped on every edit.
    revision: u64,
    /// Highest revision known to be persisted.
    saved_revision: u64,
    /// A write is running.
    saving: bool,
    /// A background save is waiting for the lane.
    requested: bool,
    /// A request arrived during the running write.
    pending: bool,
    /// Only the timer armed with this generation may fire.
    debounce_generation: u64,
    debounce_armed: bool,
    closed: bool,
}

impl FlushMachine {
    /// Create a clean machine.
    pub fn new(timing: FlushTiming) -> Self {
        Self {
            timing,
            revision: 0,
            saved_revision: 0,
            saving: false,
            requested: false,
            pending: false,
            debounce_generation: 0,
            debounce_armed: false,
            closed: false,
        }
    }

    /// Process an event and return the actions to execute.
    pub fn on_event(&mut self, event: FlushEvent) -> Vec<FlushAction> {
        if self.closed {
            return vec![];
        }
        match event {
            FlushEvent::Started => vec![FlushAction::ArmPeriodic {
                delay: self.timing.flush_interval,
            }],

            FlushEvent::Edited => {
                self.revision += 1;
                self.debounce_generation += 1;
                self.debounce_armed = true;
                vec![FlushAction::ArmDebounce {
                    generation: self.debounce_generation,
                    delay: self.timing.debounce,
                }]
            }

            FlushEvent::DebounceElapsed { generation } => {
                if !self.debounce_armed || generation != self.debounce_generation {
                    return vec![];
                }
                self.debounce_armed = false;
                self.request(SaveTrigger::Debounce)
            }

            FlushEvent::PeriodicTick => {
                let mut actions = vec![FlushAction::ArmPeriodic {
                    delay: self.timing.flush_interval,
                }];
                if self.is_dirty() {
                    actions.extend(self.request(SaveTrigger::Periodic));
                }
                actions
            }

            FlushEvent::ForceRequested => {
                self.cancel_debounce();
                vec![FlushAction::CancelDebounce]
            }

            FlushEvent::LaneAcquired { trigger } => {
                if trigger != SaveTrigger::Force {
                    self.requested = false;
                    if !self.is_dirty() {
                        return vec![];
                    }
                }
                self.saving = true;
                self.pending = false;
                vec![FlushAction::Write {
                    revision: self.revision,
                    trigger,
                }]
            }

            FlushEvent::SaveSucceeded { revision } => {
                if revision > self.saved_revision {
                    self.saved_revision = revision.min(self.revision);
                }
                self.finish_write()
            }

            FlushEvent::SaveFailed => {
                // Retry is left to the next periodic tick.
                self.pending = false;
                self.saving = false;
                vec![]
            }

            FlushEvent::Closed => {
                self.cancel_debounce();
                self.closed = true;
                vec![FlushAction::CancelTimers]
            }
        }
    }

    fn request(&mut self, trigger: SaveTrigger) -> Vec<FlushAction> {
        if self.saving {
            self.pending = true;
            return vec![];
        }
        if self.requested {
            return vec![];
        }
        self.requested = true;
        vec![FlushAction::RequestSave { trigger }]
    }

    fn finish_write(&mut self) -> Vec<FlushAction> {
        if self.pending && self.is_dirty() {
            self.pending = false;
            return vec![FlushAction::Write {
                revision: self.revision,
                trigger: SaveTrigger::FollowUp,
            }];
        }
        self.pending = false;
        self.saving = false;
        vec![]
    }

    fn cancel_debounce(&mut self) {
        if self.debounce_armed {
            self.debounce_armed = false;
            self.debounce_generation += 1;
        }
    }

    /// Whether there are edits not yet persisted.
    pub fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    /// Whether a write is running.
    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Current document revision.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether a debounce timer is armed.
    pub fn debounce_armed(&self) -> bool {
        self.debounce_armed
    }

    /// Whether the session was closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Timing in use.
    pub fn timing(&self) -> FlushTiming {
        self.timing
    }
}

impl Default for FlushMachine {
    fn default() -> Self {
        Self::new(FlushTiming::default())
    }
}

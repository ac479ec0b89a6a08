//! Session-scoped vote state: the poll vote ledger and the per-discussion
//! vote toggle. Nothing here survives a session; both ledgers start empty.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::models::{Id, VoteDirection, VoteState, VoteTally};

/// Records which (poll, option) pairs this session has already voted on.
/// The check is per-option: voting two different options of the same poll is
/// allowed, matching the original behavior.
#[derive(Clone, Default)]
pub struct VoteLedger {
    entries: Arc<DashMap<(String, String), DateTime<Utc>>>,
}

impl VoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a vote. Returns `false` without modifying the ledger when the
    /// pair is already present. The claim happens under a single shard lock,
    /// so two concurrent callers can never both see `true`.
    pub fn record(&self, poll: &str, option: &str) -> bool {
        match self.entries.entry((poll.to_string(), option.to_string())) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Utc::now());
                true
            }
        }
    }

    /// Release a claimed pair again, e.g. when the store rejects the vote.
    pub fn retract(&self, poll: &str, option: &str) -> bool {
        self.entries.remove(&(poll.to_string(), option.to_string())).is_some()
    }

    pub fn has_voted(&self, poll: &str, option: &str) -> bool {
        self.entries.contains_key(&(poll.to_string(), option.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Tally adjustment produced by a toggle transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TallyDelta {
    pub up: i64,
    pub down: i64,
}

impl TallyDelta {
    pub fn score(self) -> i64 {
        self.up - self.down
    }
}

/// The full three-state transition table. Voting the current direction again
/// retracts it; voting the opposite direction retracts and switches in one
/// step.
pub fn transition(state: VoteState, dir: VoteDirection) -> (VoteState, TallyDelta) {
    use VoteDirection::{Down, Up};
    use VoteState::{DownVoted, Neutral, UpVoted};

    match (state, dir) {
        (Neutral, Up) => (UpVoted, TallyDelta { up: 1, down: 0 }),
        (Neutral, Down) => (DownVoted, TallyDelta { up: 0, down: 1 }),
        (UpVoted, Up) => (Neutral, TallyDelta { up: -1, down: 0 }),
        (DownVoted, Down) => (Neutral, TallyDelta { up: 0, down: -1 }),
        (UpVoted, Down) => (DownVoted, TallyDelta { up: -1, down: 1 }),
        (DownVoted, Up) => (UpVoted, TallyDelta { up: 1, down: -1 }),
    }
}

/// Per-discussion toggle state for this session.
#[derive(Clone, Default)]
pub struct DiscussionVotes {
    states: Arc<DashMap<Id, VoteState>>,
}

impl DiscussionVotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, discussion: Id) -> VoteState {
        self.states.get(&discussion).map(|s| *s).unwrap_or_default()
    }

    /// Commit a state reached via [`transition`]. Kept separate so callers
    /// can apply the tally delta to the store first and leave session state
    /// untouched when that fails.
    pub fn set(&self, discussion: Id, state: VoteState) {
        if state == VoteState::Neutral {
            self.states.remove(&discussion);
        } else {
            self.states.insert(discussion, state);
        }
    }
}

/// Apply a delta to a tally, saturating at zero on both counters.
pub fn apply_delta(tally: VoteTally, delta: TallyDelta) -> VoteTally {
    VoteTally {
        up: (tally.up + delta.up).max(0),
        down: (tally.down + delta.down).max(0),
    }
}

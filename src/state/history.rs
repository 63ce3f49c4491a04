use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::state::{game::GameState, state_machine::QuizSession, ui::UiFlags};

/// Number of snapshots kept for undo.
pub const HISTORY_CAPACITY: usize = 100;

/// Snapshot taken immediately before a host action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Game state with its timer normalized to a paused countdown.
    pub game: GameState,
    /// Host screen flags at the time of the snapshot.
    pub ui: UiFlags,
    /// Milliseconds since the epoch.
    pub timestamp: u64,
    /// Label of the action that followed.
    pub reason: String,
}

impl HistoryEntry {
    /// Snapshot `session` at `now_ms`.
    pub fn capture(session: &QuizSession, reason: impl Into<String>, now_ms: u64) -> Self {
        Self {
            game: normalize_for_snapshot(&session.game, now_ms),
            ui: session.ui.clone(),
            timestamp: now_ms,
            reason: reason.into(),
        }
    }

    /// Session to restore from this snapshot. The countdown is always paused.
    pub fn restore(self) -> QuizSession {
        let mut game = self.game;
        game.timer.running = false;
        game.timer.paused = true;
        game.timer.started_at = None;
        QuizSession { game, ui: self.ui }
    }
}

/// Copy of `game` whose timer is paused at its remaining value.
pub fn normalize_for_snapshot(game: &GameState, now_ms: u64) -> GameState {
    let mut copy = game.clone();
    copy.timer = game.timer.normalized(game.timer_fallback(), now_ms);
    copy
}

/// Bounded stack of snapshots; the oldest entry is dropped once full.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

impl History {
    /// Empty history holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// History seeded from persisted entries, oldest first. Excess oldest entries are dropped.
    pub fn from_entries(entries: Vec<HistoryEntry>, capacity: usize) -> Self {
        let mut history = Self::new(capacity);
        for entry in entries {
            history.push(entry);
        }
        history
    }

    /// Push a snapshot, evicting the oldest one when full.
    pub fn push(&mut self, entry: HistoryEntry) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Remove and return the newest snapshot.
    pub fn pop(&mut self) -> Option<HistoryEntry> {
        self.entries.pop_back()
    }

    /// Most recent snapshot.
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    /// Most entries kept before the oldest is evicted.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there is nothing to revert.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every snapshot.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries oldest first, as persisted.
    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::clock::TimerState;

    const T0: u64 = 1_700_000_000_000;

    fn entry(reason: &str) -> HistoryEntry {
        HistoryEntry {
            game: GameState::default(),
            ui: UiFlags::default(),
            timestamp: T0,
            reason: reason.into(),
        }
    }

    #[test]
    fn pop_returns_newest_first() {
        let mut history = History::default();
        history.push(entry("first"));
        history.push(entry("second"));
        assert_eq!(history.pop().unwrap().reason, "second");
        assert_eq!(history.pop().unwrap().reason, "first");
        assert!(history.pop().is_none());
    }

    #[test]
    fn oldest_entries_are_evicted_at_capacity() {
        let mut history = History::new(3);
        for n in 0..5 {
            history.push(entry(&format!("e{n}")));
        }
        let reasons: Vec<_> = history.to_vec().into_iter().map(|e| e.reason).collect();
        assert_eq!(reasons, vec!["e2", "e3", "e4"]);
    }

    #[test]
    fn capture_pauses_running_timer_at_remaining_value() {
        let mut session = QuizSession::default();
        session.game.timer = TimerState::stopped_at(30);
        session.game.timer.resume(30, T0);
        session.ui.question_revealed = true;

        let snapshot = HistoryEntry::capture(&session, "pass", T0 + 12_000);
        assert_eq!(snapshot.game.timer.time_left, Some(18));
        assert!(snapshot.game.timer.paused);
        assert!(!snapshot.game.timer.running);
        assert_eq!(snapshot.game.timer.started_at, None);
        assert_eq!(snapshot.ui, session.ui);
        assert_eq!(snapshot.reason, "pass");
    }

    #[test]
    fn restore_forces_paused_timer() {
        let mut snapshot = entry("tick");
        snapshot.game.timer.running = true;
        snapshot.game.timer.paused = false;
        snapshot.game.timer.started_at = Some(T0);
        let session = snapshot.restore();
        assert!(!session.game.timer.running);
        assert!(session.game.timer.paused);
        assert_eq!(session.game.timer.started_at, None);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn length_never_exceeds_capacity(pushes in 0usize..250) {
                let mut history = History::default();
                for n in 0..pushes {
                    history.push(entry(&n.to_string()));
                    prop_assert!(history.len() <= HISTORY_CAPACITY);
                }
                prop_assert_eq!(history.len(), pushes.min(HISTORY_CAPACITY));
                if pushes > 0 {
                    let newest = (pushes - 1).to_string();
                    prop_assert_eq!(history.last().map(|e| e.reason.as_str()), Some(newest.as_str()));
                }
            }
        }
    }
}

//! Per-card removal state machine.
//!
//! ```text
//! idle --hide--> removing --commit--> removed --restore--> idle
//!                   |  \--rollback--> idle
//!                   \----abandon----> (untracked, card detached by the page)
//! ```
//!
//! A removal is decided only when its transition delay elapses, against the
//! mode at that moment.

use crate::types::Mode;

/// What to do with a card whose removing transition just finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// Swap the card for its placeholder.
    Commit,
    /// Mode changed meanwhile: undo the transition and flags.
    RollBack,
    /// Page already detached the card: leave it alone.
    Abandon,
}

pub fn decide_removal(attached: bool, mode: Mode) -> RemovalOutcome {
    if !attached {
        RemovalOutcome::Abandon
    } else if mode == Mode::Filter {
        RemovalOutcome::Commit
    } else {
        RemovalOutcome::RollBack
    }
}

/// Tracks cards between hide and restore.
///
/// Handles are compared with `PartialEq` only, since host node handles are
/// generally not hashable. Collections stay small (one entry per hidden card).
#[derive(Debug, Clone)]
pub struct Tracker<N> {
    removing: Vec<N>,
    /// Placeholder -> card, in commit order.
    removed: Vec<(N, N)>,
}

impl<N> Default for Tracker<N> {
    fn default() -> Self {
        Self {
            removing: Vec::new(),
            removed: Vec::new(),
        }
    }
}

impl<N: Clone + PartialEq> Tracker<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_removal(&mut self, card: N) {
        if !self.is_removing(&card) {
            self.removing.push(card);
        }
    }

    pub fn is_removing(&self, card: &N) -> bool {
        self.removing.contains(card)
    }

    /// Leave the removing state, returning whether the card was in it.
    pub fn end_removal(&mut self, card: &N) -> bool {
        let before = self.removing.len();
        self.removing.retain(|c| c != card);
        self.removing.len() != before
    }

    /// Record an applied removal.
    pub fn commit(&mut self, placeholder: N, card: N) {
        self.end_removal(&card);
        self.removed.push((placeholder, card));
    }

    pub fn removed_len(&self) -> usize {
        self.removed.len()
    }

    pub fn removing_len(&self) -> usize {
        self.removing.len()
    }

    /// Empty the removed registry, handing back its entries.
    pub fn drain_removed(&mut self) -> Vec<(N, N)> {
        std::mem::take(&mut self.removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decide_removal_guards() {
        assert_eq!(decide_removal(true, Mode::Filter), RemovalOutcome::Commit);
        assert_eq!(decide_removal(true, Mode::Highlight), RemovalOutcome::RollBack);
        assert_eq!(decide_removal(true, Mode::Off), RemovalOutcome::RollBack);
        assert_eq!(decide_removal(false, Mode::Filter), RemovalOutcome::Abandon);
        assert_eq!(decide_removal(false, Mode::Off), RemovalOutcome::Abandon);
    }

    #[test]
    fn test_tracker_lifecycle() {
        let mut t: Tracker<u32> = Tracker::new();
        t.begin_removal(1);
        t.begin_removal(2);
        t.begin_removal(2);
        assert!(t.is_removing(&1));
        assert_eq!(t.removing_len(), 2);

        t.commit(100, 1);
        assert!(!t.is_removing(&1));
        assert_eq!(t.removed_len(), 1);

        assert!(t.end_removal(&2));
        assert!(!t.end_removal(&2));

        assert_eq!(t.drain_removed(), vec![(100, 1)]);
        assert_eq!(t.removed_len(), 0);
    }
}

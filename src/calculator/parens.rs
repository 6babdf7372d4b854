//! Parentheses bookkeeping for the editor.
//!
//! Tracks which `(` are still open so the UI can draw ghost closing
//! parentheses. It never blocks evaluation.

/// One parenthesized group, by buffer offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Group {
    pub start: usize,
    pub end: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParenthesesTracker {
    count: usize,
    groups: Vec<Group>,
}

impl ParenthesesTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of unclosed groups.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Record a `(` at `start`.
    pub fn open(&mut self, start: usize) {
        self.groups.push(Group { start, end: None });
        self.count += 1;
    }

    /// Record a `)` at `end`, closing the innermost open group.
    /// Returns false when nothing is open.
    pub fn close(&mut self, end: usize) -> bool {
        match self.groups.iter_mut().rev().find(|g| g.end.is_none()) {
            Some(group) => {
                group.end = Some(end);
                self.count -= 1;
                true
            }
            None => false,
        }
    }

    /// Undo the most recent `)`.
    pub fn reopen_last(&mut self) {
        let last_closed = self
            .groups
            .iter_mut()
            .filter(|g| g.end.is_some())
            .max_by_key(|g| g.end);
        if let Some(group) = last_closed {
            group.end = None;
            self.count += 1;
        }
    }

    /// Undo the most recent `(`.
    pub fn discard_last_open(&mut self) {
        if let Some(pos) = self.groups.iter().rposition(|g| g.end.is_none()) {
            self.groups.remove(pos);
            self.count -= 1;
        }
    }

    /// Closing parentheses the UI may show as ghosts.
    pub fn ghost_suffix(&self) -> String {
        " )".repeat(self.count)
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.groups.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_close() {
        let mut tracker = ParenthesesTracker::new();
        tracker.open(0);
        tracker.open(2);
        assert_eq!(tracker.count(), 2);
        assert!(tracker.close(6));
        assert_eq!(tracker.count(), 1);
        assert_eq!(tracker.groups()[1], Group { start: 2, end: Some(6) });
        assert_eq!(tracker.groups()[0].end, None);
        assert_eq!(tracker.ghost_suffix(), " )");
    }

    #[test]
    fn test_close_without_open() {
        let mut tracker = ParenthesesTracker::new();
        assert!(!tracker.close(3));
        assert_eq!(tracker.count(), 0);
    }

    #[test]
    fn test_backspace_bookkeeping() {
        let mut tracker = ParenthesesTracker::new();
        tracker.open(0);
        tracker.close(4);
        tracker.reopen_last();
        assert_eq!(tracker.count(), 1);
        tracker.discard_last_open();
        assert_eq!(tracker.count(), 0);
        assert!(tracker.groups().is_empty());
    }

    #[test]
    fn test_reset() {
        let mut tracker = ParenthesesTracker::new();
        tracker.open(0);
        tracker.reset();
        assert_eq!(tracker, ParenthesesTracker::default());
    }
}

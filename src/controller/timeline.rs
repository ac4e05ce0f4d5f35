//! Delayed layout removals for cards that are fading out.

use std::time::Instant;

use crate::models::ItemId;

/// A card to take out of layout flow once its hide transition has ended.
///
/// `generation` is the recomputation that started the hide; the controller
/// drops the removal if the card's state has moved on since.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRemoval {
    pub due: Instant,
    pub id: ItemId,
    pub generation: u64,
}

/// Pending removals, kept in due order
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    pending: Vec<PendingRemoval>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Instant, id: ItemId, generation: u64) {
        let at = self.pending.partition_point(|p| p.due <= due);
        self.pending.insert(at, PendingRemoval { due, id, generation });
    }

    /// Remove and return every removal due at or before `now`, earliest first
    pub fn take_due(&mut self, now: Instant) -> Vec<PendingRemoval> {
        let split = self.pending.partition_point(|p| p.due <= now);
        self.pending.drain(..split).collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.first().map(|p| p.due)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_take_due_in_order() {
        let t0 = Instant::now();
        let mut timeline = Timeline::new();
        timeline.schedule(t0 + Duration::from_millis(300), ItemId::from("b"), 2);
        timeline.schedule(t0 + Duration::from_millis(100), ItemId::from("a"), 1);
        timeline.schedule(t0 + Duration::from_millis(900), ItemId::from("c"), 3);

        assert_eq!(timeline.next_deadline(), Some(t0 + Duration::from_millis(100)));

        let due = timeline.take_due(t0 + Duration::from_millis(300));
        let ids: Vec<_> = due.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(timeline.len(), 1);
        assert!(timeline.take_due(t0).is_empty());
    }
}

//! Lazy thumbnail reveal.
//!
//! Listing items start deferred and transition to revealed exactly once, as
//! soon as their top edge comes within [`REVEAL_MARGIN`] of the bottom of the
//! visible viewport. The transition is one-way: scrolling an item back out of
//! view never re-defers it.

/// Extra reach beyond the viewport height, so items start fetching slightly
/// before they scroll into view.
pub const REVEAL_MARGIN: f32 = 100.0;

#[derive(Debug, Clone, Copy)]
struct Slot {
    deferred: bool,
    /// Top edge relative to the top of the visible viewport, as measured by
    /// the most recent layout pass. Unmeasured slots never qualify.
    top: Option<f32>,
}

/// Per-page ledger of deferred items, indexed in document order.
#[derive(Debug, Default)]
pub struct LazyReveal {
    slots: Vec<Slot>,
}

impl LazyReveal {
    /// Rebuilds the ledger for a freshly loaded page. Items flagged deferred
    /// wait for a sweep; the rest count as revealed from the start.
    pub fn reset(&mut self, deferred: impl IntoIterator<Item = bool>) {
        self.slots = deferred
            .into_iter()
            .map(|deferred| Slot {
                deferred,
                top: None,
            })
            .collect();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Records an item's measured top edge relative to the viewport top.
    pub fn record_top(&mut self, index: usize, top: f32) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.top = Some(top);
        }
    }

    pub fn is_revealed(&self, index: usize) -> bool {
        self.slots
            .get(index)
            .map(|slot| !slot.deferred)
            .unwrap_or(false)
    }

    pub fn deferred_remaining(&self) -> usize {
        self.slots.iter().filter(|slot| slot.deferred).count()
    }

    /// Reveals every deferred item within reach of the viewport and returns
    /// their indices in document order. Repeating the sweep with the same
    /// measurements reveals nothing further.
    pub fn sweep(&mut self, viewport_height: f32) -> Vec<usize> {
        let mut revealed = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !slot.deferred {
                continue;
            }
            let Some(top) = slot.top else {
                continue;
            };
            if top - REVEAL_MARGIN < viewport_height {
                slot.deferred = false;
                revealed.push(index);
            }
        }
        revealed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with_tops(tops: &[f32]) -> LazyReveal {
        let mut reveal = LazyReveal::default();
        reveal.reset(tops.iter().map(|_| true));
        for (index, top) in tops.iter().enumerate() {
            reveal.record_top(index, *top);
        }
        reveal
    }

    #[test]
    fn reveals_items_within_margin_of_viewport() {
        let mut reveal = ledger_with_tops(&[0.0, 500.0, 680.0, 2000.0]);
        let revealed = reveal.sweep(600.0);
        assert_eq!(revealed, vec![0, 1, 2]);
        assert!(!reveal.is_revealed(3));
    }

    #[test]
    fn margin_boundary_is_exclusive() {
        // top - margin must be strictly less than the viewport height.
        let mut reveal = ledger_with_tops(&[700.0, 699.0]);
        let revealed = reveal.sweep(600.0);
        assert_eq!(revealed, vec![1]);
        assert!(!reveal.is_revealed(0));
    }

    #[test]
    fn reveal_is_one_way() {
        let mut reveal = ledger_with_tops(&[100.0]);
        assert_eq!(reveal.sweep(600.0), vec![0]);

        // Item scrolls far out of view; it must stay revealed.
        reveal.record_top(0, 5000.0);
        assert_eq!(reveal.sweep(600.0), Vec::<usize>::new());
        assert!(reveal.is_revealed(0));
    }

    #[test]
    fn repeated_sweeps_reveal_each_item_once() {
        let mut reveal = ledger_with_tops(&[10.0, 20.0]);
        assert_eq!(reveal.sweep(600.0).len(), 2);
        assert!(reveal.sweep(600.0).is_empty());
        assert_eq!(reveal.deferred_remaining(), 0);
    }

    #[test]
    fn unmeasured_items_never_qualify() {
        let mut reveal = LazyReveal::default();
        reveal.reset([true, true]);
        reveal.record_top(0, 0.0);
        assert_eq!(reveal.sweep(600.0), vec![0]);
        assert_eq!(reveal.deferred_remaining(), 1);
    }

    #[test]
    fn non_deferred_items_count_as_revealed() {
        let mut reveal = LazyReveal::default();
        reveal.reset([false, true]);
        assert!(reveal.is_revealed(0));
        reveal.record_top(1, 0.0);
        assert_eq!(reveal.sweep(600.0), vec![1]);
    }
}

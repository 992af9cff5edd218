//! Upload batch accounting.
//!
//! One drop operation becomes one batch; every file in it is posted
//! independently, and only arrivals count. A new drop supersedes the previous
//! batch, and completions belonging to a superseded batch are discarded
//! instead of advancing the live counters.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadBatch {
    submitted: usize,
    completed: usize,
}

impl UploadBatch {
    pub fn new(submitted: usize) -> Self {
        Self {
            submitted,
            completed: 0,
        }
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Counts one delivered file, saturating at the submitted count.
    pub fn complete_one(&mut self) {
        if self.completed < self.submitted {
            self.completed += 1;
        }
    }

    /// Integer percentage, `100 * completed / submitted`.
    pub fn percent(&self) -> usize {
        if self.submitted == 0 {
            return 100;
        }
        100 * self.completed / self.submitted
    }

    /// Fraction in `0.0..=1.0` for progress bars.
    pub fn fraction(&self) -> f32 {
        if self.submitted == 0 {
            return 1.0;
        }
        self.completed as f32 / self.submitted as f32
    }

    pub fn is_done(&self) -> bool {
        self.completed == self.submitted
    }
}

/// Owns the live batch and stamps each one with an epoch so that stale
/// completions from a superseded batch can be told apart.
#[derive(Debug, Default)]
pub struct BatchLedger {
    epoch: u64,
    batch: Option<UploadBatch>,
}

impl BatchLedger {
    /// Starts a new batch, superseding any previous one, and returns the
    /// epoch its completions must carry.
    pub fn begin(&mut self, submitted: usize) -> u64 {
        self.epoch += 1;
        self.batch = Some(UploadBatch::new(submitted));
        self.epoch
    }

    /// Counts one completion for the given epoch and returns the updated
    /// batch, or `None` if the completion belongs to a superseded batch.
    pub fn complete_one(&mut self, epoch: u64) -> Option<UploadBatch> {
        if epoch != self.epoch {
            return None;
        }
        let batch = self.batch.as_mut()?;
        batch.complete_one();
        Some(*batch)
    }

    pub fn current(&self) -> Option<UploadBatch> {
        self.batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_never_exceeds_submitted() {
        let mut batch = UploadBatch::new(2);
        batch.complete_one();
        batch.complete_one();
        batch.complete_one();
        assert_eq!(batch.completed(), 2);
        assert!(batch.is_done());
    }

    #[test]
    fn percent_is_exact_integer_progress() {
        let mut batch = UploadBatch::new(3);
        assert_eq!(batch.percent(), 0);
        batch.complete_one();
        assert_eq!(batch.percent(), 33);
        batch.complete_one();
        assert_eq!(batch.percent(), 66);
        batch.complete_one();
        assert_eq!(batch.percent(), 100);
        assert!(batch.is_done());
    }

    #[test]
    fn partial_batch_stays_short_of_done() {
        let mut batch = UploadBatch::new(4);
        batch.complete_one();
        batch.complete_one();
        assert_eq!(batch.percent(), 50);
        assert!(!batch.is_done());
    }

    #[test]
    fn stale_completions_do_not_advance_a_newer_batch() {
        let mut ledger = BatchLedger::default();
        let first = ledger.begin(2);
        let second = ledger.begin(3);

        assert_eq!(ledger.complete_one(first), None);
        assert_eq!(ledger.current().map(|b| b.completed()), Some(0));

        let batch = ledger.complete_one(second).expect("live batch");
        assert_eq!(batch.completed(), 1);
        assert_eq!(batch.submitted(), 3);
    }

    #[test]
    fn ledger_reports_done_exactly_at_submitted() {
        let mut ledger = BatchLedger::default();
        let epoch = ledger.begin(2);
        assert!(!ledger.complete_one(epoch).expect("batch").is_done());
        assert!(ledger.complete_one(epoch).expect("batch").is_done());
    }
}

use palaver_core::CandidateInit;
use std::collections::VecDeque;

/// FIFO buffer for connectivity candidates that arrive before a remote
/// description is set. `None` entries are the end-of-candidates sentinel and
/// are buffered like any other. Nothing is ever dropped or reordered; the
/// queue is non-empty only while no remote description exists.
#[derive(Debug, Default)]
pub struct CandidateQueue {
    pending: VecDeque<Option<CandidateInit>>,
}

impl CandidateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, candidate: Option<CandidateInit>) {
        self.pending.push_back(candidate);
    }

    /// Take every buffered candidate in arrival order, leaving the queue
    /// empty. Called exactly once per negotiation cycle, right after a
    /// remote description is first set.
    pub fn drain(&mut self) -> Vec<Option<CandidateInit>> {
        self.pending.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

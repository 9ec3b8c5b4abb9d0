use std::collections::VecDeque;

/// FIFO buffer for connectivity candidates that arrive before the remote
/// description they depend on.
///
/// Enqueue order is receipt order; draining consumes in the same order and is
/// idempotent when the queue is empty.
#[derive(Debug, Default)]
pub struct CandidateQueue {
    pending: VecDeque<String>,
}

impl CandidateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, candidate: String) {
        self.pending.push_back(candidate);
    }

    /// Take all buffered candidates in receipt order.
    pub fn drain(&mut self) -> Vec<String> {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_receipt_order() {
        let mut queue = CandidateQueue::new();
        queue.enqueue("a".to_string());
        queue.enqueue("b".to_string());
        queue.enqueue("c".to_string());

        assert_eq!(queue.drain(), vec!["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_empty_is_idempotent() {
        let mut queue = CandidateQueue::new();
        assert!(queue.drain().is_empty());
        assert!(queue.drain().is_empty());
    }
}

//! Progress reporting and cancellation
//!
//! Observers receive `begin`, then zero or more `file` events, then exactly
//! one of `cancelled` or `end`. Observers may be called from rayon worker
//! threads when the run is parallel; `file` events still arrive in index
//! order.

use crate::source::FileId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

pub trait ProgressObserver: Send + Sync {
    fn begin(&self) {}

    /// `index` counts analyzed files from 0; `count` is how many will be
    /// analyzed
    fn file(&self, _index: usize, _count: usize, _file: &FileId) {}

    fn cancelled(&self) {}

    fn end(&self) {}
}

/// Owned form of the observer callbacks, for channels and logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Begin,
    File { index: usize, count: usize, file: FileId },
    Cancelled,
    End,
}

/// Forward events over a channel. A dropped receiver is not an error.
impl ProgressObserver for Sender<ProgressEvent> {
    fn begin(&self) {
        let _ = self.send(ProgressEvent::Begin);
    }

    fn file(&self, index: usize, count: usize, file: &FileId) {
        let _ = self.send(ProgressEvent::File {
            index,
            count,
            file: file.clone(),
        });
    }

    fn cancelled(&self) {
        let _ = self.send(ProgressEvent::Cancelled);
    }

    fn end(&self) {
        let _ = self.send(ProgressEvent::End);
    }
}

/// Shared cancellation flag; clones observe the same flag
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn test_token_clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_sender_forwards_events() {
        let (tx, rx) = channel();
        tx.begin();
        tx.file(0, 1, &FileId::root("a.c"));
        tx.end();
        let events: Vec<ProgressEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                ProgressEvent::Begin,
                ProgressEvent::File { index: 0, count: 1, file: FileId::root("a.c") },
                ProgressEvent::End,
            ]
        );
    }
}

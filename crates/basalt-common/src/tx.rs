//! Transaction identity and page access permissions.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TXN_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier for a transaction.
///
/// Ids are allocated from a process-wide counter and are unique for the
/// lifetime of the process. The storage layer only threads them through
/// to the buffer pool and dirty-page bookkeeping; transaction semantics
/// live above this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Allocates a fresh transaction id.
    pub fn new() -> Self {
        Self(NEXT_TXN_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// Access intent passed to the buffer pool when requesting a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Shared read access.
    ReadOnly,
    /// Exclusive write access.
    ReadWrite,
}

//! Append-only ledger of successful redemptions.
//!
//! The ledger lives outside the core state machine; the flow only appends
//! completed outcomes. Persistence beyond memory is the caller's concern.

use cdk_types::HistoryRecord;
use std::sync::{Arc, Mutex};

/// Append-only record store. Insertion order is display order.
pub trait HistoryLedger: Send + Sync {
    /// Appends a completed redemption.
    fn append(&self, record: HistoryRecord);

    /// Returns all records in insertion order.
    fn list(&self) -> Vec<HistoryRecord>;
}

/// In-memory ledger.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    records: Mutex<Vec<HistoryRecord>>,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl HistoryLedger for MemoryLedger {
    fn append(&self, record: HistoryRecord) {
        self.records.lock().unwrap().push(record);
    }

    fn list(&self) -> Vec<HistoryRecord> {
        self.records.lock().unwrap().clone()
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::Address;

/// One watched address's ingestion progress (§3, C6).
///
/// `start_slot <= last_slot` once `tx_count > 0` (§3 invariant, §8 P5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorCursor {
    pub address: Address,
    pub enabled: bool,
    pub start_slot: u64,
    pub start_timestamp: DateTime<Utc>,
    pub start_signature: String,
    pub last_slot: u64,
    pub last_timestamp: DateTime<Utc>,
    pub last_signature: String,
    pub tx_count: u64,
    pub last_execution: Option<DateTime<Utc>>,
    pub retry: u32,
}

impl MonitorCursor {
    pub fn new(address: Address) -> Self {
        let now = chrono::DateTime::<Utc>::UNIX_EPOCH;
        Self {
            address,
            enabled: true,
            start_slot: 0,
            start_timestamp: now,
            start_signature: String::new(),
            last_slot: 0,
            last_timestamp: now,
            last_signature: String::new(),
            tx_count: 0,
            last_execution: None,
            retry: 0,
        }
    }

    /// Folds one newly-processed transaction's slot/timestamp/signature
    /// into the cursor (§4.6): bumps `last_*` if the slot advances, lowers
    /// `start_*` if this is the first transaction or an older slot.
    pub fn observe(&mut self, slot: u64, timestamp: DateTime<Utc>, signature: &str) {
        if self.tx_count == 0 || slot > self.last_slot {
            self.last_slot = slot;
            self.last_timestamp = timestamp;
            self.last_signature = signature.to_string();
        }
        if self.tx_count == 0 || self.start_slot == 0 || slot < self.start_slot {
            self.start_slot = slot;
            self.start_timestamp = timestamp;
            self.start_signature = signature.to_string();
        }
        self.tx_count += 1;
    }

    pub fn bracket_is_monotonic(&self) -> bool {
        self.tx_count == 0 || self.start_slot <= self.last_slot
    }
}

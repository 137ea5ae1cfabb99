//! Metrics wrapper for the ingestion engine.
//!
//! A thin, cheaply-`Clone`-able facade over the `metrics` crate, in the
//! same shape angstrom's per-component metrics wrappers take: one struct
//! per component, one method per named measurement, no raw `counter!`/
//! `histogram!` calls scattered through business logic.

use std::time::Duration;

/// Polling-path measurements (C6/C7).
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestWorkerMetrics;

impl IngestWorkerMetrics {
    pub fn record_page_fetched(&self, pool_address: &str) {
        metrics::counter!("ingest_pages_fetched_total", 1, "pool" => pool_address.to_string());
    }

    pub fn record_transaction_processed(&self, pool_address: &str) {
        metrics::counter!("ingest_transactions_processed_total", 1, "pool" => pool_address.to_string());
    }

    pub fn record_swap_inserted(&self, pool_address: &str) {
        metrics::counter!("ingest_swaps_inserted_total", 1, "pool" => pool_address.to_string());
    }

    pub fn record_migration_event(&self, predecessor: &str, successor: &str) {
        metrics::counter!(
            "ingest_migration_events_total",
            1,
            "predecessor" => predecessor.to_string(),
            "successor" => successor.to_string()
        );
    }

    pub fn record_round_duration(&self, elapsed: Duration) {
        metrics::histogram!("ingest_round_duration_seconds", elapsed.as_secs_f64());
    }

    pub fn record_round_skipped(&self) {
        metrics::counter!("ingest_rounds_skipped_total", 1);
    }
}

/// Live-path measurements (C8).
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveMonitorMetrics;

impl LiveMonitorMetrics {
    pub fn record_reconnect(&self, address: &str) {
        metrics::counter!("ingest_live_reconnects_total", 1, "address" => address.to_string());
    }

    pub fn record_circuit_breaker_trip(&self, address: &str) {
        metrics::counter!("ingest_live_circuit_breaker_trips_total", 1, "address" => address.to_string());
    }

    pub fn record_notification_processed(&self, address: &str) {
        metrics::counter!("ingest_live_notifications_processed_total", 1, "address" => address.to_string());
    }

    pub fn record_not_found_dropped(&self, address: &str) {
        metrics::counter!("ingest_live_not_found_dropped_total", 1, "address" => address.to_string());
    }
}

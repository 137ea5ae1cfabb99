use ingest_adapters::AdapterError;
use thiserror::Error;

/// Never returned to the caller: every step of [`crate::migrate`] is
/// best-effort and only logged (§4.5 "each step independently best-effort
/// but logged"). Kept as a typed error anyway so the individual step
/// helpers compose with `?` internally.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Store(#[from] AdapterError),
    #[error(transparent)]
    Swap(#[from] ingest_swap::SwapError),
    #[error(transparent)]
    Holder(#[from] ingest_holders::HolderError),
}

use ingest_adapters::AdapterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwapError {
    /// A swap with this `(signature, address)` already exists (§4.2, §8
    /// P4). Only returned for the primary swap's pre-check; secondary
    /// conflicts are logged and skipped, never propagated.
    #[error("swap already exists for this signature/address")]
    AlreadyExists,
    #[error(transparent)]
    Store(#[from] AdapterError),
}

use ingest_adapters::AdapterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HolderError {
    #[error(transparent)]
    Store(#[from] AdapterError),
}

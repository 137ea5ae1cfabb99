//! External Interface Adapters (C9, §4.9, §6).
//!
//! Thin typed wrappers only: no business logic lives here. The
//! transactions-API client and RPC client translate request/response
//! shapes; the `Store` trait names the operations the engine needs from
//! the persistent store without committing to an engine or driver.

pub mod error;
pub mod rpc;
pub mod store;
pub mod tx_api;
pub mod ws;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use error::AdapterError;
pub use rpc::{HttpRpcClient, ParsedTransaction, RpcAdapter, TokenBalanceEntry, TransactionMeta};
pub use store::Store;
pub use tx_api::{FetchPageParams, TransactionsApiClient};
pub use ws::{LogsNotification, LogsWsConnection};

//! Shared data model for the pool-activity ingestion engine.
//!
//! Every type in this crate is semantic, not physical: it has no opinion on
//! the database engine or wire encoding a host chooses for it (see the
//! `Store` trait in `ingest-adapters`). Amounts are `rust_decimal::Decimal`
//! so summation stays exact across the conservation checks the engine's
//! test suite relies on; timestamps are `chrono::DateTime<Utc>`.

pub mod address;
pub mod balance_change;
pub mod cursor;
pub mod holder;
pub mod live_swap;
pub mod pool;
pub mod project;
pub mod role;
pub mod swap;
pub mod tx;
pub mod wallet_stat;

pub use address::Address;
pub use balance_change::AddressBalanceChange;
pub use cursor::MonitorCursor;
pub use holder::{Holder, HolderType};
pub use live_swap::{LiveSwapTransaction, PayerType, SwapAction};
pub use pool::{GenericPoolConfig, PoolConfig, PoolStatus, ProtocolFamily};
pub use project::ProjectConfig;
pub use role::RoleAddress;
pub use swap::Swap;
pub use tx::{AccountDataEntry, EnhancedTransaction, TokenTransfer};
pub use wallet_stat::WalletTokenStat;

/// Reserved mint label for the chain's native asset, per the glossary.
pub const NATIVE_MINT: &str = "sol";

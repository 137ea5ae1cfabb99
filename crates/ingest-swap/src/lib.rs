//! Swap Builder (C2, §4.2) and Wallet-Stat Updater (C4, §4.4).
//!
//! `build_and_persist` folds one transaction's [`AddressBalanceChange`]s
//! into a primary swap row (the fee payer's) and zero or more secondary
//! rows, persisting each through [`Store`](ingest_adapters::Store) and
//! driving the Wallet-Stat Updater for every address whose swap insert
//! succeeds.

pub mod builder;
pub mod error;
pub mod wallet_stat;

pub use builder::build_and_persist;
pub use error::SwapError;
pub use wallet_stat::WalletStatUpdater;

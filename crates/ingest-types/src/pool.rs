use serde::{Deserialize, Serialize};

use crate::address::Address;

/// The protocol family a pool belongs to.
///
/// The upstream system overloads several per-family config records
/// (bonding-curve launch pools, constant-product AMM pools, and their
/// migration successors) with the same capability surface. Per §9's
/// re-architecture guidance this is modeled as a single capability trait
/// (`PoolConfig`) consumed by C1-C3, with `ProtocolFamily` distinguishing
/// family-specific constants (page interval, migration direction) that the
/// business logic itself does not need to branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolFamily {
    /// Bonding-curve launch pool (migratable to `Amm`).
    BondingCurve,
    /// Constant-product AMM pool (migration successor of `BondingCurve`).
    Amm,
    /// CPMM-style pool with its own vault/config shape.
    Cpmm,
}

impl ProtocolFamily {
    /// Inter-page sleep interval for this family's ingestion worker (§4.6).
    ///
    /// Preserved per-family rather than unified, per §4.6's instruction to
    /// keep the source's value per family.
    pub fn page_interval_secs(self) -> u64 {
        match self {
            ProtocolFamily::BondingCurve => 1,
            ProtocolFamily::Amm => 5,
            ProtocolFamily::Cpmm => 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolStatus {
    Active,
    Inactive,
    Migrated,
}

/// Capability trait consumed by the Balance-Change Deriver, Swap Builder,
/// and Holder Aggregator (C1-C3). Every per-family pool config record
/// implements this; callers never match on `ProtocolFamily` to decide
/// vault/mint semantics.
pub trait PoolConfig: Send + Sync {
    fn pool_address(&self) -> &Address;
    fn base_mint(&self) -> &str;
    fn quote_mint(&self) -> &str;
    fn base_vault(&self) -> &Address;
    fn quote_vault(&self) -> &Address;
    fn status(&self) -> PoolStatus;
    fn family(&self) -> ProtocolFamily;
    fn successor_pool_address(&self) -> Option<&Address>;
    fn is_migrated(&self) -> bool;

    /// §3 invariant: `base_mint != quote_mint`.
    fn mints_distinct(&self) -> bool {
        self.base_mint() != self.quote_mint()
    }
}

/// Concrete pool config record. One value of this type exists per row of
/// whichever family-specific table a host's store maps it from; the
/// `family` field only ever affects `ProtocolFamily::page_interval_secs`
/// and which migration direction applies, never C1-C3's core logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericPoolConfig {
    pub pool_address: Address,
    pub base_mint: String,
    pub quote_mint: String,
    pub base_vault: Address,
    pub quote_vault: Address,
    pub status: PoolStatus,
    pub family: ProtocolFamily,
    pub successor_pool_address: Option<Address>,
    pub is_migrated: bool,
}

impl GenericPoolConfig {
    pub fn new(
        pool_address: Address,
        base_mint: impl Into<String>,
        quote_mint: impl Into<String>,
        base_vault: Address,
        quote_vault: Address,
        family: ProtocolFamily,
    ) -> Self {
        Self {
            pool_address,
            base_mint: base_mint.into(),
            quote_mint: quote_mint.into(),
            base_vault,
            quote_vault,
            status: PoolStatus::Active,
            family,
            successor_pool_address: None,
            is_migrated: false,
        }
    }

    pub fn with_successor(mut self, successor: Address) -> Self {
        self.successor_pool_address = Some(successor);
        self
    }
}

impl PoolConfig for GenericPoolConfig {
    fn pool_address(&self) -> &Address {
        &self.pool_address
    }

    fn base_mint(&self) -> &str {
        &self.base_mint
    }

    fn quote_mint(&self) -> &str {
        &self.quote_mint
    }

    fn base_vault(&self) -> &Address {
        &self.base_vault
    }

    fn quote_vault(&self) -> &Address {
        &self.quote_vault
    }

    fn status(&self) -> PoolStatus {
        self.status
    }

    fn family(&self) -> ProtocolFamily {
        self.family
    }

    fn successor_pool_address(&self) -> Option<&Address> {
        self.successor_pool_address.as_ref()
    }

    fn is_migrated(&self) -> bool {
        self.is_migrated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> GenericPoolConfig {
        GenericPoolConfig::new(
            Address::from("Pool111"),
            "Base111",
            "Quote111",
            Address::from("BaseVault111"),
            Address::from("QuoteVault111"),
            ProtocolFamily::BondingCurve,
        )
    }

    #[test]
    fn mints_must_be_distinct() {
        assert!(pool().mints_distinct());
    }

    #[test]
    fn page_interval_is_family_specific() {
        assert_eq!(ProtocolFamily::BondingCurve.page_interval_secs(), 1);
        assert_eq!(ProtocolFamily::Cpmm.page_interval_secs(), 20);
    }
}

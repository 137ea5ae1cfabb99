//! Balance-Change Deriver (C1, §4.1).
//!
//! Pure, deterministic transformation of one enhanced transaction into an
//! ordered list of per-`(address, mint)` signed deltas. Two variants share
//! the same output shape: [`derive`] applies vault-account matching (the
//! polling path); [`derive_live`] degenerates the filter to "either
//! endpoint is the pool address itself" (the live path and migration
//! replay, §4.1 point 5, §4.5 step 3).

use ingest_types::{AddressBalanceChange, PoolConfig, EnhancedTransaction, NATIVE_MINT};

/// Output of [`derive`]: the balance changes plus whether this transaction
/// funded a successor pool's vaults.
#[derive(Debug, Clone, PartialEq)]
pub struct DeriveOutcome {
    pub changes: Vec<AddressBalanceChange>,
    pub migrated: bool,
}

/// Polling-path variant (§4.1 steps 1-4). `successor`, if given, is only
/// consulted to detect a funding transfer into its vaults (step 3); it
/// never changes which changes are emitted for `pool`.
pub fn derive(
    tx: &EnhancedTransaction,
    pool: &dyn PoolConfig,
    successor: Option<&dyn PoolConfig>,
) -> DeriveOutcome {
    let mut changes = Vec::new();
    let mut migrated = false;

    for transfer in &tx.token_transfers {
        let touches_base = transfer.mint == pool.base_mint()
            && (transfer.from_token_account == *pool.base_vault()
                || transfer.to_token_account == *pool.base_vault());
        let touches_quote = transfer.mint == pool.quote_mint()
            && (transfer.from_token_account == *pool.quote_vault()
                || transfer.to_token_account == *pool.quote_vault());

        if !touches_base && !touches_quote {
            continue;
        }

        if let Some(successor) = successor {
            if transfer.to_token_account == *successor.base_vault()
                || transfer.to_token_account == *successor.quote_vault()
            {
                migrated = true;
            }
        }

        let sender_is_vault =
            transfer.from_token_account == *pool.base_vault() || transfer.from_token_account == *pool.quote_vault();
        let receiver_is_vault =
            transfer.to_token_account == *pool.base_vault() || transfer.to_token_account == *pool.quote_vault();

        changes.push(AddressBalanceChange {
            slot: tx.slot,
            timestamp: tx.timestamp,
            signature: tx.signature.clone(),
            address: if sender_is_vault { pool.pool_address().clone() } else { transfer.from_user_account.clone() },
            mint: transfer.mint.clone(),
            amount_change: -transfer.token_amount,
        });

        changes.push(AddressBalanceChange {
            slot: tx.slot,
            timestamp: tx.timestamp,
            signature: tx.signature.clone(),
            address: if receiver_is_vault { pool.pool_address().clone() } else { transfer.to_user_account.clone() },
            mint: transfer.mint.clone(),
            amount_change: transfer.token_amount,
        });
    }

    for entry in &tx.account_data {
        if entry.native_balance_change == 0 {
            continue;
        }

        let address = if entry.account == *pool.base_vault() || entry.account == *pool.quote_vault() {
            pool.pool_address().clone()
        } else {
            entry.account.clone()
        };

        changes.push(AddressBalanceChange {
            slot: tx.slot,
            timestamp: tx.timestamp,
            signature: tx.signature.clone(),
            address,
            mint: NATIVE_MINT.to_string(),
            amount_change: rust_decimal::Decimal::from_i128_with_scale(entry.native_balance_change, 0),
        });
    }

    DeriveOutcome { changes, migrated }
}

/// Live-path variant (§4.1 point 5). The filter degenerates to "either
/// endpoint equals the pool address itself" — there is no vault account to
/// match against, so no rewrite is needed: the address is already the pool
/// address whenever it belongs to the pool.
pub fn derive_live(tx: &EnhancedTransaction, pool: &dyn PoolConfig) -> Vec<AddressBalanceChange> {
    let mut changes = Vec::new();

    for transfer in &tx.token_transfers {
        let is_relevant_mint = transfer.mint == pool.base_mint() || transfer.mint == pool.quote_mint();
        let touches_pool =
            transfer.from_user_account == *pool.pool_address() || transfer.to_user_account == *pool.pool_address();

        if !is_relevant_mint || !touches_pool {
            continue;
        }

        changes.push(AddressBalanceChange {
            slot: tx.slot,
            timestamp: tx.timestamp,
            signature: tx.signature.clone(),
            address: transfer.from_user_account.clone(),
            mint: transfer.mint.clone(),
            amount_change: -transfer.token_amount,
        });
        changes.push(AddressBalanceChange {
            slot: tx.slot,
            timestamp: tx.timestamp,
            signature: tx.signature.clone(),
            address: transfer.to_user_account.clone(),
            mint: transfer.mint.clone(),
            amount_change: transfer.token_amount,
        });
    }

    for entry in &tx.account_data {
        if entry.native_balance_change == 0 || entry.account != *pool.pool_address() {
            continue;
        }

        changes.push(AddressBalanceChange {
            slot: tx.slot,
            timestamp: tx.timestamp,
            signature: tx.signature.clone(),
            address: entry.account.clone(),
            mint: NATIVE_MINT.to_string(),
            amount_change: rust_decimal::Decimal::from_i128_with_scale(entry.native_balance_change, 0),
        });
    }

    changes
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use ingest_types::{Address, AccountDataEntry, GenericPoolConfig, ProtocolFamily, TokenTransfer};
    use rust_decimal::Decimal;

    use super::*;

    fn pool() -> GenericPoolConfig {
        GenericPoolConfig::new(
            Address::from("Pool"),
            "Base",
            "Quote",
            Address::from("BaseVault"),
            Address::from("QuoteVault"),
            ProtocolFamily::BondingCurve,
        )
    }

    fn base_tx() -> EnhancedTransaction {
        EnhancedTransaction {
            signature: "sig1".into(),
            slot: 100,
            timestamp: Utc::now(),
            fee: 5000,
            fee_payer: Address::from("Alice"),
            r#type: "SWAP".into(),
            source: "TEST".into(),
            token_transfers: vec![],
            account_data: vec![],
            raw: None,
        }
    }

    /// Scenario 1 (§8): simple swap, polling path.
    #[test]
    fn simple_swap_produces_conserved_changes() {
        let pool = pool();
        let mut tx = base_tx();
        tx.token_transfers = vec![
            TokenTransfer {
                mint: "Base".into(),
                from_user_account: Address::from("BaseVaultOwner"),
                to_user_account: Address::from("Alice"),
                from_token_account: Address::from("BaseVault"),
                to_token_account: Address::from("AliceBaseAta"),
                token_amount: Decimal::new(125, 2),
            },
            TokenTransfer {
                mint: "Quote".into(),
                from_user_account: Address::from("Alice"),
                to_user_account: Address::from("QuoteVaultOwner"),
                from_token_account: Address::from("AliceQuoteAta"),
                to_token_account: Address::from("QuoteVault"),
                token_amount: Decimal::new(5, 1),
            },
        ];

        let outcome = derive(&tx, &pool, None);
        assert!(!outcome.migrated);
        assert_eq!(outcome.changes.len(), 4);

        let alice_base: Decimal = outcome
            .changes
            .iter()
            .filter(|c| c.address == Address::from("Alice") && c.mint == "Base")
            .map(|c| c.amount_change)
            .sum();
        assert_eq!(alice_base, Decimal::new(125, 2));

        let pool_quote: Decimal = outcome
            .changes
            .iter()
            .filter(|c| c.address == Address::from("Pool") && c.mint == "Quote")
            .map(|c| c.amount_change)
            .sum();
        assert_eq!(pool_quote, Decimal::new(5, 1));

        // P3: no emitted change keeps a vault address.
        assert!(!outcome.changes.iter().any(|c| c.address == Address::from("BaseVault")
            || c.address == Address::from("QuoteVault")));
    }

    /// Scenario 2 (§8): unrelated transfer is ignored entirely.
    #[test]
    fn unrelated_transfer_is_ignored() {
        let pool = pool();
        let mut tx = base_tx();
        tx.token_transfers = vec![TokenTransfer {
            mint: "Unrelated".into(),
            from_user_account: Address::from("X"),
            to_user_account: Address::from("Y"),
            from_token_account: Address::from("XAta"),
            to_token_account: Address::from("YAta"),
            token_amount: Decimal::ONE,
        }];

        let outcome = derive(&tx, &pool, None);
        assert!(outcome.changes.is_empty());
    }

    #[test]
    fn native_balance_change_is_rewritten_to_pool_address() {
        let pool = pool();
        let mut tx = base_tx();
        tx.account_data = vec![AccountDataEntry { account: Address::from("BaseVault"), native_balance_change: -1500 }];

        let outcome = derive(&tx, &pool, None);
        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(outcome.changes[0].address, Address::from("Pool"));
        assert_eq!(outcome.changes[0].mint, NATIVE_MINT);
    }

    #[test]
    fn zero_native_delta_is_skipped() {
        let pool = pool();
        let mut tx = base_tx();
        tx.account_data = vec![AccountDataEntry { account: Address::from("BaseVault"), native_balance_change: 0 }];

        assert!(derive(&tx, &pool, None).changes.is_empty());
    }

    /// Scenario 5 (§8): a transfer into the successor's vault flags migration.
    #[test]
    fn funding_transfer_into_successor_vault_is_detected() {
        let pool = pool();
        let successor = GenericPoolConfig::new(
            Address::from("SuccessorPool"),
            "Base",
            "Quote",
            Address::from("SuccessorBaseVault"),
            Address::from("SuccessorQuoteVault"),
            ProtocolFamily::Amm,
        );

        let mut tx = base_tx();
        tx.token_transfers = vec![TokenTransfer {
            mint: "Base".into(),
            from_user_account: Address::from("BaseVaultOwner"),
            to_user_account: Address::from("SuccessorVaultOwner"),
            from_token_account: Address::from("BaseVault"),
            to_token_account: Address::from("SuccessorBaseVault"),
            token_amount: Decimal::new(100, 0),
        }];

        let outcome = derive(&tx, &pool, Some(&successor));
        assert!(outcome.migrated);
    }

    #[test]
    fn derive_is_deterministic() {
        let pool = pool();
        let mut tx = base_tx();
        tx.token_transfers = vec![TokenTransfer {
            mint: "Base".into(),
            from_user_account: Address::from("BaseVaultOwner"),
            to_user_account: Address::from("Alice"),
            from_token_account: Address::from("BaseVault"),
            to_token_account: Address::from("AliceBaseAta"),
            token_amount: Decimal::ONE,
        }];

        let first = derive(&tx, &pool, None);
        let second = derive(&tx, &pool, None);
        assert_eq!(first, second);
    }

    #[test]
    fn live_variant_matches_on_pool_address_equality() {
        let pool = pool();
        let mut tx = base_tx();
        tx.token_transfers = vec![TokenTransfer {
            mint: "Base".into(),
            from_user_account: Address::from("Pool"),
            to_user_account: Address::from("Alice"),
            from_token_account: Address::from("BaseVault"),
            to_token_account: Address::from("AliceBaseAta"),
            token_amount: Decimal::new(3, 0),
        }];

        let changes = derive_live(&tx, &pool);
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.address != Address::from("BaseVault")));
    }
}

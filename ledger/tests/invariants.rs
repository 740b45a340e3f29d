//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify the core consistency properties:
//! - Non-negativity: no committed balance is ever below zero
//! - Rejected withdrawals leave the balance unchanged
//! - Cache-after-commit: the cache always holds the last committed balance

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use tokio::runtime::Runtime;

use walletd_common::{Balance, LedgerError, WalletId};
use walletd_ledger::{
    BalanceCache, LedgerStore, MapBalanceCache, MemoryLedgerStore, WalletService,
};

/// A single ledger operation for the random sweep.
#[derive(Debug, Clone, Copy)]
enum Op {
    Deposit(i64),
    Withdraw(i64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1i64..1_000).prop_map(Op::Deposit),
        (1i64..1_000).prop_map(Op::Withdraw),
    ]
}

proptest! {
    #[test]
    fn committed_balance_never_negative(
        start in 0i64..500,
        ops in proptest::collection::vec(op_strategy(), 1..64),
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let store = MemoryLedgerStore::new();
            let wallet = WalletId::new();
            store.insert_wallet(wallet, start);
            let service = WalletService::new(store.clone(), MapBalanceCache::new());

            // Model the balance alongside the service.
            let mut model: Balance = start;

            for op in ops {
                match op {
                    Op::Deposit(amount) => {
                        let balance = service.deposit(wallet, amount).await.unwrap();
                        model += amount;
                        prop_assert_eq!(balance, model);
                    }
                    Op::Withdraw(amount) => {
                        match service.withdraw(wallet, amount).await {
                            Ok(balance) => {
                                model -= amount;
                                prop_assert_eq!(balance, model);
                            }
                            Err(LedgerError::InsufficientFunds { requested, available }) => {
                                prop_assert_eq!(requested, amount);
                                prop_assert_eq!(available, model);
                                prop_assert!(model - amount < 0);
                            }
                            Err(err) => return Err(TestCaseError::fail(err.to_string())),
                        }
                    }
                }

                let committed = store.get_balance(wallet).await.unwrap();
                prop_assert!(committed >= 0);
                prop_assert_eq!(committed, model);
            }
            Ok(())
        })?;
    }

    #[test]
    fn cache_tracks_last_committed_balance(
        start in 0i64..500,
        ops in proptest::collection::vec(op_strategy(), 1..64),
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let store = MemoryLedgerStore::new();
            let wallet = WalletId::new();
            store.insert_wallet(wallet, start);
            let cache = MapBalanceCache::new();
            let service = WalletService::new(store.clone(), cache);

            for op in ops {
                let result = match op {
                    Op::Deposit(amount) => service.deposit(wallet, amount).await,
                    Op::Withdraw(amount) => service.withdraw(wallet, amount).await,
                };

                let committed = store.get_balance(wallet).await.unwrap();
                match result {
                    // A successful mutation refreshes the cache with the
                    // committed value.
                    Ok(balance) => {
                        prop_assert_eq!(balance, committed);
                        prop_assert_eq!(
                            service.get_balance(wallet).await.unwrap(),
                            committed
                        );
                    }
                    // A rejected one leaves the prior entry (or miss) behind.
                    Err(LedgerError::InsufficientFunds { .. }) => {
                        prop_assert_eq!(
                            service.get_balance(wallet).await.unwrap(),
                            committed
                        );
                    }
                    Err(err) => return Err(TestCaseError::fail(err.to_string())),
                }
            }
            Ok(())
        })?;
    }
}

#[tokio::test]
async fn cache_aside_on_miss() {
    let store = MemoryLedgerStore::new();
    let wallet = WalletId::new();
    store.insert_wallet(wallet, 12345);

    let cache = std::sync::Arc::new(MapBalanceCache::new());
    let service = WalletService::new(store, cache.clone());

    assert_eq!(service.get_balance(wallet).await.unwrap(), 12345);
    // The miss populated the cache itself, not just the response.
    assert_eq!(cache.get(&wallet.cache_key()), Some(12345));
}

#[tokio::test]
async fn concurrent_deposits_do_not_lose_updates() {
    let store = MemoryLedgerStore::new();
    let wallet = WalletId::new();
    store.insert_wallet(wallet, 0);
    let service = std::sync::Arc::new(WalletService::new(store.clone(), MapBalanceCache::new()));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = service.clone();
        handles.push(tokio::spawn(
            async move { service.deposit(wallet, 50).await },
        ));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.get_balance(wallet).await.unwrap(), 16 * 50);
}

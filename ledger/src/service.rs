//! Wallet ledger service.
//!
//! Orchestrates one logical operation (deposit, withdraw, balance read)
//! across the store and the cache. Mutations follow a strict order: mutate
//! inside a repeatable-read store transaction, commit, then refresh the
//! cache with the committed value. The cache is never written before a
//! commit, so no reader can observe a balance the store could still roll
//! back.

use tracing::{debug, info, instrument, warn};

use walletd_common::{Amount, Balance, LedgerError, Result, WalletId};

use crate::cache::BalanceCache;
use crate::store::{IsolationLevel, LedgerStore, LedgerTx};

/// The wallet ledger service. Generic over the injected store and cache
/// capabilities; no in-process lock serializes operations, so two
/// operations on different wallets proceed fully in parallel and
/// same-wallet mutations are ordered by store transaction isolation alone.
pub struct WalletService<S, C> {
    store: S,
    cache: C,
}

impl<S, C> WalletService<S, C>
where
    S: LedgerStore,
    C: BalanceCache,
{
    /// Create a new wallet service.
    pub fn new(store: S, cache: C) -> Self {
        Self { store, cache }
    }

    /// Deposit `amount` into the wallet, returning the committed balance.
    ///
    /// `amount` is validated as positive at the request boundary; the
    /// service forwards it unchanged.
    #[instrument(skip(self))]
    pub async fn deposit(&self, wallet_id: WalletId, amount: Amount) -> Result<Balance> {
        let mut tx = self.store.begin(IsolationLevel::RepeatableRead).await?;

        let balance = tx.deposit(wallet_id, amount).await?;
        tx.commit().await?;

        self.cache.set(&wallet_id.cache_key(), balance);

        info!(wallet = %wallet_id, amount, balance, "deposit committed");
        Ok(balance)
    }

    /// Withdraw `amount` from the wallet, returning the committed balance.
    ///
    /// The tentative balance is inspected inside the same transaction that
    /// computed it; a negative result is rolled back and reported as
    /// insufficient funds, so the debit never commits.
    #[instrument(skip(self))]
    pub async fn withdraw(&self, wallet_id: WalletId, amount: Amount) -> Result<Balance> {
        let mut tx = self.store.begin(IsolationLevel::RepeatableRead).await?;

        let balance = tx.withdraw(wallet_id, amount).await?;
        if balance < 0 {
            if let Err(err) = tx.rollback().await {
                warn!(wallet = %wallet_id, error = %err, "rollback failed");
            }
            debug!(wallet = %wallet_id, amount, "withdrawal rejected");
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available: balance + amount,
            });
        }
        tx.commit().await?;

        self.cache.set(&wallet_id.cache_key(), balance);

        info!(wallet = %wallet_id, amount, balance, "withdrawal committed");
        Ok(balance)
    }

    /// Read the wallet's balance, serving from the cache when possible.
    ///
    /// A miss falls through to a plain store read and repopulates the
    /// cache. A wallet absent from the store propagates as not-found and is
    /// never cached.
    #[instrument(skip(self))]
    pub async fn get_balance(&self, wallet_id: WalletId) -> Result<Balance> {
        let key = wallet_id.cache_key();
        if let Some(balance) = self.cache.get(&key) {
            return Ok(balance);
        }

        let balance = self.store.get_balance(wallet_id).await?;
        self.cache.set(&key, balance);

        debug!(wallet = %wallet_id, balance, "balance read through to store");
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MapBalanceCache;
    use crate::memory::MemoryLedgerStore;
    use std::sync::Arc;

    fn service_with_wallet(
        balance: Balance,
    ) -> (
        WalletService<MemoryLedgerStore, MapBalanceCache>,
        MemoryLedgerStore,
        WalletId,
    ) {
        let store = MemoryLedgerStore::new();
        let wallet = WalletId::new();
        store.insert_wallet(wallet, balance);
        let service = WalletService::new(store.clone(), MapBalanceCache::new());
        (service, store, wallet)
    }

    #[tokio::test]
    async fn test_deposit_commits_then_caches() {
        let (service, store, wallet) = service_with_wallet(100);

        let balance = service.deposit(wallet, 50).await.unwrap();

        assert_eq!(balance, 150);
        assert_eq!(store.get_balance(wallet).await.unwrap(), 150);
        assert_eq!(service.cache.get(&wallet.cache_key()), Some(150));
    }

    #[tokio::test]
    async fn test_deposit_failure_leaves_cache_untouched() {
        let (service, store, wallet) = service_with_wallet(100);
        store.set_fail_ops(true);

        let err = service.deposit(wallet, 50).await.unwrap_err();

        assert!(matches!(err, LedgerError::Storage(_)));
        assert_eq!(service.cache.get(&wallet.cache_key()), None);
    }

    #[tokio::test]
    async fn test_deposit_commit_failure_rolls_back() {
        let (service, store, wallet) = service_with_wallet(100);
        store.set_fail_commits(true);

        let err = service.deposit(wallet, 50).await.unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));

        store.set_fail_commits(false);
        assert_eq!(store.get_balance(wallet).await.unwrap(), 100);
        assert_eq!(service.cache.get(&wallet.cache_key()), None);
    }

    #[tokio::test]
    async fn test_withdraw_round_trip() {
        let (service, store, wallet) = service_with_wallet(900);

        assert_eq!(service.deposit(wallet, 100).await.unwrap(), 1000);
        assert_eq!(service.withdraw(wallet, 30).await.unwrap(), 970);

        let err = service.withdraw(wallet, 10000).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientFunds {
                requested: 10000,
                available: 970,
            }
        ));

        // The rejected debit never reached the store or the cache.
        assert_eq!(store.get_balance(wallet).await.unwrap(), 970);
        assert_eq!(service.cache.get(&wallet.cache_key()), Some(970));
    }

    #[tokio::test]
    async fn test_withdraw_insufficient_funds_is_clean_abort() {
        let (service, store, wallet) = service_with_wallet(10);

        let err = service.withdraw(wallet, 50).await.unwrap_err();

        assert!(matches!(
            err,
            LedgerError::InsufficientFunds {
                requested: 50,
                available: 10,
            }
        ));
        assert_eq!(store.get_balance(wallet).await.unwrap(), 10);
        assert_eq!(service.cache.get(&wallet.cache_key()), None);
    }

    #[tokio::test]
    async fn test_withdraw_to_exactly_zero_commits() {
        let (service, store, wallet) = service_with_wallet(50);

        assert_eq!(service.withdraw(wallet, 50).await.unwrap(), 0);
        assert_eq!(store.get_balance(wallet).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_balance_cache_hit_skips_store() {
        let (service, store, wallet) = service_with_wallet(300);

        service.cache.set(&wallet.cache_key(), 500);
        // A store access would fail; a cache hit never reaches it.
        store.set_fail_ops(true);

        assert_eq!(service.get_balance(wallet).await.unwrap(), 500);
    }

    #[tokio::test]
    async fn test_get_balance_miss_populates_cache() {
        let (service, _store, wallet) = service_with_wallet(300);

        assert_eq!(service.get_balance(wallet).await.unwrap(), 300);
        assert_eq!(service.cache.get(&wallet.cache_key()), Some(300));
    }

    #[tokio::test]
    async fn test_get_balance_unknown_wallet_never_cached() {
        let store = MemoryLedgerStore::new();
        let service = WalletService::new(store, MapBalanceCache::new());
        let wallet = WalletId::new();

        for _ in 0..3 {
            let err = service.get_balance(wallet).await.unwrap_err();
            assert!(matches!(err, LedgerError::WalletNotFound(id) if id == wallet));
        }
        assert!(service.cache.is_empty());
    }

    #[tokio::test]
    async fn test_deposit_unknown_wallet() {
        let store = MemoryLedgerStore::new();
        let service = WalletService::new(store, MapBalanceCache::new());
        let wallet = WalletId::new();

        let err = service.deposit(wallet, 100).await.unwrap_err();
        assert!(matches!(err, LedgerError::WalletNotFound(id) if id == wallet));
    }

    #[tokio::test]
    async fn test_concurrent_same_wallet_deposits() {
        let (service, store, wallet) = service_with_wallet(0);
        let service = Arc::new(service);

        let a = tokio::spawn({
            let service = service.clone();
            async move { service.deposit(wallet, 50).await }
        });
        let b = tokio::spawn({
            let service = service.clone();
            async move { service.deposit(wallet, 50).await }
        });

        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        // No lost update, whichever transaction committed first.
        assert_eq!(store.get_balance(wallet).await.unwrap(), 100);
    }
}

//! In-memory ledger store for tests and local development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use walletd_common::{Amount, Balance, LedgerError, Result, WalletId};

use crate::store::{IsolationLevel, LedgerStore, LedgerTx};

/// In-process implementation of the transactional store contract.
///
/// Deltas are applied under one mutex in call order and compensated on
/// rollback, so concurrent same-wallet writers serialize exactly as they
/// would on a database row lock and no update is ever lost. Storage
/// failures can be injected to exercise the service's error paths.
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    balances: Mutex<HashMap<WalletId, Balance>>,
    fail_ops: AtomicBool,
    fail_commits: AtomicBool,
}

impl Inner {
    fn apply(&self, wallet_id: WalletId, delta: Amount) -> Result<Balance> {
        let mut balances = self.balances.lock();
        match balances.get_mut(&wallet_id) {
            Some(balance) => {
                *balance += delta;
                Ok(*balance)
            }
            None => Err(LedgerError::WalletNotFound(wallet_id)),
        }
    }
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a wallet row. Wallets are provisioned externally in production;
    /// tests create them here.
    pub fn insert_wallet(&self, wallet_id: WalletId, balance: Balance) {
        self.inner.balances.lock().insert(wallet_id, balance);
    }

    /// Make begin/mutate/read operations fail until cleared.
    pub fn set_fail_ops(&self, fail: bool) {
        self.inner.fail_ops.store(fail, Ordering::SeqCst);
    }

    /// Make commits fail until cleared. The failed transaction's deltas are
    /// compensated, as a real rollback would.
    pub fn set_fail_commits(&self, fail: bool) {
        self.inner.fail_commits.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    type Tx = MemoryLedgerTx;

    async fn begin(&self, _isolation: IsolationLevel) -> Result<MemoryLedgerTx> {
        if self.inner.fail_ops.load(Ordering::SeqCst) {
            return Err(LedgerError::storage("injected begin failure"));
        }
        Ok(MemoryLedgerTx {
            store: self.inner.clone(),
            undo: Vec::new(),
            done: false,
        })
    }

    async fn get_balance(&self, wallet_id: WalletId) -> Result<Balance> {
        if self.inner.fail_ops.load(Ordering::SeqCst) {
            return Err(LedgerError::storage("injected read failure"));
        }
        let balances = self.inner.balances.lock();
        balances
            .get(&wallet_id)
            .copied()
            .ok_or(LedgerError::WalletNotFound(wallet_id))
    }
}

/// An open in-memory transaction. Rolls back on drop unless committed.
pub struct MemoryLedgerTx {
    store: Arc<Inner>,
    undo: Vec<(WalletId, Amount)>,
    done: bool,
}

impl MemoryLedgerTx {
    fn update_balance(&mut self, wallet_id: WalletId, delta: Amount) -> Result<Balance> {
        if self.store.fail_ops.load(Ordering::SeqCst) {
            return Err(LedgerError::storage("injected update failure"));
        }
        let balance = self.store.apply(wallet_id, delta)?;
        self.undo.push((wallet_id, -delta));
        Ok(balance)
    }

    fn compensate(&mut self) {
        while let Some((wallet_id, delta)) = self.undo.pop() {
            let _ = self.store.apply(wallet_id, delta);
        }
        self.done = true;
    }
}

#[async_trait]
impl LedgerTx for MemoryLedgerTx {
    async fn deposit(&mut self, wallet_id: WalletId, amount: Amount) -> Result<Balance> {
        self.update_balance(wallet_id, amount)
    }

    async fn withdraw(&mut self, wallet_id: WalletId, amount: Amount) -> Result<Balance> {
        self.update_balance(wallet_id, -amount)
    }

    async fn commit(mut self) -> Result<()> {
        if self.store.fail_commits.load(Ordering::SeqCst) {
            // Leave `done` unset; the drop guard compensates.
            return Err(LedgerError::storage("injected commit failure"));
        }
        self.undo.clear();
        self.done = true;
        Ok(())
    }

    async fn rollback(mut self) -> Result<()> {
        self.compensate();
        Ok(())
    }
}

impl Drop for MemoryLedgerTx {
    fn drop(&mut self) {
        if !self.done {
            self.compensate();
        }
    }
}

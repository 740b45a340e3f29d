//! Durable balance storage with atomic, isolated read-modify-write.
//!
//! The store's job is limited to atomic arithmetic on one balance row per
//! wallet. Business policy, such as rejecting a negative result, belongs to
//! the service layer.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Row};
use tracing::debug;

use walletd_common::{Amount, Balance, LedgerError, Result, WalletId};

/// Transaction isolation level for balance mutations.
///
/// The chosen level must guarantee that two concurrent transactions
/// mutating the same wallet cannot both read the pre-mutation balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    /// The statement that sets this level for the current transaction.
    pub fn set_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => {
                "SET TRANSACTION ISOLATION LEVEL READ COMMITTED"
            }
            IsolationLevel::RepeatableRead => {
                "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ"
            }
            IsolationLevel::Serializable => {
                "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE"
            }
        }
    }
}

/// A unit of work against the ledger store.
///
/// Dropping an uncommitted transaction rolls it back, so every exit path
/// releases the transaction without explicit cleanup. `commit` consumes the
/// transaction and defuses that guard.
#[async_trait]
pub trait LedgerTx: Send {
    /// Apply `balance += amount` atomically, returning the updated balance.
    async fn deposit(&mut self, wallet_id: WalletId, amount: Amount) -> Result<Balance>;

    /// Apply `balance -= amount` atomically, returning the updated balance.
    ///
    /// A negative result is returned, not rejected; the service inspects it
    /// before deciding to commit.
    async fn withdraw(&mut self, wallet_id: WalletId, amount: Amount) -> Result<Balance>;

    /// Commit the transaction, making its mutations durable.
    async fn commit(self) -> Result<()>;

    /// Roll the transaction back, discarding its mutations.
    async fn rollback(self) -> Result<()>;
}

/// Durable, transactional storage of one balance per wallet; the source of
/// truth the cache is reconciled against.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    type Tx: LedgerTx;

    /// Begin a transaction at the given isolation level.
    async fn begin(&self, isolation: IsolationLevel) -> Result<Self::Tx>;

    /// Read the current balance outside any transaction.
    async fn get_balance(&self, wallet_id: WalletId) -> Result<Balance>;
}

const UPDATE_BALANCE: &str =
    "UPDATE wallets SET balance = balance + $1 WHERE id = $2 RETURNING balance";

const SELECT_BALANCE: &str = "SELECT balance FROM wallets WHERE id = $1";

/// Wallet rows are provisioned externally; the schema exists for tests and
/// local bootstrap.
const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS wallets (
    id UUID PRIMARY KEY,
    balance BIGINT NOT NULL DEFAULT 0
)";

/// Postgres-backed ledger store.
///
/// The balance mutation is a single `UPDATE ... RETURNING` statement, so the
/// read-modify-write is one round trip that serializes same-wallet writers
/// on the row lock.
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    /// Create a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to Postgres at the given URL.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(LedgerError::storage)?;
        Ok(Self::new(pool))
    }

    /// Create the wallets table if it does not exist.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(LedgerError::storage)?;
        Ok(())
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    type Tx = PgLedgerTx;

    async fn begin(&self, isolation: IsolationLevel) -> Result<PgLedgerTx> {
        let mut tx = self.pool.begin().await.map_err(LedgerError::storage)?;
        sqlx::query(isolation.set_sql())
            .execute(&mut *tx)
            .await
            .map_err(LedgerError::storage)?;
        debug!(isolation = ?isolation, "transaction started");
        Ok(PgLedgerTx { tx })
    }

    async fn get_balance(&self, wallet_id: WalletId) -> Result<Balance> {
        let row = sqlx::query(SELECT_BALANCE)
            .bind(*wallet_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(LedgerError::storage)?;

        match row {
            Some(row) => row.try_get("balance").map_err(LedgerError::storage),
            None => Err(LedgerError::WalletNotFound(wallet_id)),
        }
    }
}

/// An open Postgres transaction. Rolls back on drop unless committed.
pub struct PgLedgerTx {
    tx: sqlx::Transaction<'static, Postgres>,
}

impl PgLedgerTx {
    /// Deposit and withdraw share one signed-delta update primitive.
    async fn update_balance(&mut self, wallet_id: WalletId, delta: Amount) -> Result<Balance> {
        let row = sqlx::query(UPDATE_BALANCE)
            .bind(delta)
            .bind(*wallet_id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(LedgerError::storage)?;

        match row {
            Some(row) => row.try_get("balance").map_err(LedgerError::storage),
            None => Err(LedgerError::WalletNotFound(wallet_id)),
        }
    }
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn deposit(&mut self, wallet_id: WalletId, amount: Amount) -> Result<Balance> {
        self.update_balance(wallet_id, amount).await
    }

    async fn withdraw(&mut self, wallet_id: WalletId, amount: Amount) -> Result<Balance> {
        self.update_balance(wallet_id, -amount).await
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await.map_err(LedgerError::storage)
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await.map_err(LedgerError::storage)
    }
}

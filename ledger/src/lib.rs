//! walletd Ledger Core
//!
//! The consistency core of the wallet ledger: a durable transactional
//! balance store, an advisory in-memory balance cache, and the service that
//! binds the two with a strict commit-then-cache ordering.

pub mod cache;
pub mod memory;
pub mod service;
pub mod store;

pub use cache::{BalanceCache, LruBalanceCache, MapBalanceCache};
pub use memory::MemoryLedgerStore;
pub use service::WalletService;
pub use store::{IsolationLevel, LedgerStore, LedgerTx, PgLedgerStore};

//! Metrics collection for ledger operation monitoring.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Ledger operation metrics.
pub struct Metrics {
    /// Deposits committed.
    pub deposits_total: AtomicU64,
    /// Deposits failed on storage.
    pub deposits_failed: AtomicU64,
    /// Withdrawals committed.
    pub withdrawals_total: AtomicU64,
    /// Withdrawals rejected for insufficient funds.
    pub withdrawals_rejected: AtomicU64,
    /// Withdrawals failed on storage.
    pub withdrawals_failed: AtomicU64,
    /// Balance reads served.
    pub balance_reads_total: AtomicU64,
    /// Balance reads failed.
    pub balance_reads_failed: AtomicU64,
    /// Requests naming a wallet with no matching row.
    pub wallets_not_found: AtomicU64,
    /// Requests rejected before reaching the ledger.
    pub requests_invalid: AtomicU64,
}

impl Metrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self {
            deposits_total: AtomicU64::new(0),
            deposits_failed: AtomicU64::new(0),
            withdrawals_total: AtomicU64::new(0),
            withdrawals_rejected: AtomicU64::new(0),
            withdrawals_failed: AtomicU64::new(0),
            balance_reads_total: AtomicU64::new(0),
            balance_reads_failed: AtomicU64::new(0),
            wallets_not_found: AtomicU64::new(0),
            requests_invalid: AtomicU64::new(0),
        }
    }

    /// Record a committed deposit.
    pub fn deposit_ok(&self) {
        self.deposits_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed deposit.
    pub fn deposit_failed(&self) {
        self.deposits_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a committed withdrawal.
    pub fn withdrawal_ok(&self) {
        self.withdrawals_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a withdrawal rejected for insufficient funds.
    pub fn withdrawal_rejected(&self) {
        self.withdrawals_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed withdrawal.
    pub fn withdrawal_failed(&self) {
        self.withdrawals_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a served balance read.
    pub fn balance_read_ok(&self) {
        self.balance_reads_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed balance read.
    pub fn balance_read_failed(&self) {
        self.balance_reads_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request naming an unknown wallet.
    pub fn wallet_not_found(&self) {
        self.wallets_not_found.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request rejected at the boundary.
    pub fn request_invalid(&self) {
        self.requests_invalid.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            deposits_total: self.deposits_total.load(Ordering::Relaxed),
            deposits_failed: self.deposits_failed.load(Ordering::Relaxed),
            withdrawals_total: self.withdrawals_total.load(Ordering::Relaxed),
            withdrawals_rejected: self.withdrawals_rejected.load(Ordering::Relaxed),
            withdrawals_failed: self.withdrawals_failed.load(Ordering::Relaxed),
            balance_reads_total: self.balance_reads_total.load(Ordering::Relaxed),
            balance_reads_failed: self.balance_reads_failed.load(Ordering::Relaxed),
            wallets_not_found: self.wallets_not_found.load(Ordering::Relaxed),
            requests_invalid: self.requests_invalid.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            r#"# HELP walletd_deposits_total Total committed deposits
# TYPE walletd_deposits_total counter
walletd_deposits_total {}

# HELP walletd_deposits_failed Total failed deposits
# TYPE walletd_deposits_failed counter
walletd_deposits_failed {}

# HELP walletd_withdrawals_total Total committed withdrawals
# TYPE walletd_withdrawals_total counter
walletd_withdrawals_total {}

# HELP walletd_withdrawals_rejected Total withdrawals rejected for insufficient funds
# TYPE walletd_withdrawals_rejected counter
walletd_withdrawals_rejected {}

# HELP walletd_withdrawals_failed Total failed withdrawals
# TYPE walletd_withdrawals_failed counter
walletd_withdrawals_failed {}

# HELP walletd_balance_reads_total Total served balance reads
# TYPE walletd_balance_reads_total counter
walletd_balance_reads_total {}

# HELP walletd_balance_reads_failed Total failed balance reads
# TYPE walletd_balance_reads_failed counter
walletd_balance_reads_failed {}

# HELP walletd_wallets_not_found Total requests naming an unknown wallet
# TYPE walletd_wallets_not_found counter
walletd_wallets_not_found {}

# HELP walletd_requests_invalid Total requests rejected at the boundary
# TYPE walletd_requests_invalid counter
walletd_requests_invalid {}
"#,
            snapshot.deposits_total,
            snapshot.deposits_failed,
            snapshot.withdrawals_total,
            snapshot.withdrawals_rejected,
            snapshot.withdrawals_failed,
            snapshot.balance_reads_total,
            snapshot.balance_reads_failed,
            snapshot.wallets_not_found,
            snapshot.requests_invalid,
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub deposits_total: u64,
    pub deposits_failed: u64,
    pub withdrawals_total: u64,
    pub withdrawals_rejected: u64,
    pub withdrawals_failed: u64,
    pub balance_reads_total: u64,
    pub balance_reads_failed: u64,
    pub wallets_not_found: u64,
    pub requests_invalid: u64,
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<Metrics>;

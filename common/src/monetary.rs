//! Monetary units for wallet balances.
//!
//! All amounts are signed 64-bit integers denominated in the smallest
//! currency unit. There is no multi-currency support; the unit is fixed by
//! deployment.

/// An operation amount in the smallest currency unit. Always positive by the
/// time it reaches the ledger core; validated at the request boundary.
pub type Amount = i64;

/// A wallet balance in the smallest currency unit. Non-negative in the store
/// after any committed mutation.
pub type Balance = i64;

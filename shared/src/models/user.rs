//! User Model

use serde::{Deserialize, Serialize};

/// User role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[default]
    Student,
    Cook,
    Manager,
}

/// User entity (wallet + loyalty)
///
/// `balance` and `points` are mutated only through the wallet ledger's
/// atomic adjustment path; there is no fetch-then-save API for money.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: UserRole,
    /// Wallet balance in integer currency units, never negative
    pub balance: i64,
    /// Loyalty points, monotonically non-decreasing
    pub points: i64,
    pub created_at: i64,
}

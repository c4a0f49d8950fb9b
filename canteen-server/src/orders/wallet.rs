//! Wallet ledger
//!
//! The only path that mutates `balance` or `points`. The adjustment is
//! a read+write inside the caller's write transaction; redb's
//! single-writer model makes it atomic against concurrent debits and
//! credits, and an error here aborts the whole command (no order or
//! ledger change survives a failed wallet movement).

use crate::orders::storage::{OrderStorage, StorageError};
use redb::WriteTransaction;
use shared::models::User;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Insufficient balance for user {user_id}: have {available}, need {required}")]
    InsufficientBalance {
        user_id: String,
        available: i64,
        required: i64,
    },

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for WalletError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::UserNotFound(id) => WalletError::UserNotFound(id),
            other => WalletError::Storage(other),
        }
    }
}

/// Apply a balance/points delta to a user (within transaction)
///
/// Debits that would push the balance below zero are rejected; points
/// deltas are never negative in practice (loyalty only accrues).
/// Returns the post-adjustment record.
pub fn adjust(
    storage: &OrderStorage,
    txn: &WriteTransaction,
    user_id: &str,
    delta_balance: i64,
    delta_points: i64,
) -> Result<User, WalletError> {
    let mut user = storage.load_user(txn, user_id)?;

    let new_balance = user.balance + delta_balance;
    if new_balance < 0 {
        return Err(WalletError::InsufficientBalance {
            user_id: user_id.to_string(),
            available: user.balance,
            required: -delta_balance,
        });
    }

    user.balance = new_balance;
    user.points += delta_points;
    storage.store_user(txn, &user)?;

    tracing::debug!(
        user_id = %user_id,
        delta_balance,
        delta_points,
        balance = user.balance,
        "Wallet adjusted"
    );

    Ok(user)
}

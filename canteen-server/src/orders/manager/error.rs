use crate::orders::flash_sale::FlashSaleError;
use crate::orders::storage::StorageError;
use crate::orders::transition::TransitionError;
use crate::orders::wallet::WalletError;
use shared::order::{CommandError, CommandErrorCode, OrderStatus};
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Flash sale not found: {0}")]
    FlashSaleNotFound(String),

    #[error("Flash sale already claimed or expired: {0}")]
    RescueAlreadyClaimed(String),

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Insufficient balance: have {available}, need {required}")]
    InsufficientBalance { available: i64, required: i64 },

    #[error("Refund already issued for order {0}")]
    RefundAlreadyIssued(String),

    #[error("Refund request already resolved for order {0}")]
    RefundAlreadyResolved(String),

    #[error("Feedback already submitted for order {0}")]
    FeedbackAlreadySubmitted(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<WalletError> for ManagerError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::UserNotFound(id) => ManagerError::UserNotFound(id),
            WalletError::InsufficientBalance {
                available,
                required,
                ..
            } => ManagerError::InsufficientBalance {
                available,
                required,
            },
            WalletError::Storage(e) => ManagerError::Storage(e),
        }
    }
}

impl From<FlashSaleError> for ManagerError {
    fn from(err: FlashSaleError) -> Self {
        match err {
            FlashSaleError::AlreadyClaimed(id) => ManagerError::RescueAlreadyClaimed(id),
            FlashSaleError::ListingExists(id) => {
                ManagerError::Internal(format!("duplicate rescue listing for order {}", id))
            }
            FlashSaleError::Storage(e) => ManagerError::Storage(e),
        }
    }
}

impl From<TransitionError> for ManagerError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::Invalid { from, to } => ManagerError::InvalidTransition { from, to },
            TransitionError::SystemAssigned(status) => ManagerError::Validation(format!(
                "status {} cannot be requested directly",
                status
            )),
            TransitionError::MissingRejectionReason => {
                ManagerError::Validation("rejection requires a reason".to_string())
            }
        }
    }
}

/// Classify a storage error into a wire-level code (clients localize)
fn classify_storage_error(e: &StorageError) -> CommandErrorCode {
    match e {
        StorageError::Serialization(_) => return CommandErrorCode::InternalError,
        StorageError::OrderNotFound(_) => return CommandErrorCode::OrderNotFound,
        StorageError::UserNotFound(_) => return CommandErrorCode::UserNotFound,
        StorageError::FlashSaleNotFound(_) => return CommandErrorCode::FlashSaleNotFound,
        _ => {}
    }

    // redb errors classified by message
    let err_str = e.to_string().to_lowercase();

    if err_str.contains("no space") || err_str.contains("disk full") || err_str.contains("enospc")
    {
        return CommandErrorCode::StorageFull;
    }

    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return CommandErrorCode::StorageCorrupted;
    }

    CommandErrorCode::SystemBusy
}

impl From<ManagerError> for CommandError {
    fn from(err: ManagerError) -> Self {
        let (code, message) = match err {
            ManagerError::Storage(e) => {
                let code = classify_storage_error(&e);
                let message = e.to_string();
                tracing::error!(error = %e, error_code = ?code, "Storage error occurred");
                (code, message)
            }
            ManagerError::OrderNotFound(id) => (
                CommandErrorCode::OrderNotFound,
                format!("Order not found: {}", id),
            ),
            ManagerError::UserNotFound(id) => (
                CommandErrorCode::UserNotFound,
                format!("User not found: {}", id),
            ),
            ManagerError::FlashSaleNotFound(id) => (
                CommandErrorCode::FlashSaleNotFound,
                format!("Flash sale not found: {}", id),
            ),
            ManagerError::RescueAlreadyClaimed(id) => (
                CommandErrorCode::RescueAlreadyClaimed,
                format!("Rescue already claimed by someone else: {}", id),
            ),
            ManagerError::InvalidTransition { from, to } => (
                CommandErrorCode::InvalidTransition,
                format!("Invalid transition: {} -> {}", from, to),
            ),
            ManagerError::Validation(msg) => (CommandErrorCode::ValidationFailed, msg),
            ManagerError::InsufficientBalance {
                available,
                required,
            } => (
                CommandErrorCode::InsufficientBalance,
                format!("Insufficient balance: have {}, need {}", available, required),
            ),
            ManagerError::RefundAlreadyIssued(id) => (
                CommandErrorCode::RefundAlreadyIssued,
                format!("Refund already issued for order {}", id),
            ),
            ManagerError::RefundAlreadyResolved(id) => (
                CommandErrorCode::RefundAlreadyResolved,
                format!("Refund request already resolved for order {}", id),
            ),
            ManagerError::FeedbackAlreadySubmitted(id) => (
                CommandErrorCode::FeedbackAlreadySubmitted,
                format!("Feedback already submitted for order {}", id),
            ),
            ManagerError::Internal(msg) => (CommandErrorCode::InternalError, msg),
        };
        CommandError::new(code, message)
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;

//! Command responses and error codes

use serde::{Deserialize, Serialize};

/// Command response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// The command ID this responds to
    pub command_id: String,
    /// Whether the command succeeded
    pub success: bool,
    /// Order this command created or mutated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Error details if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
}

impl CommandResponse {
    pub fn success(command_id: String, order_id: Option<String>) -> Self {
        Self {
            command_id,
            success: true,
            order_id,
            error: None,
        }
    }

    pub fn error(command_id: String, error: CommandError) -> Self {
        Self {
            command_id,
            success: false,
            order_id: None,
            error: Some(error),
        }
    }

    /// A replayed command: reported as success with no new effects
    pub fn duplicate(command_id: String) -> Self {
        Self {
            command_id,
            success: true,
            order_id: None,
            error: None,
        }
    }
}

/// Command error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandError {
    pub code: CommandErrorCode,
    pub message: String,
}

impl CommandError {
    pub fn new(code: CommandErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Command error codes (clients localize; messages are diagnostic)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandErrorCode {
    OrderNotFound,
    UserNotFound,
    FlashSaleNotFound,
    /// Listing already sold or expired when a rescue order tried to claim it
    RescueAlreadyClaimed,
    /// Requested status is not reachable from the order's current status
    InvalidTransition,
    ValidationFailed,
    InsufficientBalance,
    /// Manual refund blocked because money already moved for this order
    RefundAlreadyIssued,
    RefundAlreadyResolved,
    FeedbackAlreadySubmitted,
    DuplicateCommand,
    InternalError,
    // Storage errors
    StorageFull,
    StorageCorrupted,
    SystemBusy,
}

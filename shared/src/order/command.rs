//! Order commands - requests from clients to change order state

use super::record::{OrderItem, OrderStatus, PaymentMethod};
use serde::{Deserialize, Serialize};

/// New order draft as submitted by a client
///
/// `total_amount` and `token` are computed server-side; the draft only
/// carries what the client chooses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDraft {
    pub user_id: String,
    pub branch: String,
    pub items: Vec<OrderItem>,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<i64>,
    /// Present when this order claims a rescue listing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash_sale_id: Option<String>,
}

/// Command envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCommand {
    /// Client-generated unique ID, used for duplicate detection
    pub command_id: String,
    /// User who issued the command (student, cook or manager)
    pub actor_id: String,
    /// Client timestamp (Unix millis), for audit
    pub timestamp: i64,
    pub payload: OrderCommandPayload,
}

impl OrderCommand {
    pub fn new(actor_id: impl Into<String>, payload: OrderCommandPayload) -> Self {
        Self {
            command_id: uuid::Uuid::new_v4().to_string(),
            actor_id: actor_id.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            payload,
        }
    }
}

/// Command payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderCommandPayload {
    /// Place a new order, optionally claiming a flash sale
    PlaceOrder { draft: OrderDraft },

    /// Request a status transition (kitchen progression, cancellation,
    /// rejection). `AwaitingRescue` and `Rescued` cannot be requested.
    UpdateStatus {
        order_id: String,
        status: OrderStatus,
        /// Required when `status` is `Rejected`
        #[serde(skip_serializing_if = "Option::is_none")]
        rejection_reason: Option<String>,
    },

    /// Student opens a refund request on their order
    RequestRefund { order_id: String, reason: String },

    /// Manager adjudicates a pending refund request
    ResolveRefund {
        order_id: String,
        approve: bool,
        /// Override amount; defaults to the request's amount, then to
        /// the order total
        #[serde(skip_serializing_if = "Option::is_none")]
        refund_amount: Option<i64>,
    },

    /// Attach feedback (once per order)
    SubmitFeedback {
        order_id: String,
        rating: u8,
        #[serde(skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
    },
}

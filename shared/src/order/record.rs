//! Persisted order state

use serde::{Deserialize, Serialize};

/// Order lifecycle status
///
/// `AwaitingRescue` and `Rescued` are produced only by the state
/// machine itself (cancellation interception and rescue claims); they
/// can never be requested directly through a status update.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Placed,
    Preparing,
    Ready,
    PickedUp,
    Completed,
    Cancelled,
    Rejected,
    AwaitingRescue,
    Rescued,
}

impl OrderStatus {
    /// Terminal for refund and ledger side effects (feedback may still
    /// be attached post-terminal)
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Completed
                | OrderStatus::Cancelled
                | OrderStatus::Rejected
                | OrderStatus::PickedUp
                | OrderStatus::Rescued
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Placed => "PLACED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::PickedUp => "PICKED_UP",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Rejected => "REJECTED",
            OrderStatus::AwaitingRescue => "AWAITING_RESCUE",
            OrderStatus::Rescued => "RESCUED",
        };
        write!(f, "{}", s)
    }
}

/// Payment method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Settled externally, no wallet movement at placement
    #[default]
    Upi,
    /// Debited from the user wallet at placement
    Wallet,
}

/// Order line item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderItem {
    /// Menu item reference
    pub id: String,
    pub name: String,
    /// Unit price in integer currency units
    pub price: i64,
    pub quantity: i64,
    pub is_refundable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl OrderItem {
    pub fn line_total(&self) -> i64 {
        self.price * self.quantity
    }
}

/// Refund request status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Refund request attached to an order, resolved exactly once
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefundRequest {
    pub status: RefundStatus,
    pub reason: String,
    pub requested_at: i64,
    /// Amount to credit on approval; falls back to the order's
    /// `total_amount` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<i64>,
}

/// Feedback, settable once at any point after the order exists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Feedback {
    /// 1-5
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub submitted_at: i64,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    pub id: String,
    /// Human-facing short code, unique, server-generated
    pub token: String,
    pub user_id: String,
    pub branch: String,
    pub items: Vec<OrderItem>,
    /// Sum of line totals at creation time, never recomputed
    pub total_amount: i64,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    /// Unix millis, immutable; the ledger month is always derived from
    /// this field
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_request: Option<RefundRequest>,
    /// Set only when the order is rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl Order {
    /// Sum of line totals over refundable items
    pub fn refundable_subtotal(&self) -> i64 {
        self.items
            .iter()
            .filter(|i| i.is_refundable)
            .map(OrderItem::line_total)
            .sum()
    }

    /// Sum of line totals over non-refundable items
    pub fn non_refundable_subtotal(&self) -> i64 {
        self.items
            .iter()
            .filter(|i| !i.is_refundable)
            .map(OrderItem::line_total)
            .sum()
    }

    /// Non-refundable items, in order
    pub fn non_refundable_items(&self) -> impl Iterator<Item = &OrderItem> {
        self.items.iter().filter(|i| !i.is_refundable)
    }

    pub fn has_non_refundable_items(&self) -> bool {
        self.items.iter().any(|i| !i.is_refundable)
    }

    /// Amount already paid out through an approved manual refund, 0
    /// if none. An order is auto-refunded on cancellation OR manually
    /// refunded, never both; this is the value both guards check.
    pub fn approved_refund_amount(&self) -> i64 {
        match &self.refund_request {
            Some(r) if r.status == RefundStatus::Approved => {
                r.refund_amount.unwrap_or(self.total_amount)
            }
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: i64, quantity: i64, is_refundable: bool) -> OrderItem {
        OrderItem {
            id: "itm-1".to_string(),
            name: "Veg Thali".to_string(),
            price,
            quantity,
            is_refundable,
            category: None,
        }
    }

    #[test]
    fn subtotals_partition_by_refundability() {
        let order = Order {
            id: "o-1".to_string(),
            token: "CTN1".to_string(),
            user_id: "u-1".to_string(),
            branch: "Main".to_string(),
            items: vec![item(40, 2, true), item(120, 1, false), item(10, 3, true)],
            total_amount: 230,
            payment_method: PaymentMethod::Wallet,
            status: OrderStatus::Placed,
            created_at: 0,
            scheduled_time: None,
            feedback: None,
            refund_request: None,
            rejection_reason: None,
        };
        assert_eq!(order.refundable_subtotal(), 110);
        assert_eq!(order.non_refundable_subtotal(), 120);
        assert!(order.has_non_refundable_items());
        assert_eq!(
            order.refundable_subtotal() + order.non_refundable_subtotal(),
            order.total_amount
        );
    }

    #[test]
    fn terminal_states() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Rescued.is_terminal());
        assert!(!OrderStatus::AwaitingRescue.is_terminal());
        assert!(!OrderStatus::Preparing.is_terminal());
    }
}

//! Flash Sale Model (rescue listings)

use serde::{Deserialize, Serialize};

/// Flash sale listing status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlashSaleStatus {
    #[default]
    Active,
    Sold,
    Expired,
}

/// Rescue listing created when a preparing order with non-refundable
/// items is cancelled.
///
/// At most one active listing exists per originating order. A sold
/// listing is immutable; an unsold listing expires a fixed interval
/// after `created_at` (enforced by the registry, not the storage
/// layer).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlashSale {
    pub id: String,
    pub original_order_id: String,
    pub original_user_id: String,
    /// Non-refundable item names joined with " + "
    pub item_name: String,
    /// Sum of non-refundable line totals, integer currency units
    pub original_price: i64,
    /// ceil(0.7 x original_price)
    pub discounted_price: i64,
    /// ceil(0.5 x original_price), credited to the original user on claim
    pub refund_amount: i64,
    pub status: FlashSaleStatus,
    pub created_at: i64,
}

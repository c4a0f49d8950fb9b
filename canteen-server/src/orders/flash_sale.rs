//! Flash sale registry (rescue listings)
//!
//! A preparing order with non-refundable items that gets cancelled is
//! held in `AwaitingRescue` and re-listed at a discount. The registry
//! owns listing construction, the pricing laws, claim resolution and
//! the time-to-live: expiry is passive (a stale listing is excluded
//! from active queries and rejected on claim) so no background timer
//! exists anywhere.

use crate::orders::storage::{OrderStorage, StorageResult};
use redb::WriteTransaction;
use shared::models::{FlashSale, FlashSaleStatus};
use shared::order::Order;
use thiserror::Error;

/// Discount numerator: listings sell at 70% of the original value
const DISCOUNT_NUM: i64 = 7;
/// Rescue refund numerator: the original buyer recovers 50%
const REFUND_NUM: i64 = 5;
const PRICE_DEN: i64 = 10;

#[derive(Debug, Error)]
pub enum FlashSaleError {
    /// Sold, expired, or past its TTL at claim time
    #[error("Flash sale {0} has already been claimed or expired")]
    AlreadyClaimed(String),

    #[error("Order {0} already has a rescue listing")]
    ListingExists(String),

    #[error(transparent)]
    Storage(#[from] crate::orders::storage::StorageError),
}

/// ceil(amount * num / den) for non-negative amounts
fn ceil_frac(amount: i64, num: i64, den: i64) -> i64 {
    (amount * num + den - 1) / den
}

/// Discounted price for a rescue purchase: ceil(0.7 x original)
pub fn discounted_price(original_price: i64) -> i64 {
    ceil_frac(original_price, DISCOUNT_NUM, PRICE_DEN)
}

/// Wallet credit for the original buyer on claim: ceil(0.5 x original)
pub fn refund_amount(original_price: i64) -> i64 {
    ceil_frac(original_price, REFUND_NUM, PRICE_DEN)
}

/// Build a listing for the order's non-refundable items
///
/// The caller has already established that the subset is non-empty.
pub fn build_listing(order: &Order, now: i64) -> FlashSale {
    let original_price = order.non_refundable_subtotal();
    let item_name = order
        .non_refundable_items()
        .map(|i| i.name.as_str())
        .collect::<Vec<_>>()
        .join(" + ");
    FlashSale {
        id: uuid::Uuid::new_v4().to_string(),
        original_order_id: order.id.clone(),
        original_user_id: order.user_id.clone(),
        item_name,
        original_price,
        discounted_price: discounted_price(original_price),
        refund_amount: refund_amount(original_price),
        status: FlashSaleStatus::Active,
        created_at: now,
    }
}

/// Create and persist a listing for an order (within transaction)
///
/// Fails if the order already has one, whatever its state: a listing
/// is created at most once per originating order.
pub fn create_listing(
    storage: &OrderStorage,
    txn: &WriteTransaction,
    order: &Order,
    now: i64,
) -> Result<FlashSale, FlashSaleError> {
    if storage.find_flash_sale_for_order(txn, &order.id)?.is_some() {
        return Err(FlashSaleError::ListingExists(order.id.clone()));
    }
    let sale = build_listing(order, now);
    storage.store_flash_sale(txn, &sale)?;
    tracing::info!(
        flash_sale_id = %sale.id,
        order_id = %order.id,
        original_price = sale.original_price,
        discounted_price = sale.discounted_price,
        "Rescue listing created"
    );
    Ok(sale)
}

/// Claim a listing for a rescue purchase (within transaction)
///
/// The status check and flip share the write transaction, so exactly
/// one of any number of racing claims succeeds; the rest observe
/// `Sold` (or `Expired`) and fail. A listing past its TTL is marked
/// expired here rather than claimed, even if no sweep has run yet.
pub fn claim_listing(
    storage: &OrderStorage,
    txn: &WriteTransaction,
    flash_sale_id: &str,
    now: i64,
    ttl_ms: i64,
) -> Result<FlashSale, FlashSaleError> {
    let mut sale = storage.load_flash_sale(txn, flash_sale_id)?;

    if sale.status != FlashSaleStatus::Active {
        return Err(FlashSaleError::AlreadyClaimed(flash_sale_id.to_string()));
    }
    if now - sale.created_at >= ttl_ms {
        sale.status = FlashSaleStatus::Expired;
        storage.store_flash_sale(txn, &sale)?;
        return Err(FlashSaleError::AlreadyClaimed(flash_sale_id.to_string()));
    }

    sale.status = FlashSaleStatus::Sold;
    storage.store_flash_sale(txn, &sale)?;
    Ok(sale)
}

/// Active listings, lazily expiring any whose TTL has elapsed (own
/// transaction)
pub fn active_listings(
    storage: &OrderStorage,
    now: i64,
    ttl_ms: i64,
) -> StorageResult<Vec<FlashSale>> {
    let txn = storage.begin_write()?;
    let mut active = Vec::new();
    for mut sale in storage.list_flash_sales(&txn)? {
        if sale.status != FlashSaleStatus::Active {
            continue;
        }
        if now - sale.created_at >= ttl_ms {
            sale.status = FlashSaleStatus::Expired;
            storage.store_flash_sale(&txn, &sale)?;
            tracing::debug!(flash_sale_id = %sale.id, "Rescue listing expired");
            continue;
        }
        active.push(sale);
    }
    txn.commit()?;
    Ok(active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::{OrderItem, OrderStatus, PaymentMethod};

    const TTL_MS: i64 = 30 * 60 * 1000;

    fn order_with_items(items: Vec<OrderItem>) -> Order {
        let total = items.iter().map(OrderItem::line_total).sum();
        Order {
            id: "o-1".to_string(),
            token: "CTN1".to_string(),
            user_id: "u-1".to_string(),
            branch: "Main".to_string(),
            items,
            total_amount: total,
            payment_method: PaymentMethod::Wallet,
            status: OrderStatus::Preparing,
            created_at: 0,
            scheduled_time: None,
            feedback: None,
            refund_request: None,
            rejection_reason: None,
        }
    }

    fn item(name: &str, price: i64, quantity: i64, is_refundable: bool) -> OrderItem {
        OrderItem {
            id: format!("itm-{}", name),
            name: name.to_string(),
            price,
            quantity,
            is_refundable,
            category: None,
        }
    }

    #[test]
    fn rounding_law_holds_for_odd_prices() {
        // originalPrice=101 -> discounted 71, refund 51
        assert_eq!(discounted_price(101), 71);
        assert_eq!(refund_amount(101), 51);

        assert_eq!(discounted_price(120), 84);
        assert_eq!(refund_amount(120), 60);

        assert_eq!(discounted_price(1), 1);
        assert_eq!(refund_amount(1), 1);
    }

    #[test]
    fn rounding_law_never_undercuts_ceiling() {
        for original in 1..500i64 {
            let d = discounted_price(original);
            let r = refund_amount(original);
            assert!(d * 10 >= original * 7 && (d - 1) * 10 < original * 7);
            assert!(r * 2 >= original && (r - 1) * 2 < original);
        }
    }

    #[test]
    fn listing_covers_non_refundable_items_only() {
        let order = order_with_items(vec![
            item("Paneer Roll", 120, 1, false),
            item("Juice", 30, 2, true),
            item("Biryani", 90, 1, false),
        ]);
        let sale = build_listing(&order, 1000);
        assert_eq!(sale.item_name, "Paneer Roll + Biryani");
        assert_eq!(sale.original_price, 210);
        assert_eq!(sale.discounted_price, 147);
        assert_eq!(sale.refund_amount, 105);
        assert_eq!(sale.status, FlashSaleStatus::Active);
    }

    #[test]
    fn second_listing_for_same_order_is_rejected() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let order = order_with_items(vec![item("Thali", 80, 1, false)]);

        let txn = storage.begin_write().unwrap();
        create_listing(&storage, &txn, &order, 0).unwrap();
        let err = create_listing(&storage, &txn, &order, 0).unwrap_err();
        assert!(matches!(err, FlashSaleError::ListingExists(_)));
    }

    #[test]
    fn claim_flips_active_to_sold_exactly_once() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let order = order_with_items(vec![item("Thali", 80, 1, false)]);

        let txn = storage.begin_write().unwrap();
        let sale = create_listing(&storage, &txn, &order, 0).unwrap();

        let claimed = claim_listing(&storage, &txn, &sale.id, 1000, TTL_MS).unwrap();
        assert_eq!(claimed.status, FlashSaleStatus::Sold);

        let err = claim_listing(&storage, &txn, &sale.id, 1001, TTL_MS).unwrap_err();
        assert!(matches!(err, FlashSaleError::AlreadyClaimed(_)));
    }

    #[test]
    fn stale_listing_cannot_be_claimed() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let order = order_with_items(vec![item("Thali", 80, 1, false)]);

        let txn = storage.begin_write().unwrap();
        let sale = create_listing(&storage, &txn, &order, 0).unwrap();
        let err = claim_listing(&storage, &txn, &sale.id, TTL_MS, TTL_MS).unwrap_err();
        assert!(matches!(err, FlashSaleError::AlreadyClaimed(_)));

        // Marked expired by the failed claim
        let stored = storage.load_flash_sale(&txn, &sale.id).unwrap();
        assert_eq!(stored.status, FlashSaleStatus::Expired);
    }

    #[test]
    fn active_query_sweeps_expired_listings() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let fresh_order = order_with_items(vec![item("Thali", 80, 1, false)]);
        let mut stale_order = order_with_items(vec![item("Dosa", 60, 1, false)]);
        stale_order.id = "o-2".to_string();

        let txn = storage.begin_write().unwrap();
        let stale = create_listing(&storage, &txn, &stale_order, 0).unwrap();
        let fresh = create_listing(&storage, &txn, &fresh_order, TTL_MS).unwrap();
        txn.commit().unwrap();

        let active = active_listings(&storage, TTL_MS + 1000, TTL_MS).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, fresh.id);

        // The sweep persisted the expiry
        let swept = storage.get_flash_sale(&stale.id).unwrap();
        assert_eq!(swept.status, FlashSaleStatus::Expired);
    }
}

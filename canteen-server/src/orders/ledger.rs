//! Monthly ledger updater
//!
//! Applies aggregate deltas to the `MonthlyBalance` record keyed by
//! the order's creation month. The month is always derived from
//! `order.created_at` in the business timezone, never from the time
//! the update happens: a January order cancelled in February corrects
//! January's revenue. Runs inside the caller's write transaction, so
//! concurrent orders landing in the same month serialize instead of
//! losing updates.

use crate::orders::storage::{OrderStorage, StorageResult};
use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;
use redb::WriteTransaction;
use shared::models::MonthlyBalance;
use shared::order::Order;

/// Ledger event fired by an order-state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerAction {
    /// Order placed: counts and revenue added
    New,
    /// Order completed (guarded by the transition table to fire once)
    Completed,
    /// Order cancelled or rejected: revenue corrected downward, net
    /// of any approved manual refund already subtracted;
    /// `auto_refunded` is the refundable subtotal credited back (0
    /// when a manual refund was already paid)
    Cancelled { auto_refunded: i64 },
    /// Standalone refund credit (manual approval, or the immediate
    /// policy's payout on interception)
    Refunded { amount: i64 },
}

/// Ledger month and peak-hour key for an order's creation instant
pub fn month_of(order: &Order, tz: Tz) -> (i32, u32, String) {
    let local = DateTime::<Utc>::from_timestamp_millis(order.created_at)
        .unwrap_or_default()
        .with_timezone(&tz);
    (local.year(), local.month(), format!("{:02}:00", local.hour()))
}

/// Apply one ledger action for an order, creating the month record on
/// first touch (within transaction)
pub fn apply(
    storage: &OrderStorage,
    txn: &WriteTransaction,
    order: &Order,
    action: LedgerAction,
    tz: Tz,
) -> StorageResult<MonthlyBalance> {
    let (year, month, hour_key) = month_of(order, tz);
    let mut ledger = storage.load_or_new_ledger(txn, year, month)?;

    match action {
        LedgerAction::New => {
            ledger.total_orders += 1;
            ledger.total_revenue += order.total_amount;
            *ledger
                .orders_by_branch
                .entry(order.branch.clone())
                .or_insert(0) += 1;
            *ledger.peak_hours.entry(hour_key).or_insert(0) += 1;
            for item in &order.items {
                let category = item.category.clone().unwrap_or_else(|| "Other".to_string());
                *ledger.revenue_by_category.entry(category).or_insert(0) += item.line_total();
            }
        }
        LedgerAction::Completed => {
            ledger.completed_orders += 1;
        }
        LedgerAction::Cancelled { auto_refunded } => {
            ledger.cancelled_orders += 1;
            // An approved manual refund already subtracted its amount
            // from revenue; only correct the remainder
            ledger.total_revenue -= order.total_amount - order.approved_refund_amount();
            ledger.refunded_amount += auto_refunded;
        }
        LedgerAction::Refunded { amount } => {
            ledger.refunded_amount += amount;
            ledger.total_revenue -= amount;
        }
    }

    ledger.recompute_average();
    storage.store_ledger(txn, &ledger)?;

    tracing::debug!(
        year,
        month,
        action = ?action,
        order_id = %order.id,
        total_revenue = ledger.total_revenue,
        "Ledger updated"
    );

    Ok(ledger)
}

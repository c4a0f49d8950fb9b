//! Monthly Balance Model (per-month financial ledger record)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate financial record for one calendar month.
///
/// Exactly one record exists per `(year, month)`; it is created lazily
/// on the first order event touching that month and updated
/// incrementally by the ledger updater. It is never recomputed from
/// scratch inside the core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonthlyBalance {
    pub year: i32,
    /// Calendar month, 1-12
    pub month: u32,
    /// Net revenue in integer currency units (orders add at placement,
    /// cancellations and refunds subtract)
    pub total_revenue: i64,
    pub total_orders: i64,
    pub completed_orders: i64,
    pub cancelled_orders: i64,
    /// Sum of all wallet credits issued as refunds this month
    pub refunded_amount: i64,
    /// Derived: round(total_revenue / total_orders), 0 when no orders
    pub average_order_value: i64,
    /// Orders per branch, key created on first use
    #[serde(default)]
    pub orders_by_branch: BTreeMap<String, i64>,
    /// Revenue per item category, key created on first use ("Other" for
    /// items without a category)
    #[serde(default)]
    pub revenue_by_category: BTreeMap<String, i64>,
    /// Orders per local hour of day, key format "HH:00"
    #[serde(default)]
    pub peak_hours: BTreeMap<String, i64>,
}

impl MonthlyBalance {
    /// Empty record for a month
    pub fn new(year: i32, month: u32) -> Self {
        Self {
            year,
            month,
            total_revenue: 0,
            total_orders: 0,
            completed_orders: 0,
            cancelled_orders: 0,
            refunded_amount: 0,
            average_order_value: 0,
            orders_by_branch: BTreeMap::new(),
            revenue_by_category: BTreeMap::new(),
            peak_hours: BTreeMap::new(),
        }
    }

    /// Recompute the derived average after any mutation
    pub fn recompute_average(&mut self) {
        self.average_order_value = if self.total_orders > 0 {
            (self.total_revenue as f64 / self.total_orders as f64).round() as i64
        } else {
            0
        };
    }
}

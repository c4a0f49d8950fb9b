use chrono_tz::Tz;

/// How the refundable portion of a rescue-triggering cancellation is
/// handled. The default holds the whole order pending rescue; paying
/// the refundable part out immediately is an explicit opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RescueRefundPolicy {
    /// No wallet credit until the rescue resolves (default)
    #[default]
    HoldUntilResolved,
    /// Credit the refundable subtotal as soon as the order enters
    /// `AwaitingRescue`
    RefundImmediately,
}

impl RescueRefundPolicy {
    fn from_env_value(v: &str) -> Option<Self> {
        match v.to_ascii_lowercase().as_str() {
            "hold" | "hold_until_resolved" => Some(Self::HoldUntilResolved),
            "immediate" | "refund_immediately" => Some(Self::RefundImmediately),
            _ => None,
        }
    }
}

/// Server configuration
///
/// # Environment Variables
///
/// All settings can be overridden through the environment:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/canteen | Working directory (database, logs) |
/// | LOG_LEVEL | info | Log filter level |
/// | BUSINESS_TIMEZONE | Asia/Kolkata | Timezone for ledger month/hour bucketing |
/// | FLASH_SALE_TTL_MINUTES | 30 | Rescue listing time-to-live |
/// | LOYALTY_EARN_DIVISOR | 10 | One point earned per this many currency units |
/// | RESCUE_REFUND_POLICY | hold | `hold` or `immediate` (see [`RescueRefundPolicy`]) |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/canteen LOG_LEVEL=debug cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the database and log files
    pub work_dir: String,
    /// Log filter level: trace | debug | info | warn | error
    pub log_level: String,
    /// Business timezone; ledger months and peak hours are bucketed in
    /// this zone
    pub timezone: Tz,
    /// Rescue listing time-to-live in minutes
    pub flash_sale_ttl_minutes: i64,
    /// One loyalty point per this many currency units of order total
    pub loyalty_earn_divisor: i64,
    /// Handling of the refundable portion when a cancellation is
    /// intercepted into `AwaitingRescue`
    pub rescue_refund_policy: RescueRefundPolicy,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/canteen".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            timezone: std::env::var("BUSINESS_TIMEZONE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(chrono_tz::Asia::Kolkata),
            flash_sale_ttl_minutes: std::env::var("FLASH_SALE_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            loyalty_earn_divisor: std::env::var("LOYALTY_EARN_DIVISOR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            rescue_refund_policy: std::env::var("RESCUE_REFUND_POLICY")
                .ok()
                .and_then(|v| RescueRefundPolicy::from_env_value(&v))
                .unwrap_or_default(),
        }
    }

    /// Flash sale time-to-live in milliseconds
    pub fn flash_sale_ttl_ms(&self) -> i64 {
        self.flash_sale_ttl_minutes * 60 * 1000
    }

    /// Loyalty points earned for an order total
    pub fn loyalty_points_for(&self, total_amount: i64) -> i64 {
        if self.loyalty_earn_divisor <= 0 {
            return 0;
        }
        total_amount / self.loyalty_earn_divisor
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: "/var/lib/canteen".into(),
            log_level: "info".into(),
            timezone: chrono_tz::Asia::Kolkata,
            flash_sale_ttl_minutes: 30,
            loyalty_earn_divisor: 10,
            rescue_refund_policy: RescueRefundPolicy::default(),
        }
    }
}

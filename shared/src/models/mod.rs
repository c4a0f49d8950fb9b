//! Data models
//!
//! Shared between canteen-server and frontend (via API).
//! Money fields are integer currency units; timestamps are Unix millis.

pub mod flash_sale;
pub mod monthly_balance;
pub mod user;

// Re-exports
pub use flash_sale::*;
pub use monthly_balance::*;
pub use user::*;

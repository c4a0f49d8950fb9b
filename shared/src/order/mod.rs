//! Order Module
//!
//! Types for the order lifecycle core:
//! - Records: the persisted order state
//! - Commands: requests from clients to change order state
//! - Notifications: facts broadcast after each committed state change

pub mod command;
pub mod notification;
pub mod record;
pub mod types;

// Re-exports
pub use command::{OrderCommand, OrderCommandPayload, OrderDraft};
pub use notification::Notification;
pub use record::{Feedback, Order, OrderItem, OrderStatus, PaymentMethod, RefundRequest, RefundStatus};
pub use types::*;

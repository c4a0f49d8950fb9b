//! Notifications broadcast after committed state changes
//!
//! Exactly one notification is emitted per externally visible state
//! change, always carrying the final (post-override) representation.
//! A rescue claim therefore produces two: a `NewOrder` for the
//! rescuer's order and an `OrderUpdate` for the rescued original.

use super::record::Order;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notification {
    NewOrder { order: Order },
    OrderUpdate { order: Order },
}

impl Notification {
    /// The order carried by this notification
    pub fn order(&self) -> &Order {
        match self {
            Notification::NewOrder { order } => order,
            Notification::OrderUpdate { order } => order,
        }
    }
}

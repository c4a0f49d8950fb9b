//! Shared types for the canteen ordering platform
//!
//! Common types used across the server and any transport layer:
//! data models, order commands/notifications, and response structures.

pub mod models;
pub mod order;

// Re-exports
pub use serde::{Deserialize, Serialize};

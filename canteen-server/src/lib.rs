//! Canteen Server - campus canteen ordering core
//!
//! # Architecture Overview
//!
//! The core of the platform is the order lifecycle state machine and
//! the money movement attached to it. Every state-changing request is
//! a command processed inside a single redb write transaction, so the
//! order record, the user wallet, the monthly ledger and any flash
//! sale listing always move together.
//!
//! # Module Structure
//!
//! ```text
//! canteen-server/src/
//! ├── core/          # Configuration
//! ├── utils/         # Logging setup
//! └── orders/        # Order state machine core
//!     ├── storage.rs     # redb tables and record access
//!     ├── transition.rs  # Status transition table + effect planning
//!     ├── ledger.rs      # Monthly ledger updater
//!     ├── wallet.rs      # Wallet ledger (atomic adjust)
//!     ├── flash_sale.rs  # Rescue listing registry
//!     ├── actions/       # One handler per command
//!     └── manager/       # Command processor + notification fan-out
//! ```

pub mod core;
pub mod orders;
pub mod utils;

// Re-export public types
pub use core::Config;
pub use orders::{CanteenManager, ManagerError, OrderStorage};
pub use utils::logger::init_logger;

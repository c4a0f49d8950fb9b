//! Order core: state machine, money movement and reporting
//!
//! `CanteenManager` is the only entry point; everything below it runs
//! inside its write transactions.

pub mod actions;
pub mod flash_sale;
pub mod ledger;
pub mod manager;
pub mod storage;
pub mod transition;
pub mod wallet;

pub use manager::{CanteenManager, ManagerError, ManagerResult};
pub use storage::{OrderStorage, StorageError, StorageResult};

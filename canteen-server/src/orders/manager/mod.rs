//! CanteenManager - the order core's single entry point
//!
//! Commands come in, one write transaction happens, notifications go
//! out after commit. Replayed commands (same `command_id`) are
//! acknowledged without re-running their effects.

mod error;

pub use error::{ManagerError, ManagerResult};

#[cfg(test)]
mod tests;

use crate::core::Config;
use crate::orders::actions::{CommandAction, CommandContext, CommandHandler};
use crate::orders::flash_sale;
use crate::orders::storage::{OrderStorage, StorageError};
use shared::models::{FlashSale, MonthlyBalance, User};
use shared::order::{
    CommandResponse, Notification, Order, OrderCommand, OrderCommandPayload,
};
use std::path::Path;
use tokio::sync::broadcast;

const NOTIFICATION_CHANNEL_CAPACITY: usize = 128;

pub struct CanteenManager {
    storage: OrderStorage,
    config: Config,
    notify_tx: broadcast::Sender<Notification>,
    /// Fresh per process start; lets clients detect a server restart
    /// and re-sync their order views
    epoch: String,
}

impl CanteenManager {
    /// Open the database at `db_path` and build a manager around it
    pub fn new(db_path: impl AsRef<Path>, config: Config) -> ManagerResult<Self> {
        let storage = OrderStorage::open(db_path)?;
        Ok(Self::with_storage(storage, config))
    }

    pub fn with_storage(storage: OrderStorage, config: Config) -> Self {
        let (notify_tx, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);
        Self {
            storage,
            config,
            notify_tx,
            epoch: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    /// Subscribe to post-commit notifications
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notify_tx.subscribe()
    }

    pub fn storage(&self) -> &OrderStorage {
        &self.storage
    }

    /// Execute a command and broadcast its notifications
    ///
    /// Never returns an error: failures become an error response so
    /// the transport can relay them verbatim.
    pub fn execute_command(&self, cmd: &OrderCommand) -> CommandResponse {
        match self.storage.is_command_processed(&cmd.command_id) {
            Ok(true) => {
                tracing::warn!(command_id = %cmd.command_id, "Duplicate command ignored");
                return CommandResponse::duplicate(cmd.command_id.clone());
            }
            Ok(false) => {}
            Err(e) => {
                return CommandResponse::error(cmd.command_id.clone(), ManagerError::from(e).into());
            }
        }

        match self.process_command(cmd) {
            Ok((response, notifications)) => {
                for notification in notifications {
                    // Send only fails when nobody is subscribed
                    let _ = self.notify_tx.send(notification);
                }
                response
            }
            Err(e) => {
                tracing::warn!(
                    command_id = %cmd.command_id,
                    error = %e,
                    "Command failed"
                );
                CommandResponse::error(cmd.command_id.clone(), e.into())
            }
        }
    }

    /// Run a command inside one write transaction
    ///
    /// Nothing is externally visible until the commit at the bottom;
    /// an error anywhere rolls back every mutation including the
    /// processed-command mark.
    fn process_command(
        &self,
        cmd: &OrderCommand,
    ) -> ManagerResult<(CommandResponse, Vec<Notification>)> {
        let now = chrono::Utc::now().timestamp_millis();

        // Token allocation runs in its own transaction first; redb
        // does not nest writes. A gap from a failed placement is fine.
        let token = match &cmd.payload {
            OrderCommandPayload::PlaceOrder { .. } => Some(self.generate_token()?),
            _ => None,
        };

        let txn = self.storage.begin_write()?;

        // Authoritative duplicate check, under the write lock. The
        // read-path check in execute_command is only a fast path; two
        // racing submissions of the same command both pass it, and
        // exactly one of them may run the effects.
        if self.storage.command_already_processed(&txn, &cmd.command_id)? {
            tracing::warn!(command_id = %cmd.command_id, "Duplicate command ignored");
            return Ok((CommandResponse::duplicate(cmd.command_id.clone()), Vec::new()));
        }

        let outcome = {
            let mut ctx = CommandContext::new(&txn, &self.storage, &self.config, now);
            let action = CommandAction::from_command(cmd, token);
            let outcome = action.execute(&mut ctx)?;
            self.storage.mark_command_processed(&txn, &cmd.command_id)?;
            outcome
        };
        txn.commit().map_err(StorageError::from)?;

        Ok((
            CommandResponse::success(cmd.command_id.clone(), outcome.order_id),
            outcome.notifications,
        ))
    }

    /// Human-facing pickup token, e.g. `CTN202508261042`
    fn generate_token(&self) -> ManagerResult<String> {
        let count = self.storage.next_token_number()?;
        let date = chrono::Utc::now()
            .with_timezone(&self.config.timezone)
            .format("%Y%m%d");
        Ok(format!("CTN{}{}", date, 1000 + count))
    }

    // ========== Queries ==========

    pub fn get_order(&self, order_id: &str) -> ManagerResult<Order> {
        self.storage.get_order(order_id).map_err(|e| match e {
            StorageError::OrderNotFound(id) => ManagerError::OrderNotFound(id),
            other => ManagerError::Storage(other),
        })
    }

    pub fn get_order_by_token(&self, token: &str) -> ManagerResult<Order> {
        self.storage.get_order_by_token(token).map_err(|e| match e {
            StorageError::OrderNotFound(id) => ManagerError::OrderNotFound(id),
            other => ManagerError::Storage(other),
        })
    }

    pub fn get_user(&self, user_id: &str) -> ManagerResult<User> {
        self.storage.get_user(user_id).map_err(|e| match e {
            StorageError::UserNotFound(id) => ManagerError::UserNotFound(id),
            other => ManagerError::Storage(other),
        })
    }

    /// Active rescue listings; stale ones are expired on the way out
    pub fn active_flash_sales(&self) -> ManagerResult<Vec<FlashSale>> {
        let now = chrono::Utc::now().timestamp_millis();
        Ok(flash_sale::active_listings(
            &self.storage,
            now,
            self.config.flash_sale_ttl_ms(),
        )?)
    }

    /// Ledger record for a month, created empty on first access
    pub fn monthly_ledger(&self, year: i32, month: u32) -> ManagerResult<MonthlyBalance> {
        if let Some(ledger) = self.storage.get_ledger(year, month)? {
            return Ok(ledger);
        }
        let txn = self.storage.begin_write()?;
        let ledger = self.storage.load_or_new_ledger(&txn, year, month)?;
        self.storage.store_ledger(&txn, &ledger)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(ledger)
    }
}

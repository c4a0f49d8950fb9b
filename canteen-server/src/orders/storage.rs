//! redb-based storage layer for the order core
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` | Order records |
//! | `order_tokens` | `token` | `order_id` | Human-facing token index |
//! | `users` | `user_id` | `User` | Wallet + loyalty records |
//! | `monthly_balances` | `(year, month)` | `MonthlyBalance` | Ledger records |
//! | `flash_sales` | `flash_sale_id` | `FlashSale` | Rescue listings |
//! | `flash_sale_by_order` | `order_id` | `flash_sale_id` | One-listing-per-order index |
//! | `processed_commands` | `command_id` | `()` | Idempotency check |
//! | `counters` | `()` | `u64` | Token counter |
//!
//! # Durability
//!
//! redb commits are atomic and immediately durable; every multi-entity
//! command runs inside one write transaction, so wallet, ledger, order
//! and flash-sale mutations land together or not at all. redb's
//! single-writer model also serializes concurrent commands touching
//! the same month record or listing, which is what makes the
//! flash-sale claim an effective compare-and-set.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::models::{FlashSale, MonthlyBalance, User};
use shared::order::Order;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Orders: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Token index: key = token, value = order_id
const ORDER_TOKENS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("order_tokens");

/// Users: key = user_id, value = JSON-serialized User
const USERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Ledger records: key = (year, month), value = JSON-serialized MonthlyBalance
const LEDGER_TABLE: TableDefinition<(i32, u32), &[u8]> = TableDefinition::new("monthly_balances");

/// Flash sales: key = flash_sale_id, value = JSON-serialized FlashSale
const FLASH_SALES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("flash_sales");

/// Index enforcing one listing per originating order: key = original
/// order_id, value = flash_sale_id
const FLASH_SALE_BY_ORDER_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("flash_sale_by_order");

/// Processed commands: key = command_id, value = empty (idempotency)
const PROCESSED_COMMANDS_TABLE: TableDefinition<&str, ()> =
    TableDefinition::new("processed_commands");

/// Counters: key = counter name, value = u64
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

const TOKEN_COUNT_KEY: &str = "token_count";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Flash sale not found: {0}")]
    FlashSaleNotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Order core storage backed by redb
#[derive(Clone)]
pub struct OrderStorage {
    db: Arc<Database>,
}

impl OrderStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_TOKENS_TABLE)?;
            let _ = write_txn.open_table(USERS_TABLE)?;
            let _ = write_txn.open_table(LEDGER_TABLE)?;
            let _ = write_txn.open_table(FLASH_SALES_TABLE)?;
            let _ = write_txn.open_table(FLASH_SALE_BY_ORDER_TABLE)?;
            let _ = write_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
            let mut counters = write_txn.open_table(COUNTERS_TABLE)?;
            if counters.get(TOKEN_COUNT_KEY)?.is_none() {
                counters.insert(TOKEN_COUNT_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Token Counter ==========

    /// Get and increment the token counter atomically
    ///
    /// Runs in its own transaction; call BEFORE the command's main
    /// write transaction (redb does not allow nested writes). A gap in
    /// the sequence from a failed placement is acceptable.
    pub fn next_token_number(&self) -> StorageResult<u64> {
        let txn = self.db.begin_write()?;
        let next = {
            let mut table = txn.open_table(COUNTERS_TABLE)?;
            let current = table.get(TOKEN_COUNT_KEY)?.map(|g| g.value()).unwrap_or(0);
            let next = current + 1;
            table.insert(TOKEN_COUNT_KEY, next)?;
            next
        };
        txn.commit()?;
        Ok(next)
    }

    // ========== Command Idempotency ==========

    /// Check if a command has been processed
    pub fn is_command_processed(&self, command_id: &str) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.is_some())
    }

    /// Check if a command has been processed (within transaction)
    ///
    /// The write transaction holds the single writer lock, so this
    /// check cannot race with another command marking the same id.
    pub fn command_already_processed(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<bool> {
        let table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.is_some())
    }

    /// Mark a command as processed (within transaction)
    pub fn mark_command_processed(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        table.insert(command_id, ())?;
        Ok(())
    }

    // ========== Orders ==========

    /// Store an order (within transaction)
    pub fn store_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let bytes = serde_json::to_vec(order)?;
        let mut table = txn.open_table(ORDERS_TABLE)?;
        table.insert(order.id.as_str(), bytes.as_slice())?;
        Ok(())
    }

    /// Register an order token (within transaction)
    pub fn index_token(
        &self,
        txn: &WriteTransaction,
        token: &str,
        order_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(ORDER_TOKENS_TABLE)?;
        table.insert(token, order_id)?;
        Ok(())
    }

    /// Load an order within a write transaction
    pub fn load_order(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<Order> {
        let table = txn.open_table(ORDERS_TABLE)?;
        let guard = table
            .get(order_id)?
            .ok_or_else(|| StorageError::OrderNotFound(order_id.to_string()))?;
        Ok(serde_json::from_slice(guard.value())?)
    }

    /// Get an order (read-only)
    pub fn get_order(&self, order_id: &str) -> StorageResult<Order> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        let guard = table
            .get(order_id)?
            .ok_or_else(|| StorageError::OrderNotFound(order_id.to_string()))?;
        Ok(serde_json::from_slice(guard.value())?)
    }

    /// Look up an order by its human-facing token (read-only)
    pub fn get_order_by_token(&self, token: &str) -> StorageResult<Order> {
        let read_txn = self.db.begin_read()?;
        let tokens = read_txn.open_table(ORDER_TOKENS_TABLE)?;
        let order_id = tokens
            .get(token)?
            .map(|g| g.value().to_string())
            .ok_or_else(|| StorageError::OrderNotFound(token.to_string()))?;
        let orders = read_txn.open_table(ORDERS_TABLE)?;
        let guard = orders
            .get(order_id.as_str())?
            .ok_or_else(|| StorageError::OrderNotFound(order_id.clone()))?;
        Ok(serde_json::from_slice(guard.value())?)
    }

    // ========== Users ==========

    /// Store a user record (within transaction)
    pub fn store_user(&self, txn: &WriteTransaction, user: &User) -> StorageResult<()> {
        let bytes = serde_json::to_vec(user)?;
        let mut table = txn.open_table(USERS_TABLE)?;
        table.insert(user.id.as_str(), bytes.as_slice())?;
        Ok(())
    }

    /// Load a user within a write transaction
    pub fn load_user(&self, txn: &WriteTransaction, user_id: &str) -> StorageResult<User> {
        let table = txn.open_table(USERS_TABLE)?;
        let guard = table
            .get(user_id)?
            .ok_or_else(|| StorageError::UserNotFound(user_id.to_string()))?;
        Ok(serde_json::from_slice(guard.value())?)
    }

    /// Get a user (read-only)
    pub fn get_user(&self, user_id: &str) -> StorageResult<User> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS_TABLE)?;
        let guard = table
            .get(user_id)?
            .ok_or_else(|| StorageError::UserNotFound(user_id.to_string()))?;
        Ok(serde_json::from_slice(guard.value())?)
    }

    /// Insert or replace a user record in its own transaction
    ///
    /// User provisioning belongs to the out-of-core account system;
    /// this exists for seeding and tests. Balances are never mutated
    /// through this path once orders start flowing.
    pub fn upsert_user(&self, user: &User) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        self.store_user(&txn, user)?;
        txn.commit()?;
        Ok(())
    }

    // ========== Monthly Ledger ==========

    /// Load the ledger record for a month, or an empty one if the
    /// month has not been touched yet (within transaction)
    pub fn load_or_new_ledger(
        &self,
        txn: &WriteTransaction,
        year: i32,
        month: u32,
    ) -> StorageResult<MonthlyBalance> {
        let table = txn.open_table(LEDGER_TABLE)?;
        match table.get((year, month))? {
            Some(guard) => Ok(serde_json::from_slice(guard.value())?),
            None => Ok(MonthlyBalance::new(year, month)),
        }
    }

    /// Store a ledger record (within transaction)
    pub fn store_ledger(
        &self,
        txn: &WriteTransaction,
        balance: &MonthlyBalance,
    ) -> StorageResult<()> {
        let bytes = serde_json::to_vec(balance)?;
        let mut table = txn.open_table(LEDGER_TABLE)?;
        table.insert((balance.year, balance.month), bytes.as_slice())?;
        Ok(())
    }

    /// Get a month's ledger record (read-only); `None` if the month
    /// has never been touched
    pub fn get_ledger(&self, year: i32, month: u32) -> StorageResult<Option<MonthlyBalance>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LEDGER_TABLE)?;
        match table.get((year, month))? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    // ========== Flash Sales ==========

    /// Store a listing and maintain the per-order index (within
    /// transaction)
    pub fn store_flash_sale(&self, txn: &WriteTransaction, sale: &FlashSale) -> StorageResult<()> {
        let bytes = serde_json::to_vec(sale)?;
        let mut table = txn.open_table(FLASH_SALES_TABLE)?;
        table.insert(sale.id.as_str(), bytes.as_slice())?;
        let mut index = txn.open_table(FLASH_SALE_BY_ORDER_TABLE)?;
        index.insert(sale.original_order_id.as_str(), sale.id.as_str())?;
        Ok(())
    }

    /// Load a listing within a write transaction
    pub fn load_flash_sale(&self, txn: &WriteTransaction, id: &str) -> StorageResult<FlashSale> {
        let table = txn.open_table(FLASH_SALES_TABLE)?;
        let guard = table
            .get(id)?
            .ok_or_else(|| StorageError::FlashSaleNotFound(id.to_string()))?;
        Ok(serde_json::from_slice(guard.value())?)
    }

    /// Find the listing created for an order, if any (within
    /// transaction)
    pub fn find_flash_sale_for_order(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<FlashSale>> {
        let index = txn.open_table(FLASH_SALE_BY_ORDER_TABLE)?;
        let Some(guard) = index.get(order_id)? else {
            return Ok(None);
        };
        let id = guard.value().to_string();
        drop(guard);
        drop(index);
        Ok(Some(self.load_flash_sale(txn, &id)?))
    }

    /// All listings within a write transaction (the registry filters
    /// and expires)
    pub fn list_flash_sales(&self, txn: &WriteTransaction) -> StorageResult<Vec<FlashSale>> {
        let table = txn.open_table(FLASH_SALES_TABLE)?;
        let mut sales = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            sales.push(serde_json::from_slice(value.value())?);
        }
        Ok(sales)
    }

    /// Get a listing (read-only)
    pub fn get_flash_sale(&self, id: &str) -> StorageResult<FlashSale> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(FLASH_SALES_TABLE)?;
        let guard = table
            .get(id)?
            .ok_or_else(|| StorageError::FlashSaleNotFound(id.to_string()))?;
        Ok(serde_json::from_slice(guard.value())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::UserRole;
    use shared::order::{OrderStatus, PaymentMethod};

    fn sample_order(id: &str) -> Order {
        Order {
            id: id.to_string(),
            token: format!("CTN-{}", id),
            user_id: "u-1".to_string(),
            branch: "Main".to_string(),
            items: vec![],
            total_amount: 100,
            payment_method: PaymentMethod::Wallet,
            status: OrderStatus::Placed,
            created_at: 0,
            scheduled_time: None,
            feedback: None,
            refund_request: None,
            rejection_reason: None,
        }
    }

    #[test]
    fn order_round_trip_and_token_lookup() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let order = sample_order("o-1");

        let txn = storage.begin_write().unwrap();
        storage.store_order(&txn, &order).unwrap();
        storage.index_token(&txn, &order.token, &order.id).unwrap();
        txn.commit().unwrap();

        assert_eq!(storage.get_order("o-1").unwrap(), order);
        assert_eq!(storage.get_order_by_token("CTN-o-1").unwrap(), order);
        assert!(matches!(
            storage.get_order("missing"),
            Err(StorageError::OrderNotFound(_))
        ));
    }

    #[test]
    fn token_counter_is_monotonic() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let a = storage.next_token_number().unwrap();
        let b = storage.next_token_number().unwrap();
        assert_eq!(b, a + 1);
    }

    #[test]
    fn command_idempotency_flag() {
        let storage = OrderStorage::open_in_memory().unwrap();
        assert!(!storage.is_command_processed("cmd-1").unwrap());

        let txn = storage.begin_write().unwrap();
        storage.mark_command_processed(&txn, "cmd-1").unwrap();
        txn.commit().unwrap();

        assert!(storage.is_command_processed("cmd-1").unwrap());
    }

    #[test]
    fn ledger_defaults_to_empty_month() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let ledger = storage.load_or_new_ledger(&txn, 2025, 4).unwrap();
        assert_eq!(ledger.total_orders, 0);
        assert_eq!(storage.get_ledger(2025, 4).unwrap(), None);
    }

    #[test]
    fn database_survives_a_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canteen.redb");

        {
            let storage = OrderStorage::open(&path).unwrap();
            let txn = storage.begin_write().unwrap();
            storage.store_order(&txn, &sample_order("o-1")).unwrap();
            txn.commit().unwrap();
            storage.next_token_number().unwrap();
        }

        let storage = OrderStorage::open(&path).unwrap();
        assert_eq!(storage.get_order("o-1").unwrap().id, "o-1");
        // Counter picks up where it left off
        assert_eq!(storage.next_token_number().unwrap(), 2);
    }

    #[test]
    fn user_upsert_and_get() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let user = User {
            id: "u-1".to_string(),
            name: "Asha".to_string(),
            role: UserRole::Student,
            balance: 500,
            points: 0,
            created_at: 0,
        };
        storage.upsert_user(&user).unwrap();
        assert_eq!(storage.get_user("u-1").unwrap().balance, 500);
    }
}

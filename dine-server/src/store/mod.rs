//! redb-backed state store
//!
//! Single source of truth for tables, menu items, orders, and order items.
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `tables` | `table_id` | `DiningTable` | Dining tables |
//! | `menu_items` | `item_id` | `MenuItem` | Menu catalog |
//! | `orders` | `order_id` | `OrderRecord` | Orders (items stored separately) |
//! | `order_items` | `order_item_id` | `OrderItem` | Order lines |
//! | `sequences` | name | `u64` | Per-entity id counters |
//!
//! # Durability
//!
//! redb commits are durable as soon as `commit()` returns; every mutating
//! operation here is one write transaction, so an order and its items are
//! persisted (or aborted) as a unit.

mod menu;
mod orders;
mod tables;

use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use shared::error::AppError;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub use orders::OrderRecord;

/// Dining tables: key = table id, value = JSON-serialized DiningTable
pub(crate) const TABLES_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("tables");

/// Menu catalog: key = menu item id, value = JSON-serialized MenuItem
pub(crate) const MENU_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("menu_items");

/// Orders without their items: key = order id, value = JSON-serialized OrderRecord
pub(crate) const ORDERS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("orders");

/// Order lines: key = order item id, value = JSON-serialized OrderItem
pub(crate) const ORDER_ITEMS_TABLE: TableDefinition<i64, &[u8]> =
    TableDefinition::new("order_items");

/// Id counters: key = entity name, value = last issued id
pub(crate) const SEQUENCES_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequences");

pub(crate) const SEQ_TABLE: &str = "table";
pub(crate) const SEQ_MENU_ITEM: &str = "menu_item";
pub(crate) const SEQ_ORDER: &str = "order";
pub(crate) const SEQ_ORDER_ITEM: &str = "order_item";

/// Store-level errors
///
/// Domain failures (not found, invalid reference, ...) travel as
/// [`StoreError::App`] so their error codes survive the trip out of a
/// transaction; everything else is persistence plumbing.
#[derive(Debug, Error)]
pub enum StoreError {
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

    #[error(transparent)]
    App(#[from] AppError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::App(e) => e,
            other => AppError::database(other.to_string()),
        }
    }
}

pub(crate) type StoreResult<T> = Result<T, StoreError>;

/// State store backed by redb
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open or create the database at the given path
    ///
    /// Pre-creates all tables so later read transactions never race table
    /// creation.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let db = Database::create(path).map_err(StoreError::from)?;

        let init = || -> StoreResult<()> {
            let write_txn = db.begin_write()?;
            {
                let _ = write_txn.open_table(TABLES_TABLE)?;
                let _ = write_txn.open_table(MENU_TABLE)?;
                let _ = write_txn.open_table(ORDERS_TABLE)?;
                let _ = write_txn.open_table(ORDER_ITEMS_TABLE)?;
                let _ = write_txn.open_table(SEQUENCES_TABLE)?;
            }
            write_txn.commit()?;
            Ok(())
        };
        init()?;

        Ok(Self { db: Arc::new(db) })
    }

    pub(crate) fn db(&self) -> &Database {
        &self.db
    }

    /// Issue the next id for the named sequence (within a write transaction)
    pub(crate) fn next_id(
        &self,
        txn: &redb::WriteTransaction,
        sequence: &str,
    ) -> StoreResult<i64> {
        let mut table = txn.open_table(SEQUENCES_TABLE)?;
        let current = table.get(sequence)?.map(|g| g.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(sequence, next)?;
        Ok(next as i64)
    }

    /// Whether the store holds no tables and no menu items yet
    pub fn is_empty(&self) -> Result<bool, AppError> {
        let inner = || -> StoreResult<bool> {
            let read_txn = self.db.begin_read()?;
            let tables = read_txn.open_table(TABLES_TABLE)?;
            let menu = read_txn.open_table(MENU_TABLE)?;
            Ok(tables.is_empty()? && menu.is_empty()?)
        };
        Ok(inner()?)
    }

    /// Populate a fresh store with a small demo dataset
    ///
    /// Five tables and a four-item menu, enough to drive a demo client
    /// without an admin round first.
    pub fn seed_demo_data(&self) -> Result<(), AppError> {
        use rust_decimal::Decimal;
        use shared::models::MenuItemCreate;

        for number in 1..=5u32 {
            self.create_table(number)?;
        }

        let menu = [
            ("Margherita Pizza", 350, "Main Course", true, "https://images.unsplash.com/photo-1594007654729-407eedc4be65?auto=format&fit=crop&q=80&w=1928&ixlib=rb-4.0.3"),
            ("Caesar Salad", 250, "Starters", false, "https://images.unsplash.com/photo-1550304943-4f24f54ddde9?auto=format&fit=crop&q=80&w=1974&ixlib=rb-4.0.3"),
            ("Chocolate Lava Cake", 180, "Desserts", true, "https://images.aws.nestle.recipes/resized/2020_06_23T12_02_56_mrs_ImageRecipes_147148lrg_1080_850.jpg"),
            ("Coca-Cola", 80, "Drinks", true, "https://images.unsplash.com/photo-1554866585-cd94860890b7?auto=format&fit=crop&q=80&w=1964&ixlib=rb-4.0.3"),
        ];
        for (name, price, category, is_veg, image_url) in menu {
            self.create_menu_item(MenuItemCreate {
                name: name.into(),
                price: Decimal::new(price, 0),
                category: category.into(),
                is_veg,
                image_url: Some(image_url.into()),
                available: true,
            })?;
        }

        tracing::info!("seeded demo data: 5 tables, 4 menu items");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::test_util::scratch_store;
    use rust_decimal::Decimal;

    #[test]
    fn test_seed_demo_dataset() {
        let (store, _dir) = scratch_store();
        assert!(store.is_empty().unwrap());
        store.seed_demo_data().unwrap();
        assert!(!store.is_empty().unwrap());

        let tables = store.list_tables().unwrap();
        assert_eq!(tables.len(), 5);
        assert_eq!(tables[0].number, 1);
        assert_eq!(tables[4].number, 5);

        let menu = store.list_menu().unwrap();
        assert_eq!(menu.len(), 4);
        assert_eq!(menu[0].name, "Margherita Pizza");
        assert_eq!(menu[0].price, Decimal::new(350, 0));

        // The demo salad has chicken in it
        assert_eq!(menu[1].name, "Caesar Salad");
        assert!(!menu[1].is_veg);

        assert_eq!(menu[3].name, "Coca-Cola");
        assert_eq!(menu[3].category, "Drinks");
        assert!(menu[3]
            .image_url
            .as_deref()
            .unwrap()
            .starts_with("https://images.unsplash.com/photo-1554866585-cd94860890b7"));
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::StateStore;
    use tempfile::TempDir;

    /// Open a scratch store in a temp directory; the dir guard must be kept
    /// alive for the duration of the test.
    pub(crate) fn scratch_store() -> (StateStore, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let store = StateStore::open(dir.path().join("test.redb")).expect("open store");
        (store, dir)
    }
}

//! Order persistence
//!
//! An order and its items are created, read, and deleted as a unit; item
//! status updates touch only the item row. The order's `total_price` is
//! computed exactly once here, at creation, from the menu prices current at
//! that moment — later item mutations never recompute it.

use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{CartLine, ItemStatus, MenuItem, Order, OrderItem, OrderStatus};

use super::{
    StateStore, StoreError, StoreResult, MENU_TABLE, ORDERS_TABLE, ORDER_ITEMS_TABLE,
    SEQ_ORDER, SEQ_ORDER_ITEM, TABLES_TABLE,
};

/// Order row as stored, without its items
///
/// Items live in their own table so a kitchen status update does not
/// rewrite the whole order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: i64,
    pub table_id: i64,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub created_at: chrono::DateTime<Utc>,
    pub version: u64,
}

impl OrderRecord {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            table_id: self.table_id,
            status: self.status,
            total_price: self.total_price,
            created_at: self.created_at,
            version: self.version,
            items,
        }
    }
}

fn order_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::OrderNotFound, format!("order {} not found", id))
        .with_detail("id", id)
}

fn order_item_not_found(id: i64) -> AppError {
    AppError::with_message(
        ErrorCode::OrderItemNotFound,
        format!("order item {} not found", id),
    )
    .with_detail("id", id)
}

/// Collect the items of one order, sorted by item id
fn items_of_order<T: ReadableTable<i64, &'static [u8]>>(
    items_table: &T,
    order_id: i64,
) -> StoreResult<Vec<OrderItem>> {
    let mut items = Vec::new();
    for entry in items_table.iter()? {
        let (_, value) = entry?;
        let item: OrderItem = serde_json::from_slice(value.value())?;
        if item.order_id == order_id {
            items.push(item);
        }
    }
    items.sort_by_key(|i| i.id);
    Ok(items)
}

impl StateStore {
    /// Atomically create an order and its items from a cart
    ///
    /// The whole creation fails as a unit: an unknown table or menu item
    /// reference aborts the transaction with nothing persisted.
    pub fn create_order(&self, table_id: i64, cart: &[CartLine]) -> AppResult<Order> {
        if cart.is_empty() {
            return Err(AppError::new(ErrorCode::InvalidCart));
        }

        let inner = || -> StoreResult<Order> {
            let txn = self.db().begin_write()?;
            let order = {
                let tables = txn.open_table(TABLES_TABLE)?;
                if tables.get(table_id)?.is_none() {
                    return Err(AppError::invalid_reference("table", table_id).into());
                }

                // Resolve every cart line against the catalog before
                // writing anything; total is fixed here and never again.
                let menu = txn.open_table(MENU_TABLE)?;
                let mut total = Decimal::ZERO;
                let mut resolved: Vec<(&CartLine, MenuItem)> = Vec::with_capacity(cart.len());
                for line in cart {
                    if line.quantity == 0 {
                        return Err(AppError::validation("quantity must be positive")
                            .with_detail("item_id", line.item_id)
                            .into());
                    }
                    let menu_item: MenuItem = match menu.get(line.item_id)? {
                        Some(value) => serde_json::from_slice(value.value())?,
                        None => {
                            return Err(
                                AppError::invalid_reference("menu item", line.item_id).into()
                            );
                        }
                    };
                    total += menu_item.price * Decimal::from(line.quantity);
                    resolved.push((line, menu_item));
                }

                let order_id = self.next_id(&txn, SEQ_ORDER)?;
                let mut items = Vec::with_capacity(resolved.len());
                {
                    let mut items_table = txn.open_table(ORDER_ITEMS_TABLE)?;
                    for (line, _) in &resolved {
                        let item_id = self.next_id(&txn, SEQ_ORDER_ITEM)?;
                        let item = OrderItem {
                            id: item_id,
                            order_id,
                            item_id: line.item_id,
                            quantity: line.quantity,
                            note: line.note.clone(),
                            status: ItemStatus::Pending,
                            version: 0,
                        };
                        items_table.insert(item_id, serde_json::to_vec(&item)?.as_slice())?;
                        items.push(item);
                    }
                }

                let record = OrderRecord {
                    id: order_id,
                    table_id,
                    status: OrderStatus::Pending,
                    total_price: total,
                    created_at: Utc::now(),
                    version: 0,
                };
                let mut orders = txn.open_table(ORDERS_TABLE)?;
                orders.insert(order_id, serde_json::to_vec(&record)?.as_slice())?;

                record.into_order(items)
            };
            txn.commit()?;
            Ok(order)
        };
        Ok(inner()?)
    }

    /// Fetch one order with its items
    pub fn get_order(&self, id: i64) -> AppResult<Option<Order>> {
        let inner = || -> StoreResult<Option<Order>> {
            let read_txn = self.db().begin_read()?;
            let orders = read_txn.open_table(ORDERS_TABLE)?;
            let record: OrderRecord = match orders.get(id)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Ok(None),
            };
            let items_table = read_txn.open_table(ORDER_ITEMS_TABLE)?;
            let items = items_of_order(&items_table, id)?;
            Ok(Some(record.into_order(items)))
        };
        Ok(inner()?)
    }

    /// List orders that have not completed, newest first
    pub fn list_active_orders(&self) -> AppResult<Vec<Order>> {
        let inner = || -> StoreResult<Vec<Order>> {
            let read_txn = self.db().begin_read()?;
            let orders = read_txn.open_table(ORDERS_TABLE)?;
            let items_table = read_txn.open_table(ORDER_ITEMS_TABLE)?;

            let mut out = Vec::new();
            for entry in orders.iter()? {
                let (_, value) = entry?;
                let record: OrderRecord = serde_json::from_slice(value.value())?;
                if record.status == OrderStatus::Completed {
                    continue;
                }
                let items = items_of_order(&items_table, record.id)?;
                out.push(record.into_order(items));
            }
            out.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
            Ok(out)
        };
        Ok(inner()?)
    }

    /// Update an order's lifecycle status
    ///
    /// `validate` sees the current status inside the transaction, so the
    /// transition check and the write cannot interleave with another
    /// update to the same order.
    pub fn update_order_status<F>(
        &self,
        id: i64,
        status: OrderStatus,
        expected_version: Option<u64>,
        validate: F,
    ) -> AppResult<Order>
    where
        F: FnOnce(OrderStatus) -> AppResult<()>,
    {
        let inner = |validate: F| -> StoreResult<Order> {
            let txn = self.db().begin_write()?;
            let order = {
                let mut orders = txn.open_table(ORDERS_TABLE)?;
                let mut record: OrderRecord = match orders.get(id)? {
                    Some(value) => serde_json::from_slice(value.value())?,
                    None => return Err(order_not_found(id).into()),
                };

                if let Some(expected) = expected_version {
                    if expected != record.version {
                        return Err(
                            AppError::version_conflict(expected, record.version).into()
                        );
                    }
                }
                validate(record.status).map_err(StoreError::App)?;

                record.status = status;
                record.version += 1;
                orders.insert(id, serde_json::to_vec(&record)?.as_slice())?;

                let items_table = txn.open_table(ORDER_ITEMS_TABLE)?;
                let items = items_of_order(&items_table, id)?;
                record.into_order(items)
            };
            txn.commit()?;
            Ok(order)
        };
        Ok(inner(validate)?)
    }

    /// Update one order item's preparation status
    pub fn update_order_item_status<F>(
        &self,
        item_id: i64,
        status: ItemStatus,
        expected_version: Option<u64>,
        validate: F,
    ) -> AppResult<OrderItem>
    where
        F: FnOnce(ItemStatus) -> AppResult<()>,
    {
        let inner = |validate: F| -> StoreResult<OrderItem> {
            let txn = self.db().begin_write()?;
            let item = {
                let mut items_table = txn.open_table(ORDER_ITEMS_TABLE)?;
                let mut item: OrderItem = match items_table.get(item_id)? {
                    Some(value) => serde_json::from_slice(value.value())?,
                    None => return Err(order_item_not_found(item_id).into()),
                };

                if let Some(expected) = expected_version {
                    if expected != item.version {
                        return Err(AppError::version_conflict(expected, item.version).into());
                    }
                }
                validate(item.status).map_err(StoreError::App)?;

                item.status = status;
                item.version += 1;
                items_table.insert(item_id, serde_json::to_vec(&item)?.as_slice())?;
                item
            };
            txn.commit()?;
            Ok(item)
        };
        Ok(inner(validate)?)
    }

    /// Delete an order and all of its items atomically
    pub fn delete_order(&self, id: i64) -> AppResult<()> {
        let inner = || -> StoreResult<()> {
            let txn = self.db().begin_write()?;
            {
                let mut orders = txn.open_table(ORDERS_TABLE)?;
                if orders.remove(id)?.is_none() {
                    return Err(order_not_found(id).into());
                }

                let mut items_table = txn.open_table(ORDER_ITEMS_TABLE)?;
                let mut doomed = Vec::new();
                for entry in items_table.iter()? {
                    let (key, value) = entry?;
                    let item: OrderItem = serde_json::from_slice(value.value())?;
                    if item.order_id == id {
                        doomed.push(key.value());
                    }
                }
                for item_id in doomed {
                    items_table.remove(item_id)?;
                }
            }
            txn.commit()?;
            Ok(())
        };
        Ok(inner()?)
    }
}

//! Menu catalog persistence
//!
//! Menu CRUD belongs to the admin surface; the sync engine itself only
//! reads the catalog to resolve references and prices at order creation.

use redb::{ReadableDatabase, ReadableTable};
use rust_decimal::Decimal;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{MenuItem, MenuItemCreate, MenuItemUpdate};

use super::{StateStore, StoreResult, MENU_TABLE, SEQ_MENU_ITEM};

fn menu_item_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::MenuItemNotFound, format!("menu item {} not found", id))
        .with_detail("id", id)
}

impl StateStore {
    /// List the whole menu catalog
    pub fn list_menu(&self) -> AppResult<Vec<MenuItem>> {
        let inner = || -> StoreResult<Vec<MenuItem>> {
            let read_txn = self.db().begin_read()?;
            let menu = read_txn.open_table(MENU_TABLE)?;
            let mut out = Vec::new();
            for entry in menu.iter()? {
                let (_, value) = entry?;
                out.push(serde_json::from_slice::<MenuItem>(value.value())?);
            }
            out.sort_by_key(|m| m.id);
            Ok(out)
        };
        Ok(inner()?)
    }

    /// Find a menu item by id
    pub fn get_menu_item(&self, id: i64) -> AppResult<Option<MenuItem>> {
        let inner = || -> StoreResult<Option<MenuItem>> {
            let read_txn = self.db().begin_read()?;
            let menu = read_txn.open_table(MENU_TABLE)?;
            match menu.get(id)? {
                Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
                None => Ok(None),
            }
        };
        Ok(inner()?)
    }

    /// Add a menu item
    pub fn create_menu_item(&self, data: MenuItemCreate) -> AppResult<MenuItem> {
        if data.price < Decimal::ZERO {
            return Err(AppError::validation("price must be non-negative"));
        }

        let inner = || -> StoreResult<MenuItem> {
            let txn = self.db().begin_write()?;
            let item = {
                let mut menu = txn.open_table(MENU_TABLE)?;
                let id = self.next_id(&txn, SEQ_MENU_ITEM)?;
                let item = MenuItem {
                    id,
                    name: data.name,
                    price: data.price,
                    category: data.category,
                    is_veg: data.is_veg,
                    image_url: data.image_url,
                    available: data.available,
                };
                menu.insert(id, serde_json::to_vec(&item)?.as_slice())?;
                item
            };
            txn.commit()?;
            Ok(item)
        };
        Ok(inner()?)
    }

    /// Update a menu item; absent fields keep their current value
    pub fn update_menu_item(&self, id: i64, data: MenuItemUpdate) -> AppResult<MenuItem> {
        if let Some(price) = data.price {
            if price < Decimal::ZERO {
                return Err(AppError::validation("price must be non-negative"));
            }
        }

        let inner = || -> StoreResult<MenuItem> {
            let txn = self.db().begin_write()?;
            let item = {
                let mut menu = txn.open_table(MENU_TABLE)?;
                let mut item: MenuItem = match menu.get(id)? {
                    Some(value) => serde_json::from_slice(value.value())?,
                    None => return Err(menu_item_not_found(id).into()),
                };

                if let Some(name) = data.name {
                    item.name = name;
                }
                if let Some(price) = data.price {
                    item.price = price;
                }
                if let Some(category) = data.category {
                    item.category = category;
                }
                if let Some(is_veg) = data.is_veg {
                    item.is_veg = is_veg;
                }
                if let Some(image_url) = data.image_url {
                    item.image_url = Some(image_url);
                }
                if let Some(available) = data.available {
                    item.available = available;
                }

                menu.insert(id, serde_json::to_vec(&item)?.as_slice())?;
                item
            };
            txn.commit()?;
            Ok(item)
        };
        Ok(inner()?)
    }

    /// Remove a menu item
    pub fn delete_menu_item(&self, id: i64) -> AppResult<()> {
        let inner = || -> StoreResult<()> {
            let txn = self.db().begin_write()?;
            {
                let mut menu = txn.open_table(MENU_TABLE)?;
                if menu.remove(id)?.is_none() {
                    return Err(menu_item_not_found(id).into());
                }
            }
            txn.commit()?;
            Ok(())
        };
        Ok(inner()?)
    }
}

//! Domain models shared between the engine and its clients

pub mod menu_item;
pub mod order;
pub mod table;

pub use menu_item::{MenuItem, MenuItemCreate, MenuItemUpdate};
pub use order::{CartLine, ItemStatus, Order, OrderItem, OrderStatus};
pub use table::{DiningTable, TableStatus};

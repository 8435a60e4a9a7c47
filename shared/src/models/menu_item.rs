//! Menu Item Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Menu item entity
///
/// Read-mostly: mutation is owned by the admin surface, the sync engine
/// only resolves references and prices at order-creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    /// Non-negative unit price
    pub price: Decimal,
    pub category: String,
    pub is_veg: bool,
    pub image_url: Option<String>,
    pub available: bool,
}

/// Create menu item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemCreate {
    pub name: String,
    pub price: Decimal,
    pub category: String,
    pub is_veg: bool,
    pub image_url: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

/// Update menu item payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub is_veg: Option<bool>,
    pub image_url: Option<String>,
    pub available: Option<bool>,
}

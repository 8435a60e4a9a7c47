//! Table lifecycle
//!
//! Tables move freely between `free`, `occupied`, and `billed`; the only
//! guards are existence and the optional version check. Every successful
//! status change publishes exactly one `tableStatusUpdated` event.

use std::sync::Arc;

use shared::error::{AppError, AppResult, ErrorCode};
use shared::message::EventName;
use shared::models::{DiningTable, TableStatus};

use crate::message::EventBroadcaster;
use crate::store::StateStore;

pub struct TableLifecycle {
    store: Arc<StateStore>,
    broadcaster: Arc<EventBroadcaster>,
}

impl TableLifecycle {
    pub fn new(store: Arc<StateStore>, broadcaster: Arc<EventBroadcaster>) -> Self {
        Self { store, broadcaster }
    }

    pub fn list(&self) -> AppResult<Vec<DiningTable>> {
        self.store.list_tables()
    }

    /// Fetch one table, failing with `TableNotFound` when absent
    pub fn get(&self, id: i64) -> AppResult<DiningTable> {
        self.store.get_table(id)?.ok_or_else(|| {
            AppError::with_message(ErrorCode::TableNotFound, format!("table {} not found", id))
                .with_detail("id", id)
        })
    }

    pub fn create(&self, number: u32) -> AppResult<DiningTable> {
        self.store.create_table(number)
    }

    /// Change a table's occupancy status and broadcast the new state
    pub async fn update_status(
        &self,
        id: i64,
        status: TableStatus,
        expected_version: Option<u64>,
    ) -> AppResult<DiningTable> {
        let table = self.store.update_table_status(id, status, expected_version)?;
        self.broadcaster
            .publish(EventName::TableStatusUpdated, &table)
            .await?;
        tracing::info!(table_id = id, status = %status, "table status updated");
        Ok(table)
    }
}

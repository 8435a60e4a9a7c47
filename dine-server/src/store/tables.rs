//! Dining table persistence

use redb::{ReadableDatabase, ReadableTable};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{DiningTable, TableStatus};

use super::{StateStore, StoreResult, SEQ_TABLE, TABLES_TABLE};

impl StateStore {
    /// Provision a new table with a unique, positive number
    pub fn create_table(&self, number: u32) -> AppResult<DiningTable> {
        if number == 0 {
            return Err(AppError::validation("table number must be positive"));
        }

        let inner = || -> StoreResult<DiningTable> {
            let txn = self.db().begin_write()?;
            let table = {
                let mut tables = txn.open_table(TABLES_TABLE)?;

                for entry in tables.iter()? {
                    let (_, value) = entry?;
                    let existing: DiningTable = serde_json::from_slice(value.value())?;
                    if existing.number == number {
                        return Err(AppError::with_message(
                            ErrorCode::TableNumberTaken,
                            format!("table number {} already in use", number),
                        )
                        .with_detail("number", number)
                        .into());
                    }
                }

                let id = self.next_id(&txn, SEQ_TABLE)?;
                let table = DiningTable {
                    id,
                    number,
                    status: TableStatus::Free,
                    version: 0,
                };
                tables.insert(id, serde_json::to_vec(&table)?.as_slice())?;
                table
            };
            txn.commit()?;
            Ok(table)
        };
        Ok(inner()?)
    }

    /// List all tables ordered by number
    pub fn list_tables(&self) -> AppResult<Vec<DiningTable>> {
        let inner = || -> StoreResult<Vec<DiningTable>> {
            let read_txn = self.db().begin_read()?;
            let tables = read_txn.open_table(TABLES_TABLE)?;
            let mut out = Vec::new();
            for entry in tables.iter()? {
                let (_, value) = entry?;
                out.push(serde_json::from_slice::<DiningTable>(value.value())?);
            }
            out.sort_by_key(|t| t.number);
            Ok(out)
        };
        Ok(inner()?)
    }

    /// Find a table by id
    pub fn get_table(&self, id: i64) -> AppResult<Option<DiningTable>> {
        let inner = || -> StoreResult<Option<DiningTable>> {
            let read_txn = self.db().begin_read()?;
            let tables = read_txn.open_table(TABLES_TABLE)?;
            match tables.get(id)? {
                Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
                None => Ok(None),
            }
        };
        Ok(inner()?)
    }

    /// Update a table's occupancy status
    ///
    /// Any status in the enum is reachable from any other; the only guards
    /// are existence and the optional version check.
    pub fn update_table_status(
        &self,
        id: i64,
        status: TableStatus,
        expected_version: Option<u64>,
    ) -> AppResult<DiningTable> {
        let inner = || -> StoreResult<DiningTable> {
            let txn = self.db().begin_write()?;
            let updated = {
                let mut tables = txn.open_table(TABLES_TABLE)?;
                let mut table: DiningTable = match tables.get(id)? {
                    Some(value) => serde_json::from_slice(value.value())?,
                    None => {
                        return Err(AppError::with_message(
                            ErrorCode::TableNotFound,
                            format!("table {} not found", id),
                        )
                        .with_detail("id", id)
                        .into());
                    }
                };

                if let Some(expected) = expected_version {
                    if expected != table.version {
                        return Err(
                            AppError::version_conflict(expected, table.version).into()
                        );
                    }
                }

                table.status = status;
                table.version += 1;
                tables.insert(id, serde_json::to_vec(&table)?.as_slice())?;
                table
            };
            txn.commit()?;
            Ok(updated)
        };
        Ok(inner()?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::scratch_store;
    use shared::error::ErrorCode;
    use shared::models::TableStatus;

    #[test]
    fn test_create_and_list_sorted_by_number() {
        let (store, _dir) = scratch_store();
        store.create_table(3).unwrap();
        store.create_table(1).unwrap();
        store.create_table(2).unwrap();

        let tables = store.list_tables().unwrap();
        let numbers: Vec<u32> = tables.iter().map(|t| t.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(tables.iter().all(|t| t.status == TableStatus::Free));
    }

    #[test]
    fn test_duplicate_number_rejected() {
        let (store, _dir) = scratch_store();
        store.create_table(7).unwrap();
        let err = store.create_table(7).unwrap_err();
        assert_eq!(err.code, ErrorCode::TableNumberTaken);
    }

    #[test]
    fn test_update_status_bumps_version() {
        let (store, _dir) = scratch_store();
        let table = store.create_table(1).unwrap();
        assert_eq!(table.version, 0);

        let updated = store
            .update_table_status(table.id, TableStatus::Occupied, None)
            .unwrap();
        assert_eq!(updated.status, TableStatus::Occupied);
        assert_eq!(updated.version, 1);
    }

    #[test]
    fn test_update_missing_table_is_not_found() {
        let (store, _dir) = scratch_store();
        let err = store
            .update_table_status(99, TableStatus::Billed, None)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TableNotFound);
    }

    #[test]
    fn test_stale_version_is_conflict() {
        let (store, _dir) = scratch_store();
        let table = store.create_table(1).unwrap();
        store
            .update_table_status(table.id, TableStatus::Occupied, Some(0))
            .unwrap();

        let err = store
            .update_table_status(table.id, TableStatus::Billed, Some(0))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::VersionConflict);
    }
}

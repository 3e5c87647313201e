//! SQLite-backed unit store.
//!
//! # Invariants
//! - One row per unit; `position` preserves document order.
//! - `save` rewrites all rows inside a single transaction.
//! - Rows that fail enum, timestamp or record validation are rejected.
//! - No rows are read or written before the table layout is current.

mod layout;

use super::{StoreError, StoreResult, UnitDocument, UnitStore};
use crate::model::timestamp::Timestamp;
use crate::model::unit::{Unit, UnitStatus, UnitType};
use log::{error, info};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;
use uuid::Uuid;

const UNIT_SELECT_SQL: &str = "SELECT
    id,
    name,
    type,
    status,
    last_updated
FROM units
ORDER BY position ASC";

/// Store keeping units in the `units` table.
pub struct SqliteUnitStore {
    conn: Mutex<Connection>,
}

impl SqliteUnitStore {
    /// Table layout version this build reads and writes.
    pub const LAYOUT_VERSION: u32 = layout::LAYOUT_VERSION;

    /// Opens a database file, creating the `units` table when needed.
    ///
    /// # Errors
    /// - `UnsupportedLayout` when the file was written by a newer layout.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        Self::connect(&path.display().to_string(), || Connection::open(path))
    }

    /// Private in-memory database; contents vanish with the store.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::connect(":memory:", Connection::open_in_memory)
    }

    fn connect(
        target: &str,
        open: impl FnOnce() -> rusqlite::Result<Connection>,
    ) -> StoreResult<Self> {
        let started_at = Instant::now();
        let prepared = open().map_err(StoreError::from).and_then(|mut conn| {
            layout::prepare(&mut conn)?;
            Ok(conn)
        });

        match prepared {
            Ok(conn) => {
                info!(
                    "event=store_open module=store status=ok backend=sqlite target={target} layout={} duration_ms={}",
                    Self::LAYOUT_VERSION,
                    started_at.elapsed().as_millis()
                );
                Ok(Self {
                    conn: Mutex::new(conn),
                })
            }
            Err(err) => {
                error!(
                    "event=store_open module=store status=error backend=sqlite target={target} duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Poisoned("sqlite_connection"))
    }
}

impl UnitStore for SqliteUnitStore {
    fn load(&self) -> StoreResult<UnitDocument> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(UNIT_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut units = Vec::new();

        while let Some(row) = rows.next()? {
            units.push(parse_unit_row(row)?);
        }

        Ok(UnitDocument { units })
    }

    fn save(&self, document: &UnitDocument) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let result = replace_rows(&mut conn, document);
        if let Err(err) = &result {
            error!(
                "event=store_save module=store status=error backend=sqlite error_code=write_failed units={} error={}",
                document.units.len(),
                err
            );
        }
        result
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

fn replace_rows(conn: &mut Connection, document: &UnitDocument) -> StoreResult<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM units;", [])?;
    {
        let mut insert = tx.prepare(
            "INSERT INTO units (position, id, name, type, status, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        )?;
        for (position, unit) in document.units.iter().enumerate() {
            insert.execute(params![
                position as i64,
                unit.id.to_string(),
                unit.name.as_str(),
                unit.kind.as_str(),
                unit.status.as_str(),
                unit.last_updated.to_string(),
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn parse_unit_row(row: &Row<'_>) -> StoreResult<Unit> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        StoreError::InvalidData(format!("invalid uuid value `{id_text}` in units.id"))
    })?;

    let type_text: String = row.get("type")?;
    let kind = UnitType::parse(&type_text).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid unit type `{type_text}` in units.type"))
    })?;

    let status_text: String = row.get("status")?;
    let status = UnitStatus::parse(&status_text).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "invalid unit status `{status_text}` in units.status"
        ))
    })?;

    let stamp_text: String = row.get("last_updated")?;
    let last_updated = Timestamp::parse_canonical(&stamp_text)
        .map_err(|err| StoreError::InvalidData(format!("units.last_updated: {err}")))?;

    let unit = Unit {
        id,
        name: row.get("name")?,
        kind,
        status,
        last_updated,
    };
    unit.validate()
        .map_err(|err| StoreError::InvalidData(format!("unit {id}: {err}")))?;
    Ok(unit)
}

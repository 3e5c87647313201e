//! Table layout for the sqlite backend.
//!
//! # Invariants
//! - The applied layout is recorded in `PRAGMA user_version`.
//! - A file written by a newer layout is refused, never rewritten.
//! - Pending layout steps apply in one transaction.

use crate::store::{StoreError, StoreResult};
use rusqlite::Connection;
use std::time::Duration;

pub const LAYOUT_VERSION: u32 = 1;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// `(version, ddl)` steps in ascending version order.
const LAYOUT_STEPS: &[(u32, &str)] = &[(1, include_str!("units.sql"))];

/// Configures `conn` and brings its tables up to `LAYOUT_VERSION`.
pub(super) fn prepare(conn: &mut Connection) -> StoreResult<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;

    let found: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if found > LAYOUT_VERSION {
        return Err(StoreError::UnsupportedLayout {
            found,
            supported: LAYOUT_VERSION,
        });
    }
    if found == LAYOUT_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, ddl) in LAYOUT_STEPS.iter().filter(|(version, _)| *version > found) {
        tx.execute_batch(ddl)?;
        tx.pragma_update(None, "user_version", version)?;
    }
    tx.commit()?;
    Ok(())
}

use std::path::Path;

use duckdb::Connection;
use tracing::info;

use crate::error::Result;

/// Scoped handle over the embedded warehouse database.
///
/// DuckDB is single-writer. The build pipeline is single-threaded and
/// synchronous, and every component takes the handle as an explicit
/// argument, so exclusive serialized access is enforced by construction
/// rather than by locking. The connection closes when the handle drops.
pub struct Warehouse {
    pub(crate) conn: Connection,
}

impl Warehouse {
    /// Open (or create) the warehouse database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "warehouse opened");
        Ok(Self { conn })
    }

    /// Open an **in-memory** warehouse.
    ///
    /// Intended for tests only — all relations are discarded when the
    /// handle is dropped.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// `SELECT count(*)` from a relation. `table` must be one of the
    /// warehouse's own relation names, never external input.
    pub fn table_count(&self, table: &str) -> Result<i64> {
        let mut stmt = self.conn.prepare(&format!("SELECT count(*) FROM {table}"))?;
        let count: i64 = stmt.query_row([], |row| row.get(0))?;
        Ok(count)
    }

    /// Return `true` if a base table with the given name exists.
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT count(*) FROM information_schema.tables WHERE table_name = ?1")?;
        let count: i64 = stmt.query_row(duckdb::params![table], |row| row.get(0))?;
        Ok(count > 0)
    }

    /// Direct access to the underlying connection.
    ///
    /// Intended for integration tests that need to inspect or tamper with
    /// stored data. Production code goes through the loader, the pipeline
    /// runner, and the query layer.
    pub fn conn_for_test(&self) -> &Connection {
        &self.conn
    }
}

/// Quote a string as a SQL literal (single quotes doubled). Used for
/// values DuckDB cannot take as bound parameters, such as file paths in
/// `read_csv_auto` and `COPY ... TO` targets.
pub(crate) fn sql_str(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Quote an identifier for use in a projection list. Raw CSV headers may
/// contain spaces or punctuation, so they are always double-quoted.
pub(crate) fn sql_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

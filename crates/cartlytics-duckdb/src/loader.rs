//! Schema normalizer: raw CSV export → `stg_sessions_raw`.
//!
//! Column handling is name-driven, not value-driven: a fixed list of
//! boolean-semantic columns is coerced to 0/1 integers, one categorical
//! column is kept as text, and a fixed list of duration columns is coerced
//! to DOUBLE. Everything else keeps whatever type the CSV sniffer infers.

use std::path::Path;

use tracing::{info, warn};

use cartlytics_core::naming::to_snake_case;
use cartlytics_core::stage::STAGING_TABLE;

use crate::error::{Result, WarehouseError};
use crate::warehouse::{sql_ident, sql_str, Warehouse};

/// Boolean-semantic columns stored as 0/1 integers in staging.
const BOOLEAN_COLUMNS: &[&str] = &["weekend", "revenue"];

/// Categorical column kept as text even when every value looks numeric.
const TEXT_COLUMNS: &[&str] = &["month"];

/// Duration columns stored as DOUBLE seconds in staging.
const DURATION_COLUMNS: &[&str] = &[
    "administrative_duration",
    "informational_duration",
    "product_related_duration",
];

/// A raw column together with its canonical staging name.
struct RawColumn {
    raw: String,
    normalized: String,
}

/// Load the raw CSV at `path` into the staging table.
///
/// Drops any pre-existing staging table first, then materializes the
/// normalized projection plus a sequential `session_id`. The id is dense
/// and unique within one run but its row assignment comes from an
/// unordered window scan, so it is not stable across independent runs and
/// must never be compared between them.
///
/// Returns the number of staged rows.
pub fn load_staging(warehouse: &Warehouse, path: &Path) -> Result<u64> {
    if !path.exists() {
        return Err(WarehouseError::MissingInput {
            path: path.to_path_buf(),
        });
    }

    let source = format!("read_csv_auto({})", sql_str(&path.to_string_lossy()));
    let columns = raw_columns(warehouse, &source)?;
    check_coercions(warehouse, &source, &columns)?;
    warn_absent_coercion_columns(&columns);

    let mut projection = vec!["row_number() OVER () AS session_id".to_string()];
    for col in &columns {
        projection.push(staging_expr(col));
    }

    warehouse
        .conn
        .execute_batch(&format!("DROP TABLE IF EXISTS {STAGING_TABLE};"))?;
    warehouse.conn.execute_batch(&format!(
        "CREATE TABLE {STAGING_TABLE} AS SELECT {} FROM {source};",
        projection.join(", ")
    ))?;

    let rows = warehouse.table_count(STAGING_TABLE)?;
    info!(rows, table = STAGING_TABLE, "staging table rebuilt");
    Ok(rows as u64)
}

/// Sniff the CSV header through DuckDB and pair each raw name with its
/// canonical form.
fn raw_columns(warehouse: &Warehouse, source: &str) -> Result<Vec<RawColumn>> {
    let mut stmt = warehouse
        .conn
        .prepare(&format!("DESCRIBE SELECT * FROM {source}"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names
        .into_iter()
        .map(|raw| {
            let normalized = to_snake_case(&raw);
            RawColumn { raw, normalized }
        })
        .collect())
}

/// The projection expression for one raw column.
fn staging_expr(col: &RawColumn) -> String {
    let raw = sql_ident(&col.raw);
    let name = &col.normalized;
    if BOOLEAN_COLUMNS.contains(&name.as_str()) {
        format!("CAST(CAST({raw} AS BOOLEAN) AS INTEGER) AS {name}")
    } else if TEXT_COLUMNS.contains(&name.as_str()) {
        format!("CAST({raw} AS VARCHAR) AS {name}")
    } else if DURATION_COLUMNS.contains(&name.as_str()) {
        format!("CAST({raw} AS DOUBLE) AS {name}")
    } else {
        format!("{raw} AS {name}")
    }
}

/// Probe every present coercion column with TRY_CAST before materializing,
/// so an uncoercible value surfaces as a `TypeCoercion` error naming the
/// column instead of an engine error halfway through a CTAS.
fn check_coercions(warehouse: &Warehouse, source: &str, columns: &[RawColumn]) -> Result<()> {
    for col in columns {
        let target: Option<(&str, &'static str)> = if BOOLEAN_COLUMNS
            .contains(&col.normalized.as_str())
        {
            Some(("BOOLEAN", "0/1 integer"))
        } else if DURATION_COLUMNS.contains(&col.normalized.as_str()) {
            Some(("DOUBLE", "real number"))
        } else {
            None
        };
        let Some((cast_type, target_desc)) = target else {
            continue;
        };
        let raw = sql_ident(&col.raw);
        let bad: i64 = warehouse
            .conn
            .prepare(&format!(
                "SELECT count(*) FROM {source} \
                 WHERE {raw} IS NOT NULL AND TRY_CAST({raw} AS {cast_type}) IS NULL"
            ))?
            .query_row([], |row| row.get(0))?;
        if bad > 0 {
            return Err(WarehouseError::TypeCoercion {
                column: col.normalized.clone(),
                target: target_desc,
                detail: format!("{bad} row(s) hold values that do not convert"),
            });
        }
    }
    Ok(())
}

/// Absent coercion columns are tolerated schema drift, but worth a warning
/// because the downstream scripts expect the standard dataset shape.
fn warn_absent_coercion_columns(columns: &[RawColumn]) {
    let present: Vec<&str> = columns.iter().map(|c| c.normalized.as_str()).collect();
    for expected in BOOLEAN_COLUMNS
        .iter()
        .chain(TEXT_COLUMNS)
        .chain(DURATION_COLUMNS)
    {
        if !present.contains(expected) {
            warn!(column = expected, "coercion column absent in raw input; skipping");
        }
    }
}

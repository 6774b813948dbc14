//! Mart export: dump the reporting views to flat files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::warehouse::{sql_str, Warehouse};

/// The reporting views, in export order. Each is recomputed from current
/// fact and dimension state at read time; the export is a full dump, not
/// a snapshot.
pub const MART_VIEWS: &[&str] = &[
    "mart_conversion_by_month",
    "mart_conversion_by_visitor",
    "mart_conversion_by_traffic",
    "mart_conversion_by_device",
    "mart_behavior_summary",
];

/// Export every mart view to `<artifacts_dir>/<view>.csv`. Returns the
/// written file paths in export order.
pub fn export_marts(warehouse: &Warehouse, artifacts_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(artifacts_dir)?;
    let mut written = Vec::with_capacity(MART_VIEWS.len());
    for view in MART_VIEWS {
        let output = artifacts_dir.join(format!("{view}.csv"));
        warehouse.conn.execute_batch(&format!(
            "COPY (SELECT * FROM {view}) TO {} (HEADER, DELIMITER ',');",
            sql_str(&output.to_string_lossy())
        ))?;
        info!(view, path = %output.display(), "mart exported");
        written.push(output);
    }
    Ok(written)
}

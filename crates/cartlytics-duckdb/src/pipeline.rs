//! Ordered SQL pipeline runner.
//!
//! Executes the fixed stage sequence declared in `cartlytics_core::stage`
//! against the warehouse. Scripts rebuild their relations with
//! `CREATE OR REPLACE`, so re-running the whole sequence over unchanged
//! staging input reproduces the same relation set.

use std::fs;
use std::path::Path;

use tracing::info;

use cartlytics_core::stage::{validate_plan, Stage, StageKind, PIPELINE};

use crate::error::{Result, WarehouseError};
use crate::warehouse::Warehouse;

/// Execute the full stage sequence in order.
///
/// Fail-fast with no rollback: the first failing stage aborts the run and
/// leaves the warehouse in whatever state that stage produced. Recovery is
/// a full rerun starting from the loader, never a partial resume.
pub fn run_pipeline(warehouse: &Warehouse, sql_dir: &Path) -> Result<()> {
    validate_plan(PIPELINE)?;
    for stage in PIPELINE {
        run_one(warehouse, sql_dir, stage)?;
    }
    info!("pipeline completed");
    Ok(())
}

/// Execute a single stage by script name.
///
/// The dependency and idempotency guarantees only hold for the full
/// sequence; this entry point exists for tests and targeted re-checks
/// (re-running the sanity stage against a built warehouse is safe because
/// that stage is read-only).
pub fn run_stage(warehouse: &Warehouse, sql_dir: &Path, script: &str) -> Result<()> {
    let stage = PIPELINE
        .iter()
        .find(|s| s.script == script)
        .ok_or_else(|| WarehouseError::MissingScript {
            path: sql_dir.join(script),
        })?;
    run_one(warehouse, sql_dir, stage)
}

fn run_one(warehouse: &Warehouse, sql_dir: &Path, stage: &Stage) -> Result<()> {
    let path = sql_dir.join(stage.script);
    if !path.exists() {
        return Err(WarehouseError::MissingScript { path });
    }
    let sql = fs::read_to_string(&path)?;
    info!(script = stage.script, "running stage");
    if let Err(source) = warehouse.conn.execute_batch(&sql) {
        return Err(match stage.kind {
            StageKind::SanityCheck => WarehouseError::SanityCheck {
                script: stage.script.to_string(),
                source,
            },
            StageKind::Transform => WarehouseError::ScriptExecution {
                script: stage.script.to_string(),
                source,
            },
        });
    }
    Ok(())
}

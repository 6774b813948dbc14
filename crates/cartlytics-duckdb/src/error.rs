use std::path::PathBuf;

use thiserror::Error;

use cartlytics_core::stage::PlanError;

/// Failure taxonomy of the warehouse build.
///
/// None of these are recovered locally: every variant aborts the current
/// stage and propagates to the CLI, which exits non-zero. Recovery is
/// always operator intervention (fix the input or script, rerun from the
/// loader) — there is no retry logic anywhere in the pipeline.
#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("missing raw input at {}. See data/README.md for download instructions", path.display())]
    MissingInput { path: PathBuf },

    #[error("column '{column}' cannot be coerced to {target}: {detail}")]
    TypeCoercion {
        column: String,
        target: &'static str,
        detail: String,
    },

    #[error("missing SQL script: {}", path.display())]
    MissingScript { path: PathBuf },

    #[error("script {script} failed: {source}")]
    ScriptExecution {
        script: String,
        #[source]
        source: duckdb::Error,
    },

    #[error("sanity check failed in {script}: {source}")]
    SanityCheck {
        script: String,
        #[source]
        source: duckdb::Error,
    },

    #[error("invalid stage plan: {0}")]
    InvalidPlan(#[from] PlanError),

    #[error(transparent)]
    Db(#[from] duckdb::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WarehouseError>;

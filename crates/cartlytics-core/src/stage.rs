use thiserror::Error;

/// Name of the relation the schema normalizer materializes. Declared here
/// because it is the root input of the stage plan.
pub const STAGING_TABLE: &str = "stg_sessions_raw";

/// How the pipeline runner classifies a stage's failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    /// Creates or replaces warehouse relations.
    Transform,
    /// Read-only data-quality gate; must not produce relations.
    SanityCheck,
}

/// One transformation script plus its declared relation inputs/outputs.
///
/// Stage dependency is easy to leave implicit in file list order.
/// Declaring inputs and outputs here turns the ordering into an invariant
/// [`validate_plan`] can check before anything executes.
#[derive(Debug, Clone)]
pub struct Stage {
    pub script: &'static str,
    pub kind: StageKind,
    pub inputs: &'static [&'static str],
    pub outputs: &'static [&'static str],
}

const DIMENSIONS: &[&str] = &["dim_device", "dim_geo", "dim_traffic", "dim_visitor", "dim_date"];

/// The fixed transformation sequence: staging validation, dimensions,
/// facts, marts, sanity checks. Order is load-bearing; the runner never
/// reorders, parallelizes, skips, or retries.
pub const PIPELINE: &[Stage] = &[
    Stage {
        script: "00_staging.sql",
        kind: StageKind::Transform,
        inputs: &[STAGING_TABLE],
        outputs: &["stg_sessions"],
    },
    Stage {
        script: "10_dimensions.sql",
        kind: StageKind::Transform,
        inputs: &["stg_sessions"],
        outputs: DIMENSIONS,
    },
    Stage {
        script: "20_facts.sql",
        kind: StageKind::Transform,
        inputs: &[
            "stg_sessions",
            "dim_device",
            "dim_geo",
            "dim_traffic",
            "dim_visitor",
            "dim_date",
        ],
        outputs: &["fct_sessions"],
    },
    Stage {
        script: "30_metrics.sql",
        kind: StageKind::Transform,
        inputs: &[
            "fct_sessions",
            "dim_device",
            "dim_geo",
            "dim_traffic",
            "dim_visitor",
            "dim_date",
        ],
        outputs: &[
            "mart_conversion_by_month",
            "mart_conversion_by_visitor",
            "mart_conversion_by_traffic",
            "mart_conversion_by_device",
            "mart_behavior_summary",
        ],
    },
    Stage {
        script: "99_sanity_checks.sql",
        kind: StageKind::SanityCheck,
        inputs: &[
            STAGING_TABLE,
            "fct_sessions",
            "dim_device",
            "dim_geo",
            "dim_traffic",
            "dim_visitor",
            "dim_date",
        ],
        outputs: &[],
    },
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("stage {script} declares input '{input}' that no earlier stage produces")]
    UndeclaredInput {
        script: &'static str,
        input: &'static str,
    },
    #[error("sanity-check stage {script} declares outputs; it must be read-only")]
    MutatingSanityStage { script: &'static str },
}

/// Check that every declared input of stage *n* is the staging table or an
/// output of a stage before *n*, and that sanity-check stages declare no
/// outputs. Run before executing anything.
pub fn validate_plan(plan: &[Stage]) -> Result<(), PlanError> {
    let mut produced: Vec<&'static str> = vec![STAGING_TABLE];
    for stage in plan {
        for input in stage.inputs {
            if !produced.contains(input) {
                return Err(PlanError::UndeclaredInput {
                    script: stage.script,
                    input,
                });
            }
        }
        if stage.kind == StageKind::SanityCheck && !stage.outputs.is_empty() {
            return Err(PlanError::MutatingSanityStage {
                script: stage.script,
            });
        }
        produced.extend_from_slice(stage.outputs);
    }
    Ok(())
}

use std::path::{Path, PathBuf};

use cartlytics_duckdb::{loader, pipeline, Warehouse, WarehouseError};

const FIXTURE_CSV: &str = "\
Administrative,Administrative_Duration,Informational,Informational_Duration,ProductRelated,ProductRelated_Duration,BounceRates,ExitRates,PageValues,SpecialDay,Month,OperatingSystems,Browser,Region,TrafficType,VisitorType,Weekend,Revenue
0,0.0,0,0.0,1,0.0,0.2,0.2,0.0,0.0,Feb,1,1,1,1,Returning_Visitor,FALSE,FALSE
2,80.5,0,0.0,10,627.5,0.02,0.05,12.5,0.0,May,2,2,3,2,Returning_Visitor,FALSE,TRUE
1,7.0,1,120.0,31,3398.75,0.0,0.022,0.0,0.4,May,1,1,9,3,New_Visitor,TRUE,FALSE
0,0.0,0,0.0,2,37.0,0.0,0.1,0.0,0.8,Nov,3,2,1,4,Returning_Visitor,TRUE,TRUE
4,212.0,2,64.6,18,1452.2,0.01,0.025,53.9,0.0,Nov,2,4,2,2,Returning_Visitor,FALSE,FALSE
0,0.0,0,0.0,3,104.3,0.066,0.066,0.0,0.0,June,1,1,1,1,Other,FALSE,FALSE
0,0.0,0,0.0,0,0.0,0.2,0.2,0.0,0.0,Feb,1,1,1,1,Returning_Visitor,FALSE,FALSE
";

const FIXTURE_ROWS: i64 = 7;

fn sql_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../sql")
}

fn write_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("online_shoppers_intention.csv");
    std::fs::write(&path, FIXTURE_CSV).expect("write fixture csv");
    path
}

fn built_warehouse(dir: &Path) -> Warehouse {
    let warehouse = Warehouse::open_in_memory().expect("open warehouse");
    let csv = write_fixture(dir);
    loader::load_staging(&warehouse, &csv).expect("load staging");
    pipeline::run_pipeline(&warehouse, &sql_dir()).expect("run pipeline");
    warehouse
}

#[test]
fn load_rejects_missing_input() {
    let warehouse = Warehouse::open_in_memory().expect("open warehouse");
    let err = loader::load_staging(&warehouse, Path::new("/nonexistent/raw.csv"))
        .expect_err("absent file must fail");
    match err {
        WarehouseError::MissingInput { path } => {
            assert_eq!(path, Path::new("/nonexistent/raw.csv"));
        }
        other => panic!("expected MissingInput, got {other:?}"),
    }
    // The message points the operator at the setup instructions.
    let rendered = WarehouseError::MissingInput {
        path: PathBuf::from("/nonexistent/raw.csv"),
    }
    .to_string();
    assert!(rendered.contains("data/README.md"), "{rendered}");
}

#[test]
fn load_rejects_uncoercible_duration_values() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("bad.csv");
    std::fs::write(
        &path,
        "Administrative,Administrative_Duration,Weekend,Revenue\n1,n/a,FALSE,TRUE\n2,9.5,TRUE,FALSE\n",
    )
    .expect("write csv");

    let warehouse = Warehouse::open_in_memory().expect("open warehouse");
    let err = loader::load_staging(&warehouse, &path).expect_err("bad duration must fail");
    match err {
        WarehouseError::TypeCoercion { column, .. } => {
            assert_eq!(column, "administrative_duration");
        }
        other => panic!("expected TypeCoercion, got {other:?}"),
    }
}

#[test]
fn staging_normalizes_names_and_boolean_values() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let warehouse = Warehouse::open_in_memory().expect("open warehouse");
    let csv = write_fixture(tmp.path());
    let rows = loader::load_staging(&warehouse, &csv).expect("load staging");
    assert_eq!(rows, FIXTURE_ROWS as u64);

    let conn = warehouse.conn_for_test();
    // Canonical names: camelCase split, underscores preserved, lowercased.
    let non_binary: i64 = conn
        .prepare(
            "SELECT count(*) FROM stg_sessions_raw \
             WHERE weekend NOT IN (0, 1) OR revenue NOT IN (0, 1)",
        )
        .expect("prepare")
        .query_row([], |row| row.get(0))
        .expect("query");
    assert_eq!(non_binary, 0);

    let typed: i64 = conn
        .prepare(
            "SELECT count(*) FROM stg_sessions_raw \
             WHERE administrative_duration IS NOT NULL AND operating_systems IS NOT NULL",
        )
        .expect("prepare")
        .query_row([], |row| row.get(0))
        .expect("query");
    assert_eq!(typed, FIXTURE_ROWS);
}

#[test]
fn reload_replaces_staging_wholesale() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let warehouse = Warehouse::open_in_memory().expect("open warehouse");
    let csv = write_fixture(tmp.path());
    loader::load_staging(&warehouse, &csv).expect("first load");
    loader::load_staging(&warehouse, &csv).expect("second load");
    // Drop-and-rebuild, never merge: the count does not double.
    assert_eq!(
        warehouse.table_count("stg_sessions_raw").expect("count"),
        FIXTURE_ROWS
    );
}

#[test]
fn full_build_conserves_row_counts() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let warehouse = built_warehouse(tmp.path());
    assert_eq!(
        warehouse.table_count("stg_sessions_raw").expect("count"),
        FIXTURE_ROWS
    );
    assert_eq!(
        warehouse.table_count("fct_sessions").expect("count"),
        FIXTURE_ROWS
    );
}

#[test]
fn fact_foreign_keys_all_resolve() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let warehouse = built_warehouse(tmp.path());
    let conn = warehouse.conn_for_test();
    for (dim, key) in [
        ("dim_device", "device_id"),
        ("dim_geo", "geo_id"),
        ("dim_traffic", "traffic_id"),
        ("dim_visitor", "visitor_id"),
        ("dim_date", "date_id"),
    ] {
        let orphans: i64 = conn
            .prepare(&format!(
                "SELECT count(*) FROM fct_sessions f \
                 LEFT JOIN {dim} d ON d.{key} = f.{key} WHERE d.{key} IS NULL"
            ))
            .expect("prepare")
            .query_row([], |row| row.get(0))
            .expect("query");
        assert_eq!(orphans, 0, "orphan {key} rows against {dim}");
    }
}

#[test]
fn rebuild_is_idempotent() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let warehouse = Warehouse::open_in_memory().expect("open warehouse");
    let csv = write_fixture(tmp.path());
    let sql = sql_dir();

    let snapshot = |warehouse: &Warehouse| -> Vec<(String, i64)> {
        ["stg_sessions_raw", "dim_device", "dim_geo", "dim_traffic", "dim_visitor", "dim_date", "fct_sessions"]
            .iter()
            .map(|t| (t.to_string(), warehouse.table_count(t).expect("count")))
            .collect()
    };
    let month_mart = |warehouse: &Warehouse| -> Vec<(String, i64)> {
        warehouse
            .conn_for_test()
            .prepare("SELECT month_name, sessions FROM mart_conversion_by_month ORDER BY month_number")
            .expect("prepare")
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .expect("query")
            .collect::<Result<Vec<_>, _>>()
            .expect("rows")
    };

    loader::load_staging(&warehouse, &csv).expect("first load");
    pipeline::run_pipeline(&warehouse, &sql).expect("first run");
    let first_counts = snapshot(&warehouse);
    let first_mart = month_mart(&warehouse);

    loader::load_staging(&warehouse, &csv).expect("second load");
    pipeline::run_pipeline(&warehouse, &sql).expect("second run");
    assert_eq!(snapshot(&warehouse), first_counts);
    assert_eq!(month_mart(&warehouse), first_mart);
}

#[test]
fn pipeline_without_staging_fails_on_first_script() {
    let warehouse = Warehouse::open_in_memory().expect("open warehouse");
    let err = pipeline::run_pipeline(&warehouse, &sql_dir()).expect_err("must fail");
    match err {
        WarehouseError::ScriptExecution { script, .. } => {
            assert_eq!(script, "00_staging.sql");
        }
        other => panic!("expected ScriptExecution, got {other:?}"),
    }
}

#[test]
fn dimension_stage_alone_requires_staging() {
    // Running a later stage against an empty warehouse must surface a
    // ScriptExecution error naming that stage, never silently skip it.
    let warehouse = Warehouse::open_in_memory().expect("open warehouse");
    let err =
        pipeline::run_stage(&warehouse, &sql_dir(), "10_dimensions.sql").expect_err("must fail");
    match err {
        WarehouseError::ScriptExecution { script, .. } => {
            assert_eq!(script, "10_dimensions.sql");
        }
        other => panic!("expected ScriptExecution, got {other:?}"),
    }
}

#[test]
fn missing_script_halts_before_any_execution() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let warehouse = Warehouse::open_in_memory().expect("open warehouse");
    let csv = write_fixture(tmp.path());
    loader::load_staging(&warehouse, &csv).expect("load staging");

    let empty_sql_dir = tmp.path().join("sql");
    std::fs::create_dir_all(&empty_sql_dir).expect("mkdir");
    let err = pipeline::run_pipeline(&warehouse, &empty_sql_dir).expect_err("must fail");
    match err {
        WarehouseError::MissingScript { path } => {
            assert!(path.ends_with("00_staging.sql"), "{}", path.display());
        }
        other => panic!("expected MissingScript, got {other:?}"),
    }
    // Nothing ran: the staging view of stage 00 was never created.
    assert!(!warehouse.table_exists("stg_sessions").expect("exists"));
}

#[test]
fn sanity_check_catches_dangling_dimension_key() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let warehouse = built_warehouse(tmp.path());
    warehouse
        .conn_for_test()
        .execute("UPDATE fct_sessions SET device_id = 9999 WHERE session_id = 1", [])
        .expect("tamper");

    let err = pipeline::run_stage(&warehouse, &sql_dir(), "99_sanity_checks.sql")
        .expect_err("sanity stage must fail");
    match err {
        WarehouseError::SanityCheck { script, source } => {
            assert_eq!(script, "99_sanity_checks.sql");
            assert!(source.to_string().contains("orphan device_id"), "{source}");
        }
        other => panic!("expected SanityCheck, got {other:?}"),
    }
}

#[test]
fn sanity_check_catches_row_count_drift() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let warehouse = built_warehouse(tmp.path());
    warehouse
        .conn_for_test()
        .execute("DELETE FROM fct_sessions WHERE session_id = 1", [])
        .expect("tamper");

    let err = pipeline::run_stage(&warehouse, &sql_dir(), "99_sanity_checks.sql")
        .expect_err("sanity stage must fail");
    match err {
        WarehouseError::SanityCheck { source, .. } => {
            assert!(source.to_string().contains("row count mismatch"), "{source}");
        }
        other => panic!("expected SanityCheck, got {other:?}"),
    }
}

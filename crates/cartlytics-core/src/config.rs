#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: String,
    pub raw_csv_path: String,
    pub warehouse_path: String,
    pub sql_dir: String,
    pub artifacts_dir: String,
}

impl Config {
    /// Read configuration from `CARTLYTICS_*` environment variables,
    /// falling back to repository-relative defaults. Every value can also
    /// be overridden per invocation by a CLI flag.
    pub fn from_env() -> Self {
        let data_dir =
            std::env::var("CARTLYTICS_DATA_DIR").unwrap_or_else(|_| "./data".to_string());
        Self {
            raw_csv_path: std::env::var("CARTLYTICS_RAW_CSV")
                .unwrap_or_else(|_| format!("{data_dir}/online_shoppers_intention.csv")),
            warehouse_path: std::env::var("CARTLYTICS_WAREHOUSE_PATH")
                .unwrap_or_else(|_| "./warehouse.duckdb".to_string()),
            sql_dir: std::env::var("CARTLYTICS_SQL_DIR").unwrap_or_else(|_| "./sql".to_string()),
            artifacts_dir: std::env::var("CARTLYTICS_ARTIFACTS_DIR")
                .unwrap_or_else(|_| "./artifacts".to_string()),
            data_dir,
        }
    }
}

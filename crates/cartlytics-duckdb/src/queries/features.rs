//! The model-feature read contract.
//!
//! Training and evaluation both consume exactly this query. The join
//! graph, the projected columns, and their order are public contract:
//! changing any of them is a breaking schema change for downstream
//! consumers and must be versioned, not edited in place.

use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::warehouse::Warehouse;

/// Inner join of the fact table against all five dimensions on their
/// surrogate keys. Inner joins drop fact rows with unresolved dimension
/// references; the sanity-check stage guarantees none exist after a
/// successful build, so the row scope equals the fact table.
pub const FEATURE_QUERY: &str = "\
SELECT
    fct.administrative,
    fct.administrative_duration,
    fct.informational,
    fct.informational_duration,
    fct.product_related,
    fct.product_related_duration,
    fct.bounce_rates,
    fct.exit_rates,
    fct.page_values,
    fct.special_day,
    fct.total_pageviews,
    fct.total_duration,
    fct.avg_duration_per_page,
    dim_device.operating_systems,
    dim_device.browser,
    dim_geo.region,
    dim_traffic.traffic_type,
    dim_visitor.visitor_type,
    dim_date.month_name,
    dim_date.is_weekend,
    fct.converted
FROM fct_sessions fct
JOIN dim_device ON dim_device.device_id = fct.device_id
JOIN dim_geo ON dim_geo.geo_id = fct.geo_id
JOIN dim_traffic ON dim_traffic.traffic_id = fct.traffic_id
JOIN dim_visitor ON dim_visitor.visitor_id = fct.visitor_id
JOIN dim_date ON dim_date.date_id = fct.date_id";

/// One row of the feature table. Field order matches the projection in
/// [`FEATURE_QUERY`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub administrative: i64,
    pub administrative_duration: f64,
    pub informational: i64,
    pub informational_duration: f64,
    pub product_related: i64,
    pub product_related_duration: f64,
    pub bounce_rates: f64,
    pub exit_rates: f64,
    pub page_values: f64,
    pub special_day: f64,
    pub total_pageviews: i64,
    pub total_duration: f64,
    /// NULL for sessions with zero recorded pageviews.
    pub avg_duration_per_page: Option<f64>,
    pub operating_systems: i64,
    pub browser: i64,
    pub region: i64,
    pub traffic_type: i64,
    pub visitor_type: String,
    pub month_name: String,
    pub is_weekend: i64,
    pub converted: i64,
}

/// Fetch the full feature table.
pub fn fetch_features(warehouse: &Warehouse) -> Result<Vec<FeatureRow>> {
    let mut stmt = warehouse.conn.prepare(FEATURE_QUERY)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(FeatureRow {
                administrative: row.get(0)?,
                administrative_duration: row.get(1)?,
                informational: row.get(2)?,
                informational_duration: row.get(3)?,
                product_related: row.get(4)?,
                product_related_duration: row.get(5)?,
                bounce_rates: row.get(6)?,
                exit_rates: row.get(7)?,
                page_values: row.get(8)?,
                special_day: row.get(9)?,
                total_pageviews: row.get(10)?,
                total_duration: row.get(11)?,
                avg_duration_per_page: row.get(12)?,
                operating_systems: row.get(13)?,
                browser: row.get(14)?,
                region: row.get(15)?,
                traffic_type: row.get(16)?,
                visitor_type: row.get(17)?,
                month_name: row.get(18)?,
                is_weekend: row.get(19)?,
                converted: row.get(20)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Write the feature table to a CSV file with a header row. Returns the
/// number of data rows written.
pub fn export_features(warehouse: &Warehouse, output: &Path) -> Result<u64> {
    let rows = fetch_features(warehouse)?;
    let mut writer = csv::Writer::from_path(output)?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    tracing::info!(rows = rows.len(), path = %output.display(), "feature table exported");
    Ok(rows.len() as u64)
}

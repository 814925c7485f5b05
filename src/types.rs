use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read {dataset} csv: {source}")]
    Csv {
        dataset: &'static str,
        #[source]
        source: csv::Error,
    },
    #[error("failed to write {path}: {source}")]
    CsvWrite {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("{dataset} csv is missing required column '{column}'")]
    MissingColumn {
        dataset: &'static str,
        column: &'static str,
    },
    #[error("no valid data found. Dealers: {dealers}, Deals: {deals}, Users: {users}, Deals Full: {deals_full}")]
    EmptyDataset {
        users: usize,
        dealers: usize,
        deals: usize,
        deals_full: usize,
    },
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

// Raw CSV rows. Every field is optional with a default so a missing column
// surfaces as `None` per row; required-column enforcement happens once
// against the header in the loader.

#[derive(Debug, Deserialize)]
pub struct RawUserRow {
    #[serde(default)]
    pub userid: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "createEpoch")]
    pub create_epoch: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawDealerRow {
    #[serde(default, rename = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub coname: Option<String>,
    #[serde(default)]
    pub phone_no: Option<String>,
    #[serde(default)]
    pub addr1: Option<String>,
    #[serde(default)]
    pub addr2: Option<String>,
    #[serde(default)]
    pub landmark: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
    #[serde(default)]
    pub lat: Option<String>,
    #[serde(default, rename = "long")]
    pub lon: Option<String>,
    #[serde(default)]
    pub cat_disp_names: Option<String>,
    #[serde(default)]
    pub subcat_disp_names: Option<String>,
    #[serde(default, rename = "Imgurl")]
    pub img_url: Option<String>,
}

// The deal exports are flattened document dumps; the embedded dealer
// reference arrives as dotted columns.
#[derive(Debug, Deserialize)]
pub struct RawDealRow {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_pincode: Option<String>,
    #[serde(default)]
    pub req_qty: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, rename = "dealerinfo.coname")]
    pub dealer_coname: Option<String>,
    #[serde(default, rename = "dealerinfo.dealer_id")]
    pub dealer_id: Option<String>,
}

// Cleaned records. Coordinates are always concrete; rows that could not be
// resolved never survive loading.

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: String,
    pub pincode: Option<String>,
    pub city: String,
    pub name: String,
    pub phone: String,
    pub create_epoch: Option<i64>,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone)]
pub struct DealerRecord {
    pub id: String,
    pub coname: String,
    pub phone_no: String,
    pub addr1: String,
    pub addr2: String,
    pub landmark: String,
    pub city: String,
    pub pincode: String,
    pub latitude: f64,
    pub longitude: f64,
    pub cat_disp_names: String,
    pub subcat_disp_names: String,
    pub img_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DealRecord {
    pub user_id: String,
    pub user_name: String,
    pub pincode: Option<String>,
    pub city: String,
    pub req_qty: f64,
    pub created_at: Option<NaiveDateTime>,
    pub dealer_coname: Option<String>,
    pub dealer_id: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

/// The dashboard's headline numbers, written to `summary.json`.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub total_users: usize,
    pub total_visits: usize,
    pub new_users: usize,
    pub active_users: usize,
    pub total_deals: usize,
    pub unique_deals: usize,
    pub new_user_deal_ratio: f64,
    pub response_ratio: f64,
}

/// One metric card for the console preview.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct MetricCardRow {
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

// Lookup result rows, previewed with `tabled` and exported with `csv`.

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct DealOnDateRow {
    pub user_id: String,
    pub user_name: String,
    pub pincode: String,
    pub req_qty: f64,
    pub deal_date: String,
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct DealerDirectoryRow {
    pub coname: String,
    pub pincode: String,
    pub phone_no: String,
    pub cat_disp_names: String,
    pub subcat_disp_names: String,
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct PincodeDealRow {
    pub user_id: String,
    pub user_name: String,
    pub dealer_name: String,
    pub pincode: String,
    pub req_qty: f64,
    pub deal_date: String,
}

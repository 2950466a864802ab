use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Columns every inventory row must carry.
pub const STOCK_NUMBER_COLUMN: &str = "stock_number";
const YEAR_COLUMN: &str = "year";
const MAKE_COLUMN: &str = "make";
const MODEL_COLUMN: &str = "model";
const TRIM_COLUMN: &str = "Trim";
const DRIVETRAIN_COLUMN: &str = "drivetrain";
const MILEAGE_COLUMN: &str = "mileage.value";
const TRANSMISSION_COLUMN: &str = "transmission";

/// One inventory record keyed by the CSV header names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryRow {
    fields: HashMap<String, String>,
}

impl InventoryRow {
    pub fn new(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn stock_number(&self) -> Option<&str> {
        self.get(STOCK_NUMBER_COLUMN)
    }

    fn required(&self, column: &str) -> anyhow::Result<String> {
        self.get(column)
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Inventory row is missing column '{}'", column))
    }
}

impl FromIterator<(String, String)> for InventoryRow {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Vehicle attributes returned by `/lookup` and embedded in `/generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub year: String,
    pub make: String,
    pub model: String,
    pub trim: String,
    pub drivetrain: String,
    pub mileage: String,
    pub transmission: String,
}

impl VehicleRecord {
    pub fn from_row(row: &InventoryRow) -> anyhow::Result<Self> {
        Ok(Self {
            year: row.required(YEAR_COLUMN)?,
            make: row.required(MAKE_COLUMN)?,
            model: row.required(MODEL_COLUMN)?,
            trim: row.get(TRIM_COLUMN).unwrap_or_default().to_string(),
            drivetrain: row.required(DRIVETRAIN_COLUMN)?,
            mileage: row.required(MILEAGE_COLUMN)?,
            transmission: row.required(TRANSMISSION_COLUMN)?,
        })
    }

    /// Drivetrain is only worth advertising for all- and four-wheel drive.
    pub fn advertises_drivetrain(&self) -> bool {
        matches!(
            self.drivetrain.trim().to_lowercase().as_str(),
            "awd" | "4wd"
        )
    }
}

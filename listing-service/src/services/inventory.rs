//! Inventory loading and stock-number resolution.
//!
//! The CSV is fetched and parsed on every call; nothing is cached between
//! requests so each response reflects the latest uploaded inventory.

use crate::config::{InventoryConfig, StockMatch};
use crate::models::{InventoryRow, VehicleRecord};
use crate::services::BlobStore;
use anyhow::Context;
use service_core::error::AppError;

/// Fetch the configured inventory object and parse it into rows.
pub async fn load_inventory(
    store: &dyn BlobStore,
    config: &InventoryConfig,
) -> Result<Vec<InventoryRow>, AppError> {
    let bucket = required_setting(config.bucket.as_deref(), "BUCKET_NAME")?;
    let key = required_setting(config.key.as_deref(), "CSV_KEY")?;

    let bytes = store.get_object(bucket, key).await?;
    let rows = parse_inventory(&bytes)
        .with_context(|| format!("Failed to parse inventory {}/{}", bucket, key))?;

    tracing::debug!(rows = rows.len(), key = %key, "Loaded inventory");
    Ok(rows)
}

fn required_setting<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, AppError> {
    value.ok_or_else(|| AppError::ConfigError(anyhow::anyhow!("{} is not set", name)))
}

/// Parse UTF-8 CSV with a header row into header-keyed rows.
pub fn parse_inventory(bytes: &[u8]) -> anyhow::Result<Vec<InventoryRow>> {
    let text = std::str::from_utf8(bytes).context("Inventory is not valid UTF-8")?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers().context("Failed to read CSV header")?.clone();

    reader
        .records()
        .map(|record| -> anyhow::Result<InventoryRow> {
            let record = record.context("Malformed CSV record")?;
            Ok(headers
                .iter()
                .zip(record.iter())
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect())
        })
        .collect()
}

/// First row, in file order, whose stock number matches.
pub fn find_row<'a>(
    rows: &'a [InventoryRow],
    stock_number: &str,
    mode: StockMatch,
) -> Option<&'a InventoryRow> {
    rows.iter().find(|row| {
        row.stock_number()
            .is_some_and(|candidate| mode.matches(candidate, stock_number))
    })
}

/// Load the inventory and project the matching row, or `NotFound`.
pub async fn resolve_vehicle(
    store: &dyn BlobStore,
    config: &InventoryConfig,
    stock_number: &str,
) -> Result<VehicleRecord, AppError> {
    let rows = load_inventory(store, config).await?;

    let outcome = match find_row(&rows, stock_number, config.stock_match) {
        Some(row) => Ok(VehicleRecord::from_row(row)?),
        None => Err(AppError::not_found("Stock not found")),
    };

    metrics::counter!(
        "inventory_lookups_total",
        "outcome" => if outcome.is_ok() { "found" } else { "not_found" }
    )
    .increment(1);

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
stock_number,year,make,model,Trim,drivetrain,mileage.value,transmission
A100,2021,Subaru,Outback,Limited,AWD,32000,Automatic
b200,2019,Honda,Civic,EX,FWD,54000,CVT
A100,2010,Ford,Focus,SE,FWD,120000,Manual
";

    #[test]
    fn parses_header_keyed_rows() {
        let rows = parse_inventory(CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].get("make"), Some("Honda"));
        assert_eq!(rows[1].get("mileage.value"), Some("54000"));
    }

    #[test]
    fn handles_quoted_fields() {
        let csv = "stock_number,model\nQ1,\"Model, With Comma\"\n";
        let rows = parse_inventory(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].get("model"), Some("Model, With Comma"));
    }

    #[test]
    fn rejects_invalid_utf8() {
        let err = parse_inventory(&[0x73, 0xff, 0xfe]).unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn first_match_wins() {
        let rows = parse_inventory(CSV.as_bytes()).unwrap();
        let row = find_row(&rows, "A100", StockMatch::Exact).unwrap();
        assert_eq!(row.get("make"), Some("Subaru"));
    }

    #[test]
    fn exact_mode_is_case_sensitive() {
        let rows = parse_inventory(CSV.as_bytes()).unwrap();
        assert!(find_row(&rows, "B200", StockMatch::Exact).is_none());
        assert!(find_row(&rows, "b200", StockMatch::Exact).is_some());
    }

    #[test]
    fn case_insensitive_mode() {
        let rows = parse_inventory(CSV.as_bytes()).unwrap();
        let row = find_row(&rows, "B200", StockMatch::CaseInsensitive).unwrap();
        assert_eq!(row.get("model"), Some("Civic"));
        assert!(find_row(&rows, "a100", StockMatch::CaseInsensitive).is_some());
    }

    #[test]
    fn unset_setting_is_config_error() {
        let err = required_setting(None, "CSV_KEY").unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
        assert!(err.to_string().contains("CSV_KEY"));
        assert_eq!(required_setting(Some("cars.csv"), "CSV_KEY").unwrap(), "cars.csv");
    }

    #[test]
    fn missing_stock_is_none() {
        let rows = parse_inventory(CSV.as_bytes()).unwrap();
        assert!(find_row(&rows, "Z999", StockMatch::Exact).is_none());
    }
}

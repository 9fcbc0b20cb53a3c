//! Data loading for CSV and JSON record sets
//!
//! Column names follow the usual export headers ("Total Revenue", ...),
//! snake_case names are accepted as well. Extra columns are ignored.

use crate::error::LoadError;
use crate::models::{DataFormat, FinancialRecord};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Company,
    Year,
    TotalRevenue,
    NetIncome,
    TotalAssets,
    TotalLiabilities,
    OperatingCashFlow,
}

impl Column {
    const ALL: [Column; 7] = [
        Column::Company,
        Column::Year,
        Column::TotalRevenue,
        Column::NetIncome,
        Column::TotalAssets,
        Column::TotalLiabilities,
        Column::OperatingCashFlow,
    ];

    fn header(self) -> &'static str {
        match self {
            Column::Company => "Company",
            Column::Year => "Year",
            Column::TotalRevenue => "Total Revenue",
            Column::NetIncome => "Net Income",
            Column::TotalAssets => "Total Assets",
            Column::TotalLiabilities => "Total Liabilities",
            Column::OperatingCashFlow => "Cash Flow from Operating Activities",
        }
    }

    fn alias(self) -> &'static str {
        match self {
            Column::Company => "company",
            Column::Year => "year",
            Column::TotalRevenue => "total_revenue",
            Column::NetIncome => "net_income",
            Column::TotalAssets => "total_assets",
            Column::TotalLiabilities => "total_liabilities",
            Column::OperatingCashFlow => "operating_cash_flow",
        }
    }

    fn matches(self, name: &str) -> bool {
        let name = name.trim();
        name.eq_ignore_ascii_case(self.header()) || name.eq_ignore_ascii_case(self.alias())
    }
}

/// Parse a record set from raw bytes
pub fn load_bytes(bytes: &[u8], format: DataFormat) -> Result<Vec<FinancialRecord>, LoadError> {
    let records = match format {
        DataFormat::Csv => parse_csv(bytes)?,
        DataFormat::Json => parse_json(bytes)?,
    };

    if records.is_empty() {
        return Err(LoadError::Empty);
    }

    debug!(count = records.len(), ?format, "Parsed record set");
    Ok(records)
}

/// Read and parse a record set from disk
pub fn load_path(path: &Path, format: DataFormat) -> Result<Vec<FinancialRecord>, LoadError> {
    let bytes = std::fs::read(path)
        .map_err(|e| LoadError::Unreadable(format!("{}: {}", path.display(), e)))?;
    load_bytes(&bytes, format)
}

/// Built-in demo dataset: three companies over three years
pub fn sample_dataset() -> Vec<FinancialRecord> {
    const ROWS: [(&str, i32, f64, f64, f64, f64, f64); 9] = [
        ("Apple", 2021, 365817.0, 94680.0, 351002.0, 287912.0, 104038.0),
        ("Microsoft", 2021, 168088.0, 61271.0, 364840.0, 185768.0, 76740.0),
        ("Tesla", 2021, 53823.0, 5519.0, 62131.0, 30590.0, 11497.0),
        ("Apple", 2022, 394328.0, 99803.0, 352755.0, 290915.0, 122151.0),
        ("Microsoft", 2022, 198270.0, 72738.0, 388588.0, 193244.0, 89035.0),
        ("Tesla", 2022, 81462.0, 12556.0, 82338.0, 36477.0, 14724.0),
        ("Apple", 2023, 383285.0, 96995.0, 358547.0, 287912.0, 110543.0),
        ("Microsoft", 2023, 211915.0, 67718.0, 403162.0, 195244.0, 81869.0),
        ("Tesla", 2023, 96773.0, 14837.0, 112237.0, 45293.0, 13285.0),
    ];

    ROWS.iter()
        .map(|&(company, year, revenue, income, assets, liabilities, cash_flow)| FinancialRecord {
            company: company.to_string(),
            year,
            total_revenue: revenue,
            net_income: income,
            total_assets: assets,
            total_liabilities: liabilities,
            operating_cash_flow: cash_flow,
        })
        .collect()
}

/// Render records as CSV using the export headers
pub fn records_to_csv(records: &[FinancialRecord]) -> Result<Vec<u8>, LoadError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(Column::ALL.iter().map(|c| c.header()))
        .map_err(|e| LoadError::Csv(e.to_string()))?;

    for r in records {
        writer
            .write_record([
                r.company.clone(),
                r.year.to_string(),
                r.total_revenue.to_string(),
                r.net_income.to_string(),
                r.total_assets.to_string(),
                r.total_liabilities.to_string(),
                r.operating_cash_flow.to_string(),
            ])
            .map_err(|e| LoadError::Csv(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| LoadError::Csv(e.to_string()))
}

// =============================
// CSV
// =============================

fn parse_csv(bytes: &[u8]) -> Result<Vec<FinancialRecord>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| LoadError::Csv(e.to_string()))?
        .clone();

    let mut indices = [0usize; 7];
    for (slot, column) in indices.iter_mut().zip(Column::ALL) {
        *slot = headers
            .iter()
            .position(|h| column.matches(h))
            .ok_or(LoadError::MissingColumn(column.header()))?;
    }

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.map_err(|e| LoadError::Csv(e.to_string()))?;
        let field = |column: Column| record.get(indices[column as usize]).unwrap_or("");

        let company = field(Column::Company);
        if company.is_empty() {
            return Err(invalid(row, Column::Company, company));
        }

        records.push(FinancialRecord {
            company: company.to_string(),
            year: parse_year(field(Column::Year), row)?,
            total_revenue: parse_number(field(Column::TotalRevenue), row, Column::TotalRevenue)?,
            net_income: parse_number(field(Column::NetIncome), row, Column::NetIncome)?,
            total_assets: parse_number(field(Column::TotalAssets), row, Column::TotalAssets)?,
            total_liabilities: parse_number(
                field(Column::TotalLiabilities),
                row,
                Column::TotalLiabilities,
            )?,
            operating_cash_flow: parse_number(
                field(Column::OperatingCashFlow),
                row,
                Column::OperatingCashFlow,
            )?,
        });
    }

    Ok(records)
}

fn invalid(row: usize, column: Column, value: &str) -> LoadError {
    LoadError::InvalidValue {
        row,
        column: column.header(),
        value: value.to_string(),
    }
}

fn parse_number(text: &str, row: usize, column: Column) -> Result<f64, LoadError> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| invalid(row, column, text))
}

fn parse_year(text: &str, row: usize) -> Result<i32, LoadError> {
    let text = text.trim();
    if let Ok(year) = text.parse::<i32>() {
        return Ok(year);
    }

    // Dataframe exports sometimes write integral columns as "2021.0"
    match text.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v.abs() <= i32::MAX as f64 => Ok(v as i32),
        _ => Err(invalid(row, Column::Year, text)),
    }
}

// =============================
// JSON
// =============================

fn parse_json(bytes: &[u8]) -> Result<Vec<FinancialRecord>, LoadError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| LoadError::Json(e.to_string()))?;

    let rows = match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(row, item)| match item {
                Value::Object(map) => Ok(map),
                other => Err(LoadError::Json(format!(
                    "row {} is not an object: {}",
                    row, other
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Value::Object(columns) => rows_from_columns(&columns)?,
        other => {
            return Err(LoadError::Json(format!(
                "expected an array of rows or an object of columns, got {}",
                other
            )))
        }
    };

    rows.iter()
        .enumerate()
        .map(|(row, map)| record_from_row(map, row))
        .collect()
}

/// Pivot `{column: {index: value}}` or `{column: [values]}` into row objects
fn rows_from_columns(columns: &Map<String, Value>) -> Result<Vec<Map<String, Value>>, LoadError> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<(String, Map<String, Value>)> = Vec::new();

    for (name, column) in columns {
        match column {
            Value::Object(by_index) => {
                for (key, value) in by_index {
                    place(&mut slots, &mut rows, key, name, value);
                }
            }
            Value::Array(values) => {
                for (i, value) in values.iter().enumerate() {
                    place(&mut slots, &mut rows, &i.to_string(), name, value);
                }
            }
            other => {
                return Err(LoadError::Json(format!(
                    "column '{}' is not an object or array: {}",
                    name, other
                )))
            }
        }
    }

    // Index keys are strings; order them numerically where possible
    rows.sort_by_cached_key(|(k, _)| (k.parse::<u64>().unwrap_or(u64::MAX), k.clone()));

    Ok(rows.into_iter().map(|(_, row)| row).collect())
}

fn place(
    slots: &mut HashMap<String, usize>,
    rows: &mut Vec<(String, Map<String, Value>)>,
    key: &str,
    name: &str,
    value: &Value,
) {
    let slot = match slots.get(key) {
        Some(&slot) => slot,
        None => {
            rows.push((key.to_string(), Map::new()));
            slots.insert(key.to_string(), rows.len() - 1);
            rows.len() - 1
        }
    };
    rows[slot].1.insert(name.to_string(), value.clone());
}

fn lookup<'a>(row: &'a Map<String, Value>, column: Column) -> Option<&'a Value> {
    row.iter()
        .find(|(k, _)| column.matches(k))
        .map(|(_, v)| v)
}

fn json_number(row: &Map<String, Value>, idx: usize, column: Column) -> Result<f64, LoadError> {
    match lookup(row, column) {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| invalid(idx, column, &n.to_string())),
        Some(Value::String(s)) => parse_number(s, idx, column),
        Some(other) => Err(invalid(idx, column, &other.to_string())),
        None => Err(LoadError::MissingColumn(column.header())),
    }
}

fn record_from_row(row: &Map<String, Value>, idx: usize) -> Result<FinancialRecord, LoadError> {
    let company = match lookup(row, Column::Company) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => return Err(invalid(idx, Column::Company, &other.to_string())),
        None => return Err(LoadError::MissingColumn(Column::Company.header())),
    };

    let year = match lookup(row, Column::Year) {
        Some(Value::Number(n)) => parse_year(&n.to_string(), idx)?,
        Some(Value::String(s)) => parse_year(s, idx)?,
        Some(other) => return Err(invalid(idx, Column::Year, &other.to_string())),
        None => return Err(LoadError::MissingColumn(Column::Year.header())),
    };

    Ok(FinancialRecord {
        company,
        year,
        total_revenue: json_number(row, idx, Column::TotalRevenue)?,
        net_income: json_number(row, idx, Column::NetIncome)?,
        total_assets: json_number(row, idx, Column::TotalAssets)?,
        total_liabilities: json_number(row, idx, Column::TotalLiabilities)?,
        operating_cash_flow: json_number(row, idx, Column::OperatingCashFlow)?,
    })
}

//! CSV ingest for sales files.
//!
//! Turns a sales export into typed `SalesRecord`s. The schema is strict: a
//! missing column or a single unparseable row rejects the whole file, so a
//! report is never built from partial data.
//!
//! Exports from spreadsheet tools are often Latin-1 rather than UTF-8, so
//! bytes that are not valid UTF-8 are decoded as Latin-1.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::{SalesRecord, YearMonth};
use crate::error::PipelineError;

pub const COL_ORDER_DATE: &str = "order date";
pub const COL_REGION: &str = "region";
pub const COL_CATEGORY: &str = "category";
pub const COL_SALES: &str = "sales";

const REQUIRED_COLUMNS: [&str; 4] = [COL_ORDER_DATE, COL_REGION, COL_CATEGORY, COL_SALES];

/// Read and parse a sales file from disk.
pub fn load_sales_records(path: &Path) -> Result<Vec<SalesRecord>, PipelineError> {
    let bytes = std::fs::read(path).map_err(|e| PipelineError::file_load(path, e.to_string()))?;
    let text = decode_text(bytes);
    parse_sales_csv(path, &text)
}

/// Parse already-decoded CSV text. `path` is only used for error messages.
pub fn parse_sales_csv(path: &Path, text: &str) -> Result<Vec<SalesRecord>, PipelineError> {
    if text.trim().is_empty() {
        return Err(PipelineError::parse(path, "File is empty."));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::parse(path, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(path, &header_map)?;

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // records() starts on the line after the header, and lines are 1-based.
        let line = idx + 2;
        let record =
            result.map_err(|e| PipelineError::parse(path, format!("line {line}: CSV parse error: {e}")))?;
        if is_blank(&record) {
            continue;
        }
        let row = parse_row(&record, &header_map).map_err(|e| PipelineError::parse(path, format!("line {line}: {e}")))?;
        records.push(row);
    }

    if records.is_empty() {
        return Err(PipelineError::parse(path, "No data rows found."));
    }

    Ok(records)
}

fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => match text.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => text,
        },
        // Latin-1 maps each byte to the code point of the same value.
        Err(err) => err.into_bytes().into_iter().map(char::from).collect(),
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(path: &Path, header_map: &HashMap<String, usize>) -> Result<(), PipelineError> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !header_map.contains_key(*col))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    let names: Vec<String> = missing.iter().map(|c| format!("`{c}`")).collect();
    Err(PipelineError::parse(
        path,
        format!("Missing required column(s): {}", names.join(", ")),
    ))
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<SalesRecord, String> {
    let order_date = parse_date(get_required(record, header_map, COL_ORDER_DATE)?)?;
    let region = get_required(record, header_map, COL_REGION)?.to_string();
    let category = get_required(record, header_map, COL_CATEGORY)?.to_string();
    let sales = parse_amount(get_required(record, header_map, COL_SALES)?)?;

    Ok(SalesRecord {
        order_date,
        month: YearMonth::from_date(order_date),
        region,
        category,
        sales,
    })
}

/// Fetch a field by column name. The value is returned untouched so grouping
/// keys stay exact; only emptiness is checked on the trimmed form.
fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // Order dates are day-first. A time component ("08/11/2016 00:00") is ignored.
    const FMTS: [&str; 5] = ["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%d/%m/%y", "%Y-%m-%d"];
    let date_part = s.split_whitespace().next().unwrap_or("");
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(date_part, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid order date '{s}'. Expected one of: DD/MM/YYYY, DD-MM-YYYY, DD.MM.YYYY, DD/MM/YY, YYYY-MM-DD."
    ))
}

fn parse_amount(s: &str) -> Result<f64, String> {
    let v = s
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid sales amount '{s}'."))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("Non-finite sales amount '{s}'."))
    }
}

//! CSV ingest and normalization.
//!
//! This module is responsible for turning a two-column `(date, value)` CSV into
//! an ordered, month-resolution series that is safe to smooth and join.
//!
//! Design goals:
//! - **Strict schema** for required fields (clear errors + exit code 2)
//! - **Forgiving gaps**: rows with an empty cell are skipped and counted
//! - **Deterministic behavior** (sorted output, duplicates rejected)
//! - **Separation of concerns**: no smoothing logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use csv::StringRecord;
use tracing::{debug, warn};

use crate::domain::{SeriesKind, TimeSeriesRow};
use crate::error::AppError;

/// Load one series from a CSV file on disk.
pub fn load_series(path: &Path, kind: SeriesKind) -> Result<Vec<TimeSeriesRow>, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::input(format!(
            "Failed to open {} CSV '{}': {e}",
            kind.display_name(),
            path.display()
        ))
    })?;

    let rows = read_series(file, kind, &path.display().to_string())?;
    debug!(path = %path.display(), rows = rows.len(), series = kind.display_name(), "loaded series");
    Ok(rows)
}

/// Parse one series from any reader. `source` is only used in error messages.
pub fn read_series<R: Read>(reader: R, kind: SeriesKind, source: &str) -> Result<Vec<TimeSeriesRow>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("{source}: failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    let (date_idx, value_idx) = resolve_columns(&headers, &header_map, kind, source)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;

        let record = result.map_err(|e| AppError::input(format!("{source}: line {line}: CSV parse error: {e}")))?;

        let (Some(date_raw), Some(value_raw)) = (get_cell(&record, date_idx), get_cell(&record, value_idx)) else {
            skipped += 1;
            continue;
        };

        let date = parse_month(date_raw).map_err(|e| AppError::input(format!("{source}: line {line}: {e}")))?;
        let value = parse_value(value_raw).map_err(|e| AppError::input(format!("{source}: line {line}: {e}")))?;

        rows.push(TimeSeriesRow { date, value });
    }

    if skipped > 0 {
        warn!(source, skipped, "skipped rows with an empty date or value");
    }

    if rows.is_empty() {
        return Err(AppError::data(format!(
            "{source}: no usable {} rows.",
            kind.display_name()
        )));
    }

    rows.sort_by_key(|r| r.date);

    if let Some(dup) = rows.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(AppError::input(format!(
            "{source}: duplicate month {} in {} series.",
            dup[0].date.format("%Y-%m"),
            kind.display_name()
        )));
    }

    Ok(rows)
}

/// Parse a month-resolution date and normalize it to the first of the month.
///
/// Accepts `YYYY-MM`, `YYYY/MM`, `YYYY-MM-DD`, `YYYY/MM/DD` and `DD/MM/YYYY`.
/// A trailing time component (`2000-01-01T00:00:00`, `2000-01-01 00:00:00`) is ignored.
pub fn parse_month(s: &str) -> Result<NaiveDate, String> {
    let s = s.trim();
    let day_part = s.split(['T', ' ']).next().unwrap_or(s);

    const FULL: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];
    for fmt in FULL {
        if let Ok(d) = NaiveDate::parse_from_str(day_part, fmt) {
            return first_of_month(d.year(), d.month());
        }
    }

    // chrono cannot parse a date without a day, so pin it to the 1st.
    const MONTH_ONLY: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
    let sep = if day_part.contains('/') { '/' } else { '-' };
    let padded = format!("{day_part}{sep}01");
    for fmt in MONTH_ONLY {
        if let Ok(d) = NaiveDate::parse_from_str(&padded, fmt) {
            return first_of_month(d.year(), d.month());
        }
    }

    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM, YYYY-MM-DD, YYYY/MM, YYYY/MM/DD, DD/MM/YYYY."
    ))
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate, String> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| format!("Invalid month {year}-{month:02}."))
}

fn parse_value(s: &str) -> Result<f64, String> {
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid numeric value '{s}'."))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("Non-finite value '{s}'."))
    }
}

fn resolve_columns(
    headers: &StringRecord,
    header_map: &HashMap<String, usize>,
    kind: SeriesKind,
    source: &str,
) -> Result<(usize, usize), AppError> {
    let date_idx = *header_map
        .get("date")
        .ok_or_else(|| AppError::input(format!("{source}: missing required column: `date`")))?;

    if let Some(&idx) = header_map.get(kind.value_column()) {
        return Ok((date_idx, idx));
    }

    // A plain two-column file: whatever is not the date is the value.
    if headers.len() == 2 {
        return Ok((date_idx, 1 - date_idx));
    }

    Err(AppError::input(format!(
        "{source}: missing required column: `{}`",
        kind.value_column()
    )))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, `date` is reported as missing.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_cell(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

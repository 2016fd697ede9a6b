//! Loading the historical SAIDI series from CSV.
//!
//! The file needs a header row. The date column is `Fecha` or `date`
//! (any case), otherwise the first column. The value column is `SAIDI`,
//! otherwise `SAIDI Histórico`. Rows whose value is blank or `NaN` are the
//! months the analysis has to predict.

use crate::core::TimeSeries;
use crate::error::SearchError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use log::{debug, info};
use std::fs::File;
use std::io;
use std::path::Path;

const DATE_COLUMNS: [&str; 2] = ["fecha", "date"];
const VALUE_COLUMNS: [&str; 2] = ["saidi", "saidi histórico"];

/// A loaded SAIDI file split into observed history and months to predict.
#[derive(Debug, Clone, PartialEq)]
pub struct SaidiData {
    /// Observed values in date order.
    pub history: TimeSeries,
    /// Dates whose value is missing, in date order.
    pub missing: Vec<DateTime<Utc>>,
}

impl SaidiData {
    /// Whether there is anything to predict.
    pub fn has_missing(&self) -> bool {
        !self.missing.is_empty()
    }
}

/// Load a SAIDI CSV file.
pub fn load_csv(path: impl AsRef<Path>) -> Result<SaidiData, SearchError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| {
        SearchError::Input(format!("cannot open {}: {err}", path.display()))
    })?;
    let data = read_csv(file)?;
    info!(
        "loaded {} observations and {} missing months from {}",
        data.history.len(),
        data.missing.len(),
        path.display()
    );
    Ok(data)
}

/// Parse SAIDI CSV content from any reader.
pub fn read_csv<R: io::Read>(reader: R) -> Result<SaidiData, SearchError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let date_idx = find_column(&headers, &DATE_COLUMNS).unwrap_or(0);
    let value_idx = find_column(&headers, &VALUE_COLUMNS).ok_or_else(|| {
        SearchError::Input("no 'SAIDI' or 'SAIDI Histórico' column found".to_string())
    })?;
    debug!(
        "date column '{}', value column '{}'",
        headers.get(date_idx).unwrap_or_default(),
        headers.get(value_idx).unwrap_or_default()
    );

    let mut rows: Vec<(DateTime<Utc>, Option<f64>)> = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        // Header is line 1
        let row = line + 2;
        let raw_date = record.get(date_idx).unwrap_or_default();
        if raw_date.is_empty() && record.iter().all(str::is_empty) {
            continue;
        }
        let date = parse_date(raw_date).ok_or_else(|| {
            SearchError::Input(format!("row {row}: unrecognized date '{raw_date}'"))
        })?;
        let value = parse_value(record.get(value_idx).unwrap_or_default()).ok_or_else(|| {
            SearchError::Input(format!(
                "row {row}: value '{}' is not a number",
                record.get(value_idx).unwrap_or_default()
            ))
        })?;
        rows.push((date, value));
    }

    rows.sort_by_key(|(date, _)| *date);

    let mut timestamps = Vec::with_capacity(rows.len());
    let mut values = Vec::with_capacity(rows.len());
    let mut missing = Vec::new();
    for (date, value) in rows {
        match value {
            Some(v) => {
                timestamps.push(date);
                values.push(v);
            }
            None => missing.push(date),
        }
    }

    let label = headers.get(value_idx).unwrap_or("SAIDI").to_string();
    let history = TimeSeries::univariate(timestamps, values)?.with_label(label);
    Ok(SaidiData { history, missing })
}

fn find_column(headers: &csv::StringRecord, candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|candidate| {
        headers
            .iter()
            .position(|h| h.trim().to_lowercase() == *candidate)
    })
}

/// Parse a date in one of the accepted layouts: `YYYY-MM-DD`,
/// `YYYY-MM-DD HH:MM:SS`, `YYYY-MM` or `DD/MM/YYYY`.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
                .or_else(|_| NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d"))
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
    Some(Utc.from_utc_datetime(&naive))
}

/// `Some(None)` for a missing value, `None` for text that is not a number.
fn parse_value(raw: &str) -> Option<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Some(None);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(Some(v)),
        Ok(_) => Some(None),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn splits_history_and_missing_months() {
        let csv = "Fecha,SAIDI\n\
                   2024-01-01,12.5\n\
                   2024-02-01,10.1\n\
                   2024-03-01,\n\
                   2024-04-01,NaN\n";
        let data = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(data.history.primary_values(), &[12.5, 10.1]);
        assert_eq!(data.missing.len(), 2);
        assert_eq!(data.missing[0].month(), 3);
        assert_eq!(data.missing[1].month(), 4);
        assert!(data.has_missing());
        assert_eq!(data.history.label(), Some("SAIDI"));
    }

    #[test]
    fn column_detection_is_case_insensitive() {
        let csv = "region,DATE,saidi histórico\nnorth,2023-05,4.0\nnorth,2023-06,5.0\n";
        let data = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(data.history.len(), 2);
        assert!(!data.has_missing());
        assert_eq!(data.history.timestamps()[0].month(), 5);
    }

    #[test]
    fn first_column_is_date_by_default() {
        let csv = "mes,SAIDI\n15/01/2022,3.0\n15/02/2022,4.0\n";
        let data = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(data.history.timestamps()[1].day(), 15);
        assert_eq!(data.history.timestamps()[1].month(), 2);
    }

    #[test]
    fn rows_are_sorted_by_date() {
        let csv = "Fecha,SAIDI\n2024-03-01,3\n2024-01-01,1\n2024-02-01,2\n";
        let data = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(data.history.primary_values(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn missing_value_column_is_an_input_error() {
        let csv = "Fecha,Other\n2024-01-01,1\n";
        assert!(matches!(
            read_csv(csv.as_bytes()),
            Err(SearchError::Input(_))
        ));
    }

    #[test]
    fn unparsable_rows_are_input_errors() {
        let bad_date = "Fecha,SAIDI\nnot-a-date,1\n";
        assert!(matches!(
            read_csv(bad_date.as_bytes()),
            Err(SearchError::Input(_))
        ));

        let bad_value = "Fecha,SAIDI\n2024-01-01,abc\n";
        assert!(matches!(
            read_csv(bad_value.as_bytes()),
            Err(SearchError::Input(_))
        ));
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let csv = "Fecha,SAIDI\n2024-01-01,1\n2024-01-01,2\n";
        assert!(read_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn date_formats() {
        let expected = Utc.with_ymd_and_hms(2021, 7, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_date("2021-07-01"), Some(expected));
        assert_eq!(parse_date("2021-07-01 00:00:00"), Some(expected));
        assert_eq!(parse_date("2021-07"), Some(expected));
        assert_eq!(parse_date("01/07/2021"), Some(expected));
        assert_eq!(parse_date("July 2021"), None);
    }

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Fecha,SAIDI").unwrap();
        writeln!(file, "2024-01-01,7.5").unwrap();
        file.flush().unwrap();

        let data = load_csv(file.path()).unwrap();
        assert_eq!(data.history.len(), 1);

        assert!(matches!(
            load_csv("/nonexistent/saidi.csv"),
            Err(SearchError::Input(_))
        ));
    }
}

use crate::data_structures::SpendRecord;
use crate::error::AttributionError;
use crate::identifier::{ScheduleRow, ScheduleTable};
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

pub const SPEND_TIMESTAMP_COLUMN: &str = "日期";
pub const SPEND_AMOUNT_COLUMN: &str = "花费";

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

pub struct DataLoader;

impl DataLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn load_schedule<P: AsRef<Path>>(&self, path: P) -> Result<ScheduleTable> {
        let file = File::open(&path)
            .with_context(|| format!("Failed to open schedule file: {}", path.as_ref().display()))?;
        self.read_schedule(file)
            .with_context(|| format!("Failed to load schedule file: {}", path.as_ref().display()))
    }

    pub fn load_spend<P: AsRef<Path>>(&self, path: P) -> Result<Vec<SpendRecord>> {
        let file = File::open(&path)
            .with_context(|| format!("Failed to open spend file: {}", path.as_ref().display()))?;
        self.read_spend(file)
            .with_context(|| format!("Failed to load spend file: {}", path.as_ref().display()))
    }

    /// Reads a schedule sheet: first column is the date, every other column a slot.
    pub fn read_schedule<R: Read>(&self, reader: R) -> Result<ScheduleTable> {
        let mut csv = ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = clean_headers(csv.headers().context("Failed to read schedule header")?);
        let date_column = headers.first().cloned().unwrap_or_default();
        let slot_columns: Vec<String> = headers.iter().skip(1).cloned().collect();

        let mut rows = Vec::new();
        for (i, record) in csv.records().enumerate() {
            let record = record.with_context(|| format!("Failed to read schedule row {}", i + 2))?;
            let row = line_of(&record, i);

            let raw_date = record.get(0).unwrap_or("").trim();
            if raw_date.is_empty() {
                warn!(row, "schedule row without a date skipped");
                continue;
            }
            let date = parse_date(raw_date).ok_or_else(|| AttributionError::MalformedSchedule {
                row,
                column: date_column.clone(),
                message: format!("unrecognised date '{raw_date}'"),
            })?;

            let cells = (1..=slot_columns.len())
                .map(|col| record.get(col).unwrap_or("").to_string())
                .collect();
            rows.push(ScheduleRow::new(row, date, cells));
        }

        debug!(rows = rows.len(), slots = slot_columns.len(), "loaded schedule");
        Ok(ScheduleTable::new(slot_columns, rows))
    }

    /// Reads charge events; only the timestamp and amount columns are used.
    pub fn read_spend<R: Read>(&self, reader: R) -> Result<Vec<SpendRecord>> {
        let mut csv = ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = clean_headers(csv.headers().context("Failed to read spend header")?);
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| anyhow::anyhow!("Spend table is missing the '{}' column", name))
        };
        let timestamp_col = column(SPEND_TIMESTAMP_COLUMN)?;
        let amount_col = column(SPEND_AMOUNT_COLUMN)?;

        let mut entries = Vec::new();
        for (i, record) in csv.records().enumerate() {
            let record = record.with_context(|| format!("Failed to read spend line {}", i + 2))?;
            let line = line_of(&record, i);

            let raw_timestamp = record.get(timestamp_col).unwrap_or("").trim();
            if raw_timestamp.is_empty() {
                warn!(line, "spend record without a timestamp skipped");
                continue;
            }
            let timestamp =
                parse_timestamp(raw_timestamp).ok_or_else(|| AttributionError::MalformedSpend {
                    line,
                    message: format!("unrecognised timestamp '{raw_timestamp}'"),
                })?;
            let amount = parse_amount(record.get(amount_col).unwrap_or(""))
                .map_err(|message| AttributionError::MalformedSpend { line, message })?;

            entries.push(SpendRecord::new(timestamp, amount));
        }

        debug!(records = entries.len(), "loaded spend records");
        Ok(entries)
    }
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn clean_headers(headers: &StringRecord) -> Vec<String> {
    headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect()
}

fn line_of(record: &StringRecord, index: usize) -> usize {
    record
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or(index + 2)
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Accepts bare dates as well as date-times exported from spreadsheets.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    parse_timestamp(value).map(|ts| ts.date())
}

pub fn parse_amount(value: &str) -> std::result::Result<f64, String> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Ok(0.0);
    }

    let amount: f64 = cleaned
        .parse()
        .map_err(|_| format!("unrecognised amount '{}'", value.trim()))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(format!("amount must be a non-negative number, got '{}'", value.trim()));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn ts(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_read_schedule() {
        let loader = DataLoader::new();
        let content = "\u{feff}Date,morning,evening\n\
                       2025-03-01,A(9:00-12:00),B+C（20:00-24:00）\n\
                       ,ignored(1:00-2:00),\n\
                       2025/03/02,,D(22:00-01:00)\n";

        let table = loader.read_schedule(content.as_bytes()).unwrap();
        assert_eq!(table.slot_columns(), &["morning".to_string(), "evening".to_string()]);
        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.rows()[0].row(), 2);
        assert_eq!(table.rows()[1].date(), NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());
        assert_eq!(table.rows()[1].cells()[0], "");
    }

    #[test]
    fn test_schedule_bad_date_reports_row() {
        let loader = DataLoader::new();
        let content = "Date,slot\n2025-03-01,A(9:00-10:00)\nyesterday,B(9:00-10:00)\n";

        let err = loader.read_schedule(content.as_bytes()).unwrap_err();
        match err.downcast_ref::<AttributionError>() {
            Some(AttributionError::MalformedSchedule { row, column, .. }) => {
                assert_eq!(*row, 3);
                assert_eq!(column, "Date");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_read_spend() {
        let loader = DataLoader::new();
        let content = "计划,日期,花费\n\
                       p1,2025-03-01 09:05:00,\"1,200.50\"\n\
                       p2,2025/03/01 09:40,30\n\
                       p3,2025-03-02,\n";

        let records = loader.read_spend(content.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].timestamp(), ts(1, 9, 5));
        assert_eq!(records[0].amount(), 1200.5);
        assert_eq!(records[1].timestamp(), ts(1, 9, 40));
        assert_eq!(records[2].timestamp(), ts(2, 0, 0));
        assert_eq!(records[2].amount(), 0.0);
    }

    #[test]
    fn test_spend_missing_column() {
        let loader = DataLoader::new();
        let content = "日期,amount\n2025-03-01 09:00,1\n";
        assert!(loader.read_spend(content.as_bytes()).is_err());
    }

    #[test]
    fn test_spend_negative_amount_rejected() {
        let loader = DataLoader::new();
        let content = "日期,花费\n2025-03-01 09:00,5\n2025-03-01 10:00,-3\n";

        let err = loader.read_spend(content.as_bytes()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AttributionError>(),
            Some(AttributionError::MalformedSpend { line: 3, .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let loader = DataLoader::new();
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all("日期,花费\n2025-03-01 09:00:00,10\n".as_bytes())
            .unwrap();

        let records = loader.load_spend(temp_file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert!(loader.load_schedule("/nonexistent/schedule.csv").is_err());
    }
}

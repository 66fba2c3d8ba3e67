use crate::data_structures::ScheduleEntry;
use crate::error::{AttributionError, Result};
use crate::rounding::{normalize, RoundingMethod};
use chrono::{Duration, NaiveDate, NaiveTime};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use tracing::debug;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^(]+)\(([^)]+)\)").expect("token pattern is valid"));

/// One dated row of the schedule sheet; `cells` line up with the table's slot columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRow {
    row: usize,
    date: NaiveDate,
    cells: Vec<String>,
}

impl ScheduleRow {
    pub fn new(row: usize, date: NaiveDate, cells: Vec<String>) -> Self {
        Self { row, date, cells }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleTable {
    slot_columns: Vec<String>,
    rows: Vec<ScheduleRow>,
}

impl ScheduleTable {
    pub fn new(slot_columns: Vec<String>, rows: Vec<ScheduleRow>) -> Self {
        Self { slot_columns, rows }
    }

    pub fn slot_columns(&self) -> &[String] {
        &self.slot_columns
    }

    pub fn rows(&self) -> &[ScheduleRow] {
        &self.rows
    }
}

/// A `names(span)` occurrence found in a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotToken<'a> {
    pub names: &'a str,
    pub span: &'a str,
}

pub struct IntervalIdentifier {
    method: RoundingMethod,
}

impl IntervalIdentifier {
    pub fn new() -> Self {
        Self {
            method: RoundingMethod::default(),
        }
    }

    pub fn with_method(method: RoundingMethod) -> Self {
        Self { method }
    }

    pub fn identify_intervals(&self, table: &ScheduleTable) -> Result<Vec<ScheduleEntry>> {
        let mut entries = Vec::new();

        for row in table.rows() {
            for (column, cell) in table.slot_columns().iter().zip(row.cells()) {
                entries.extend(self.entries_for_cell(row, column, cell)?);
            }
        }

        debug!(
            rows = table.rows().len(),
            intervals = entries.len(),
            method = %self.method,
            "identified schedule intervals"
        );
        Ok(entries)
    }

    pub fn entries_for_cell(
        &self,
        row: &ScheduleRow,
        column: &str,
        cell: &str,
    ) -> Result<Vec<ScheduleEntry>> {
        let cell = normalize_parentheses(cell);
        let mut entries = Vec::new();

        for token in scan_tokens(&cell) {
            let malformed = |message: String| AttributionError::MalformedSchedule {
                row: row.row(),
                column: column.to_string(),
                message,
            };

            let names = expand_names(token.names)
                .ok_or_else(|| malformed(format!("empty presenter name in '{}'", token.names)))?;
            let (start, end) = self
                .normalize_span(token.span)
                .map_err(malformed)?;

            let start_time = row.date().and_time(start);
            let mut end_time = row.date().and_time(end);
            if end_time < start_time {
                end_time += Duration::days(1);
            }

            let concurrent_count = names.len() as u32;
            entries.extend(names.into_iter().map(|name| {
                ScheduleEntry::new(
                    row.date(),
                    name.to_string(),
                    start_time,
                    end_time,
                    concurrent_count,
                )
            }));
        }

        Ok(entries)
    }

    fn normalize_span(&self, span: &str) -> std::result::Result<(NaiveTime, NaiveTime), String> {
        let (start, end) = span
            .split_once('-')
            .ok_or_else(|| format!("time span '{span}' is not of the form HH:MM-HH:MM"))?;

        let start = normalize(start, self.method, false)
            .map_err(|e| format!("invalid start time '{}': {e}", start.trim()))?;
        let end = normalize(end, self.method, true)
            .map_err(|e| format!("invalid end time '{}': {e}", end.trim()))?;
        Ok((start, end))
    }
}

impl Default for IntervalIdentifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Full-width parentheses are common in hand-typed schedules.
pub fn normalize_parentheses(cell: &str) -> Cow<'_, str> {
    if cell.contains(['（', '）']) {
        Cow::Owned(cell.replace('（', "(").replace('）', ")"))
    } else {
        Cow::Borrowed(cell)
    }
}

pub fn scan_tokens(cell: &str) -> impl Iterator<Item = SlotToken<'_>> {
    TOKEN_PATTERN.captures_iter(cell).filter_map(|caps| {
        Some(SlotToken {
            names: caps.get(1)?.as_str(),
            span: caps.get(2)?.as_str(),
        })
    })
}

/// Splits `a+b` into presenter names; `None` if any name is blank.
pub fn expand_names(names: &str) -> Option<Vec<&str>> {
    names
        .split('+')
        .map(|name| name.trim_matches(is_name_separator))
        .map(|name| (!name.is_empty()).then_some(name))
        .collect()
}

fn is_name_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '，' | '、' | ';' | '；')
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        date.and_hms_opt(h, m, 0).unwrap()
    }

    fn row(cell: &str) -> ScheduleRow {
        ScheduleRow::new(2, day(), vec![cell.to_string()])
    }

    #[test]
    fn test_scan_multiple_tokens() {
        let tokens: Vec<_> = scan_tokens("Zhang(9:00-12:00)Li+Wang(12:00-15:30)").collect();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].names, "Zhang");
        assert_eq!(tokens[1].names, "Li+Wang");
        assert_eq!(tokens[1].span, "12:00-15:30");
    }

    #[test]
    fn test_full_width_parentheses() {
        let cell = normalize_parentheses("张三（20:00-24:00）");
        let tokens: Vec<_> = scan_tokens(&cell).collect();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].names, "张三");
    }

    #[test]
    fn test_expand_names_trims_separators() {
        assert_eq!(expand_names(" Li + Wang").unwrap(), vec!["Li", "Wang"]);
        assert_eq!(expand_names("、Zhao").unwrap(), vec!["Zhao"]);
        assert!(expand_names("Li+").is_none());
    }

    #[test]
    fn test_shared_slot_expands_per_presenter() {
        let identifier = IntervalIdentifier::new();
        let entries = identifier
            .entries_for_cell(&row("Li+Wang(9:15-11:45)"), "slot1", "Li+Wang(9:15-11:45)")
            .unwrap();

        assert_eq!(entries.len(), 2);
        for entry in &entries {
            assert_eq!(entry.concurrent_count(), 2);
            assert_eq!(entry.start_time(), at(day(), 9, 0));
            assert_eq!(entry.end_time(), at(day(), 12, 0));
        }
        assert_eq!(entries[0].presenter(), "Li");
        assert_eq!(entries[1].presenter(), "Wang");
    }

    #[test]
    fn test_cross_midnight_interval() {
        let identifier = IntervalIdentifier::new();
        let entries = identifier
            .entries_for_cell(&row(""), "slot1", "Zhang(22:00-01:00)")
            .unwrap();

        assert_eq!(entries[0].start_time(), at(day(), 22, 0));
        assert_eq!(entries[0].end_time(), at(day().succ_opt().unwrap(), 1, 0));
        assert_eq!(entries[0].date(), day());
    }

    #[test]
    fn test_end_of_day_alias_lands_on_next_midnight() {
        let identifier = IntervalIdentifier::new();
        let entries = identifier
            .entries_for_cell(&row(""), "slot1", "Zhang(20:00-24:00)")
            .unwrap();

        assert_eq!(entries[0].end_time(), at(day().succ_opt().unwrap(), 0, 0));
    }

    #[test]
    fn test_malformed_span_reports_location() {
        let identifier = IntervalIdentifier::new();
        let err = identifier
            .entries_for_cell(&row(""), "evening", "Zhang(20:00~22:00)")
            .unwrap_err();

        match err {
            AttributionError::MalformedSchedule { row, column, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "evening");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_identify_intervals_walks_all_cells() {
        let table = ScheduleTable::new(
            vec!["morning".into(), "evening".into()],
            vec![
                ScheduleRow::new(2, day(), vec!["A(9:00-12:00)".into(), "".into()]),
                ScheduleRow::new(
                    3,
                    day().succ_opt().unwrap(),
                    vec!["".into(), "B+C(20:00-23:00)".into()],
                ),
            ],
        );

        let entries = IntervalIdentifier::new().identify_intervals(&table).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.presenter()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }
}

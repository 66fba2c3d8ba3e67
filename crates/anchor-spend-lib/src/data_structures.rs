use crate::error::{AttributionError, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// One presenter working one scheduled interval.
///
/// A slot shared by several presenters produces one entry per presenter, each
/// carrying the same `concurrent_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    date: NaiveDate,
    presenter: String,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    concurrent_count: u32,
}

impl ScheduleEntry {
    pub fn new(
        date: NaiveDate,
        presenter: String,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        concurrent_count: u32,
    ) -> Self {
        Self {
            date,
            presenter,
            start_time,
            end_time,
            concurrent_count,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn presenter(&self) -> &str {
        &self.presenter
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    pub fn end_time(&self) -> NaiveDateTime {
        self.end_time
    }

    pub fn concurrent_count(&self) -> u32 {
        self.concurrent_count
    }
}

/// A raw charge event as exported by the ad platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendRecord {
    timestamp: NaiveDateTime,
    amount: f64,
}

impl SpendRecord {
    pub fn new(timestamp: NaiveDateTime, amount: f64) -> Self {
        Self { timestamp, amount }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySpendRecord {
    hour: NaiveDateTime,
    spend: f64,
    cumulative_spend: f64,
}

impl HourlySpendRecord {
    pub fn new(hour: NaiveDateTime, spend: f64, cumulative_spend: f64) -> Self {
        Self {
            hour,
            spend,
            cumulative_spend,
        }
    }

    pub fn hour(&self) -> NaiveDateTime {
        self.hour
    }

    pub fn spend(&self) -> f64 {
        self.spend
    }

    pub fn cumulative_spend(&self) -> f64 {
        self.cumulative_spend
    }

    pub(crate) fn with_hour(self, hour: NaiveDateTime) -> Self {
        Self { hour, ..self }
    }
}

/// Inclusive calendar-day query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(AttributionError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Midnight opening the first day.
    pub fn lower_bound(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN)
    }

    /// Midnight closing the last day.
    pub fn upper_bound(&self) -> NaiveDateTime {
        (self.end + Duration::days(1)).and_time(NaiveTime::MIN)
    }

    /// Whether the whole interval lies inside the window.
    pub fn contains(&self, entry: &ScheduleEntry) -> bool {
        entry.start_time() >= self.lower_bound() && entry.end_time() <= self.upper_bound()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenterSummary {
    presenter: String,
    total_attributed_spend: f64,
    #[serde(rename = "range_start(inclusive)")]
    range_start: NaiveDate,
    #[serde(rename = "range_end(inclusive)")]
    range_end: NaiveDate,
}

impl PresenterSummary {
    pub fn new(presenter: String, total_attributed_spend: f64, range: DateRange) -> Self {
        Self {
            presenter,
            total_attributed_spend,
            range_start: range.start(),
            range_end: range.end(),
        }
    }

    pub fn presenter(&self) -> &str {
        &self.presenter
    }

    pub fn total_attributed_spend(&self) -> f64 {
        self.total_attributed_spend
    }

    pub fn range_start(&self) -> NaiveDate {
        self.range_start
    }

    pub fn range_end(&self) -> NaiveDate {
        self.range_end
    }
}

/// An interval left out of its presenter's total because one of its
/// boundaries has no cumulative spend entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedInterval {
    presenter: String,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    missing_at: NaiveDateTime,
}

impl SkippedInterval {
    pub fn new(entry: &ScheduleEntry, missing_at: NaiveDateTime) -> Self {
        Self {
            presenter: entry.presenter().to_string(),
            start_time: entry.start_time(),
            end_time: entry.end_time(),
            missing_at,
        }
    }

    pub fn presenter(&self) -> &str {
        &self.presenter
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    pub fn end_time(&self) -> NaiveDateTime {
        self.end_time
    }

    pub fn missing_at(&self) -> NaiveDateTime {
        self.missing_at
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributionReport {
    summaries: Vec<PresenterSummary>,
    skipped: Vec<SkippedInterval>,
}

impl AttributionReport {
    pub fn new(summaries: Vec<PresenterSummary>, skipped: Vec<SkippedInterval>) -> Self {
        Self { summaries, skipped }
    }

    pub fn summaries(&self) -> &[PresenterSummary] {
        &self.summaries
    }

    pub fn skipped(&self) -> &[SkippedInterval] {
        &self.skipped
    }

    pub fn summary_for(&self, presenter: &str) -> Option<&PresenterSummary> {
        self.summaries.iter().find(|s| s.presenter() == presenter)
    }

    pub fn total_attributed_spend(&self) -> f64 {
        self.summaries
            .iter()
            .map(|s| s.total_attributed_spend())
            .sum()
    }
}

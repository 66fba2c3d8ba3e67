use crate::data_structures::{HourlySpendRecord, SpendRecord};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Day-cumulative spend keyed by hour. The value at `h` is that day's spend before `h`.
#[derive(Debug, Clone, Default)]
pub struct SpendIndex {
    records: Vec<HourlySpendRecord>,
    by_hour: BTreeMap<NaiveDateTime, f64>,
}

impl SpendIndex {
    pub fn build(raw_records: &[SpendRecord]) -> Self {
        let (Some(first_day), Some(last_day)) = (
            raw_records.iter().map(|r| r.timestamp().date()).min(),
            raw_records.iter().map(|r| r.timestamp().date()).max(),
        ) else {
            warn!("no spend records, every lookup will miss");
            return Self::default();
        };

        let buckets = aggregate_by_hour(raw_records);
        let filled = fill_axis(hourly_axis(first_day, last_day), &buckets);
        let records = shift_forward_one_hour(accumulate_daily(filled));

        debug!(
            raw = raw_records.len(),
            hours = records.len(),
            %first_day,
            %last_day,
            "built cumulative spend index"
        );

        let by_hour = records
            .iter()
            .map(|r| (r.hour(), r.cumulative_spend()))
            .collect();
        Self { records, by_hour }
    }

    pub fn records(&self) -> &[HourlySpendRecord] {
        &self.records
    }

    /// Spend accumulated on the billing day up to `at`.
    pub fn cumulative_at(&self, at: NaiveDateTime) -> Option<f64> {
        self.by_hour.get(&at).copied()
    }

    /// Cumulative value to subtract when an interval starts at `at`.
    ///
    /// At midnight the billing day has just reset, so the opening value is
    /// zero as long as the index holds that day's first hour.
    pub fn opening_at(&self, at: NaiveDateTime) -> Option<f64> {
        if at.time() == NaiveTime::MIN {
            return self
                .by_hour
                .contains_key(&(at + Duration::hours(1)))
                .then_some(0.0);
        }
        self.cumulative_at(at)
    }

    pub fn first_hour(&self) -> Option<NaiveDateTime> {
        self.by_hour.keys().next().copied()
    }

    pub fn last_hour(&self) -> Option<NaiveDateTime> {
        self.by_hour.keys().next_back().copied()
    }

    /// First and last calendar dates of the published hour keys.
    pub fn coverage(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.first_hour()?.date(), self.last_hour()?.date()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn truncate_to_hour(at: NaiveDateTime) -> NaiveDateTime {
    at.date().and_time(NaiveTime::from_hms_opt(at.hour(), 0, 0).unwrap_or(NaiveTime::MIN))
}

/// Every hour from `first_day` 00:00 through `last_day + 1` 00:00 inclusive.
pub fn hourly_axis(first_day: NaiveDate, last_day: NaiveDate) -> Vec<NaiveDateTime> {
    let start = first_day.and_time(NaiveTime::MIN);
    let end = (last_day + Duration::days(1)).and_time(NaiveTime::MIN);
    let hours = (end - start).num_hours();

    (0..=hours).map(|h| start + Duration::hours(h)).collect()
}

pub fn aggregate_by_hour(raw_records: &[SpendRecord]) -> BTreeMap<NaiveDateTime, f64> {
    let mut buckets = BTreeMap::new();
    for record in raw_records {
        *buckets.entry(truncate_to_hour(record.timestamp())).or_insert(0.0) += record.amount();
    }
    buckets
}

pub fn fill_axis(
    axis: Vec<NaiveDateTime>,
    buckets: &BTreeMap<NaiveDateTime, f64>,
) -> Vec<(NaiveDateTime, f64)> {
    axis.into_iter()
        .map(|hour| (hour, buckets.get(&hour).copied().unwrap_or(0.0)))
        .collect()
}

/// Running sum of hourly spend, restarting at each midnight. Expects `hours` in order.
pub fn accumulate_daily(hours: Vec<(NaiveDateTime, f64)>) -> Vec<HourlySpendRecord> {
    let mut running = 0.0;
    let mut current_day = None;

    hours
        .into_iter()
        .map(|(hour, spend)| {
            if current_day != Some(hour.date()) {
                current_day = Some(hour.date());
                running = 0.0;
            }
            running += spend;
            HourlySpendRecord::new(hour, spend, running)
        })
        .collect()
}

/// Re-keys each record one hour later so the key names the moment its
/// cumulative value is complete.
pub fn shift_forward_one_hour(records: Vec<HourlySpendRecord>) -> Vec<HourlySpendRecord> {
    records
        .into_iter()
        .map(|r| {
            let hour = r.hour() + Duration::hours(1);
            r.with_hour(hour)
        })
        .collect()
}

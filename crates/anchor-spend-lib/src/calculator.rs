use crate::data_structures::{
    AttributionReport, DateRange, PresenterSummary, ScheduleEntry, SkippedInterval,
};
use crate::error::{AttributionError, Result};
use crate::index::SpendIndex;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// What to do with an interval whose boundary has no cumulative spend entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingDataPolicy {
    /// Leave the interval out of its presenter's total and report it.
    #[default]
    Skip,
    Fail,
}

pub struct Calculator {
    missing_data: MissingDataPolicy,
}

impl Calculator {
    pub fn new() -> Self {
        Self {
            missing_data: MissingDataPolicy::default(),
        }
    }

    pub fn with_policy(missing_data: MissingDataPolicy) -> Self {
        Self { missing_data }
    }

    /// Window in which both the schedule and the spend index have data.
    pub fn coverage(
        &self,
        intervals: &[ScheduleEntry],
        index: &SpendIndex,
    ) -> Result<(NaiveDate, NaiveDate)> {
        let schedule_min = intervals.iter().map(|e| e.start_time().date()).min();
        let schedule_max = intervals.iter().map(|e| e.end_time().date()).max();
        let (Some(schedule_min), Some(schedule_max)) = (schedule_min, schedule_max) else {
            return Err(AttributionError::NoCoverage("schedule"));
        };
        let (spend_min, spend_max) = index
            .coverage()
            .ok_or(AttributionError::NoCoverage("spend"))?;

        Ok((schedule_min.max(spend_min), schedule_max.min(spend_max)))
    }

    pub fn validate_range(
        &self,
        intervals: &[ScheduleEntry],
        index: &SpendIndex,
        range: DateRange,
    ) -> Result<()> {
        let (overall_min, overall_max) = self.coverage(intervals, index)?;

        if range.start() < overall_min || range.end() > overall_max + Duration::days(1) {
            return Err(AttributionError::DateRange {
                requested_start: range.start(),
                requested_end: range.end(),
                coverage_start: overall_min,
                coverage_end: overall_max,
            });
        }
        Ok(())
    }

    /// Spend attributable to the interval before splitting among co-presenters.
    ///
    /// The index resets at each midnight, so an interval crossing midnight is
    /// summed per billing day. `Err` carries the first boundary with no entry.
    pub fn interval_spend(
        &self,
        entry: &ScheduleEntry,
        index: &SpendIndex,
    ) -> std::result::Result<f64, NaiveDateTime> {
        let mut total = 0.0;
        let mut cursor = entry.start_time();

        while cursor < entry.end_time() {
            let next_midnight = (cursor.date() + Duration::days(1)).and_time(NaiveTime::MIN);
            let segment_end = entry.end_time().min(next_midnight);

            let opening = index.opening_at(cursor).ok_or(cursor)?;
            let closing = index.cumulative_at(segment_end).ok_or(segment_end)?;
            total += closing - opening;

            cursor = segment_end;
        }

        Ok(total)
    }

    /// The presenter's equal share of the interval's spend.
    pub fn interval_amount(
        &self,
        entry: &ScheduleEntry,
        index: &SpendIndex,
    ) -> std::result::Result<f64, NaiveDateTime> {
        let share = entry.concurrent_count().max(1) as f64;
        Ok(self.interval_spend(entry, index)? / share)
    }

    pub fn attribute(
        &self,
        intervals: &[ScheduleEntry],
        index: &SpendIndex,
        range: DateRange,
    ) -> Result<AttributionReport> {
        self.validate_range(intervals, index, range)?;

        let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
        let mut skipped = Vec::new();

        for entry in intervals.iter().filter(|e| range.contains(e)) {
            let total = totals.entry(entry.presenter()).or_insert(0.0);

            match self.interval_amount(entry, index) {
                Ok(amount) => *total += amount,
                Err(missing_at) => {
                    if self.missing_data == MissingDataPolicy::Fail {
                        return Err(AttributionError::MissingAttributionData {
                            presenter: entry.presenter().to_string(),
                            start: entry.start_time(),
                            end: entry.end_time(),
                        });
                    }
                    warn!(
                        presenter = entry.presenter(),
                        start = %entry.start_time(),
                        end = %entry.end_time(),
                        %missing_at,
                        "no cumulative spend at interval boundary, interval skipped"
                    );
                    skipped.push(SkippedInterval::new(entry, missing_at));
                }
            }
        }

        debug!(
            presenters = totals.len(),
            skipped = skipped.len(),
            start = %range.start(),
            end = %range.end(),
            "attributed spend"
        );

        let summaries = totals
            .into_iter()
            .map(|(presenter, total)| PresenterSummary::new(presenter.to_string(), total, range))
            .collect();
        Ok(AttributionReport::new(summaries, skipped))
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

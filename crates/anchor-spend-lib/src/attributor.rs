use crate::calculator::Calculator;
use crate::config::RunSettings;
use crate::data_structures::{AttributionReport, DateRange, ScheduleEntry, SpendRecord};
use crate::identifier::{IntervalIdentifier, ScheduleTable};
use crate::index::SpendIndex;
use crate::loader::DataLoader;
use crate::writer;
use anyhow::Result;
use std::path::Path;
use tracing::info;

/// Holds one platform's schedule intervals and spend index for a run.
pub struct SpendAttributor {
    intervals: Vec<ScheduleEntry>,
    index: SpendIndex,
    identifier: IntervalIdentifier,
    calculator: Calculator,
    loader: DataLoader,
}

impl SpendAttributor {
    pub fn new(identifier: IntervalIdentifier, calculator: Calculator) -> Self {
        Self {
            intervals: Vec::new(),
            index: SpendIndex::default(),
            identifier,
            calculator,
            loader: DataLoader::new(),
        }
    }

    pub fn from_settings(settings: &RunSettings) -> Self {
        Self::new(
            IntervalIdentifier::with_method(settings.method),
            Calculator::with_policy(settings.missing_data),
        )
    }

    pub fn load_schedule<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let table = self.loader.load_schedule(path)?;
        self.set_schedule(&table)?;
        Ok(())
    }

    pub fn load_spend<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let records = self.loader.load_spend(path)?;
        self.set_spend(&records);
        Ok(())
    }

    pub fn set_schedule(&mut self, table: &ScheduleTable) -> crate::Result<()> {
        self.intervals = self.identifier.identify_intervals(table)?;
        Ok(())
    }

    pub fn set_spend(&mut self, records: &[SpendRecord]) {
        self.index = SpendIndex::build(records);
    }

    pub fn index(&self) -> &SpendIndex {
        &self.index
    }

    pub fn attribute(&self, range: DateRange) -> crate::Result<AttributionReport> {
        self.calculator.attribute(&self.intervals, &self.index, range)
    }

    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty() && self.index.is_empty()
    }
}

impl Default for SpendAttributor {
    fn default() -> Self {
        Self::new(IntervalIdentifier::new(), Calculator::new())
    }
}

/// Loads both inputs, attributes spend over the configured range and writes
/// the summary. Nothing is written unless attribution succeeds.
pub fn run(settings: &RunSettings) -> Result<AttributionReport> {
    info!(
        platform = %settings.platform,
        method = %settings.method,
        start = %settings.range.start(),
        end = %settings.range.end(),
        "starting attribution run"
    );

    let mut attributor = SpendAttributor::from_settings(settings);
    attributor.load_schedule(&settings.schedule_file)?;
    attributor.load_spend(&settings.expense_file)?;

    let report = attributor.attribute(settings.range)?;
    writer::write_summaries(&settings.output_file, report.summaries())?;
    Ok(report)
}

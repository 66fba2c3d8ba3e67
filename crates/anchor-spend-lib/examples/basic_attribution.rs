use anchor_spend_attribution::prelude::*;
use anchor_spend_attribution::{DataLoader, SpendAttributor};
use std::env;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!(
            "Usage: {} <schedule.csv> <spend.csv> <start YYYY-MM-DD> [end YYYY-MM-DD] [method]",
            args[0]
        );
        std::process::exit(1);
    }

    let start: chrono::NaiveDate = args[3].parse()?;
    let end: chrono::NaiveDate = match args.get(4) {
        Some(end) => end.parse()?,
        None => start,
    };
    let method: RoundingMethod = match args.get(5) {
        Some(method) => method.parse()?,
        None => RoundingMethod::default(),
    };

    let loader = DataLoader::new();
    let table = loader.load_schedule(&args[1])?;
    let records = loader.load_spend(&args[2])?;
    println!(
        "Loaded {} schedule rows and {} spend records",
        table.rows().len(),
        records.len()
    );

    let mut attributor = SpendAttributor::new(
        anchor_spend_attribution::IntervalIdentifier::with_method(method),
        anchor_spend_attribution::Calculator::new(),
    );
    attributor.set_schedule(&table)?;
    attributor.set_spend(&records);

    if let Some((first, last)) = attributor.index().coverage() {
        println!("Spend index covers {} to {}", first, last);
    }

    let report = attributor.attribute(DateRange::new(start, end)?)?;
    println!("\n=== Spend by presenter ({} to {}, {}) ===", start, end, method);
    for summary in report.summaries() {
        println!(
            "{:<16} {:>12.2}",
            summary.presenter(),
            summary.total_attributed_spend()
        );
    }
    println!("{:<16} {:>12.2}", "total", report.total_attributed_spend());

    if !report.skipped().is_empty() {
        println!("\n{} interval(s) had no spend data:", report.skipped().len());
        for skipped in report.skipped() {
            println!(
                "  {} {} - {} (missing at {})",
                skipped.presenter(),
                skipped.start_time(),
                skipped.end_time(),
                skipped.missing_at()
            );
        }
    }

    Ok(())
}

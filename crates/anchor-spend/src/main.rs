use anchor_spend_attribution::config::DEFAULT_CONFIG_FILE;
use anchor_spend_attribution::prelude::*;
use clap::{Parser, ValueEnum};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Platform {
    Tmall,
    Douyinshemei,
    Douyinpy,
}

impl Platform {
    fn config_key(&self) -> &'static str {
        match self {
            Platform::Tmall => "tmall",
            Platform::Douyinshemei => "douyinshemei",
            Platform::Douyinpy => "douyinpy",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(author = "Red", version, about)]
struct Args {
    /// Platform section of config.json to run
    #[arg(short = 'p', long = "platform", value_enum, default_value = "tmall")]
    platform: Platform,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_platform(platform: Platform) -> Result<AttributionReport> {
    let config = AppConfig::from_file(DEFAULT_CONFIG_FILE)?;
    let settings = config.resolve(platform.config_key())?;
    let report = run(&settings)?;

    println!(
        "{} results saved to {}",
        platform.config_key(),
        settings.output_file.display()
    );
    Ok(report)
}

fn print_report(report: &AttributionReport) {
    for summary in report.summaries() {
        println!(
            "  {:<16} {:>14.2}",
            summary.presenter(),
            summary.total_attributed_spend()
        );
    }
    if !report.skipped().is_empty() {
        println!(
            "  {} interval(s) skipped for missing spend data, see log",
            report.skipped().len()
        );
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing();

    match run_platform(args.platform) {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            let date_range = e
                .downcast_ref::<AttributionError>()
                .is_some_and(|e| e.is_date_range());
            if date_range {
                eprintln!("Date range error: {}", e);
            } else {
                eprintln!("Execution failed: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

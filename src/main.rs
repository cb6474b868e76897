use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;

use country_hegemony::logging;
use country_hegemony::runner::{DEFAULT_MIN_POPULATION, DEFAULT_TOP};
use country_hegemony::shared::Endpoints;
use country_hegemony::{
    AddressFamily, AggregationOptions, ApnicPopulationClient, HegeError, IhrHegemonyClient,
    ReportConfig, ReportRunner, Result, RunSummary,
};

#[derive(Parser, Debug)]
#[command(name = "country-hege")]
#[command(about = "Rank the networks a country's eyeball population depends on, using AS hegemony")]
struct Args {
    /// Country code (ISO 3166 alpha-2)
    country_code: String,

    /// Don't count origin ASes in the hegemony calculation; only transit networks are ranked
    #[arg(short = 'r', long = "remove_eyeball", alias = "remove-eyeball")]
    remove_eyeball: bool,

    /// Don't weight by eyeball population
    #[arg(short = 'n', long = "noweight")]
    noweight: bool,

    /// Number of ASes printed per instant
    #[arg(short = 't', long, default_value_t = DEFAULT_TOP)]
    top: usize,

    /// Minimum population share of the eyeball networks
    #[arg(short = 'm', long = "min_population", alias = "min-population", default_value_t = DEFAULT_MIN_POPULATION)]
    min_population: f64,

    /// Fetch data for the given start date
    #[arg(short = 's', long)]
    start: Option<String>,

    /// Fetch data until the given end date (requires --start)
    #[arg(short = 'e', long)]
    end: Option<String>,

    /// Plot results in the given SVG file
    #[arg(short = 'p', long)]
    plot: Option<PathBuf>,

    /// Address family of the hegemony graphs (4 or 6)
    #[arg(long, default_value_t = 4)]
    af: u8,

    /// Population estimate endpoint
    #[arg(long, default_value = Endpoints::APNIC_ECONOMIES)]
    population_url: String,

    /// AS hegemony API endpoint
    #[arg(long, default_value = Endpoints::IHR_HEGEMONY)]
    hegemony_url: String,

    /// Log more (-v info, -vv debug)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn run(args: Args) -> Result<RunSummary> {
    let af = AddressFamily::from_number(args.af)
        .ok_or_else(|| HegeError::Argument(format!("--af must be 4 or 6, got {}", args.af)))?;

    let options = AggregationOptions::new()
        .with_remove_eyeball(args.remove_eyeball)
        .with_no_weight(args.noweight);
    let config = ReportConfig::new(&args.country_code)
        .with_options(options)
        .with_top(args.top)
        .with_min_population(args.min_population)
        .with_start(args.start)
        .with_end(args.end)
        .with_plot(args.plot);

    let population_client = ApnicPopulationClient::new().with_base_url(args.population_url);
    let hegemony_client = IhrHegemonyClient::new()
        .with_base_url(args.hegemony_url)
        .with_af(af);

    let runner = ReportRunner::new(config, Utc::now(), &population_client, &hegemony_client)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = runner.run(&mut out)?;
    out.flush()?;
    Ok(summary)
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    match run(args) {
        Ok(summary) => {
            tracing::info!(
                instants = summary.instants,
                skipped = summary.skipped.len(),
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {}", err);
            // the top-level message already embeds the direct cause
            let mut cause = err.source().and_then(|source| source.source());
            while let Some(inner) = cause {
                eprintln!("  caused by: {}", inner);
                cause = inner.source();
            }
            match err {
                HegeError::Argument(_) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

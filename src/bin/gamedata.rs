use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use gamedata_scraper::config::{ConfigLoader, ConfigOverrides};
use gamedata_scraper::error::ScrapeError;
use gamedata_scraper::metacritic::RatingsHttpClient;
use gamedata_scraper::output::{ConsoleProgress, JsonOutput, OutputMode, RunReport, TextOutput};
use gamedata_scraper::pipeline::{Pipeline, RunOptions};
use gamedata_scraper::sink::CsvSink;
use gamedata_scraper::vgchartz::CatalogHttpClient;

#[derive(Parser)]
#[command(name = "gamedata")]
#[command(about = "VGChartz and Metacritic game scraper")]
#[command(version, author)]
struct Cli {
    /// Maximum number of games to scrape (0 to disable).
    #[arg(short = 'n', long = "number")]
    number: Option<usize>,

    /// Seconds to wait before each request to Metacritic (0 to disable).
    #[arg(short, long)]
    wait: Option<u64>,

    /// JSON config file (defaults to ./gamedata.json when present).
    #[arg(long)]
    config: Option<String>,

    /// Directory the CSV file is written to.
    #[arg(long)]
    output_dir: Option<String>,

    /// Print the final summary as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<ScrapeError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &ScrapeError) -> u8 {
    match error {
        ScrapeError::ConfigRead(_)
        | ScrapeError::ConfigParse(_)
        | ScrapeError::InvalidConfig(_) => 2,
        ScrapeError::CatalogHttp(_) | ScrapeError::CatalogStatus { .. } => 3,
        ScrapeError::MalformedPage(_) | ScrapeError::MalformedRow(_) => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let config = ConfigLoader::resolve(
        cli.config.as_deref(),
        ConfigOverrides {
            max_records: cli.number,
            wait_secs: cli.wait,
            output_dir: cli.output_dir,
        },
    )?;

    let catalog = CatalogHttpClient::new(&config)?;
    let ratings = RatingsHttpClient::new(&config)?;

    let started = Local::now();
    let (mut sink, output_path) = CsvSink::create(&config.output_dir, &started)?;

    let pipeline = Pipeline::new(
        &catalog,
        &ratings,
        RunOptions {
            ratings_base_url: config.ratings_base_url.clone(),
            max_records: config.max_records,
            wait: config.wait,
        },
    );
    let progress = ConsoleProgress::new(mode);
    let result = pipeline.run(&mut sink, &progress);
    let rows_written = sink.rows_written();
    drop(sink);

    let summary = match result {
        Ok(summary) => summary,
        Err(err) => {
            eprintln!("{rows_written} rows kept in {output_path}");
            return Err(err.into());
        }
    };

    let report = RunReport {
        summary,
        output_path,
    };
    match mode {
        OutputMode::Text => TextOutput::print_report(&report).into_diagnostic()?,
        OutputMode::Json => JsonOutput::print_report(&report).into_diagnostic()?,
    }
    Ok(())
}

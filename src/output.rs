use std::io::{self, Write};

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::pipeline::{ProgressEvent, ProgressSink, RunSummary};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    #[serde(flatten)]
    pub summary: RunSummary,
    pub output_path: Utf8PathBuf,
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_report(report: &RunReport) -> io::Result<()> {
        let mut stdout = io::stdout();
        writeln!(
            stdout,
            "Scraped {} games in {} seconds.",
            report.summary.scraped, report.summary.elapsed_secs
        )?;
        writeln!(stdout, "Wrote scraper data to {}", report.output_path)?;
        Ok(())
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_report(report: &RunReport) -> io::Result<()> {
        let json = serde_json::to_string_pretty(report)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

/// Prints progress lines to stdout. In JSON mode they go to stderr so stdout
/// carries only the report.
pub struct ConsoleProgress {
    mode: OutputMode,
}

impl ConsoleProgress {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }
}

impl ProgressSink for ConsoleProgress {
    fn event(&self, event: ProgressEvent) {
        let line = format_event(&event);
        match self.mode {
            OutputMode::Text => println!("{line}"),
            OutputMode::Json => eprintln!("{line}"),
        }
    }
}

/// Page and stop events carry the run clock, per-title lines do not.
pub fn format_event(event: &ProgressEvent) -> String {
    match event.elapsed {
        Some(elapsed) => format!("[{:.2}s] {}", elapsed.as_secs_f64(), event.message),
        None => event.message.clone(),
    }
}

use std::fs::File;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Local};

use crate::domain::{COLUMNS, MergedRow};
use crate::error::ScrapeError;

pub trait RowSink {
    fn write_row(&mut self, row: &MergedRow) -> Result<(), ScrapeError>;
}

/// `gamedata-<YYYYMMDD-HH_MM_SS>.csv`
pub fn output_file_name(started: &DateTime<Local>) -> String {
    format!("gamedata-{}.csv", started.format("%Y%m%d-%H_%M_%S"))
}

/// CSV writer that flushes after every row, so an aborted run leaves every
/// row written so far on disk.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl CsvSink<File> {
    /// Creates `dir/gamedata-<timestamp>.csv` and writes the preamble.
    pub fn create(
        dir: &Utf8Path,
        started: &DateTime<Local>,
    ) -> Result<(Self, Utf8PathBuf), ScrapeError> {
        std::fs::create_dir_all(dir)
            .map_err(|err| ScrapeError::Output(format!("create {dir}: {err}")))?;
        let path = dir.join(output_file_name(started));
        let file = File::create(&path)
            .map_err(|err| ScrapeError::Output(format!("create {path}: {err}")))?;
        let sink = Self::new(file, started)?;
        Ok((sink, path))
    }
}

impl<W: Write> CsvSink<W> {
    /// Writes the `DateTime:` line and the column headers.
    pub fn new(inner: W, started: &DateTime<Local>) -> Result<Self, ScrapeError> {
        // the metadata line has two fields, data lines eighteen
        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(inner);
        writer.write_record([
            "DateTime:".to_string(),
            started.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
        ])?;
        writer.write_record(COLUMNS)?;
        writer
            .flush()
            .map_err(|err| ScrapeError::Output(err.to_string()))?;
        Ok(Self { writer, rows: 0 })
    }

    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> Result<W, ScrapeError> {
        self.writer
            .into_inner()
            .map_err(|err| ScrapeError::Output(err.to_string()))
    }
}

impl<W: Write> RowSink for CsvSink<W> {
    fn write_row(&mut self, row: &MergedRow) -> Result<(), ScrapeError> {
        self.writer.write_record(row.fields())?;
        self.writer
            .flush()
            .map_err(|err| ScrapeError::Output(err.to_string()))?;
        self.rows += 1;
        Ok(())
    }
}

impl RowSink for Vec<MergedRow> {
    fn write_row(&mut self, row: &MergedRow) -> Result<(), ScrapeError> {
        self.push(row.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn file_name_embeds_timestamp() {
        let started = Local.with_ymd_and_hms(2014, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(output_file_name(&started), "gamedata-20140309-07_05_01.csv");
    }

    #[test]
    fn preamble_then_headers() {
        let started = Local.with_ymd_and_hms(2014, 3, 9, 7, 5, 1).unwrap();
        let sink = CsvSink::new(Vec::new(), &started).unwrap();
        let bytes = sink.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("DateTime:,2014-03-09 07:05:01.000000"));
        assert_eq!(
            lines.next(),
            Some(
                "name,platform,release year,genre,publisher,north america sales,europe sales,japan sales,rest of world sales,global sales,release date,critic score,critic outof,critic count,user score,user count,developer,rating"
            )
        );
        assert_eq!(lines.next(), None);
    }
}

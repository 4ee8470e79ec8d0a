use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ScrapeError {
    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid config value: {0}")]
    InvalidConfig(String),

    #[error("VGChartz request failed: {0}")]
    CatalogHttp(String),

    #[error("VGChartz returned status {status} for page {page}")]
    CatalogStatus { page: u32, status: u16 },

    #[error("VGChartz page {0} has no chart table")]
    #[diagnostic(help("the page layout may have changed; check the `table.chart` selector"))]
    MalformedPage(u32),

    #[error("malformed chart row: {0}")]
    MalformedRow(String),

    #[error("Metacritic request failed: {0}")]
    RatingsHttp(String),

    #[error("Metacritic returned status {status}: {url}")]
    RatingsStatus { status: u16, url: String },

    #[error("output error: {0}")]
    Output(String),
}

impl From<csv::Error> for ScrapeError {
    fn from(err: csv::Error) -> Self {
        ScrapeError::Output(err.to_string())
    }
}

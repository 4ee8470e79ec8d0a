use std::sync::OnceLock;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use crate::config::ResolvedConfig;
use crate::domain::{PrimaryRecord, RegionalSales, SalesFigure, basename_from_url};
use crate::error::ScrapeError;

/// Cells in a data row: rank, title, platform, year, genre, publisher and
/// five sales columns.
pub const ROW_CELLS: usize = 11;

pub trait CatalogClient {
    /// Raw HTML of one page of the sales-sorted game database. Pages start
    /// at 1.
    fn fetch_page(&self, page: u32) -> Result<String, ScrapeError>;
}

#[derive(Clone)]
pub struct CatalogHttpClient {
    client: Client,
    base_url: String,
    page_size: u32,
}

impl CatalogHttpClient {
    pub fn new(config: &ResolvedConfig) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|err| ScrapeError::InvalidConfig(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|err| ScrapeError::CatalogHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: config.catalog_base_url.clone(),
            page_size: config.page_size,
        })
    }

    pub fn page_url(base_url: &str, page: u32, page_size: u32) -> String {
        format!(
            "{base_url}/gamedb/?page={page}&results={page_size}&name=&platform=&minSales=0&publisher=&genre=&sort=GL"
        )
    }
}

impl CatalogClient for CatalogHttpClient {
    fn fetch_page(&self, page: u32) -> Result<String, ScrapeError> {
        let url = Self::page_url(&self.base_url, page, self.page_size);
        info!(page, %url, "requesting VGChartz page");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| ScrapeError::CatalogHttp(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ScrapeError::CatalogStatus {
                page,
                status: response.status().as_u16(),
            });
        }
        response
            .text()
            .map_err(|err| ScrapeError::CatalogHttp(err.to_string()))
    }
}

/// One `td` of a chart row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub href: Option<String>,
}

/// The cells of one `tr`, in document order. Header rows have none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub cells: Vec<Cell>,
}

impl RawRow {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

fn selector(slot: &'static OnceLock<Selector>, css: &str) -> &'static Selector {
    slot.get_or_init(|| Selector::parse(css).expect("static selector"))
}

/// Splits a VGChartz page into rows of `table.chart`.
///
/// A page without the chart table is an error; a table without data rows
/// is not.
pub fn parse_page(page: u32, html: &str) -> Result<Vec<RawRow>, ScrapeError> {
    static TABLE: OnceLock<Selector> = OnceLock::new();
    static ROW: OnceLock<Selector> = OnceLock::new();
    static CELL: OnceLock<Selector> = OnceLock::new();

    let document = Html::parse_document(html);
    let table = document
        .select(selector(&TABLE, "table.chart"))
        .next()
        .ok_or(ScrapeError::MalformedPage(page))?;

    let rows = table
        .select(selector(&ROW, "tr"))
        .map(|row| RawRow {
            cells: row.select(selector(&CELL, "td")).map(read_cell).collect(),
        })
        .collect();
    Ok(rows)
}

fn read_cell(cell: ElementRef<'_>) -> Cell {
    static LINK: OnceLock<Selector> = OnceLock::new();
    let href = cell
        .select(selector(&LINK, "a"))
        .next()
        .and_then(|link| link.value().attr("href"))
        .map(str::to_string);
    Cell {
        text: cell.text().collect(),
        href,
    }
}

/// Builds a record from one chart row. Rows without cells yield `None`.
pub fn parse_row(row: &RawRow) -> Result<Option<PrimaryRecord>, ScrapeError> {
    if row.is_empty() {
        return Ok(None);
    }
    let cells = &row.cells;
    if cells.len() < ROW_CELLS {
        return Err(ScrapeError::MalformedRow(format!(
            "expected {ROW_CELLS} cells, found {}",
            cells.len()
        )));
    }

    let title = &cells[1];
    let detail_url = title
        .href
        .clone()
        .ok_or_else(|| ScrapeError::MalformedRow(format!("no link for {:?}", title.text)))?;
    let basename = basename_from_url(&detail_url)
        .ok_or_else(|| ScrapeError::MalformedRow(format!("unexpected link {detail_url}")))?
        .to_string();

    let text = |index: usize| cells[index].text.clone();
    let sales = |index: usize| SalesFigure::from(cells[index].text.as_str());

    let name = text(1);
    let global_sales = sales(10);
    if global_sales.value().is_none() {
        warn!(title = %name, raw = %global_sales, "unparsable global sales figure");
    }

    Ok(Some(PrimaryRecord {
        name,
        basename,
        detail_url,
        platform: text(2),
        release_year: text(3),
        genre: text(4),
        publisher: text(5),
        sales: RegionalSales {
            north_america: sales(6),
            europe: sales(7),
            japan: sales(8),
            rest_of_world: sales(9),
        },
        global_sales,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> RawRow {
        RawRow {
            cells: values
                .iter()
                .enumerate()
                .map(|(index, value)| Cell {
                    text: value.to_string(),
                    href: (index == 1)
                        .then(|| format!("http://www.vgchartz.com/game/1/{}/", value)),
                })
                .collect(),
        }
    }

    #[test]
    fn header_row_has_no_record() {
        assert_eq!(parse_row(&RawRow::default()).unwrap(), None);
    }

    #[test]
    fn short_row_is_malformed() {
        let err = parse_row(&row(&["1", "halo", "X360"])).unwrap_err();
        assert!(matches!(err, ScrapeError::MalformedRow(_)));
    }

    #[test]
    fn missing_link_is_malformed() {
        let mut raw = row(&[
            "1", "halo", "X360", "2007", "Shooter", "MS", "1", "1", "0", "0", "2",
        ]);
        raw.cells[1].href = None;
        assert!(matches!(
            parse_row(&raw).unwrap_err(),
            ScrapeError::MalformedRow(_)
        ));
    }

    #[test]
    fn text_is_kept_verbatim() {
        let raw = row(&[
            "1", " halo ", "X360", "N/A", "Shooter", "MS", "1.00", "0.50", "0.00", "0.10", "1.60",
        ]);
        let record = parse_row(&raw).unwrap().unwrap();
        assert_eq!(record.name, " halo ");
        assert_eq!(record.release_year, "N/A");
        assert_eq!(record.global_sales.as_str(), "1.60");
        assert_eq!(record.sales.japan.as_str(), "0.00");
    }

    #[test]
    fn unparsable_global_sales_still_yields_a_record() {
        let raw = row(&[
            "9", "pong", "2600", "1977", "Sports", "Atari", "N/A", "N/A", "N/A", "N/A", "N/A",
        ]);
        let record = parse_row(&raw).unwrap().unwrap();
        assert_eq!(record.global_sales.as_str(), "N/A");
        assert_eq!(record.global_sales.value(), None);
        assert!(!record.global_sales.is_zero());
    }

    #[test]
    fn page_url_shape() {
        assert_eq!(
            CatalogHttpClient::page_url("http://www.vgchartz.com", 3, 1000),
            "http://www.vgchartz.com/gamedb/?page=3&results=1000&name=&platform=&minSales=0&publisher=&genre=&sort=GL"
        );
    }
}

use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use serde::Serialize;

/// Column headers of the output file, in row order.
pub const COLUMNS: [&str; 18] = [
    "name",
    "platform",
    "release year",
    "genre",
    "publisher",
    "north america sales",
    "europe sales",
    "japan sales",
    "rest of world sales",
    "global sales",
    "release date",
    "critic score",
    "critic outof",
    "critic count",
    "user score",
    "user count",
    "developer",
    "rating",
];

/// A sales figure as printed by VGChartz. The verbatim text is what gets
/// written out; the parsed value drives the sales floor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesFigure {
    raw: String,
    value: Option<BigDecimal>,
}

impl SalesFigure {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> Option<&BigDecimal> {
        self.value.as_ref()
    }

    pub fn is_zero(&self) -> bool {
        self.value.as_ref().is_some_and(|value| value.is_zero())
    }
}

impl From<&str> for SalesFigure {
    fn from(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            value: BigDecimal::from_str(raw.trim()).ok(),
        }
    }
}

impl fmt::Display for SalesFigure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionalSales {
    pub north_america: SalesFigure,
    pub europe: SalesFigure,
    pub japan: SalesFigure,
    pub rest_of_world: SalesFigure,
}

/// One title from the VGChartz chart table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryRecord {
    pub name: String,
    pub detail_url: String,
    pub basename: String,
    pub platform: String,
    pub release_year: String,
    pub genre: String,
    pub publisher: String,
    pub sales: RegionalSales,
    pub global_sales: SalesFigure,
}

/// Second-to-last `/`-separated segment of a detail URL.
///
/// `http://www.vgchartz.com/game/2667/wii-sports/` yields `wii-sports`.
pub fn basename_from_url(url: &str) -> Option<&str> {
    let mut segments = url.rsplitn(3, '/');
    let _last = segments.next()?;
    let basename = segments.next()?;
    segments.next()?;
    Some(basename)
}

/// Where the ratings page for a title lives, if the platform has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupUrl {
    Available(String),
    Unavailable,
}

/// Metacritic enrichment for one title. Every field is independently
/// optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SecondaryRecord {
    pub release_date: Option<String>,
    pub critic_score: Option<String>,
    pub critic_score_max: Option<String>,
    pub critic_review_count: Option<String>,
    pub user_score: Option<String>,
    pub user_review_count: Option<String>,
    pub developer: Option<String>,
    pub content_rating: Option<String>,
}

impl SecondaryRecord {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRow {
    pub primary: PrimaryRecord,
    pub secondary: SecondaryRecord,
}

impl MergedRow {
    pub fn new(primary: PrimaryRecord, secondary: SecondaryRecord) -> Self {
        Self { primary, secondary }
    }

    /// Field values in [`COLUMNS`] order; absent values become empty strings.
    pub fn fields(&self) -> [&str; 18] {
        let p = &self.primary;
        let s = &self.secondary;
        [
            p.name.as_str(),
            p.platform.as_str(),
            p.release_year.as_str(),
            p.genre.as_str(),
            p.publisher.as_str(),
            p.sales.north_america.as_str(),
            p.sales.europe.as_str(),
            p.sales.japan.as_str(),
            p.sales.rest_of_world.as_str(),
            p.global_sales.as_str(),
            or_blank(&s.release_date),
            or_blank(&s.critic_score),
            or_blank(&s.critic_score_max),
            or_blank(&s.critic_review_count),
            or_blank(&s.user_score),
            or_blank(&s.user_review_count),
            or_blank(&s.developer),
            or_blank(&s.content_rating),
        ]
    }
}

fn or_blank(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

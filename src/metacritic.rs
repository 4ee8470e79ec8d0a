use std::sync::OnceLock;

use regex::Regex;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::config::ResolvedConfig;
use crate::domain::{LookupUrl, PrimaryRecord, SecondaryRecord};
use crate::error::ScrapeError;
use crate::platform;

pub trait RatingsClient {
    fn fetch_document(&self, url: &str) -> Result<String, ScrapeError>;
}

#[derive(Clone)]
pub struct RatingsHttpClient {
    client: Client,
}

impl RatingsHttpClient {
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
            .map_err(|err| ScrapeError::RatingsHttp(err.to_string()))?;
        Ok(Self { client })
    }
}

impl RatingsClient for RatingsHttpClient {
    fn fetch_document(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| ScrapeError::RatingsHttp(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ScrapeError::RatingsStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        response
            .text()
            .map_err(|err| ScrapeError::RatingsHttp(err.to_string()))
    }
}

/// `<base>/game/<platform-slug>/<basename>`, or unavailable when Metacritic
/// has no slug for the record's platform.
pub fn lookup_url(base_url: &str, record: &PrimaryRecord) -> LookupUrl {
    match platform::translate(&record.platform) {
        Some(slug) => LookupUrl::Available(format!("{base_url}/game/{slug}/{}", record.basename)),
        None => LookupUrl::Unavailable,
    }
}

/// Fetches and extracts the ratings page behind `lookup`.
///
/// Never fails: an unavailable lookup returns a blank record without any
/// request, and transport or status errors are logged and also produce a
/// blank record.
pub fn fetch_secondary<R: RatingsClient + ?Sized>(
    client: &R,
    lookup: &LookupUrl,
) -> SecondaryRecord {
    let LookupUrl::Available(url) = lookup else {
        return SecondaryRecord::blank();
    };
    match client.fetch_document(url) {
        Ok(html) => {
            let record = extract_record(&html);
            if record.is_blank() {
                debug!(%url, "no rating fields found");
            }
            record
        }
        Err(ScrapeError::RatingsStatus { status, url })
            if status == StatusCode::NOT_FOUND.as_u16() =>
        {
            debug!(%url, "no Metacritic page");
            SecondaryRecord::blank()
        }
        Err(err) => {
            warn!(%url, error = %err, "Metacritic lookup failed; leaving columns blank");
            SecondaryRecord::blank()
        }
    }
}

struct FieldSelectors {
    release_date: Selector,
    critic_score: Selector,
    critic_score_max: Selector,
    critic_review_count: Selector,
    user_score: Selector,
    user_review_count: Selector,
    developer: Selector,
    content_rating: Selector,
}

fn field_selectors() -> &'static FieldSelectors {
    static SELECTORS: OnceLock<FieldSelectors> = OnceLock::new();
    SELECTORS.get_or_init(|| {
        let parse = |css: &str| Selector::parse(css).expect("static selector");
        FieldSelectors {
            release_date: parse("[itemprop='datePublished']"),
            critic_score: parse(".metascore_summary [itemprop='ratingValue']"),
            critic_score_max: parse(".metascore_summary [itemprop='bestRating']"),
            critic_review_count: parse(".metascore_summary [itemprop='reviewCount']"),
            user_score: parse(".userscore_wrap .metascore_w.user"),
            user_review_count: parse(".userscore_wrap .count a"),
            developer: parse("li.developer .data"),
            content_rating: parse("li.product_rating .data"),
        }
    })
}

fn first_integer(text: &str) -> Option<String> {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    let number = NUMBER.get_or_init(|| Regex::new(r"\d[\d,]*").expect("static regex"));
    number
        .find(text)
        .map(|found| found.as_str().replace(',', ""))
}

fn text_of(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Pulls the rating fields out of a Metacritic game page. Each field is
/// looked up on its own; whatever is missing stays `None`.
pub fn extract_record(html: &str) -> SecondaryRecord {
    let document = Html::parse_document(html);
    let fields = field_selectors();
    SecondaryRecord {
        release_date: text_of(&document, &fields.release_date),
        critic_score: text_of(&document, &fields.critic_score),
        critic_score_max: text_of(&document, &fields.critic_score_max),
        critic_review_count: text_of(&document, &fields.critic_review_count),
        user_score: text_of(&document, &fields.user_score),
        user_review_count: text_of(&document, &fields.user_review_count)
            .and_then(|text| first_integer(&text)),
        developer: text_of(&document, &fields.developer),
        content_rating: text_of(&document, &fields.content_rating),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_drop_thousands_separators() {
        assert_eq!(first_integer("1,204 Ratings").as_deref(), Some("1204"));
        assert_eq!(first_integer("based on 87 Critics").as_deref(), Some("87"));
        assert_eq!(first_integer("no ratings yet"), None);
    }

    #[test]
    fn empty_document_is_blank() {
        assert!(extract_record("").is_blank());
        assert!(extract_record("<html><body><p>Page not found</p></body></html>").is_blank());
    }

    #[test]
    fn fields_are_independent() {
        let html = r#"<html><body>
            <li class="summary_detail developer"><span class="label">Developer:</span>
              <span class="data"> Nintendo </span></li>
            <div class="userscore_wrap"><div class="metascore_w user">tbd</div></div>
        </body></html>"#;
        let record = extract_record(html);
        assert_eq!(record.developer.as_deref(), Some("Nintendo"));
        assert_eq!(record.user_score.as_deref(), Some("tbd"));
        assert_eq!(record.critic_score, None);
        assert_eq!(record.user_review_count, None);
    }
}

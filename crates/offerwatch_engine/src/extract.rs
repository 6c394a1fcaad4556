use std::collections::HashSet;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use offerwatch_core::{Offer, OfferId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("invalid CSS selector for `{field}`: {selector}")]
    BadSelector { field: &'static str, selector: String },
    #[error("invalid base url: {0}")]
    BadBaseUrl(String),
}

/// Mapping from page structure to offer fields, all CSS selectors
/// relative to one listing row. `title` and `link` are required on every
/// row; the rest are optional display attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Selects one element per listing.
    pub row: String,
    pub title: String,
    pub link: String,
    /// Attribute on the link element holding the target URL.
    #[serde(default = "default_link_attr")]
    pub link_attr: String,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub posted_at: Option<String>,
    /// Attribute on the row element carrying the site's own stable key.
    /// When set, that key becomes the offer id; otherwise the id is
    /// derived from title+link+price.
    #[serde(default)]
    pub id_attr: Option<String>,
}

fn default_link_attr() -> String {
    "href".to_owned()
}

/// What one pass over the rendered document produced. `skipped_rows`
/// counts listing rows dropped for missing required fields; zero offers
/// with a non-zero prior baseline is judged by the coordinator, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub offers: Vec<Offer>,
    pub skipped_rows: usize,
}

pub trait OfferExtractor: Send + Sync {
    fn extract(&self, html: &str) -> Result<Extraction, ExtractError>;
}

/// CSS-selector driven extractor. All selectors are compiled up front so
/// a typo in the mapping fails loudly at startup instead of silently
/// extracting nothing every run.
#[derive(Debug)]
pub struct SelectorExtractor {
    base_url: Url,
    row: Selector,
    title: Selector,
    link: Selector,
    link_attr: String,
    price: Option<Selector>,
    location: Option<Selector>,
    posted_at: Option<Selector>,
    id_attr: Option<String>,
}

impl SelectorExtractor {
    pub fn new(mapping: &FieldMapping, base_url: &str) -> Result<Self, ExtractError> {
        let base_url =
            Url::parse(base_url).map_err(|err| ExtractError::BadBaseUrl(err.to_string()))?;
        Ok(Self {
            base_url,
            row: compile("row", &mapping.row)?,
            title: compile("title", &mapping.title)?,
            link: compile("link", &mapping.link)?,
            link_attr: mapping.link_attr.clone(),
            price: compile_opt("price", mapping.price.as_deref())?,
            location: compile_opt("location", mapping.location.as_deref())?,
            posted_at: compile_opt("posted_at", mapping.posted_at.as_deref())?,
            id_attr: mapping.id_attr.clone(),
        })
    }

    fn text_of(row: &scraper::ElementRef<'_>, selector: &Selector) -> Option<String> {
        row.select(selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_owned())
            .filter(|text| !text.is_empty())
    }
}

impl OfferExtractor for SelectorExtractor {
    fn extract(&self, html: &str) -> Result<Extraction, ExtractError> {
        let doc = Html::parse_document(html);
        let mut offers: Vec<Offer> = Vec::new();
        let mut seen: HashSet<OfferId> = HashSet::new();
        let mut skipped_rows = 0;

        for row in doc.select(&self.row) {
            let title = Self::text_of(&row, &self.title);
            let link = row
                .select(&self.link)
                .next()
                .and_then(|el| el.value().attr(&self.link_attr))
                .and_then(|raw| self.base_url.join(raw).ok())
                .map(|url| url.to_string());

            let (Some(title), Some(link)) = (title, link) else {
                skipped_rows += 1;
                continue;
            };

            let price = self.price.as_ref().and_then(|sel| Self::text_of(&row, sel));
            let id = match &self.id_attr {
                Some(attr) => match row.value().attr(attr) {
                    Some(key) => OfferId::native(key),
                    // A configured native key missing on a row is a
                    // malformed listing, same treatment as a missing link.
                    None => {
                        skipped_rows += 1;
                        continue;
                    }
                },
                None => OfferId::derived(&title, &link, price.as_deref()),
            };

            // Duplicate ids within one extraction: first occurrence wins.
            if !seen.insert(id.clone()) {
                continue;
            }

            offers.push(Offer {
                id,
                title,
                link,
                price,
                location: self
                    .location
                    .as_ref()
                    .and_then(|sel| Self::text_of(&row, sel)),
                posted_at: self
                    .posted_at
                    .as_ref()
                    .and_then(|sel| Self::text_of(&row, sel)),
            });
        }

        Ok(Extraction {
            offers,
            skipped_rows,
        })
    }
}

fn compile(field: &'static str, selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|_| ExtractError::BadSelector {
        field,
        selector: selector.to_owned(),
    })
}

fn compile_opt(
    field: &'static str,
    selector: Option<&str>,
) -> Result<Option<Selector>, ExtractError> {
    selector.map(|sel| compile(field, sel)).transpose()
}

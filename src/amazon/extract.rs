//! Field extraction from product-detail pages.

use crate::amazon::selectors::{blocks, brand, image, price};
use crate::harvest::outcome::Field;
use scraper::{ElementRef, Html};
use tracing::trace;

/// A value located on the page, before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// Text value ready to record.
    Text(String),
    /// Image URL still to be downloaded.
    ImageUrl(String),
}

/// Walks the fixed selector strategies for one field kind.
pub struct Extractor {
    field: Field,
}

impl Extractor {
    pub fn new(field: Field) -> Self {
        Self { field }
    }

    pub fn field(&self) -> Field {
        self.field
    }

    /// Detects a block/challenge page. Checked before any extraction:
    /// a blocked page may still carry product markup in cached fragments.
    pub fn is_blocked(&self, document: &Html) -> bool {
        if let Some(title) = document.select(&blocks::TITLE).next() {
            let title_text = title.text().collect::<String>();
            if title_text.contains(blocks::ROBOT_TITLE_MARKER) {
                return true;
            }
        }

        if document.select(&blocks::CAPTCHA).next().is_some() {
            return true;
        }

        if document.select(&blocks::DOG_PAGE).next().is_some() {
            return true;
        }

        document.root_element().text().any(|t| t.contains(blocks::ACCESS_DENIED_MARKER))
    }

    /// Tries the field's strategies in order; the first non-empty value wins.
    /// Returns `None` when every strategy comes up empty.
    ///
    /// Placeholder detection on a winning value (tracking-pixel image URLs)
    /// is the caller's concern: a placeholder means the strategy matched a
    /// real element, which is a different failure than nothing matching.
    pub fn extract(&self, document: &Html) -> Option<Candidate> {
        match self.field {
            Field::Brand => self.extract_brand(document),
            Field::Image => self.extract_image(document),
            Field::Price => self.extract_price(document),
        }
    }

    /// True when a winning candidate is a known placeholder.
    pub fn is_placeholder(&self, candidate: &Candidate) -> bool {
        match candidate {
            Candidate::ImageUrl(url) => url.contains(image::PLACEHOLDER_MARKER),
            Candidate::Text(_) => false,
        }
    }

    fn extract_brand(&self, document: &Html) -> Option<Candidate> {
        for selector in [&*brand::BYLINE, &*brand::OVERVIEW_ROW] {
            if let Some(element) = document.select(selector).next() {
                let cleaned = clean_byline(&element_text(element));
                if !cleaned.is_empty() {
                    trace!("Brand strategy hit: {}", cleaned);
                    return Some(Candidate::Text(cleaned));
                }
            }
        }
        None
    }

    fn extract_image(&self, document: &Html) -> Option<Candidate> {
        if let Some(element) = document.select(&image::LANDING).next() {
            if let Some(url) = non_empty_attr(element, "src") {
                trace!("Image strategy hit: landing");
                return Some(Candidate::ImageUrl(url));
            }
        }

        if let Some(element) = document.select(&image::WRAPPER).next() {
            if let Some(url) =
                non_empty_attr(element, "src").or_else(|| non_empty_attr(element, image::HIRES_ATTR))
            {
                trace!("Image strategy hit: wrapper");
                return Some(Candidate::ImageUrl(url));
            }
        }

        None
    }

    fn extract_price(&self, document: &Html) -> Option<Candidate> {
        // Unavailable listings have no price block; the marker text is the
        // recorded value for the row.
        for element in document.select(&price::AVAILABILITY) {
            if element_text(element).to_lowercase().contains(price::UNAVAILABLE_MARKER) {
                trace!("Price availability probe hit");
                return Some(Candidate::Text("Currently unavailable".to_string()));
            }
        }

        let strategies = [
            &*price::OFFSCREEN,
            &*price::OUR_PRICE,
            &*price::DEAL_PRICE,
            &*price::SALE_PRICE,
            &*price::BUYBOX,
        ];
        for selector in strategies {
            if let Some(element) = document.select(selector).next() {
                let text = element_text(element);
                if !text.is_empty() {
                    trace!("Price strategy hit: {}", text);
                    return Some(Candidate::Text(text));
                }
            }
        }

        // Composite fallback: whole and fractional parts rendered separately.
        let whole = document.select(&price::WHOLE).next().map(element_text)?;
        let fraction = document.select(&price::FRACTION).next().map(element_text)?;
        let whole = whole.trim_end_matches(['.', ',']).trim().to_string();
        if whole.is_empty() || fraction.is_empty() {
            return None;
        }
        Some(Candidate::Text(format!("{}.{}", whole, fraction)))
    }
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn non_empty_attr(element: ElementRef, name: &str) -> Option<String> {
    element.value().attr(name).map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

/// Strips byline furniture around the brand name.
fn clean_byline(text: &str) -> String {
    text.trim()
        .trim_start_matches("Brand:")
        .trim_start_matches("Visit the")
        .trim_end_matches("Store")
        .trim()
        .to_string()
}

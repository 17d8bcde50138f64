//! HTML scraping for the scheduling portal
//!
//! [`PageScraper`] turns rendered portal pages into the handful of values the
//! session and booking flows need: the anti-forgery token, the facility
//! options of the booking form and the flash message of a re-rendered form.
//! It never touches the network.

pub mod selectors;

use scraper::{Html, Selector};

use crate::models::FacilityRegistry;
use crate::parser::selectors::{PortalSelectors, ASC_FACILITY_SELECT, CONSULATE_FACILITY_SELECT};
use crate::utils::error::ScrapeError;
use crate::utils::normalize_whitespace;

/// Stateless scraper over portal HTML
pub struct PageScraper {
    selectors: PortalSelectors,
}

impl PageScraper {
    #[must_use]
    pub fn new() -> Self {
        Self {
            selectors: PortalSelectors::new(),
        }
    }

    /// Read the `content` attribute of the page's CSRF meta tag
    ///
    /// Returns `None` when the tag is missing or its content is blank.
    pub fn extract_anti_forgery_token(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);

        document
            .select(self.selectors.csrf_meta)
            .filter_map(|meta| meta.value().attr("content"))
            .map(str::trim)
            .find(|content| !content.is_empty())
            .map(str::to_string)
    }

    /// Read all non-empty `option` values under the element matched by `selector`
    ///
    /// # Errors
    ///
    /// Returns `ScrapeError::InvalidSelector` if `selector` is not valid CSS
    pub fn extract_facility_options(
        &self,
        html: &str,
        selector: &str,
    ) -> Result<Vec<String>, ScrapeError> {
        let container = Selector::parse(selector)
            .map_err(|_| ScrapeError::InvalidSelector(selector.to_string()))?;
        let document = Html::parse_document(html);

        Ok(self.options_under(&document, &container))
    }

    /// Facility identifiers offered by the booking form for both appointment kinds
    pub fn facility_registry(&self, html: &str) -> FacilityRegistry {
        let document = Html::parse_document(html);

        let consulate = Selector::parse(CONSULATE_FACILITY_SELECT)
            .map(|sel| self.options_under(&document, &sel))
            .unwrap_or_default();
        let asc = Selector::parse(ASC_FACILITY_SELECT)
            .map(|sel| self.options_under(&document, &sel))
            .unwrap_or_default();

        FacilityRegistry { consulate, asc }
    }

    /// Whether the page is the sign-in form
    pub fn has_sign_in_form(&self, html: &str) -> bool {
        let document = Html::parse_document(html);

        self.selectors
            .sign_in_form
            .iter()
            .any(|sel| document.select(sel).next().is_some())
    }

    /// First non-blank flash/alert message on the page
    pub fn extract_flash_message(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);

        for selector in self.selectors.flash_messages {
            for element in document.select(selector) {
                let text = normalize_whitespace(&element.text().collect::<String>());
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }

        None
    }

    fn options_under(&self, document: &Html, container: &Selector) -> Vec<String> {
        let mut values = Vec::new();

        for element in document.select(container) {
            for option in element.select(self.selectors.option) {
                if let Some(value) = option.value().attr("value") {
                    let value = value.trim();
                    if !value.is_empty() && !values.iter().any(|v| v == value) {
                        values.push(value.to_string());
                    }
                }
            }
        }

        values
    }
}

impl Default for PageScraper {
    fn default() -> Self {
        Self::new()
    }
}

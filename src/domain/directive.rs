use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::domain::fault::HarvestError;

pub const DEFAULT_MAX_SCROLLS: u32 = 5;
pub const DEFAULT_SCROLL_DELAY_MS: u64 = 2000;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Everything one fetch is allowed to do, fixed up front. Selector keys are
/// unique by construction of the map.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionDirective {
    pub url: String,
    pub selectors: BTreeMap<String, String>,
    pub wait_for_selector: Option<String>,
    pub scroll_to_bottom: bool,
    pub max_scrolls: u32,
    pub delay_between_scrolls_ms: u64,
    pub extract_text: bool,
    pub extract_links: bool,
    pub extract_images: bool,
    pub extract_tables: bool,
    pub custom_script: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub timeout_ms: u64,
}

impl Default for ExtractionDirective {
    fn default() -> Self {
        ExtractionDirective {
            url: String::new(),
            selectors: BTreeMap::new(),
            wait_for_selector: None,
            scroll_to_bottom: false,
            max_scrolls: DEFAULT_MAX_SCROLLS,
            delay_between_scrolls_ms: DEFAULT_SCROLL_DELAY_MS,
            extract_text: true,
            extract_links: false,
            extract_images: false,
            extract_tables: false,
            custom_script: None,
            headers: BTreeMap::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ExtractionDirective {
    pub fn for_url(url: &str) -> Self {
        ExtractionDirective {
            url: url.to_string(),
            ..Default::default()
        }
    }

    /// Text, links, images and tables all on. What the crawl pipeline asks
    /// for on every candidate site.
    pub fn with_full_capture(mut self) -> Self {
        self.extract_text = true;
        self.extract_links = true;
        self.extract_images = true;
        self.extract_tables = true;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn scroll_delay(&self) -> Duration {
        Duration::from_millis(self.delay_between_scrolls_ms)
    }

    /// Checked before any network I/O. A directive that fails here is a
    /// caller mistake, not a fetch failure.
    pub fn validated_url(&self) -> Result<Url, HarvestError> {
        let parsed = Url::parse(&self.url)
            .map_err(|_| HarvestError::InvalidInput(format!("Invalid URL: {}", self.url)))?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(HarvestError::InvalidInput(format!(
                    "Unsupported URL scheme: {}",
                    other
                )))
            }
        }

        match parsed.host_str() {
            Some(host) if !host.is_empty() => Ok(parsed),
            _ => Err(HarvestError::InvalidInput(format!(
                "URL has no host: {}",
                self.url
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ExtractionDirective;

    #[test]
    fn validated_url_accepts_absolute_http_urls() {
        let directive = ExtractionDirective::for_url("https://www.znaturalfoods.com/products/green-tea-organic");
        let parsed = directive.validated_url().unwrap();

        assert_eq!(parsed.host_str(), Some("www.znaturalfoods.com"));
    }

    #[test]
    fn validated_url_rejects_relative_and_malformed_urls() {
        let bad = [
            "",
            "#",
            "not-a-url",
            "/search?q=green+tea",
            "javascript:void(0)",
            "ftp://example.com/archive",
        ];

        for url in bad {
            let directive = ExtractionDirective::for_url(url);
            assert!(directive.validated_url().is_err(), "accepted: {}", url);
        }
    }

    #[test]
    fn defaults_match_a_plain_text_scrape() {
        let directive = ExtractionDirective::for_url("https://example.com");

        assert!(directive.extract_text);
        assert!(!directive.extract_links);
        assert!(!directive.scroll_to_bottom);
        assert_eq!(directive.max_scrolls, 5);
        assert_eq!(directive.timeout_ms, 30_000);
    }
}

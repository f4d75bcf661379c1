use std::time::{Duration, Instant};

use fake_user_agent::get_rua;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use thirtyfour::{By, WebDriver};
use url::Url;

use crate::domain::directive::ExtractionDirective;
use crate::domain::fault::HarvestError;
use crate::domain::page::{ExtractedRecord, FetchMethod, PageData};
use crate::services::extract::extract_page_data;
use crate::services::pilot::Pilot;
use crate::stats;

const WAIT_SELECTOR_TIMEOUT: Duration = Duration::from_secs(10);
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(200);

enum RenderOutcome {
    Captured(PageData),
    /// Session setup or navigation failed; the static strategy gets a shot.
    Unavailable(String),
    /// The page was reached but something after navigation failed. Terminal,
    /// a static refetch would not see the dynamic content either.
    PageError(String),
}

/// Fetches one URL per a directive. Rendered strategy first, static
/// HTTP+parse when no renderer can be had. Page-load failures come back as
/// `success: false` records; the only error out of here is a bad directive.
pub struct PageFetcher {
    webdriver_endpoint: String,
    headless: bool,
}

impl PageFetcher {
    pub fn new(webdriver_endpoint: String, headless: bool) -> Self {
        PageFetcher {
            webdriver_endpoint,
            headless,
        }
    }

    pub async fn fetch(
        &self,
        directive: &ExtractionDirective,
    ) -> Result<ExtractedRecord, HarvestError> {
        let target = directive.validated_url()?;
        let user_agent = get_rua();
        log::info!("Fetching {}", target);

        let record = match self.fetch_rendered(&target, directive, user_agent).await {
            RenderOutcome::Captured(data) => {
                ExtractedRecord::captured(target.to_string(), FetchMethod::Rendered, data)
            }
            RenderOutcome::PageError(message) => {
                log::error!("Rendered fetch failed on {}: {}", target, message);
                ExtractedRecord::failed(target.to_string(), FetchMethod::Rendered, message)
            }
            RenderOutcome::Unavailable(message) => {
                log::warn!(
                    "Renderer unavailable for {} ({}), using static fetch",
                    target,
                    message
                );
                match self.fetch_static(&target, directive, user_agent).await {
                    Ok(data) => ExtractedRecord::captured(
                        target.to_string(),
                        FetchMethod::StaticFallback,
                        data,
                    ),
                    Err(e) => ExtractedRecord::failed(
                        target.to_string(),
                        FetchMethod::StaticFallback,
                        e.to_string(),
                    ),
                }
            }
        };

        if !record.success {
            stats::record_scrape_failure();
        }
        Ok(record)
    }

    async fn fetch_rendered(
        &self,
        target: &Url,
        directive: &ExtractionDirective,
        user_agent: &str,
    ) -> RenderOutcome {
        let pilot = match Pilot::board(&self.webdriver_endpoint, self.headless, user_agent).await {
            Ok(pilot) => pilot,
            Err(e) => return RenderOutcome::Unavailable(format!("webdriver session: {}", e)),
        };

        // The session is dismissed on every path out of drive_page.
        let outcome = drive_page(&pilot.driver, target, directive).await;
        pilot.dismiss().await;
        outcome
    }

    // Custom headers cannot be injected through WebDriver; they only bind on
    // this path. The user agent is carried by a browser argument instead.
    async fn fetch_static(
        &self,
        target: &Url,
        directive: &ExtractionDirective,
        user_agent: &str,
    ) -> anyhow::Result<PageData> {
        let mut headers = HeaderMap::new();
        for (name, value) in directive.headers.iter() {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(directive.timeout())
            .build()?;

        let body = client
            .get(target.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(extract_page_data(&body, directive))
    }
}

async fn drive_page(
    driver: &WebDriver,
    target: &Url,
    directive: &ExtractionDirective,
) -> RenderOutcome {
    if let Err(e) = driver.set_page_load_timeout(directive.timeout()).await {
        return RenderOutcome::Unavailable(format!("session timeouts: {}", e));
    }
    if let Err(e) = driver.goto(target.as_str()).await {
        return RenderOutcome::Unavailable(format!("navigation: {}", e));
    }

    if let Some(selector) = &directive.wait_for_selector {
        if let Err(message) = wait_for_selector(driver, selector).await {
            return RenderOutcome::PageError(message);
        }
    }

    if directive.scroll_to_bottom {
        scroll_to_bottom(driver, directive).await;
    }

    if let Some(script) = &directive.custom_script {
        // Side effects only; the script's return value is not part of the
        // record.
        if let Err(e) = driver.execute(script, Vec::new()).await {
            return RenderOutcome::PageError(format!("custom script: {}", e));
        }
    }

    match driver.source().await {
        Ok(html) => RenderOutcome::Captured(extract_page_data(&html, directive)),
        Err(e) => RenderOutcome::PageError(format!("page source: {}", e)),
    }
}

async fn wait_for_selector(driver: &WebDriver, selector: &str) -> Result<(), String> {
    let deadline = Instant::now() + WAIT_SELECTOR_TIMEOUT;
    loop {
        if driver.find(By::Css(selector)).await.is_ok() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(format!("Timed out waiting for selector {:?}", selector));
        }
        tokio::time::sleep(WAIT_POLL_INTERVAL).await;
    }
}

// How infinite-scroll pages get their content surfaced. A scroll that fails
// mid-way keeps whatever already loaded.
async fn scroll_to_bottom(driver: &WebDriver, directive: &ExtractionDirective) {
    for _ in 0..directive.max_scrolls {
        if let Err(e) = driver
            .execute("window.scrollTo(0, document.body.scrollHeight);", Vec::new())
            .await
        {
            log::warn!("Scroll failed: {:?}", e);
            break;
        }
        tokio::time::sleep(directive.scroll_delay()).await;
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::directive::ExtractionDirective;
    use crate::domain::fault::HarvestError;

    use super::PageFetcher;

    #[tokio::test]
    async fn malformed_url_is_rejected_before_any_io() {
        let fetcher = PageFetcher::new("http://localhost:4444".to_string(), true);
        let directive = ExtractionDirective::for_url("not-a-url");

        match fetcher.fetch(&directive).await {
            Err(HarvestError::InvalidInput(_)) => {}
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }
}

use chrono::Utc;

use crate::configuration::CrawlSettings;
use crate::domain::directive::ExtractionDirective;
use crate::domain::fault::HarvestError;
use crate::domain::search::{CrawlResult, ScrapedSite};
use crate::services::fetcher::PageFetcher;
use crate::services::{politeness_pause, seeker};

/// Search, then scrape each candidate with full capture. A candidate that
/// fails to fetch is dropped and the loop moves on; the strategy fallback
/// inside the fetcher is the only retry there is. Only the orchestrator
/// coming back empty-handed on every engine aborts the run.
pub async fn search_and_scrape(
    fetcher: &PageFetcher,
    crawl: &CrawlSettings,
    query: &str,
    max_results: usize,
    engines: &[String],
) -> Result<CrawlResult, HarvestError> {
    log::info!(
        "Starting search and scrape for {:?} across {:?}",
        query,
        engines
    );

    let search_results = seeker::search(fetcher, crawl, query, max_results, engines).await?;

    let mut scraped_sites: Vec<ScrapedSite> = vec![];
    for (index, candidate) in search_results.iter().take(max_results).enumerate() {
        if index > 0 {
            politeness_pause(crawl.site_delay()).await;
        }

        let directive = ExtractionDirective::for_url(&candidate.url)
            .with_full_capture()
            .with_timeout_ms(crawl.scrape_timeout_ms);
        if let Err(e) = directive.validated_url() {
            log::error!("Skipping candidate with invalid URL {}: {}", candidate.url, e);
            continue;
        }

        match fetcher.fetch(&directive).await {
            Ok(record) if record.success => {
                scraped_sites.push(ScrapedSite {
                    url: candidate.url.clone(),
                    title: candidate.title.clone(),
                    search_engine: candidate.search_engine.clone(),
                    scraped_data: record.data.unwrap_or_default(),
                    timestamp: record.timestamp,
                });
            }
            Ok(record) => {
                log::error!(
                    "Dropping candidate {}: {}",
                    candidate.url,
                    record.error.unwrap_or_default()
                );
            }
            Err(e) => {
                log::error!("Dropping candidate {}: {}", candidate.url, e);
            }
        }
    }

    log::info!(
        "Search and scrape done for {:?}: {} found, {} scraped",
        query,
        search_results.len(),
        scraped_sites.len()
    );

    Ok(CrawlResult {
        query: query.to_string(),
        timestamp: Utc::now(),
        total_results: search_results.len(),
        search_results,
        scraped_sites,
    })
}

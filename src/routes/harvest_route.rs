use actix_web::{post, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::configuration::CrawlSettings;
use crate::domain::fault::HarvestError;
use crate::domain::lead::LeadReport;
use crate::services::{estimate_cost, pipeline, seeker, Gatekeeper, PageFetcher, Prospector, Tier};
use crate::stats;

use super::{client_key, error_response, ok_response};

const MIN_QUERY_LEN: usize = 2;
const MAX_QUERY_LEN: usize = 500;
const MAX_RESULTS_CAP: usize = 100;

fn default_max_results() -> usize {
    10
}

fn default_engines() -> Vec<String> {
    vec!["google".to_string(), "bing".to_string()]
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestRequest {
    query: String,
    #[serde(default = "default_max_results")]
    max_results: usize,
    #[serde(default = "default_engines")]
    engines: Vec<String>,
    #[serde(default)]
    enrich: bool,
    #[serde(default)]
    location: Option<String>,
}

/// Search, scrape, optionally enrich. Thin: validation and rate gating up
/// front, one pipeline call, one response.
#[post("/harvest")]
async fn harvest(
    request: HttpRequest,
    body: web::Json<HarvestRequest>,
    fetcher: web::Data<PageFetcher>,
    prospector: web::Data<Prospector>,
    gatekeeper: web::Data<Gatekeeper>,
    crawl: web::Data<CrawlSettings>,
) -> HttpResponse {
    stats::record_request();

    if let Err(e) = validate_harvest_request(&body.query, body.max_results, &body.engines) {
        return error_response(&e);
    }

    let caller = client_key(&request);
    if let Err(e) = gatekeeper.consume(&caller, Tier::General) {
        return error_response(&e.into());
    }
    if let Err(e) = gatekeeper.consume(&caller, Tier::Scrape) {
        return error_response(&e.into());
    }

    let request_id = Uuid::new_v4();
    log::info!(
        "[{}] Harvest request: {:?}, max {}, engines {:?}, enrich {}",
        request_id,
        body.query,
        body.max_results,
        body.engines,
        body.enrich
    );

    let crawl_result = match pipeline::search_and_scrape(
        &fetcher,
        &crawl,
        body.query.trim(),
        body.max_results,
        &body.engines,
    )
    .await
    {
        Ok(result) => result,
        Err(e) => {
            log::error!("[{}] Harvest failed: {}", request_id, e);
            return error_response(&e);
        }
    };

    if !body.enrich {
        return ok_response(crawl_result);
    }

    let location = body.location.as_deref();
    let toggles = prospector.toggles(location);
    let leads = prospector.enrich(crawl_result.scraped_sites, location).await;
    log::info!("[{}] Enriched {} leads", request_id, leads.len());

    ok_response(LeadReport {
        query: crawl_result.query,
        timestamp: crawl_result.timestamp,
        search_results: crawl_result.search_results,
        estimated_cost: estimate_cost(leads.len(), toggles),
        total_results: crawl_result.total_results,
        leads,
    })
}

fn validate_harvest_request(
    query: &str,
    max_results: usize,
    engines: &[String],
) -> Result<(), HarvestError> {
    let trimmed = query.trim();
    if trimmed.len() < MIN_QUERY_LEN {
        return Err(HarvestError::InvalidInput(
            "Search query must be at least 2 characters long".to_string(),
        ));
    }
    if trimmed.len() > MAX_QUERY_LEN {
        return Err(HarvestError::InvalidInput(
            "Search query must be less than 500 characters".to_string(),
        ));
    }
    if max_results < 1 || max_results > MAX_RESULTS_CAP {
        return Err(HarvestError::InvalidInput(
            "maxResults must be an integer between 1 and 100".to_string(),
        ));
    }
    if engines.is_empty() {
        return Err(HarvestError::InvalidInput(
            "engines must be a non-empty list".to_string(),
        ));
    }

    let unknown: Vec<&str> = engines
        .iter()
        .filter(|engine| !seeker::known_engine(engine))
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        return Err(HarvestError::InvalidInput(format!(
            "Invalid search engines: {}",
            unknown.join(", ")
        )));
    }

    Ok(())
}

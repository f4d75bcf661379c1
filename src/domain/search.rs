use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::page::PageData;

/// One candidate discovered on a search-engine result page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    #[serde(rename = "searchEngine")]
    pub search_engine: String,
    pub snippet: String,
}

/// A candidate that survived the scrape step.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapedSite {
    pub url: String,
    pub title: String,
    #[serde(rename = "searchEngine")]
    pub search_engine: String,
    #[serde(rename = "scrapedData")]
    pub scraped_data: PageData,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate for one pipeline run. `scraped_sites` is always a subset of
/// `search_results`; candidates that failed to fetch are simply absent.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlResult {
    pub query: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "searchResults")]
    pub search_results: Vec<SearchResult>,
    #[serde(rename = "scrapedSites")]
    pub scraped_sites: Vec<ScrapedSite>,
    #[serde(rename = "totalResults")]
    pub total_results: usize,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{CrawlResult, SearchResult};

    #[test]
    fn crawl_result_serializes_with_stable_field_names() {
        let result = CrawlResult {
            query: "find restaurants in Los Angeles".to_string(),
            timestamp: Utc::now(),
            search_results: vec![SearchResult {
                title: "Best Restaurants".to_string(),
                url: "https://www.laeats.com/guide".to_string(),
                search_engine: "google".to_string(),
                snippet: "Top places to eat".to_string(),
            }],
            scraped_sites: vec![],
            total_results: 1,
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["totalResults"], 1);
        assert_eq!(json["searchResults"][0]["searchEngine"], "google");
        assert!(json["scrapedSites"].as_array().unwrap().is_empty());
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::search::{ScrapedSite, SearchResult};
use crate::services::prospector::CostEstimate;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailHit {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrgProfile {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryListing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
}

/// A scraped site with whatever the providers managed to add. A provider
/// that failed leaves its block None and the rest of the record untouched.
#[derive(Debug, Clone, Serialize)]
pub struct LeadRecord {
    #[serde(flatten)]
    pub site: ScrapedSite,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emails: Option<Vec<EmailHit>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<OrgProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing: Option<DirectoryListing>,
}

impl LeadRecord {
    pub fn bare(site: ScrapedSite) -> Self {
        LeadRecord {
            site,
            emails: None,
            organization: None,
            listing: None,
        }
    }
}

/// Harvest response body when enrichment was requested.
#[derive(Debug, Clone, Serialize)]
pub struct LeadReport {
    pub query: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "searchResults")]
    pub search_results: Vec<SearchResult>,
    pub leads: Vec<LeadRecord>,
    #[serde(rename = "totalResults")]
    pub total_results: usize,
    #[serde(rename = "estimatedCost")]
    pub estimated_cost: CostEstimate,
}

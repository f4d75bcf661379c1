use std::time::Duration;

use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;
use url::Url;

use crate::configuration::{ProviderSettings, ProvidersSettings};
use crate::domain::lead::{DirectoryListing, EmailHit, LeadRecord, OrgProfile};
use crate::domain::search::ScrapedSite;

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

// Per-1000-record provider prices, used for reporting only.
const CONTACT_COST_PER_LEAD: f64 = 0.008;
const ORGANIZATION_COST_PER_LEAD: f64 = 0.049;
const DIRECTORY_COST_PER_LEAD: f64 = 0.017;

/// Augments scraped sites with provider data: emails by domain, an
/// organization profile by name, a directory listing by name and location.
/// Providers fail independently; a record always comes back, enriched or
/// not.
pub struct Prospector {
    client: reqwest::Client,
    contact: Option<ProviderSettings>,
    organization: Option<ProviderSettings>,
    directory: Option<ProviderSettings>,
}

impl Prospector {
    pub fn new(settings: ProvidersSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()
            .expect("Failed to build enrichment http client");

        Prospector {
            client,
            contact: settings.contact,
            organization: settings.organization,
            directory: settings.directory,
        }
    }

    /// Output length always equals input length, whatever the providers do.
    pub async fn enrich(
        &self,
        sites: Vec<ScrapedSite>,
        location: Option<&str>,
    ) -> Vec<LeadRecord> {
        let mut leads = Vec::with_capacity(sites.len());

        for site in sites {
            let mut lead = LeadRecord::bare(site);

            if let Some(domain) = domain_of(&lead.site.url) {
                match self.find_emails(&domain).await {
                    Ok(hits) => lead.emails = hits,
                    Err(e) => log::error!("Contact lookup failed for {}: {:?}", domain, e),
                }
            }

            match self.find_organization(&lead.site.title).await {
                Ok(profile) => lead.organization = profile,
                Err(e) => {
                    log::error!("Organization lookup failed for {}: {:?}", lead.site.title, e)
                }
            }

            if let Some(location) = location {
                match self.find_listing(&lead.site.title, location).await {
                    Ok(listing) => lead.listing = listing,
                    Err(e) => {
                        log::error!("Directory lookup failed for {}: {:?}", lead.site.title, e)
                    }
                }
            }

            leads.push(lead);
        }

        leads
    }

    async fn find_emails(&self, domain: &str) -> anyhow::Result<Option<Vec<EmailHit>>> {
        let Some(provider) = &self.contact else {
            return Ok(None);
        };

        let response: ContactSearchResponse = self
            .client
            .get(format!("{}/v2/domain-search", provider.base_url))
            .query(&[("domain", domain), ("api_key", provider.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let hits: Vec<EmailHit> = response
            .data
            .emails
            .into_iter()
            .map(|email| EmailHit {
                email: email.value,
                confidence: email.confidence,
                kind: email.kind,
            })
            .collect();

        Ok(Some(hits))
    }

    async fn find_organization(&self, name: &str) -> anyhow::Result<Option<OrgProfile>> {
        let Some(provider) = &self.organization else {
            return Ok(None);
        };

        let response: OrgSearchResponse = self
            .client
            .post(format!("{}/v1/organizations/search", provider.base_url))
            .header("X-API-KEY", &provider.api_key)
            .json(&OrgSearchRequest {
                q_organization_name: name,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(best_organization_match(name, response.organizations))
    }

    async fn find_listing(
        &self,
        name: &str,
        location: &str,
    ) -> anyhow::Result<Option<DirectoryListing>> {
        let Some(provider) = &self.directory else {
            return Ok(None);
        };

        let response: DirectorySearchResponse = self
            .client
            .get(format!("{}/v3/businesses/search", provider.base_url))
            .bearer_auth(&provider.api_key)
            .query(&[("term", name), ("location", location), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.businesses.into_iter().next().map(|business| {
            DirectoryListing {
                phone: business.phone,
                rating: business.rating,
                reviews: business.review_count,
                address: business
                    .location
                    .and_then(|loc| loc.display_address)
                    .map(|lines| lines.join(", ")),
                price: business.price,
            }
        }))
    }
}

// The provider returns candidates in its own relevance order; pick the one
// whose name actually reads like the queried title.
fn best_organization_match(name: &str, organizations: Vec<OrgCandidate>) -> Option<OrgProfile> {
    organizations
        .into_iter()
        .max_by(|a, b| {
            jaro_winkler(name, &a.name)
                .partial_cmp(&jaro_winkler(name, &b.name))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|org| OrgProfile {
            name: org.name,
            website: org.website_url,
            industry: org.industry,
            size: org.employee_count,
            location: match (org.city, org.state) {
                (Some(city), Some(state)) => Some(format!("{}, {}", city, state)),
                (Some(city), None) => Some(city),
                (None, Some(state)) => Some(state),
                (None, None) => None,
            },
            linkedin: org.linkedin_url,
        })
}

fn domain_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    match host.strip_prefix("www.") {
        Some(stripped) => Some(stripped.to_string()),
        None => Some(host.to_string()),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderToggles {
    pub contact: bool,
    pub organization: bool,
    pub directory: bool,
}

impl Prospector {
    pub fn toggles(&self, location: Option<&str>) -> ProviderToggles {
        ProviderToggles {
            contact: self.contact.is_some(),
            organization: self.organization.is_some(),
            directory: self.directory.is_some() && location.is_some(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEstimate {
    pub contact: f64,
    pub organization: f64,
    pub directory: f64,
    pub total: f64,
}

/// Pure reporting figure; nothing branches on it.
pub fn estimate_cost(lead_count: usize, toggles: ProviderToggles) -> CostEstimate {
    let leads = lead_count as f64;
    let contact = match toggles.contact {
        true => leads * CONTACT_COST_PER_LEAD,
        false => 0.0,
    };
    let organization = match toggles.organization {
        true => leads * ORGANIZATION_COST_PER_LEAD,
        false => 0.0,
    };
    let directory = match toggles.directory {
        true => leads * DIRECTORY_COST_PER_LEAD,
        false => 0.0,
    };

    CostEstimate {
        contact,
        organization,
        directory,
        total: contact + organization + directory,
    }
}

#[derive(Deserialize)]
struct ContactSearchResponse {
    data: ContactData,
}

#[derive(Deserialize)]
struct ContactData {
    #[serde(default)]
    emails: Vec<ContactEmail>,
}

#[derive(Deserialize)]
struct ContactEmail {
    value: String,
    confidence: Option<u8>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Serialize)]
struct OrgSearchRequest<'a> {
    q_organization_name: &'a str,
}

#[derive(Deserialize)]
struct OrgSearchResponse {
    #[serde(default)]
    organizations: Vec<OrgCandidate>,
}

#[derive(Deserialize)]
struct OrgCandidate {
    name: String,
    website_url: Option<String>,
    industry: Option<String>,
    employee_count: Option<u32>,
    city: Option<String>,
    state: Option<String>,
    linkedin_url: Option<String>,
}

#[derive(Deserialize)]
struct DirectorySearchResponse {
    #[serde(default)]
    businesses: Vec<DirectoryBusiness>,
}

#[derive(Deserialize)]
struct DirectoryBusiness {
    phone: Option<String>,
    rating: Option<f32>,
    review_count: Option<u32>,
    location: Option<DirectoryLocation>,
    price: Option<String>,
}

#[derive(Deserialize)]
struct DirectoryLocation {
    display_address: Option<Vec<String>>,
}

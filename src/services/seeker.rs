use itertools::Itertools;
use url::Url;

use crate::configuration::CrawlSettings;
use crate::domain::directive::ExtractionDirective;
use crate::domain::fault::HarvestError;
use crate::domain::page::PageData;
use crate::domain::search::SearchResult;
use crate::services::fetcher::PageFetcher;
use crate::services::politeness_pause;

pub struct EngineSpec {
    pub id: &'static str,
    pub results_url: &'static str,
}

/// The engines the orchestrator knows how to query. Request validation
/// only admits identifiers from this list.
pub const ENGINE_REGISTRY: [EngineSpec; 3] = [
    EngineSpec {
        id: "google",
        results_url: "https://www.google.com/search",
    },
    EngineSpec {
        id: "bing",
        results_url: "https://www.bing.com/search",
    },
    EngineSpec {
        id: "duckduckgo",
        results_url: "https://duckduckgo.com/",
    },
];

// Links back at these hosts are result-page furniture, not candidates.
const SEARCH_ENGINE_HOSTS: [&str; 4] = ["google.com", "bing.com", "duckduckgo.com", "yahoo.com"];

pub fn engine_spec(id: &str) -> Option<&'static EngineSpec> {
    ENGINE_REGISTRY.iter().find(|engine| engine.id == id)
}

pub fn known_engine(id: &str) -> bool {
    engine_spec(id).is_some()
}

/// Query each requested engine through the page fetcher, parse candidates
/// out of the result pages, dedup by URL (first seen wins) and truncate.
/// A failed engine only costs its own results; all of them failing is
/// fatal since there is nothing left to crawl.
pub async fn search(
    fetcher: &PageFetcher,
    crawl: &CrawlSettings,
    query: &str,
    max_results: usize,
    engines: &[String],
) -> Result<Vec<SearchResult>, HarvestError> {
    let mut all_results: Vec<SearchResult> = vec![];
    let mut failed_engines: Vec<String> = vec![];
    let mut attempted = 0;

    for engine_id in engines {
        let Some(engine) = engine_spec(engine_id) else {
            log::error!("Skipping unknown search engine: {}", engine_id);
            continue;
        };

        if attempted > 0 {
            politeness_pause(crawl.engine_delay()).await;
        }
        attempted += 1;

        let directive = results_page_directive(engine, query, crawl.search_timeout_ms);
        match fetcher.fetch(&directive).await {
            Ok(record) if record.success => {
                let data = record.data.unwrap_or_default();
                let parsed = parse_result_links(&data, engine.id);
                log::info!("{} returned {} candidate links", engine.id, parsed.len());
                all_results.extend(parsed);
            }
            Ok(record) => {
                log::error!(
                    "Search fetch failed on {}: {}",
                    engine.id,
                    record.error.unwrap_or_default()
                );
                failed_engines.push(engine.id.to_string());
            }
            Err(e) => {
                log::error!("Search fetch rejected on {}: {}", engine.id, e);
                failed_engines.push(engine.id.to_string());
            }
        }
    }

    if attempted > 0 && failed_engines.len() == attempted {
        return Err(HarvestError::OrchestratorExhausted {
            engines: failed_engines,
        });
    }

    Ok(dedup_by_url(all_results, max_results))
}

fn results_page_directive(
    engine: &EngineSpec,
    query: &str,
    timeout_ms: u64,
) -> ExtractionDirective {
    let mut url = Url::parse(engine.results_url).unwrap();
    url.query_pairs_mut().append_pair("q", query);

    let mut directive =
        ExtractionDirective::for_url(url.as_str()).with_timeout_ms(timeout_ms);
    directive.extract_text = true;
    directive.extract_links = true;
    directive
}

/// Turn a result page's link list into candidates: unwrap engine redirect
/// links, drop anything that is not a plain absolute URL or that points
/// back at a search engine.
pub fn parse_result_links(data: &PageData, engine: &str) -> Vec<SearchResult> {
    let Some(links) = &data.all_links else {
        return vec![];
    };
    let page_text = data.all_text.as_deref();

    links
        .iter()
        .enumerate()
        .filter_map(|(index, link)| {
            let url = normalize_candidate_url(&link.href)?;
            let title = match link.text.is_empty() {
                true => format!("Result {}", index + 1),
                false => link.text.clone(),
            };
            let snippet = page_text
                .map(|text| extract_snippet(text, &link.text))
                .unwrap_or_default();
            Some(SearchResult {
                title,
                url,
                search_engine: engine.to_string(),
                snippet,
            })
        })
        .collect()
}

fn normalize_candidate_url(href: &str) -> Option<String> {
    // Google wraps organic results as /url?q=<target>&...
    let href = match href.strip_prefix("/url?q=") {
        Some(rest) => rest.split('&').next().unwrap_or(rest),
        None => href,
    };

    let parsed = Url::parse(href).ok()?;
    match parsed.scheme() {
        "http" | "https" => {}
        _ => return None,
    }

    let host = parsed.host_str()?;
    if host.is_empty() {
        return None;
    }
    let self_referential = SEARCH_ENGINE_HOSTS
        .iter()
        .any(|engine_host| host == *engine_host || host.ends_with(&format!(".{}", engine_host)));
    match self_referential {
        true => None,
        false => Some(parsed.to_string()),
    }
}

// A window of page text around the link title, the closest thing a parsed
// result page has to the engine's own snippet.
fn extract_snippet(text: &str, title: &str) -> String {
    if title.is_empty() || text.is_empty() {
        return String::new();
    }

    match text.find(title) {
        Some(position) => {
            let start = position.saturating_sub(100);
            let end = (position + 300).min(text.len());
            let start = ceil_char_boundary(text, start);
            let end = ceil_char_boundary(text, end);
            format!("{}...", &text[start..end])
        }
        None => {
            let end = ceil_char_boundary(text, text.len().min(200));
            format!("{}...", &text[..end])
        }
    }
}

fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

fn dedup_by_url(results: Vec<SearchResult>, max_results: usize) -> Vec<SearchResult> {
    results
        .into_iter()
        .unique_by(|result| result.url.clone())
        .take(max_results)
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::domain::page::{LinkEntry, PageData};
    use crate::domain::search::SearchResult;

    use super::{dedup_by_url, known_engine, normalize_candidate_url, parse_result_links};

    fn link(href: &str, text: &str) -> LinkEntry {
        LinkEntry {
            href: href.to_string(),
            text: text.to_string(),
            title: String::new(),
        }
    }

    #[test]
    fn registry_knows_the_three_engines() {
        assert!(known_engine("google"));
        assert!(known_engine("bing"));
        assert!(known_engine("duckduckgo"));
        assert!(!known_engine("altavista"));
    }

    #[test]
    fn candidate_urls_drop_search_engine_noise() {
        let noise = [
            "https://www.google.com/search?q=green+tea&start=10",
            "https://accounts.google.com/ServiceLogin?hl=en",
            "https://support.google.com/websearch/answer/181196",
            "https://www.bing.com/search?q=green+tea",
            "https://duckduckgo.com/about",
            "/search?q=green+tea",
            "#",
            "mailto:hello@example.com",
        ];
        for href in noise {
            assert_eq!(normalize_candidate_url(href), None, "kept: {}", href);
        }

        assert_eq!(
            normalize_candidate_url("https://www.znaturalfoods.com/products/green-tea"),
            Some("https://www.znaturalfoods.com/products/green-tea".to_string())
        );
    }

    #[test]
    fn google_redirect_links_are_unwrapped() {
        assert_eq!(
            normalize_candidate_url("/url?q=https://dallosell.com/product_detail/organic-green-tea-bag&sa=U&ved=2ahUKE"),
            Some("https://dallosell.com/product_detail/organic-green-tea-bag".to_string())
        );
    }

    #[test]
    fn parsed_results_carry_the_engine_id_and_fallback_titles() {
        let data = PageData {
            all_links: Some(vec![
                link("https://www.laeats.com/guide", "Best Restaurants"),
                link("https://www.opentable.com/los-angeles", ""),
            ]),
            all_text: Some("A guide. Best Restaurants in Los Angeles, ranked.".to_string()),
            ..Default::default()
        };

        let results = parse_result_links(&data, "google");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].search_engine, "google");
        assert!(results[0].snippet.contains("Best Restaurants"));
        assert_eq!(results[1].title, "Result 2");
    }

    #[test]
    fn dedup_keeps_first_occurrence_and_truncates() {
        let result = |url: &str, engine: &str| SearchResult {
            title: url.to_string(),
            url: url.to_string(),
            search_engine: engine.to_string(),
            snippet: String::new(),
        };
        let results = vec![
            result("https://a.com/", "google"),
            result("https://b.com/", "google"),
            result("https://a.com/", "bing"),
            result("https://c.com/", "bing"),
        ];

        let deduped = dedup_by_url(results, 2);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].url, "https://a.com/");
        assert_eq!(deduped[0].search_engine, "google");
        assert_eq!(deduped[1].url, "https://b.com/");
    }
}

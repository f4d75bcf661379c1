use actix_web::{post, web, HttpRequest, HttpResponse};

use crate::domain::directive::ExtractionDirective;
use crate::domain::fault::HarvestError;
use crate::services::{Gatekeeper, PageFetcher, Tier};
use crate::stats;

use super::{client_key, error_response, ok_response};

/// Single-URL directive scrape. Thin: validate, gate, hand to the fetcher.
#[post("/scrape")]
async fn scrape(
    request: HttpRequest,
    body: web::Json<ExtractionDirective>,
    fetcher: web::Data<PageFetcher>,
    gatekeeper: web::Data<Gatekeeper>,
) -> HttpResponse {
    stats::record_request();

    if let Err(e) = validate_directive(&body) {
        return error_response(&e);
    }

    let caller = client_key(&request);
    if let Err(e) = gatekeeper.consume(&caller, Tier::General) {
        return error_response(&e.into());
    }
    if let Err(e) = gatekeeper.consume(&caller, Tier::Scrape) {
        return error_response(&e.into());
    }

    match fetcher.fetch(&body).await {
        Ok(record) => ok_response(record),
        Err(e) => error_response(&e),
    }
}

fn validate_directive(directive: &ExtractionDirective) -> Result<(), HarvestError> {
    directive.validated_url()?;

    if directive.max_scrolls < 1 || directive.max_scrolls > 20 {
        return Err(HarvestError::InvalidInput(
            "maxScrolls must be between 1 and 20".to_string(),
        ));
    }
    if directive.delay_between_scrolls_ms < 500 || directive.delay_between_scrolls_ms > 10_000 {
        return Err(HarvestError::InvalidInput(
            "delayBetweenScrollsMs must be between 500 and 10000".to_string(),
        ));
    }
    if directive.timeout_ms < 5_000 || directive.timeout_ms > 120_000 {
        return Err(HarvestError::InvalidInput(
            "timeoutMs must be between 5000 and 120000".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::domain::directive::ExtractionDirective;

    use super::validate_directive;

    #[test]
    fn default_directive_with_valid_url_passes() {
        let directive = ExtractionDirective::for_url("https://example.com");
        assert!(validate_directive(&directive).is_ok());
    }

    #[test]
    fn out_of_range_numbers_are_rejected() {
        let mut directive = ExtractionDirective::for_url("https://example.com");
        directive.max_scrolls = 21;
        assert!(validate_directive(&directive).is_err());

        let mut directive = ExtractionDirective::for_url("https://example.com");
        directive.delay_between_scrolls_ms = 100;
        assert!(validate_directive(&directive).is_err());

        let mut directive = ExtractionDirective::for_url("https://example.com");
        directive.timeout_ms = 1_000;
        assert!(validate_directive(&directive).is_err());
    }

    #[test]
    fn invalid_url_is_rejected_first() {
        let directive = ExtractionDirective::for_url("not-a-url");
        assert!(validate_directive(&directive).is_err());
    }
}

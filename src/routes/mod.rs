use actix_web::{HttpRequest, HttpResponse};
use serde::Serialize;

use crate::domain::fault::HarvestError;

pub mod default_route;
pub mod harvest_route;
pub mod scrape_route;

#[derive(Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
    #[serde(rename = "retryAfterSeconds", skip_serializing_if = "Option::is_none")]
    retry_after_seconds: Option<u64>,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: ErrorBody,
}

#[derive(Serialize)]
struct DataEnvelope<T: Serialize> {
    success: bool,
    data: T,
}

pub fn ok_response<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(DataEnvelope {
        success: true,
        data,
    })
}

pub fn error_response(error: &HarvestError) -> HttpResponse {
    let envelope = ErrorEnvelope {
        success: false,
        error: ErrorBody {
            kind: error.kind(),
            message: error.to_string(),
            retry_after_seconds: error.retry_after_secs(),
        },
    };

    match error {
        HarvestError::InvalidInput(_) => HttpResponse::BadRequest().json(envelope),
        HarvestError::RateExceeded { retry_after_secs } => HttpResponse::TooManyRequests()
            .insert_header(("Retry-After", retry_after_secs.to_string()))
            .json(envelope),
        HarvestError::UpstreamFailure { .. } | HarvestError::OrchestratorExhausted { .. } => {
            HttpResponse::BadGateway().json(envelope)
        }
        HarvestError::Internal(_) => HttpResponse::InternalServerError().json(envelope),
    }
}

/// The rate limiter key: the peer address as the request handler saw it.
pub fn client_key(request: &HttpRequest) -> String {
    let connection = request.connection_info();
    connection
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string()
}

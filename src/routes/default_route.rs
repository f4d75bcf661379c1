use actix_web::{get, HttpResponse, Responder};
use serde::Serialize;

use crate::stats;

#[get("/")]
async fn default() -> impl Responder {
    HttpResponse::Ok().body("trawl is up")
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    #[serde(rename = "requestsServed")]
    requests_served: u64,
    #[serde(rename = "scrapeFailures")]
    scrape_failures: u64,
}

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthBody {
        status: "ok",
        requests_served: stats::requests_served(),
        scrape_failures: stats::scrape_failures(),
    })
}

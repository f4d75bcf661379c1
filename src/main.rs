use std::net::TcpListener;

use env_logger::Env;
use trawl::{
    configuration::get_configuration,
    services::{Gatekeeper, PageFetcher, Prospector},
    startup::run,
};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().expect("Failed to read configuration.");

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(address)?;

    let fetcher = PageFetcher::new(
        configuration.webdriver.endpoint.clone(),
        configuration.webdriver.headless,
    );
    let prospector = Prospector::new(configuration.providers.clone());
    let gatekeeper = Gatekeeper::new();

    run(
        listener,
        fetcher,
        prospector,
        gatekeeper,
        configuration.crawl.clone(),
    )?
    .await
}

use std::net::TcpListener;

use actix_web::{
    dev::Server,
    middleware::Logger,
    web, App, HttpServer,
};

use crate::{
    configuration::CrawlSettings,
    routes::{default_route, harvest_route, scrape_route},
    services::{Gatekeeper, PageFetcher, Prospector},
};

pub fn run(
    listener: TcpListener,
    fetcher: PageFetcher,
    prospector: Prospector,
    gatekeeper: Gatekeeper,
    crawl: CrawlSettings,
) -> Result<Server, std::io::Error> {
    let fetcher = web::Data::new(fetcher);
    let prospector = web::Data::new(prospector);
    let gatekeeper = web::Data::new(gatekeeper);
    let crawl = web::Data::new(crawl);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(default_route::default)
            .service(default_route::health)
            .service(scrape_route::scrape)
            .service(harvest_route::harvest)
            .app_data(fetcher.clone())
            .app_data(prospector.clone())
            .app_data(gatekeeper.clone())
            .app_data(crawl.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

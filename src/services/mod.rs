use std::time::Duration;

use rand::Rng;

pub mod extract;
pub mod fetcher;
pub mod gatekeeper;
pub mod pilot;
pub mod pipeline;
pub mod prospector;
pub mod seeker;

pub use fetcher::*;
pub use gatekeeper::*;
pub use pilot::*;
pub use prospector::*;

/// Sleep the politeness delay plus a little jitter so consecutive requests
/// do not land on a target in lockstep.
pub async fn politeness_pause(base: Duration) {
    let jitter = rand::thread_rng().gen_range(0..400);
    tokio::time::sleep(base + Duration::from_millis(jitter)).await;
}

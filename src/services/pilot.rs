use thirtyfour::error::WebDriverResult;
use thirtyfour::{ChromiumLikeCapabilities, DesiredCapabilities, WebDriver};

/// One WebDriver session, boarded for exactly one fetch. Sessions are never
/// shared or reused, so no cookies or storage bleed between fetches.
pub struct Pilot {
    pub driver: WebDriver,
}

impl Pilot {
    pub async fn board(endpoint: &str, headless: bool, user_agent: &str) -> WebDriverResult<Self> {
        let mut caps = DesiredCapabilities::chrome();
        if headless {
            caps.add_arg("--headless=new")?;
        }
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-dev-shm-usage")?;
        caps.add_arg("--disable-gpu")?;
        caps.add_arg(&format!("--user-agent={}", user_agent))?;

        let driver = WebDriver::new(endpoint, caps).await?;
        driver.maximize_window().await?;

        Ok(Pilot { driver })
    }

    /// Quit the session. Called on every exit path of a fetch; a session
    /// left behind holds a browser process until the grid reaps it.
    pub async fn dismiss(self) {
        if let Err(e) = self.driver.quit().await {
            log::error!("Failed to quit webdriver session: {:?}", e);
        }
    }
}

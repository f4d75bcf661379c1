use std::time::Duration;

use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub webdriver: WebdriverSettings,
    pub crawl: CrawlSettings,
    pub providers: ProvidersSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct WebdriverSettings {
    pub endpoint: String,
    pub headless: bool,
}

#[derive(serde::Deserialize, Clone)]
pub struct CrawlSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub engine_delay_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub site_delay_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub search_timeout_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub scrape_timeout_ms: u64,
}

impl CrawlSettings {
    pub fn engine_delay(&self) -> Duration {
        Duration::from_millis(self.engine_delay_ms)
    }

    pub fn site_delay(&self) -> Duration {
        Duration::from_millis(self.site_delay_ms)
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct ProvidersSettings {
    pub contact: Option<ProviderSettings>,
    pub organization: Option<ProviderSettings>,
    pub directory: Option<ProviderSettings>,
}

#[derive(serde::Deserialize, Clone)]
pub struct ProviderSettings {
    pub api_key: String,
    pub base_url: String,
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .expect("Failed to parse APP_ENVIRONMENT.");
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

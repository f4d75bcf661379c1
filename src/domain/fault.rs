use std::error::Error;
use std::fmt;

/// Failures the handler layer has to translate into a transport status.
/// Single-candidate fetch failures never show up here, they only shrink
/// the output lists.
#[derive(Debug)]
pub enum HarvestError {
    InvalidInput(String),
    RateExceeded { retry_after_secs: u64 },
    UpstreamFailure { source_name: String, message: String },
    OrchestratorExhausted { engines: Vec<String> },
    Internal(String),
}

impl HarvestError {
    pub fn kind(&self) -> &'static str {
        match self {
            HarvestError::InvalidInput(_) => "invalid_input",
            HarvestError::RateExceeded { .. } => "rate_exceeded",
            HarvestError::UpstreamFailure { .. } => "upstream_failure",
            HarvestError::OrchestratorExhausted { .. } => "orchestrator_exhausted",
            HarvestError::Internal(_) => "internal",
        }
    }

    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            HarvestError::RateExceeded { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }
}

impl fmt::Display for HarvestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarvestError::InvalidInput(message) => write!(f, "{}", message),
            HarvestError::RateExceeded { retry_after_secs } => {
                write!(f, "Rate limit exceeded. Try again in {} seconds.", retry_after_secs)
            }
            HarvestError::UpstreamFailure { source_name, message } => {
                write!(f, "Upstream failure on {}: {}", source_name, message)
            }
            HarvestError::OrchestratorExhausted { engines } => {
                write!(f, "Every requested search engine failed: {}", engines.join(", "))
            }
            HarvestError::Internal(message) => write!(f, "{}", message),
        }
    }
}

impl Error for HarvestError {}

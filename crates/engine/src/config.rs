// Flowrun Configuration
//
// Explicit configuration values for the FlowHunt client, the target flow and the poll loop.
// One value of each is threaded through every call; nothing is global.

use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.flowhunt.io";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_EMPTY_STREAK_LIMIT: u32 = 3;
pub const DEFAULT_ARTEFACT_PATTERN: &str = "korektura";

/// Connection settings for the FlowHunt API
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL without trailing slash
    pub api_url: String,

    /// Value sent in the `Api-Key` header
    pub api_key: String,
}

impl ApiConfig {
    pub fn new(api_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

/// The flow a new session is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowTarget {
    pub workspace_id: String,
    pub flow_id: String,
}

impl FlowTarget {
    pub fn new(workspace_id: impl Into<String>, flow_id: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            flow_id: flow_id.into(),
        }
    }
}

/// Poll loop tuning
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Upper bound on poll requests, failed requests included
    pub max_attempts: u32,

    /// Sleep between two polls
    pub poll_interval: Duration,

    /// Sleep before the first poll
    pub initial_delay: Duration,

    /// Consecutive empty polls after which a run with AI output counts as done
    pub empty_streak_limit: u32,

    /// Case-insensitive substring an artefact name must contain
    pub artefact_pattern: String,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            initial_delay: DEFAULT_INITIAL_DELAY,
            empty_streak_limit: DEFAULT_EMPTY_STREAK_LIMIT,
            artefact_pattern: DEFAULT_ARTEFACT_PATTERN.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_config_trims_trailing_slash() {
        let config = ApiConfig::new("https://api.flowhunt.io/", "key");
        assert_eq!(config.api_url, "https://api.flowhunt.io");

        let config = ApiConfig::new("http://localhost:8080//", "key");
        assert_eq!(config.api_url, "http://localhost:8080");
    }

    #[test]
    fn test_poll_config_defaults() {
        let config = PollConfig::default();
        assert_eq!(config.max_attempts, 60);
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.initial_delay, Duration::from_secs(5));
        assert_eq!(config.empty_streak_limit, 3);
        assert_eq!(config.artefact_pattern, "korektura");
    }
}

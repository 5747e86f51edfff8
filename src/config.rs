//! Viewer host configuration parsed from environment variables.

use std::time::Duration;

use uuid::Uuid;

pub const DEFAULT_BCF_BASE_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_BCF_PROJECT_ID: &str = "demo-bcf-management-project";
pub const DEFAULT_PUBLISH_DELAY_SECS: u64 = 20;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const MODEL_SERVER_PATH: &str = "/api/v3/ifc_models";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl crate::error::ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Missing(_) => "E_CONFIG_MISSING",
            Self::Invalid { .. } => "E_CONFIG_INVALID",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl HttpTimeouts {
    #[must_use]
    pub fn request(self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerConfig {
    pub bcf_base_url: String,
    pub project_id: String,
    /// Topic that scheduled viewpoints are posted to. Publishing is off when absent.
    pub topic_id: Option<Uuid>,
    pub session_cookie: Option<String>,
    pub publish_delay: Duration,
    pub model_server_base_url: String,
    pub timeouts: HttpTimeouts,
}

impl ViewerConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `BCF_BASE_URL`: default `http://127.0.0.1:3000`
    /// - `BCF_PROJECT_ID`: default `demo-bcf-management-project`
    /// - `BCF_TOPIC_ID`: topic UUID for scheduled publishing
    /// - `BCF_SESSION_COOKIE`: sent as the `Cookie` header
    /// - `VIEWPOINT_PUBLISH_DELAY_SECS`: default 20
    /// - `MODEL_SERVER_BASE_URL`: default `{BCF_BASE_URL}/api/v3/ifc_models`
    /// - `BCF_REQUEST_TIMEOUT_SECS`: default 30
    /// - `BCF_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `BCF_TOPIC_ID` is set but not a UUID,
    /// or if a project id is blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bcf_base_url = trimmed_url(std::env::var("BCF_BASE_URL").ok(), DEFAULT_BCF_BASE_URL);

        let project_id = std::env::var("BCF_PROJECT_ID").unwrap_or_else(|_| DEFAULT_BCF_PROJECT_ID.to_string());
        if project_id.trim().is_empty() {
            return Err(ConfigError::Invalid { var: "BCF_PROJECT_ID", reason: "must not be blank".into() });
        }

        let topic_id = match std::env::var("BCF_TOPIC_ID") {
            Ok(raw) => Some(parse_topic_id(&raw)?),
            Err(_) => None,
        };

        let session_cookie = std::env::var("BCF_SESSION_COOKIE")
            .ok()
            .filter(|c| !c.trim().is_empty());

        let model_server_base_url = trimmed_url(
            std::env::var("MODEL_SERVER_BASE_URL").ok(),
            &format!("{bcf_base_url}{MODEL_SERVER_PATH}"),
        );

        let publish_delay = Duration::from_secs(env_parse("VIEWPOINT_PUBLISH_DELAY_SECS", DEFAULT_PUBLISH_DELAY_SECS));
        let timeouts = HttpTimeouts {
            request_secs: env_parse_nonzero("BCF_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_nonzero("BCF_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { bcf_base_url, project_id, topic_id, session_cookie, publish_delay, model_server_base_url, timeouts })
    }

    /// Topic reference for the configured project and topic, if a topic is set.
    #[must_use]
    pub fn topic(&self) -> Option<crate::sync::TopicRef> {
        self.topic_id
            .map(|topic_id| crate::sync::TopicRef::new(self.project_id.clone(), topic_id))
    }
}

/// Parse a topic UUID, naming `BCF_TOPIC_ID` in the error.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when `raw` is not a UUID.
pub fn parse_topic_id(raw: &str) -> Result<Uuid, ConfigError> {
    Uuid::parse_str(raw.trim()).map_err(|e| ConfigError::Invalid { var: "BCF_TOPIC_ID", reason: e.to_string() })
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn trimmed_url(raw: Option<String>, default: &str) -> String {
    raw.filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

/// Like [`env_parse`], but a zero value also falls back to `default`.
pub(crate) fn env_parse_nonzero(key: &str, default: u64) -> u64 {
    match env_parse(key, default) {
        0 => default,
        v => v,
    }
}

//! Process configuration, read once at startup

use crate::error::ConfigError;
use std::time::Duration;

pub const PROJECT_KEY: &str = "GCP_PROJECT";
pub const RESULT_TOPIC_KEY: &str = "RESULT_TOPIC";
pub const TARGET_LANGUAGES_KEY: &str = "TO_LANG";
pub const LOCATION_KEY: &str = "TRANSLATE_LOCATION";
pub const ACCESS_TOKEN_KEY: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";
pub const VISION_ENDPOINT_KEY: &str = "VISION_ENDPOINT";
pub const TRANSLATE_ENDPOINT_KEY: &str = "TRANSLATE_ENDPOINT";
pub const PUBSUB_ENDPOINT_KEY: &str = "PUBSUB_ENDPOINT";
pub const METADATA_ENDPOINT_KEY: &str = "METADATA_ENDPOINT";
pub const REQUEST_TIMEOUT_KEY: &str = "REQUEST_TIMEOUT_SECS";

/// Immutable settings shared by every invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub project_id: String,
    pub result_topic: String,
    /// Target language codes, in publish order
    pub target_languages: Vec<String>,
    pub location: String,
    /// Static bearer token; the metadata server is asked when unset
    pub access_token: Option<String>,
    pub endpoints: Endpoints,
    pub request_timeout: Duration,
}

/// Base URLs of the Google APIs
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    pub vision: String,
    pub translate: String,
    pub pubsub: String,
    pub metadata: String,
}

// Defaults

fn default_location() -> String {
    "global".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            vision: "https://vision.googleapis.com".to_string(),
            translate: "https://translation.googleapis.com".to_string(),
            pubsub: "https://pubsub.googleapis.com".to_string(),
            metadata: "http://metadata.google.internal".to_string(),
        }
    }
}

impl Config {
    /// Build a config with the required settings and defaults for the rest
    pub fn new(
        project_id: impl Into<String>,
        result_topic: impl Into<String>,
        target_languages: Vec<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            result_topic: result_topic.into(),
            target_languages,
            location: default_location(),
            access_token: None,
            endpoints: Endpoints::default(),
            request_timeout: default_request_timeout(),
        }
    }

    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| optional(key).ok_or(ConfigError::Missing(key));

        let project_id = required(PROJECT_KEY)?;
        let result_topic = required(RESULT_TOPIC_KEY)?;
        let target_languages = parse_target_languages(&required(TARGET_LANGUAGES_KEY)?);
        if target_languages.is_empty() {
            return Err(ConfigError::NoTargetLanguages(TARGET_LANGUAGES_KEY));
        }

        let mut config = Self::new(project_id, result_topic, target_languages);

        if let Some(location) = optional(LOCATION_KEY) {
            config.location = location;
        }
        config.access_token = optional(ACCESS_TOKEN_KEY);

        let endpoints = &mut config.endpoints;
        for (key, slot) in [
            (VISION_ENDPOINT_KEY, &mut endpoints.vision),
            (TRANSLATE_ENDPOINT_KEY, &mut endpoints.translate),
            (PUBSUB_ENDPOINT_KEY, &mut endpoints.pubsub),
            (METADATA_ENDPOINT_KEY, &mut endpoints.metadata),
        ] {
            if let Some(url) = optional(key) {
                *slot = url.trim_end_matches('/').to_string();
            }
        }

        if let Some(raw) = optional(REQUEST_TIMEOUT_KEY) {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: REQUEST_TIMEOUT_KEY,
                value: raw.clone(),
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// `projects/{project}/locations/{location}`, the translation parent
    pub fn location_name(&self) -> String {
        format!("projects/{}/locations/{}", self.project_id, self.location)
    }

    /// `projects/{project}/topics/{topic}`, where results are published
    pub fn topic_name(&self) -> String {
        format!("projects/{}/topics/{}", self.project_id, self.result_topic)
    }
}

/// Split a comma-separated language list, trimming and dropping empty entries
pub fn parse_target_languages(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
        .collect()
}

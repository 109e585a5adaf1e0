//! External services used by the pipeline
//!
//! Each collaborator sits behind a small trait so the orchestrator can be
//! driven by the Google Cloud REST clients in production and by fakes in tests.

mod pubsub;
mod session;
mod translate;
mod vision;

pub use pubsub::PubsubPublisher;
pub use session::{ApiSession, SessionFactory, TokenSource};
pub use translate::TranslationClient;
pub use vision::VisionClient;

use crate::config::Config;
use async_trait::async_trait;
use std::sync::Arc;

/// Error reported inside an otherwise successful response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderStatus {
    pub code: i32,
    pub message: String,
}

/// Outcome of a text-detection request for one image
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextAnnotation {
    /// Full extracted text; `None` when the image contains no text
    pub full_text: Option<String>,
    pub error: Option<ProviderStatus>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectedLanguage {
    pub language_code: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub translated_text: String,
    pub detected_language_code: Option<String>,
}

/// OCR provider
#[async_trait]
pub trait ImageAnnotator: Send + Sync {
    /// Run text detection on the image at `image_uri`
    async fn annotate_text(&self, image_uri: &str) -> Result<TextAnnotation, ProviderError>;
}

/// Language-detection provider
#[async_trait]
pub trait LanguageDetector: Send + Sync {
    /// Detected languages, most likely first
    async fn detect_language(&self, text: &str) -> Result<Vec<DetectedLanguage>, ProviderError>;
}

/// Translation provider
#[async_trait]
pub trait TextTranslator: Send + Sync {
    async fn translate_text(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<Vec<Translation>, ProviderError>;
}

/// Result channel
#[async_trait]
pub trait ResultPublisher: Send + Sync {
    /// Publish one message and return its server-assigned id
    async fn publish(&self, data: Vec<u8>) -> Result<String, ProviderError>;
}

/// The set of providers one orchestrator talks to
#[derive(Clone)]
pub struct Providers {
    pub annotator: Arc<dyn ImageAnnotator>,
    pub detector: Arc<dyn LanguageDetector>,
    pub translator: Arc<dyn TextTranslator>,
    pub publisher: Arc<dyn ResultPublisher>,
}

impl Providers {
    /// Google Cloud REST clients sharing one connection pool
    pub fn google_cloud(config: &Config) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let tokens = match &config.access_token {
            Some(token) => TokenSource::Static(token.clone()),
            None => TokenSource::MetadataServer {
                base_url: config.endpoints.metadata.clone(),
            },
        };

        let translation = Arc::new(TranslationClient::new(
            SessionFactory::new(http.clone(), tokens.clone()),
            &config.endpoints.translate,
            config.location_name(),
        ));

        Ok(Self {
            annotator: Arc::new(VisionClient::new(
                SessionFactory::new(http.clone(), tokens.clone()),
                &config.endpoints.vision,
            )),
            detector: translation.clone(),
            translator: translation,
            publisher: Arc::new(PubsubPublisher::new(
                SessionFactory::new(http, tokens),
                &config.endpoints.pubsub,
                config.topic_name(),
            )),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{service} returned {status}: {message}")]
    Status {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Unexpected response from {service}: {message}")]
    InvalidResponse {
        service: &'static str,
        message: String,
    },
}

// Orchestrator - drives one storage event through OCR, language detection,
// translation and publishing

use super::types::{AbortReason, InvocationOutcome, PublishReport, PublishedTranslation};
use crate::config::Config;
use crate::error::Error;
use crate::message::{DecodeError, PubsubPayload, StorageObjectEvent, TranslationMessage};
use crate::providers::Providers;
use std::sync::Arc;

/// Runs the translation pipeline for inbound storage events
///
/// Holds only immutable state, so one instance serves concurrent invocations.
pub struct Orchestrator {
    config: Arc<Config>,
    providers: Providers,
}

impl Orchestrator {
    pub fn new(config: Arc<Config>, providers: Providers) -> Self {
        Self { config, providers }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Decode an inbound payload and process it
    ///
    /// Only a malformed payload is reported as an error; every provider
    /// failure ends up in the returned outcome.
    pub async fn handle_event(&self, payload: &[u8]) -> Result<InvocationOutcome, DecodeError> {
        let event = StorageObjectEvent::from_pubsub_data(payload).map_err(|e| {
            tracing::error!(error = %e, "Could not decode storage event");
            e
        })?;

        Ok(self.process(&event).await)
    }

    /// Process an already decoded storage event
    pub async fn process(&self, event: &StorageObjectEvent) -> InvocationOutcome {
        let bucket = event.bucket.as_deref().unwrap_or_default();
        let filename = event.name.as_deref().unwrap_or_default();
        tracing::info!(bucket, filename, "Received storage event");

        let Some(image_uri) = event.gcs_uri() else {
            tracing::warn!(bucket, filename, "Event does not name a storage object");
            return InvocationOutcome::IncompleteEvent;
        };

        let requests = match self.detect_text(&image_uri, filename).await {
            Ok(requests) => requests,
            Err(outcome) => return outcome,
        };

        let outcome = self.translate_and_publish(&requests).await;
        tracing::info!(
            filename,
            outcome = outcome.as_str(),
            published = outcome.published().len(),
            "Invocation finished"
        );
        outcome
    }

    /// Extract the image text and build one translation request per target
    /// language, in configured order
    pub async fn detect_text(
        &self,
        image_uri: &str,
        filename: &str,
    ) -> Result<Vec<TranslationMessage>, InvocationOutcome> {
        tracing::info!(filename, "Looking for text in image");

        let annotation = match self.providers.annotator.annotate_text(image_uri).await {
            Ok(annotation) => annotation,
            Err(e) => {
                tracing::error!(image_uri, error = %e, "Error detecting text");
                return Err(InvocationOutcome::OcrFailed {
                    error: e.to_string(),
                });
            }
        };

        let Some(text) = annotation.full_text else {
            tracing::info!(filename, "Image contains no text");
            return Err(InvocationOutcome::NoText);
        };

        if let Some(status) = annotation.error {
            tracing::error!(
                image_uri,
                code = status.code,
                message = %status.message,
                "Error in vision API call"
            );
            return Err(InvocationOutcome::OcrRejected {
                message: status.message,
            });
        }

        tracing::info!(filename, text = %text, "Extracted text from image");

        let languages = match self.providers.detector.detect_language(&text).await {
            Ok(languages) => languages,
            Err(e) => {
                tracing::error!(filename, error = %e, "Error detecting language");
                return Err(InvocationOutcome::DetectionFailed {
                    error: e.to_string(),
                });
            }
        };

        let Some(detected) = languages.first() else {
            tracing::info!(filename, text = %text, "No languages were detected for text");
            return Err(InvocationOutcome::NoLanguage);
        };
        tracing::info!(
            filename,
            language = %detected.language_code,
            confidence = detected.confidence,
            "Detected language"
        );

        Ok(self
            .config
            .target_languages
            .iter()
            .map(|lang| {
                tracing::debug!(filename, lang = %lang, "Queued translation request");
                TranslationMessage::new(text.clone(), filename, lang.clone())
            })
            .collect())
    }

    /// Translate each request in order and publish the results
    ///
    /// A failed or empty translation stops the whole batch. A failed publish
    /// is recorded and the next language is still processed.
    pub async fn translate_and_publish(&self, requests: &[TranslationMessage]) -> InvocationOutcome {
        let mut report = PublishReport::default();

        for request in requests {
            let lang = request.lang.as_str();
            tracing::info!(lang, "Translating text");

            let translations = match self
                .providers
                .translator
                .translate_text(&request.text, lang)
                .await
            {
                Ok(translations) => translations,
                Err(e) => {
                    tracing::error!(lang, error = %e, "Error translating text");
                    return InvocationOutcome::TranslationAborted {
                        language: request.lang.clone(),
                        reason: AbortReason::CallFailed(e.to_string()),
                        report,
                    };
                }
            };

            let Some(translation) = translations.into_iter().next() else {
                tracing::warn!(lang, "Translation returned no results");
                return InvocationOutcome::TranslationAborted {
                    language: request.lang.clone(),
                    reason: AbortReason::NoTranslation,
                    report,
                };
            };
            tracing::info!(lang, text = %translation.translated_text, "Translated text");

            let message =
                TranslationMessage::new(translation.translated_text, &request.filename, lang);
            match self.publish(&message).await {
                Ok(message_id) => {
                    tracing::info!(lang, message_id = %message_id, "Text translated");
                    report.published.push(PublishedTranslation {
                        lang: request.lang.clone(),
                        message_id,
                    });
                }
                Err(e) => {
                    tracing::error!(lang, error = %e, "Error publishing translation result");
                    report.failed.push(request.lang.clone());
                }
            }
        }

        InvocationOutcome::Completed(report)
    }

    async fn publish(&self, message: &TranslationMessage) -> Result<String, Error> {
        let data = message.encode()?;
        Ok(self.providers.publisher.publish(data).await?)
    }
}

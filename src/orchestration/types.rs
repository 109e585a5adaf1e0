// Outcome types for one pipeline invocation

use serde::Serialize;

/// How a single invocation ended
///
/// Every variant except `Completed` is an early exit. None of them is an
/// error from the point of view of the delivering framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InvocationOutcome {
    /// The event did not name both a bucket and an object
    IncompleteEvent,
    /// OCR found no text in the image
    NoText,
    /// OCR answered with an error status
    OcrRejected { message: String },
    /// The OCR call itself failed
    OcrFailed { error: String },
    /// The language-detection call failed
    DetectionFailed { error: String },
    /// No language could be detected
    NoLanguage,
    /// Translation stopped at `language`; later targets were never attempted
    TranslationAborted {
        language: String,
        reason: AbortReason,
        report: PublishReport,
    },
    /// Every target language was processed
    Completed(PublishReport),
}

impl InvocationOutcome {
    /// Messages that reached the result topic
    pub fn published(&self) -> &[PublishedTranslation] {
        match self {
            InvocationOutcome::Completed(report)
            | InvocationOutcome::TranslationAborted { report, .. } => &report.published,
            _ => &[],
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            InvocationOutcome::IncompleteEvent => "incomplete_event",
            InvocationOutcome::NoText => "no_text",
            InvocationOutcome::OcrRejected { .. } => "ocr_rejected",
            InvocationOutcome::OcrFailed { .. } => "ocr_failed",
            InvocationOutcome::DetectionFailed { .. } => "detection_failed",
            InvocationOutcome::NoLanguage => "no_language",
            InvocationOutcome::TranslationAborted { .. } => "translation_aborted",
            InvocationOutcome::Completed(_) => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AbortReason {
    CallFailed(String),
    NoTranslation,
}

/// Per-target results gathered while translating
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub published: Vec<PublishedTranslation>,
    /// Target languages whose result could not be published
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedTranslation {
    pub lang: String,
    pub message_id: String,
}

//! Cloud Translation v3: language detection and text translation

use super::{
    DetectedLanguage, LanguageDetector, ProviderError, SessionFactory, TextTranslator, Translation,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const SERVICE: &str = "translate";
const MIME_TYPE: &str = "text/plain";

pub struct TranslationClient {
    sessions: SessionFactory,
    detect_url: String,
    translate_url: String,
}

impl TranslationClient {
    /// `parent` is the `projects/{p}/locations/{l}` resource requests run under
    pub fn new(sessions: SessionFactory, base_url: &str, parent: String) -> Self {
        let base = format!("{}/v3/{}", base_url.trim_end_matches('/'), parent);
        Self {
            sessions,
            detect_url: format!("{}:detectLanguage", base),
            translate_url: format!("{}:translateText", base),
        }
    }
}

#[async_trait]
impl LanguageDetector for TranslationClient {
    async fn detect_language(&self, text: &str) -> Result<Vec<DetectedLanguage>, ProviderError> {
        let request = DetectLanguageRequest {
            content: text,
            mime_type: MIME_TYPE,
        };

        let session = self.sessions.open().await?;
        let response: DetectLanguageResponse =
            session.post_json(SERVICE, &self.detect_url, &request).await?;

        Ok(response
            .languages
            .into_iter()
            .map(|l| DetectedLanguage {
                language_code: l.language_code,
                confidence: l.confidence,
            })
            .collect())
    }
}

#[async_trait]
impl TextTranslator for TranslationClient {
    async fn translate_text(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<Vec<Translation>, ProviderError> {
        let request = TranslateTextRequest {
            contents: [text],
            target_language_code: target_language,
            mime_type: MIME_TYPE,
        };

        let session = self.sessions.open().await?;
        let response: TranslateTextResponse =
            session.post_json(SERVICE, &self.translate_url, &request).await?;

        Ok(response
            .translations
            .into_iter()
            .map(|t| Translation {
                translated_text: t.translated_text,
                detected_language_code: t.detected_language_code,
            })
            .collect())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectLanguageRequest<'a> {
    content: &'a str,
    mime_type: &'static str,
}

#[derive(Deserialize)]
struct DetectLanguageResponse {
    #[serde(default)]
    languages: Vec<LanguageEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LanguageEntry {
    #[serde(default)]
    language_code: String,
    #[serde(default)]
    confidence: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TranslateTextRequest<'a> {
    contents: [&'a str; 1],
    target_language_code: &'a str,
    mime_type: &'static str,
}

#[derive(Deserialize)]
struct TranslateTextResponse {
    #[serde(default)]
    translations: Vec<TranslationEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslationEntry {
    #[serde(default)]
    translated_text: String,
    detected_language_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::TokenSource;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> TranslationClient {
        TranslationClient::new(
            SessionFactory::new(reqwest::Client::new(), TokenSource::Static("t0k".into())),
            &server.uri(),
            "projects/demo/locations/global".to_string(),
        )
    }

    #[tokio::test]
    async fn test_detect_language() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/projects/demo/locations/global:detectLanguage"))
            .and(header("authorization", "Bearer t0k"))
            .and(body_json(json!({"content": "Bonjour", "mimeType": "text/plain"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "languages": [
                    {"languageCode": "fr", "confidence": 0.98},
                    {"languageCode": "en", "confidence": 0.02}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let languages = client(&server).detect_language("Bonjour").await.unwrap();
        assert_eq!(languages.len(), 2);
        assert_eq!(languages[0].language_code, "fr");
        assert!(languages[0].confidence > languages[1].confidence);
    }

    #[tokio::test]
    async fn test_detect_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let languages = client(&server).detect_language("???").await.unwrap();
        assert!(languages.is_empty());
    }

    #[tokio::test]
    async fn test_translate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/projects/demo/locations/global:translateText"))
            .and(body_json(json!({
                "contents": ["Bonjour"],
                "targetLanguageCode": "es",
                "mimeType": "text/plain"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "translations": [{"translatedText": "Hola", "detectedLanguageCode": "fr"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let translations = client(&server).translate_text("Bonjour", "es").await.unwrap();
        assert_eq!(
            translations,
            vec![Translation {
                translated_text: "Hola".into(),
                detected_language_code: Some("fr".into()),
            }]
        );
    }

    #[tokio::test]
    async fn test_translate_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(&server).translate_text("x", "es").await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Status { service: "translate", status: 500, .. }
        ));
    }
}

//! Cloud Vision text detection

use super::{ImageAnnotator, ProviderError, ProviderStatus, SessionFactory, TextAnnotation};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const SERVICE: &str = "vision";

/// Cloud Vision `images:annotate` client, restricted to text detection
pub struct VisionClient {
    sessions: SessionFactory,
    annotate_url: String,
}

impl VisionClient {
    pub fn new(sessions: SessionFactory, base_url: &str) -> Self {
        Self {
            sessions,
            annotate_url: format!("{}/v1/images:annotate", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl ImageAnnotator for VisionClient {
    async fn annotate_text(&self, image_uri: &str) -> Result<TextAnnotation, ProviderError> {
        let request = BatchAnnotateImagesRequest {
            requests: vec![AnnotateImageRequest {
                image: Image {
                    source: ImageSource {
                        gcs_image_uri: image_uri.to_string(),
                    },
                },
                features: vec![Feature {
                    kind: "TEXT_DETECTION",
                }],
            }],
        };

        let session = self.sessions.open().await?;
        let response: BatchAnnotateImagesResponse =
            session.post_json(SERVICE, &self.annotate_url, &request).await?;

        let first = response
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse {
                service: SERVICE,
                message: "no annotation result for the image".to_string(),
            })?;

        Ok(TextAnnotation {
            full_text: first.full_text_annotation.map(|a| a.text),
            error: first.error.map(|s| ProviderStatus {
                code: s.code,
                message: s.message,
            }),
        })
    }
}

#[derive(Serialize)]
struct BatchAnnotateImagesRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Serialize)]
struct AnnotateImageRequest {
    image: Image,
    features: Vec<Feature>,
}

#[derive(Serialize)]
struct Image {
    source: ImageSource,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageSource {
    gcs_image_uri: String,
}

#[derive(Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct BatchAnnotateImagesResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    full_text_annotation: Option<FullTextAnnotation>,
    error: Option<Status>,
}

#[derive(Deserialize)]
struct FullTextAnnotation {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct Status {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::TokenSource;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> VisionClient {
        VisionClient::new(
            SessionFactory::new(reqwest::Client::new(), TokenSource::Static("t0k".into())),
            &server.uri(),
        )
    }

    #[tokio::test]
    async fn test_text_detection_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/images:annotate"))
            .and(header("authorization", "Bearer t0k"))
            .and(body_json(json!({
                "requests": [{
                    "image": {"source": {"gcsImageUri": "gs://uploads/sign.png"}},
                    "features": [{"type": "TEXT_DETECTION"}]
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "responses": [{
                    "textAnnotations": [{"description": "STOP"}],
                    "fullTextAnnotation": {"text": "STOP\n", "pages": []}
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let annotation = client(&server).annotate_text("gs://uploads/sign.png").await.unwrap();
        assert_eq!(annotation.full_text.as_deref(), Some("STOP\n"));
        assert_eq!(annotation.error, None);
    }

    #[tokio::test]
    async fn test_image_without_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"responses": [{}]})))
            .mount(&server)
            .await;

        let annotation = client(&server).annotate_text("gs://b/blank.png").await.unwrap();
        assert_eq!(annotation, TextAnnotation::default());
    }

    #[tokio::test]
    async fn test_error_inside_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "responses": [{"error": {"code": 7, "message": "no access to bucket"}}]
            })))
            .mount(&server)
            .await;

        let annotation = client(&server).annotate_text("gs://b/x.png").await.unwrap();
        assert_eq!(annotation.full_text, None);
        assert_eq!(
            annotation.error,
            Some(ProviderStatus {
                code: 7,
                message: "no access to bucket".into()
            })
        );
    }

    #[tokio::test]
    async fn test_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": 403, "message": "Vision API has not been used", "status": "PERMISSION_DENIED"}
            })))
            .mount(&server)
            .await;

        let err = client(&server).annotate_text("gs://b/x.png").await.unwrap_err();
        match err {
            ProviderError::Status { service, status, message } => {
                assert_eq!(service, "vision");
                assert_eq!(status, 403);
                assert_eq!(message, "Vision API has not been used");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_batch_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let err = client(&server).annotate_text("gs://b/x.png").await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse { service: "vision", .. }));
    }
}

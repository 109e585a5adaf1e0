//! Pub/Sub topic publisher

use super::{ProviderError, ResultPublisher, SessionFactory};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

const SERVICE: &str = "pubsub";

/// Publishes to a single, fixed topic
pub struct PubsubPublisher {
    sessions: SessionFactory,
    publish_url: String,
}

impl PubsubPublisher {
    /// `topic` is the full `projects/{p}/topics/{t}` resource name
    pub fn new(sessions: SessionFactory, base_url: &str, topic: String) -> Self {
        Self {
            sessions,
            publish_url: format!("{}/v1/{}:publish", base_url.trim_end_matches('/'), topic),
        }
    }
}

#[async_trait]
impl ResultPublisher for PubsubPublisher {
    async fn publish(&self, data: Vec<u8>) -> Result<String, ProviderError> {
        // The REST API carries message bodies as base64 strings.
        let request = PublishRequest {
            messages: vec![PubsubMessage {
                data: STANDARD.encode(&data),
            }],
        };

        let session = self.sessions.open().await?;
        let response: PublishResponse =
            session.post_json(SERVICE, &self.publish_url, &request).await?;

        response
            .message_ids
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse {
                service: SERVICE,
                message: "publish acknowledged without a message id".to_string(),
            })
    }
}

#[derive(Serialize)]
struct PublishRequest {
    messages: Vec<PubsubMessage>,
}

#[derive(Serialize)]
struct PubsubMessage {
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    #[serde(default)]
    message_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::TokenSource;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn publisher(server: &MockServer) -> PubsubPublisher {
        PubsubPublisher::new(
            SessionFactory::new(reqwest::Client::new(), TokenSource::Static("t0k".into())),
            &server.uri(),
            "projects/demo/topics/translated".to_string(),
        )
    }

    #[tokio::test]
    async fn test_publish() {
        let server = MockServer::start().await;
        let payload = br#"{"text":"Hola","filename":"a.png","lang":"es"}"#.to_vec();

        Mock::given(method("POST"))
            .and(path("/v1/projects/demo/topics/translated:publish"))
            .and(header("authorization", "Bearer t0k"))
            .and(body_json(json!({
                "messages": [{"data": STANDARD.encode(&payload)}]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"messageIds": ["9001"]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let id = publisher(&server).publish(payload).await.unwrap();
        assert_eq!(id, "9001");
    }

    #[tokio::test]
    async fn test_publish_without_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let err = publisher(&server).publish(b"{}".to_vec()).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse { service: "pubsub", .. }));
    }

    #[tokio::test]
    async fn test_topic_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": 404, "message": "Resource not found (resource=translated).", "status": "NOT_FOUND"}
            })))
            .mount(&server)
            .await;

        let err = publisher(&server).publish(b"{}".to_vec()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "pubsub returned 404: Resource not found (resource=translated)."
        );
    }
}

//! Authorized, per-call access to Google APIs

use super::ProviderError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const METADATA_TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

/// Where bearer tokens come from
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// A token handed over in configuration
    Static(String),
    /// The instance metadata server of the hosting environment
    MetadataServer { base_url: String },
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
}

impl TokenSource {
    async fn fetch(&self, http: &reqwest::Client) -> Result<String, ProviderError> {
        let base_url = match self {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::MetadataServer { base_url } => base_url,
        };

        let url = format!("{}{}", base_url.trim_end_matches('/'), METADATA_TOKEN_PATH);
        let response = http
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| ProviderError::Auth(format!("metadata server unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(ProviderError::Auth(format!(
                "metadata server returned {}",
                response.status()
            )));
        }

        let token: MetadataToken = response
            .json()
            .await
            .map_err(|e| ProviderError::Auth(format!("malformed token response: {}", e)))?;

        if token.access_token.is_empty() {
            return Err(ProviderError::Auth("metadata server returned an empty token".into()));
        }

        Ok(token.access_token)
    }
}

/// Opens one [`ApiSession`] per provider call
#[derive(Debug, Clone)]
pub struct SessionFactory {
    http: reqwest::Client,
    tokens: TokenSource,
}

impl SessionFactory {
    pub fn new(http: reqwest::Client, tokens: TokenSource) -> Self {
        Self { http, tokens }
    }

    /// Acquire credentials for a single call; they are released on drop
    pub async fn open(&self) -> Result<ApiSession<'_>, ProviderError> {
        let token = self.tokens.fetch(&self.http).await?;
        tracing::trace!("Opened API session");
        Ok(ApiSession {
            http: &self.http,
            token,
        })
    }
}

/// Credentials scoped to one provider call
pub struct ApiSession<'a> {
    http: &'a reqwest::Client,
    token: String,
}

impl ApiSession<'_> {
    /// POST a JSON body and decode the JSON response
    pub async fn post_json<B, R>(
        &self,
        service: &'static str,
        url: &str,
        body: &B,
    ) -> Result<R, ProviderError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        tracing::debug!(service, url, "Calling API");

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(service, url, error = %e, "API request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                service,
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ProviderError::InvalidResponse {
            service,
            message: e.to_string(),
        })
    }
}

impl Drop for ApiSession<'_> {
    fn drop(&mut self) {
        tracing::trace!("Closed API session");
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

/// Google APIs wrap failures in `{"error": {"message": ...}}`
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => parsed.error.message,
        _ if body.trim().is_empty() => "empty response body".to_string(),
        _ => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_static_token() {
        let factory = SessionFactory::new(reqwest::Client::new(), TokenSource::Static("abc".into()));
        let session = factory.open().await.unwrap();
        assert_eq!(session.token, "abc");
    }

    #[tokio::test]
    async fn test_metadata_token_fetched_per_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(METADATA_TOKEN_PATH))
            .and(header("Metadata-Flavor", "Google"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.fresh",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(2)
            .mount(&server)
            .await;

        let factory = SessionFactory::new(
            reqwest::Client::new(),
            TokenSource::MetadataServer { base_url: server.uri() },
        );

        for _ in 0..2 {
            let session = factory.open().await.unwrap();
            assert_eq!(session.token, "ya29.fresh");
        }
    }

    #[tokio::test]
    async fn test_metadata_failure_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let factory = SessionFactory::new(
            reqwest::Client::new(),
            TokenSource::MetadataServer { base_url: server.uri() },
        );

        assert!(matches!(factory.open().await, Err(ProviderError::Auth(_))));
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(r#"{"error":{"code":403,"message":"Permission denied","status":"PERMISSION_DENIED"}}"#),
            "Permission denied"
        );
        assert_eq!(error_message("  upstream timeout \n"), "upstream timeout");
        assert_eq!(error_message(""), "empty response body");
    }
}

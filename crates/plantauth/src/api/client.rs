//! HTTP client for the main API.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

use crate::config::MainApiOptions;
use crate::error::{AuthzError, AuthzResult};

/// Longest URL the main API accepts.
pub const MAX_URL_LENGTH: usize = 2000;

/// Supplies bearer tokens for main API calls.
///
/// `on_behalf_of` is `Some(oid)` for calls made for a specific user and
/// `None` for calls made as the application itself. How tokens are
/// obtained (client credentials, on-behalf-of flow, a fixed token) is up
/// to the implementation.
#[async_trait]
pub trait BearerTokenProvider: Send + Sync {
    async fn bearer_token(&self, on_behalf_of: Option<Uuid>) -> AuthzResult<String>;
}

/// Uses one token for every call.
pub struct StaticBearerToken(String);

impl StaticBearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl BearerTokenProvider for StaticBearerToken {
    async fn bearer_token(&self, _on_behalf_of: Option<Uuid>) -> AuthzResult<String> {
        Ok(self.0.clone())
    }
}

/// Authenticated JSON client bound to one main API base address.
pub struct MainApiClient {
    http: reqwest::Client,
    base_url: Url,
    api_version: String,
    tokens: Arc<dyn BearerTokenProvider>,
}

impl MainApiClient {
    /// Build a client from `options`.
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::Configuration` if the base address does not parse
    /// or the HTTP client cannot be built.
    pub fn new(options: &MainApiOptions, tokens: Arc<dyn BearerTokenProvider>) -> AuthzResult<Self> {
        // Relative paths are joined onto the base, which needs a trailing slash.
        let mut base = options.base_address.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| {
            AuthzError::configuration(format!("invalid main API base address '{base}': {e}"))
        })?;

        let http = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| AuthzError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            api_version: options.api_version.clone(),
            tokens,
        })
    }

    /// Resolve `path` against the base address and append `query` plus the
    /// `api-version` parameter.
    pub fn url(&self, path: &str, query: &[(&str, &str)]) -> AuthzResult<Url> {
        let mut url = self.base_url.join(path).map_err(|e| {
            AuthzError::configuration(format!("invalid main API path '{path}': {e}"))
        })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
            pairs.append_pair("api-version", &self.api_version);
        }

        if url.as_str().len() > MAX_URL_LENGTH {
            return Err(AuthzError::remote(
                url.as_str(),
                None,
                format!("url exceeds max {MAX_URL_LENGTH} characters"),
            ));
        }
        Ok(url)
    }

    /// GET `url` and decode the JSON body. Any non-success status is an error.
    pub async fn query_and_deserialize<T: DeserializeOwned>(
        &self,
        url: &Url,
        on_behalf_of: Option<Uuid>,
        cancel: &CancellationToken,
    ) -> AuthzResult<T> {
        let response = self
            .send(self.request(Method::GET, url, on_behalf_of).await?, url, cancel)
            .await?;
        decode(url, response).await
    }

    /// GET `url` and decode the JSON body. A 404 is reported as `None`.
    pub async fn try_query_and_deserialize<T: DeserializeOwned>(
        &self,
        url: &Url,
        on_behalf_of: Option<Uuid>,
        cancel: &CancellationToken,
    ) -> AuthzResult<Option<T>> {
        let response = self
            .send_tolerating_not_found(self.request(Method::GET, url, on_behalf_of).await?, url, cancel)
            .await?;
        match response {
            Some(response) => decode(url, response).await.map(Some),
            None => Ok(None),
        }
    }

    /// POST `body` as JSON to `url`, ignoring the response body.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &Url,
        body: &B,
        on_behalf_of: Option<Uuid>,
        cancel: &CancellationToken,
    ) -> AuthzResult<()> {
        let request = self.request(Method::POST, url, on_behalf_of).await?.json(body);
        self.send(request, url, cancel).await?;
        Ok(())
    }

    async fn request(
        &self,
        method: Method,
        url: &Url,
        on_behalf_of: Option<Uuid>,
    ) -> AuthzResult<RequestBuilder> {
        let token = self.tokens.bearer_token(on_behalf_of).await?;
        Ok(self
            .http
            .request(method, url.clone())
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json"))
    }

    async fn send(
        &self,
        request: RequestBuilder,
        url: &Url,
        cancel: &CancellationToken,
    ) -> AuthzResult<Response> {
        match self.send_tolerating_not_found(request, url, cancel).await? {
            Some(response) => Ok(response),
            None => Err(AuthzError::remote(
                url.as_str(),
                Some(StatusCode::NOT_FOUND.as_u16()),
                "HTTP 404 Not Found",
            )),
        }
    }

    async fn send_tolerating_not_found(
        &self,
        request: RequestBuilder,
        url: &Url,
        cancel: &CancellationToken,
    ) -> AuthzResult<Option<Response>> {
        let started = Instant::now();

        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AuthzError::Cancelled),
            response = request.send() => response,
        };
        let response = sent.map_err(|e| {
            tracing::error!(url = %url, error = %e, "main API request failed");
            AuthzError::remote(url.as_str(), None, format!("request failed: {e}"))
        })?;

        let status = response.status();
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if status.is_success() {
            tracing::info!(url = %url, status = status.as_u16(), elapsed_ms, "main API request");
            return Ok(Some(response));
        }
        if status == StatusCode::NOT_FOUND {
            tracing::warn!(url = %url, status = status.as_u16(), elapsed_ms, "main API request");
            return Ok(None);
        }

        tracing::error!(url = %url, status = status.as_u16(), elapsed_ms, "main API request");
        let body = response.text().await.unwrap_or_default();
        Err(AuthzError::remote(
            url.as_str(),
            Some(status.as_u16()),
            format!("HTTP {status}: {body}"),
        ))
    }
}

async fn decode<T: DeserializeOwned>(url: &Url, response: Response) -> AuthzResult<T> {
    let status = response.status().as_u16();
    let body = response.text().await.map_err(|e| {
        AuthzError::remote(url.as_str(), Some(status), format!("failed to read body: {e}"))
    })?;

    // An empty body decodes like JSON null.
    let text = if body.trim().is_empty() { "null" } else { body.as_str() };
    serde_json::from_str(text).map_err(|e| {
        AuthzError::remote(
            url.as_str(),
            Some(status),
            format!("failed to parse response JSON: {e}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    struct PerUserToken;

    #[async_trait]
    impl BearerTokenProvider for PerUserToken {
        async fn bearer_token(&self, on_behalf_of: Option<Uuid>) -> AuthzResult<String> {
            Ok(match on_behalf_of {
                Some(oid) => format!("user-{oid}"),
                None => "app".to_string(),
            })
        }
    }

    fn client(server: &MockServer) -> MainApiClient {
        let options = MainApiOptions {
            base_address: format!("{}/api", server.uri()),
            api_version: "4.1".to_string(),
            client_friendly_name: "tests".to_string(),
            request_timeout: Duration::from_secs(5),
        };
        MainApiClient::new(&options, Arc::new(PerUserToken)).unwrap()
    }

    #[tokio::test]
    async fn test_url_appends_api_version() {
        let server = MockServer::start().await;
        let client = client(&server);

        let url = client.url("Permissions", &[("plantId", "PCS$A")]).unwrap();
        assert!(url.path().ends_with("/api/Permissions"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("plantId".to_string(), "PCS$A".to_string()),
                ("api-version".to_string(), "4.1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_url_length_guard() {
        let server = MockServer::start().await;
        let client = client(&server);

        let long = "x".repeat(MAX_URL_LENGTH);
        let err = client.url("Permissions", &[("plantId", long.as_str())]).unwrap_err();
        assert!(err.to_string().contains("exceeds max 2000"));
    }

    #[tokio::test]
    async fn test_query_sends_bearer_for_user() {
        let server = MockServer::start().await;
        let oid = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/api/Permissions"))
            .and(query_param("api-version", "4.1"))
            .and(header("authorization", format!("Bearer user-{oid}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["A", "B"])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let url = client.url("Permissions", &[]).unwrap();
        let result: Vec<String> = client
            .query_and_deserialize(&url, Some(oid), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_query_error_status_is_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/Permissions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client(&server);
        let url = client.url("Permissions", &[]).unwrap();
        let err = client
            .query_and_deserialize::<Vec<String>>(&url, None, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            AuthzError::RemoteAuthority { status, message, .. } => {
                assert_eq!(status, Some(500));
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_query_not_found_is_error_but_try_query_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/Person"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client(&server);
        let url = client.url("Person", &[]).unwrap();
        let cancel = CancellationToken::new();

        let err = client
            .query_and_deserialize::<serde_json::Value>(&url, None, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthzError::RemoteAuthority {
                status: Some(404),
                ..
            }
        ));

        let none = client
            .try_query_and_deserialize::<serde_json::Value>(&url, None, &cancel)
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_empty_body_decodes_as_null() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/Projects"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client(&server);
        let url = client.url("Projects", &[]).unwrap();
        let result: Option<Vec<String>> = client
            .query_and_deserialize(&url, None, &CancellationToken::new())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_post_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/Me/TracePlant"))
            .and(body_json(json!("plantauth")))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let url = client.url("Me/TracePlant", &[("plantId", "PCS$A")]).unwrap();
        client
            .post_json(&url, "plantauth", Some(Uuid::new_v4()), &CancellationToken::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/Permissions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = client(&server);
        let url = client.url("Permissions", &[]).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = client
            .query_and_deserialize::<Vec<String>>(&url, None, &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}

//! HTTP client wrapper for the Bitbucket Cloud REST API.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::auth::{AuthProvider, Credentials};
use super::error::BitbucketError;

pub const DEFAULT_BASE_URL: &str = "https://api.bitbucket.org/2.0";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_TASKS_SEGMENT: &str = "tasks";

/// Everything needed to build a [`BitbucketClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credentials: Credentials,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    /// Collection name under `/pullrequests/{id}/` that serves tasks.
    pub tasks_segment: Option<String>,
}

impl ClientConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: None,
            timeout: None,
            tasks_segment: None,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn tasks_segment(mut self, segment: impl Into<String>) -> Self {
        self.tasks_segment = Some(segment.into());
        self
    }
}

/// Bitbucket API client. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct BitbucketClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    http: Client,
    base_url: String,
    tasks_segment: String,
}

impl BitbucketClient {
    pub fn new(config: ClientConfig) -> Result<Self, BitbucketError> {
        let auth = AuthProvider::new(config.credentials)?;

        let mut auth_value = HeaderValue::from_str(&auth.auth_header_value()).map_err(|e| {
            BitbucketError::Configuration(format!("Invalid credentials for auth header: {}", e))
        })?;
        auth_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth_value);
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .user_agent(concat!("mcp-bitbucket/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                BitbucketError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let tasks_segment = config
            .tasks_segment
            .map(|s| s.trim_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_TASKS_SEGMENT.to_string());

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                tasks_segment,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub(crate) fn tasks_segment(&self) -> &str {
        &self.inner.tasks_segment
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, BitbucketError> {
        let response = self.send(Method::GET, path, None::<&()>).await?;
        decode(response).await
    }

    /// GET a resource whose body is plain text, such as a diff or patch.
    pub async fn get_text(&self, path: &str) -> Result<String, BitbucketError> {
        let response = self.send(Method::GET, path, None::<&()>).await?;
        Ok(response.text().await?)
    }

    pub async fn post<B, T>(&self, path: &str, body: Option<&B>) -> Result<T, BitbucketError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::POST, path, body).await?;
        decode(response).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, BitbucketError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::PUT, path, Some(body)).await?;
        decode(response).await
    }

    /// DELETE a resource. Any response body is discarded.
    pub async fn delete(&self, path: &str) -> Result<(), BitbucketError> {
        self.send(Method::DELETE, path, None::<&()>).await?;
        Ok(())
    }

    /// Perform one round trip, turning every failure into a [`BitbucketError`].
    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, BitbucketError>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.inner.base_url, path);
        tracing::debug!(method = %method, path, "Sending Bitbucket API request");

        let mut request = self.inner.http.request(method.clone(), &url);
        if let Some(body) = body {
            let payload = serde_json::to_vec(body).map_err(|e| {
                BitbucketError::Configuration(format!("Failed to encode request body: {}", e))
            })?;
            request = request.body(payload);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(method = %method, path, error = %e, "Bitbucket request failed without a response");
            BitbucketError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let headers = response.headers().clone();
        let text = response.text().await.unwrap_or_default();
        let err = BitbucketError::from_response(status, &headers, &text);
        tracing::warn!(
            method = %method,
            path,
            status = status.as_u16(),
            kind = ?err.kind(),
            "Bitbucket API returned an error"
        );
        Err(err)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BitbucketError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| BitbucketError::InvalidResponse(e.to_string()))
}

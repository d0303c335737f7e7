//! Authorized JSON transport shared by the Pub/Sub and BigQuery clients

use std::sync::Arc;
use std::time::Duration;

use contracts::HttpClientConfig;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::auth::TokenProvider;
use crate::error::{GcpError, Result};

/// Build the outbound reqwest client
pub fn build_http_client(config: &HttpClientConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .user_agent(concat!("pipeline-gateway/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| GcpError::request("building http client", e))
}

/// Google API error envelope: `{"error": {"code": 404, "message": "...", "status": "NOT_FOUND"}}`
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// reqwest client + token provider
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    tokens: Arc<TokenProvider>,
}

impl ApiClient {
    pub fn new(http: reqwest::Client, tokens: Arc<TokenProvider>) -> Self {
        Self { http, tokens }
    }

    /// Client without credentials, for emulators and tests
    pub fn anonymous() -> Self {
        Self::new(reqwest::Client::new(), Arc::new(TokenProvider::anonymous()))
    }

    async fn request(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        let builder = self.http.request(method, url);
        Ok(match self.tokens.token().await? {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// GET `url` and decode the JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, context: &str) -> Result<T> {
        let builder = self.request(Method::GET, url).await?;
        self.execute(builder, context).await
    }

    /// POST `body` to `url` and decode the JSON response
    pub async fn post_json<B, T>(&self, url: &str, body: &B, context: &str) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, url).await?.json(body);
        self.execute(builder, context).await
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder, context: &str) -> Result<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| GcpError::request(context, e))?;
        let response = check_status(response, context).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| GcpError::unexpected(context, e.to_string()))
    }
}

/// Turn non-2xx responses into `GcpError::Api`, preferring the API's own message
async fn check_status(response: Response, context: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or(body);

    Err(GcpError::Api {
        context: context.to_string(),
        status: status.as_u16(),
        message,
    })
}

//! HTTP utilities for IBM Cloud REST API calls

use crate::error::ApiError;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// HTTP client wrapper for IBM Cloud API calls
#[derive(Clone)]
pub struct IbmHttpClient {
    client: Client,
}

impl IbmHttpClient {
    /// Create a new HTTP client with a per-request timeout
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("ibmtf/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    pub async fn get(&self, url: &str, token: &str) -> Result<Value, ApiError> {
        self.execute(Method::GET, url, token, None, &[]).await
    }

    pub async fn post(&self, url: &str, token: &str, body: &Value) -> Result<Value, ApiError> {
        self.execute(Method::POST, url, token, Some(body), &[]).await
    }

    pub async fn patch(&self, url: &str, token: &str, body: &Value) -> Result<Value, ApiError> {
        self.execute(Method::PATCH, url, token, Some(body), &[]).await
    }

    pub async fn delete(&self, url: &str, token: &str) -> Result<Value, ApiError> {
        self.execute(Method::DELETE, url, token, None, &[]).await
    }

    /// Make a request carrying extra headers (container registry scopes by header)
    pub async fn send_with_headers(
        &self,
        method: Method,
        url: &str,
        token: &str,
        headers: &[(&str, &str)],
    ) -> Result<Value, ApiError> {
        self.execute(method, url, token, None, headers).await
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<&Value>,
        headers: &[(&str, &str)],
    ) -> Result<Value, ApiError> {
        tracing::debug!("{} {}", method, url);

        let mut request: RequestBuilder = self.client.request(method, url).bearer_auth(token);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::transport(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        let response_body = response
            .text()
            .await
            .map_err(|e| ApiError::transport(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            // Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&response_body));
            return Err(
                ApiError::new(Some(status.as_u16()), format!("API request failed: {}", status))
                    .with_body(response_body),
            );
        }

        // Handle empty response
        if response_body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&response_body).map_err(|e| {
            ApiError::new(
                Some(status.as_u16()),
                format!("Failed to parse response JSON: {}", e),
            )
        })
    }
}

/// Append query parameters to a URL, skipping unset values
pub fn with_query(url: &str, params: &[(&str, Option<String>)]) -> Result<String, ApiError> {
    let mut parsed =
        Url::parse(url).map_err(|e| ApiError::transport(format!("Invalid URL {}: {}", url, e)))?;

    let present: Vec<(&str, &str)> = params
        .iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (*key, v)))
        .collect();
    if !present.is_empty() {
        parsed.query_pairs_mut().extend_pairs(present);
    }

    Ok(parsed.to_string())
}

/// Read a single query parameter out of a URL (pagination links carry the next token)
pub fn query_param(url: &str, key: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Deserialize a response value into a typed model
pub fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value)
        .map_err(|e| ApiError::transport(format!("Failed to decode response: {}", e)))
}

/// Serialize a request model into a JSON body
pub fn encode<T: serde::Serialize>(body: &T) -> Result<Value, ApiError> {
    serde_json::to_value(body)
        .map_err(|e| ApiError::transport(format!("Failed to encode request: {}", e)))
}

/// Format an API error for display
pub fn format_api_error(error: &ApiError) -> String {
    match error.status {
        Some(401) => "Authentication failed. Check IBMCLOUD_IAM_TOKEN.".to_string(),
        Some(403) => "Permission denied. Check your IBM Cloud IAM access policies.".to_string(),
        Some(404) => "Resource not found.".to_string(),
        Some(409) => "Resource conflict. The resource may already exist or be in use.".to_string(),
        Some(429) => "Rate limit exceeded. Please try again later.".to_string(),
        Some(500) | Some(502) | Some(503) => {
            "IBM Cloud service temporarily unavailable. Please try again.".to_string()
        }
        _ => error
            .message
            .chars()
            .filter(|c| c.is_ascii_graphic() || *c == ' ')
            .take(80)
            .collect(),
    }
}

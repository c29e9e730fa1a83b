//! Container Registry namespaces

use super::http::{decode, IbmHttpClient};
use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NamespaceDetails {
    pub name: String,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub crn: Option<String>,
    #[serde(default)]
    pub resource_group: Option<String>,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub updated_date: Option<String>,
}

/// Container Registry operations used by the handlers
#[async_trait]
pub trait ContainerRegistryApi: Send + Sync {
    async fn list_namespace_details(&self) -> Result<Vec<NamespaceDetails>, ApiError>;

    async fn create_namespace(
        &self,
        name: &str,
        resource_group_id: Option<&str>,
    ) -> Result<(), ApiError>;

    async fn delete_namespace(&self, name: &str) -> Result<(), ApiError>;

    /// The registry has no single-namespace lookup; absence is reported as a 404
    async fn get_namespace(&self, name: &str) -> Result<NamespaceDetails, ApiError> {
        self.list_namespace_details()
            .await?
            .into_iter()
            .find(|ns| ns.name == name)
            .ok_or_else(|| ApiError::not_found(format!("namespace {} not found", name)))
    }
}

/// REST binding for the regional registry API
#[derive(Clone)]
pub struct ContainerRegistryClient {
    http: IbmHttpClient,
    base_url: String,
    token: String,
    account_id: Option<String>,
}

impl ContainerRegistryClient {
    pub fn new(
        http: IbmHttpClient,
        base_url: &str,
        token: &str,
        account_id: Option<&str>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            account_id: account_id.map(|s| s.to_string()),
        }
    }

    fn namespaces_url(&self) -> String {
        format!("{}/api/v1/namespaces", self.base_url)
    }

    fn namespace_url(&self, name: &str) -> String {
        format!("{}/{}", self.namespaces_url(), urlencoding::encode(name))
    }

    fn account_header(&self) -> Vec<(&str, &str)> {
        self.account_id
            .as_deref()
            .map(|account| vec![("Account", account)])
            .unwrap_or_default()
    }
}

#[async_trait]
impl ContainerRegistryApi for ContainerRegistryClient {
    async fn list_namespace_details(&self) -> Result<Vec<NamespaceDetails>, ApiError> {
        let url = format!("{}/details", self.namespaces_url());
        let response = self
            .http
            .send_with_headers(Method::GET, &url, &self.token, &self.account_header())
            .await?;
        if response.is_null() {
            return Ok(Vec::new());
        }
        decode(response)
    }

    async fn create_namespace(
        &self,
        name: &str,
        resource_group_id: Option<&str>,
    ) -> Result<(), ApiError> {
        let url = self.namespace_url(name);
        let mut headers = self.account_header();
        if let Some(group) = resource_group_id {
            headers.push(("X-Auth-Resource-Group", group));
        }
        self.http
            .send_with_headers(Method::PUT, &url, &self.token, &headers)
            .await?;
        Ok(())
    }

    async fn delete_namespace(&self, name: &str) -> Result<(), ApiError> {
        let url = self.namespace_url(name);
        self.http
            .send_with_headers(Method::DELETE, &url, &self.token, &self.account_header())
            .await?;
        Ok(())
    }
}

//! Client session
//!
//! Handlers never construct service clients themselves; they receive a
//! [`ClientSession`] and ask it for the binding they need.

use super::cr::{ContainerRegistryApi, ContainerRegistryClient};
use super::dns::{DnsSvcsApi, DnsSvcsClient};
use super::http::IbmHttpClient;
use super::vpc::{VpcApi, VpcClient};
use crate::config::Config;
use crate::error::{ProviderError, Result};

/// Source of service clients for handlers
pub trait ClientSession: Send + Sync {
    fn private_dns(&self) -> Result<&dyn DnsSvcsApi>;

    fn vpc(&self) -> Result<&dyn VpcApi>;

    fn container_registry(&self) -> Result<&dyn ContainerRegistryApi>;
}

/// Session backed by the IBM Cloud REST APIs
pub struct IbmSession {
    dns: Option<DnsSvcsClient>,
    vpc: Option<VpcClient>,
    cr: Option<ContainerRegistryClient>,
    region: String,
}

impl IbmSession {
    /// Build every service binding from configuration.
    ///
    /// A missing token does not fail here; each accessor reports it when a
    /// handler actually needs that service.
    pub fn new(config: &Config) -> Result<Self> {
        let region = config.effective_region();
        let Some(token) = config.iam_token.as_deref().map(strip_bearer) else {
            return Ok(Self {
                dns: None,
                vpc: None,
                cr: None,
                region,
            });
        };

        let http = IbmHttpClient::new(config.request_timeout())
            .map_err(|e| ProviderError::Session(e.to_string()))?;

        tracing::debug!(
            "Session for region {}: dns={}, vpc={}, cr={}",
            region,
            config.dns_endpoint(),
            config.vpc_endpoint(),
            config.cr_endpoint()
        );

        Ok(Self {
            dns: Some(DnsSvcsClient::new(http.clone(), &config.dns_endpoint(), token)),
            vpc: Some(VpcClient::new(
                http.clone(),
                &config.vpc_endpoint(),
                token,
                &config.vpc_api_version(),
            )),
            cr: Some(ContainerRegistryClient::new(
                http,
                &config.cr_endpoint(),
                token,
                config.account_id.as_deref(),
            )),
            region,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

fn strip_bearer(token: &str) -> &str {
    token.strip_prefix("Bearer ").unwrap_or(token).trim()
}

fn missing_token(service: &str) -> ProviderError {
    ProviderError::Session(format!(
        "Failed to create {} client: no IAM token configured (set IBMCLOUD_IAM_TOKEN)",
        service
    ))
}

impl ClientSession for IbmSession {
    fn private_dns(&self) -> Result<&dyn DnsSvcsApi> {
        self.dns
            .as_ref()
            .map(|c| c as &dyn DnsSvcsApi)
            .ok_or_else(|| missing_token("private DNS"))
    }

    fn vpc(&self) -> Result<&dyn VpcApi> {
        self.vpc
            .as_ref()
            .map(|c| c as &dyn VpcApi)
            .ok_or_else(|| missing_token("VPC"))
    }

    fn container_registry(&self) -> Result<&dyn ContainerRegistryApi> {
        self.cr
            .as_ref()
            .map(|c| c as &dyn ContainerRegistryApi)
            .ok_or_else(|| missing_token("container registry"))
    }
}

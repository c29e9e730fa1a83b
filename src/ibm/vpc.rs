//! VPC Infrastructure
//!
//! Only the VPN gateway endpoints are bound here.

use super::http::{decode, encode, query_param, with_query, IbmHttpClient};
use crate::error::ApiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// API date sent as the `version` query parameter when none is configured
pub const DEFAULT_VPC_API_VERSION: &str = "2021-03-30";

/// Reference to another VPC resource by id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
}

impl Reference {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PublicIp {
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VpnGatewayMember {
    #[serde(default)]
    pub public_ip: Option<PublicIp>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VpnGateway {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub crn: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub members: Vec<VpnGatewayMember>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub resource_group: Option<Reference>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub subnet: Option<Reference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PageLink {
    pub href: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VpnGatewayCollection {
    #[serde(default)]
    pub vpn_gateways: Vec<VpnGateway>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub first: Option<PageLink>,
    #[serde(default)]
    pub next: Option<PageLink>,
}

impl VpnGatewayCollection {
    /// Continuation token for the following page, if there is one
    pub fn next_start(&self) -> Option<String> {
        self.next
            .as_ref()
            .and_then(|link| query_param(&link.href, "start"))
    }
}

/// Filters and page window for listing VPN gateways
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListVpnGatewaysOptions {
    pub start: Option<String>,
    pub limit: Option<i64>,
    pub resource_group_id: Option<String>,
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VpnGatewayPrototype {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub subnet: Reference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<Reference>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VpnGatewayPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// VPC operations used by the handlers
#[async_trait]
pub trait VpcApi: Send + Sync {
    async fn list_vpn_gateways(
        &self,
        options: &ListVpnGatewaysOptions,
    ) -> Result<VpnGatewayCollection, ApiError>;

    async fn create_vpn_gateway(
        &self,
        prototype: &VpnGatewayPrototype,
    ) -> Result<VpnGateway, ApiError>;

    async fn get_vpn_gateway(&self, id: &str) -> Result<VpnGateway, ApiError>;

    async fn update_vpn_gateway(
        &self,
        id: &str,
        patch: &VpnGatewayPatch,
    ) -> Result<VpnGateway, ApiError>;

    async fn delete_vpn_gateway(&self, id: &str) -> Result<(), ApiError>;
}

/// REST binding for the regional VPC API
#[derive(Clone)]
pub struct VpcClient {
    http: IbmHttpClient,
    base_url: String,
    token: String,
    version: String,
}

impl VpcClient {
    pub fn new(http: IbmHttpClient, base_url: &str, token: &str, version: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            version: version.to_string(),
        }
    }

    /// Build a VPC URL; every call carries the API version and generation
    fn url(&self, path: &str, extra: &[(&str, Option<String>)]) -> Result<String, ApiError> {
        let mut params = vec![
            ("version", Some(self.version.clone())),
            ("generation", Some("2".to_string())),
        ];
        params.extend(extra.iter().cloned());
        with_query(&format!("{}/{}", self.base_url, path), &params)
    }
}

#[async_trait]
impl VpcApi for VpcClient {
    async fn list_vpn_gateways(
        &self,
        options: &ListVpnGatewaysOptions,
    ) -> Result<VpnGatewayCollection, ApiError> {
        let url = self.url(
            "vpn_gateways",
            &[
                ("start", options.start.clone()),
                ("limit", options.limit.map(|v| v.to_string())),
                ("resource_group.id", options.resource_group_id.clone()),
                ("mode", options.mode.clone()),
            ],
        )?;
        decode(self.http.get(&url, &self.token).await?)
    }

    async fn create_vpn_gateway(
        &self,
        prototype: &VpnGatewayPrototype,
    ) -> Result<VpnGateway, ApiError> {
        let url = self.url("vpn_gateways", &[])?;
        decode(self.http.post(&url, &self.token, &encode(prototype)?).await?)
    }

    async fn get_vpn_gateway(&self, id: &str) -> Result<VpnGateway, ApiError> {
        let url = self.url(&format!("vpn_gateways/{}", urlencoding::encode(id)), &[])?;
        decode(self.http.get(&url, &self.token).await?)
    }

    async fn update_vpn_gateway(
        &self,
        id: &str,
        patch: &VpnGatewayPatch,
    ) -> Result<VpnGateway, ApiError> {
        let url = self.url(&format!("vpn_gateways/{}", urlencoding::encode(id)), &[])?;
        decode(self.http.patch(&url, &self.token, &encode(patch)?).await?)
    }

    async fn delete_vpn_gateway(&self, id: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("vpn_gateways/{}", urlencoding::encode(id)), &[])?;
        self.http.delete(&url, &self.token).await?;
        Ok(())
    }
}

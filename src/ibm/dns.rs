//! Private DNS Services
//!
//! Global load balancers and their health-check monitors.

use super::http::{decode, encode, with_query, IbmHttpClient};
use crate::error::ApiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A request header sent by a health check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthcheckHeader {
    pub name: String,
    #[serde(default)]
    pub value: Vec<String>,
}

/// Health-check monitor as returned by the API
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Monitor {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub monitor_type: Option<String>,
    #[serde(default)]
    pub port: Option<i64>,
    #[serde(default)]
    pub interval: Option<i64>,
    #[serde(default)]
    pub retries: Option<i64>,
    #[serde(default)]
    pub timeout: Option<i64>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub headers: Option<Vec<HealthcheckHeader>>,
    #[serde(default)]
    pub allow_insecure: Option<bool>,
    #[serde(default)]
    pub expected_codes: Option<String>,
    #[serde(default)]
    pub expected_body: Option<String>,
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default)]
    pub modified_on: Option<String>,
}

/// Body of a monitor create or update call; unset fields are left out
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonitorRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub monitor_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<HealthcheckHeader>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_insecure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_codes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_body: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MonitorList {
    #[serde(default)]
    pub monitors: Vec<Monitor>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub total_count: Option<i64>,
}

/// Availability zone mapped to an ordered list of pools
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzPool {
    pub availability_zone: String,
    #[serde(default)]
    pub pools: Vec<String>,
}

/// Global load balancer as returned by the API
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LoadBalancer {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub ttl: Option<i64>,
    #[serde(default)]
    pub health: Option<String>,
    #[serde(default)]
    pub fallback_pool: Option<String>,
    #[serde(default)]
    pub default_pools: Vec<String>,
    #[serde(default)]
    pub az_pools: Vec<AzPool>,
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default)]
    pub modified_on: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadBalancerRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_pool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_pools: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub az_pools: Option<Vec<AzPool>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LoadBalancerList {
    #[serde(default)]
    pub load_balancers: Vec<LoadBalancer>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub total_count: Option<i64>,
}

/// Offset-based page window for list calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageOptions {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl PageOptions {
    fn query(&self) -> [(&'static str, Option<String>); 2] {
        [
            ("offset", self.offset.map(|v| v.to_string())),
            ("limit", self.limit.map(|v| v.to_string())),
        ]
    }
}

/// Private DNS Services operations used by the handlers
#[async_trait]
pub trait DnsSvcsApi: Send + Sync {
    async fn create_monitor(
        &self,
        instance_id: &str,
        body: &MonitorRequest,
    ) -> Result<Monitor, ApiError>;

    async fn get_monitor(&self, instance_id: &str, monitor_id: &str) -> Result<Monitor, ApiError>;

    async fn update_monitor(
        &self,
        instance_id: &str,
        monitor_id: &str,
        body: &MonitorRequest,
    ) -> Result<Monitor, ApiError>;

    async fn delete_monitor(&self, instance_id: &str, monitor_id: &str) -> Result<(), ApiError>;

    async fn list_monitors(
        &self,
        instance_id: &str,
        page: &PageOptions,
    ) -> Result<MonitorList, ApiError>;

    async fn create_load_balancer(
        &self,
        instance_id: &str,
        zone_id: &str,
        body: &LoadBalancerRequest,
    ) -> Result<LoadBalancer, ApiError>;

    async fn get_load_balancer(
        &self,
        instance_id: &str,
        zone_id: &str,
        lb_id: &str,
    ) -> Result<LoadBalancer, ApiError>;

    async fn update_load_balancer(
        &self,
        instance_id: &str,
        zone_id: &str,
        lb_id: &str,
        body: &LoadBalancerRequest,
    ) -> Result<LoadBalancer, ApiError>;

    async fn delete_load_balancer(
        &self,
        instance_id: &str,
        zone_id: &str,
        lb_id: &str,
    ) -> Result<(), ApiError>;

    async fn list_load_balancers(
        &self,
        instance_id: &str,
        zone_id: &str,
        page: &PageOptions,
    ) -> Result<LoadBalancerList, ApiError>;
}

/// REST binding for the DNS Services v1 API
#[derive(Clone)]
pub struct DnsSvcsClient {
    http: IbmHttpClient,
    base_url: String,
    token: String,
}

impl DnsSvcsClient {
    pub fn new(http: IbmHttpClient, base_url: &str, token: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn monitors_url(&self, instance_id: &str) -> String {
        format!(
            "{}/instances/{}/monitors",
            self.base_url,
            urlencoding::encode(instance_id)
        )
    }

    fn monitor_url(&self, instance_id: &str, monitor_id: &str) -> String {
        format!(
            "{}/{}",
            self.monitors_url(instance_id),
            urlencoding::encode(monitor_id)
        )
    }

    fn load_balancers_url(&self, instance_id: &str, zone_id: &str) -> String {
        format!(
            "{}/instances/{}/dnszones/{}/load_balancers",
            self.base_url,
            urlencoding::encode(instance_id),
            urlencoding::encode(zone_id)
        )
    }

    fn load_balancer_url(&self, instance_id: &str, zone_id: &str, lb_id: &str) -> String {
        format!(
            "{}/{}",
            self.load_balancers_url(instance_id, zone_id),
            urlencoding::encode(lb_id)
        )
    }
}

#[async_trait]
impl DnsSvcsApi for DnsSvcsClient {
    async fn create_monitor(
        &self,
        instance_id: &str,
        body: &MonitorRequest,
    ) -> Result<Monitor, ApiError> {
        let url = self.monitors_url(instance_id);
        decode(self.http.post(&url, &self.token, &encode(body)?).await?)
    }

    async fn get_monitor(&self, instance_id: &str, monitor_id: &str) -> Result<Monitor, ApiError> {
        let url = self.monitor_url(instance_id, monitor_id);
        decode(self.http.get(&url, &self.token).await?)
    }

    async fn update_monitor(
        &self,
        instance_id: &str,
        monitor_id: &str,
        body: &MonitorRequest,
    ) -> Result<Monitor, ApiError> {
        let url = self.monitor_url(instance_id, monitor_id);
        decode(self.http.patch(&url, &self.token, &encode(body)?).await?)
    }

    async fn delete_monitor(&self, instance_id: &str, monitor_id: &str) -> Result<(), ApiError> {
        let url = self.monitor_url(instance_id, monitor_id);
        self.http.delete(&url, &self.token).await?;
        Ok(())
    }

    async fn list_monitors(
        &self,
        instance_id: &str,
        page: &PageOptions,
    ) -> Result<MonitorList, ApiError> {
        let url = with_query(&self.monitors_url(instance_id), &page.query())?;
        decode(self.http.get(&url, &self.token).await?)
    }

    async fn create_load_balancer(
        &self,
        instance_id: &str,
        zone_id: &str,
        body: &LoadBalancerRequest,
    ) -> Result<LoadBalancer, ApiError> {
        let url = self.load_balancers_url(instance_id, zone_id);
        decode(self.http.post(&url, &self.token, &encode(body)?).await?)
    }

    async fn get_load_balancer(
        &self,
        instance_id: &str,
        zone_id: &str,
        lb_id: &str,
    ) -> Result<LoadBalancer, ApiError> {
        let url = self.load_balancer_url(instance_id, zone_id, lb_id);
        decode(self.http.get(&url, &self.token).await?)
    }

    async fn update_load_balancer(
        &self,
        instance_id: &str,
        zone_id: &str,
        lb_id: &str,
        body: &LoadBalancerRequest,
    ) -> Result<LoadBalancer, ApiError> {
        let url = self.load_balancer_url(instance_id, zone_id, lb_id);
        decode(self.http.patch(&url, &self.token, &encode(body)?).await?)
    }

    async fn delete_load_balancer(
        &self,
        instance_id: &str,
        zone_id: &str,
        lb_id: &str,
    ) -> Result<(), ApiError> {
        let url = self.load_balancer_url(instance_id, zone_id, lb_id);
        self.http.delete(&url, &self.token).await?;
        Ok(())
    }

    async fn list_load_balancers(
        &self,
        instance_id: &str,
        zone_id: &str,
        page: &PageOptions,
    ) -> Result<LoadBalancerList, ApiError> {
        let url = with_query(&self.load_balancers_url(instance_id, zone_id), &page.query())?;
        decode(self.http.get(&url, &self.token).await?)
    }
}

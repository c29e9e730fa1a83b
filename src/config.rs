//! Configuration Management
//!
//! Persistent settings live in `<config_dir>/ibmtf/config.json`.
//! `IBMCLOUD_*` environment variables override the file; CLI flags
//! override both.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix
const ENV_PREFIX: &str = "IBMCLOUD";

const DEFAULT_REGION: &str = "us-south";
const DEFAULT_DNS_ENDPOINT: &str = "https://api.dns-svcs.cloud.ibm.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Keys accepted by `ibmtf config set`
pub const SETTABLE_KEYS: &[&str] = &[
    "region",
    "account_id",
    "dns_endpoint",
    "vpc_endpoint",
    "cr_endpoint",
    "vpc_api_version",
    "timeout_secs",
];

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Bearer token for IBM Cloud APIs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iam_token: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Account owning container registry namespaces
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub dns_endpoint: Option<String>,
    #[serde(default)]
    pub vpc_endpoint: Option<String>,
    #[serde(default)]
    pub cr_endpoint: Option<String>,
    #[serde(default)]
    pub vpc_api_version: Option<String>,
    /// Per-request HTTP timeout
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ibmtf").join("config.json"))
    }

    /// Load configuration from disk, then apply environment overrides
    pub fn load() -> Self {
        let config = match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        };
        config.with_env_overrides(|name| std::env::var(name).ok())
    }

    /// Load configuration from a file; a missing or unreadable file yields defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Overlay `IBMCLOUD_*` variables resolved through `lookup`
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(&format!("{}_{}", ENV_PREFIX, name));

        if let Some(v) = get("IAM_TOKEN") {
            self.iam_token = Some(v);
        }
        if let Some(v) = get("REGION") {
            self.region = Some(v);
        }
        if let Some(v) = get("ACCOUNT_ID") {
            self.account_id = Some(v);
        }
        if let Some(v) = get("DNS_ENDPOINT") {
            self.dns_endpoint = Some(v);
        }
        if let Some(v) = get("VPC_ENDPOINT") {
            self.vpc_endpoint = Some(v);
        }
        if let Some(v) = get("CR_ENDPOINT") {
            self.cr_endpoint = Some(v);
        }
        if let Some(v) = get("VPC_API_VERSION") {
            self.vpc_api_version = Some(v);
        }
        if let Some(v) = get("TIMEOUT").and_then(|v| v.parse().ok()) {
            self.timeout_secs = Some(v);
        }
        self
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    /// Set a persisted key by name
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = Some(value.to_string());
        match key {
            "region" => self.region = value,
            "account_id" => self.account_id = value,
            "dns_endpoint" => self.dns_endpoint = value,
            "vpc_endpoint" => self.vpc_endpoint = value,
            "cr_endpoint" => self.cr_endpoint = value,
            "vpc_api_version" => self.vpc_api_version = value,
            "timeout_secs" => {
                let secs = value
                    .as_deref()
                    .unwrap_or_default()
                    .parse()
                    .context("timeout_secs must be a whole number of seconds")?;
                self.timeout_secs = Some(secs);
            }
            _ => bail!(
                "Unknown config key {:?} (expected one of: {})",
                key,
                SETTABLE_KEYS.join(", ")
            ),
        }
        Ok(())
    }

    pub fn effective_region(&self) -> String {
        self.region
            .clone()
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    pub fn dns_endpoint(&self) -> String {
        self.dns_endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_DNS_ENDPOINT.to_string())
    }

    /// Regional VPC endpoint, e.g. `https://us-south.iaas.cloud.ibm.com/v1`
    pub fn vpc_endpoint(&self) -> String {
        self.vpc_endpoint.clone().unwrap_or_else(|| {
            format!("https://{}.iaas.cloud.ibm.com/v1", self.effective_region())
        })
    }

    /// Registry host for the configured region
    pub fn cr_endpoint(&self) -> String {
        if let Some(endpoint) = &self.cr_endpoint {
            return endpoint.clone();
        }
        let host = match self.effective_region().as_str() {
            "us-south" | "us-east" => "us.icr.io",
            "eu-gb" => "uk.icr.io",
            "eu-de" => "de.icr.io",
            "au-syd" => "au.icr.io",
            "jp-tok" => "jp.icr.io",
            "jp-osa" => "jp2.icr.io",
            "ca-tor" => "ca.icr.io",
            "br-sao" => "br.icr.io",
            _ => "icr.io",
        };
        format!("https://{}", host)
    }

    pub fn vpc_api_version(&self) -> String {
        self.vpc_api_version
            .clone()
            .unwrap_or_else(|| crate::ibm::vpc::DEFAULT_VPC_API_VERSION.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

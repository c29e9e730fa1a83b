//! `ibm_dns_glb_monitor` resource and `ibm_dns_glb_monitors` data source

use super::flatten::{expand_headers, flatten_headers};
use super::id::MonitorId;
use super::{apply_attributes, data_source_id, insert_opt, probe_result, DataSource, Resource};
use crate::error::{ProviderError, Result};
use crate::ibm::dns::{HealthcheckHeader, Monitor, MonitorRequest, PageOptions};
use crate::ibm::ClientSession;
use crate::schema::ResourceData;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Fields only an HTTP or HTTPS monitor may carry
const HTTP_ONLY_FIELDS: &[&str] = &[
    "path",
    "expected_codes",
    "expected_body",
    "allow_insecure",
    "method",
    "headers",
];

/// Changes here go out in the first PATCH
const GENERAL_FIELDS: &[&str] = &[
    "name",
    "description",
    "interval",
    "retries",
    "timeout",
    "expected_body",
];

/// Changes here go out in the second PATCH
const PROTOCOL_FIELDS: &[&str] = &[
    "type",
    "port",
    "path",
    "method",
    "allow_insecure",
    "expected_codes",
    "expected_body",
    "headers",
];

/// Everything a read refreshes
const READ_FIELDS: &[&str] = &[
    "monitor_id",
    "name",
    "description",
    "type",
    "port",
    "interval",
    "retries",
    "timeout",
    "method",
    "path",
    "headers",
    "allow_insecure",
    "expected_codes",
    "expected_body",
    "created_on",
    "modified_on",
];

const PAGE_LIMIT: i64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorType {
    Http,
    Https,
    Tcp,
}

impl MonitorType {
    pub fn as_str(self) -> &'static str {
        match self {
            MonitorType::Http => "HTTP",
            MonitorType::Https => "HTTPS",
            MonitorType::Tcp => "TCP",
        }
    }

    /// Port used when none is configured; TCP has none
    pub fn default_port(self) -> Option<i64> {
        match self {
            MonitorType::Http => Some(80),
            MonitorType::Https => Some(443),
            MonitorType::Tcp => None,
        }
    }
}

impl FromStr for MonitorType {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "HTTP" => Ok(MonitorType::Http),
            "HTTPS" => Ok(MonitorType::Https),
            "TCP" => Ok(MonitorType::Tcp),
            other => Err(ProviderError::validation(format!(
                "unsupported monitor type {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for MonitorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request settings shared by HTTP and HTTPS checks
#[derive(Debug, Clone, PartialEq)]
pub struct HttpCheck {
    pub method: String,
    pub path: String,
    pub expected_codes: String,
    pub expected_body: Option<String>,
    pub headers: Option<Vec<HealthcheckHeader>>,
}

impl HttpCheck {
    fn from_data(d: &ResourceData) -> Self {
        let configured_str = |key: &str, default: &str| {
            d.configured(key)
                .and_then(Value::as_str)
                .unwrap_or(default)
                .to_string()
        };
        Self {
            method: configured_str("method", "GET"),
            path: configured_str("path", "/"),
            expected_codes: configured_str("expected_codes", "200"),
            expected_body: d
                .configured("expected_body")
                .and_then(Value::as_str)
                .map(str::to_string),
            headers: d.configured("headers").map(|h| expand_headers(Some(h))),
        }
    }

    fn apply_to(&self, req: &mut MonitorRequest) {
        req.method = Some(self.method.clone());
        req.path = Some(self.path.clone());
        req.expected_codes = Some(self.expected_codes.clone());
        req.expected_body = self.expected_body.clone();
        req.headers = self.headers.clone();
    }
}

/// Protocol-specific settings; a TCP monitor cannot carry HTTP fields
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorProtocol {
    Http(HttpCheck),
    Https { check: HttpCheck, allow_insecure: bool },
    Tcp,
}

/// Whether the user set an HTTP-only field. `allow_insecure: false` is the
/// default and is accepted for every type.
fn sets_http_field(d: &ResourceData, key: &str) -> bool {
    match d.configured(key) {
        None => false,
        Some(value) if key == "allow_insecure" => value.as_bool() != Some(false),
        Some(_) => true,
    }
}

/// Validated protocol settings of a monitor
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSpec {
    pub port: i64,
    pub protocol: MonitorProtocol,
}

impl MonitorSpec {
    /// Build from the user's configuration.
    ///
    /// Only explicitly supplied values count; defaults and retained state
    /// never make a field illegal.
    pub fn from_data(d: &ResourceData) -> Result<Self> {
        let monitor_type: MonitorType = d.get_str("type").unwrap_or("HTTP").parse()?;
        let port = d.configured("port").and_then(Value::as_i64);

        let protocol = match monitor_type {
            MonitorType::Tcp => {
                let illegal: Vec<&str> = HTTP_ONLY_FIELDS
                    .iter()
                    .copied()
                    .filter(|key| sets_http_field(d, key))
                    .collect();
                if !illegal.is_empty() {
                    return Err(ProviderError::validation(format!(
                        "monitor {} not supported in type TCP",
                        illegal.join("/")
                    )));
                }
                MonitorProtocol::Tcp
            }
            MonitorType::Http => {
                if sets_http_field(d, "allow_insecure") {
                    return Err(ProviderError::validation(
                        "monitor allow_insecure is not supported in type HTTP",
                    ));
                }
                MonitorProtocol::Http(HttpCheck::from_data(d))
            }
            MonitorType::Https => MonitorProtocol::Https {
                check: HttpCheck::from_data(d),
                allow_insecure: d
                    .configured("allow_insecure")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            },
        };

        let port = port
            .or_else(|| monitor_type.default_port())
            .ok_or_else(|| ProviderError::validation("monitor port must be provided for type TCP"))?;

        Ok(Self { port, protocol })
    }

    pub fn monitor_type(&self) -> MonitorType {
        match self.protocol {
            MonitorProtocol::Http(_) => MonitorType::Http,
            MonitorProtocol::Https { .. } => MonitorType::Https,
            MonitorProtocol::Tcp => MonitorType::Tcp,
        }
    }

    fn apply_to(&self, req: &mut MonitorRequest) {
        req.monitor_type = Some(self.monitor_type().as_str().to_string());
        req.port = Some(self.port);
        match &self.protocol {
            MonitorProtocol::Http(check) => check.apply_to(req),
            MonitorProtocol::Https {
                check,
                allow_insecure,
            } => {
                check.apply_to(req);
                req.allow_insecure = Some(*allow_insecure);
            }
            MonitorProtocol::Tcp => {}
        }
    }
}

/// Schema attributes of a monitor; HTTP fields only for HTTP(S) monitors
fn monitor_attributes(monitor: &Monitor) -> Map<String, Value> {
    let mut attrs = Map::new();
    attrs.insert("monitor_id".to_string(), Value::from(monitor.id.as_str()));
    insert_opt(&mut attrs, "name", monitor.name.clone());
    insert_opt(&mut attrs, "description", monitor.description.clone());
    insert_opt(&mut attrs, "type", monitor.monitor_type.clone());
    insert_opt(&mut attrs, "port", monitor.port);
    insert_opt(&mut attrs, "interval", monitor.interval);
    insert_opt(&mut attrs, "retries", monitor.retries);
    insert_opt(&mut attrs, "timeout", monitor.timeout);
    insert_opt(&mut attrs, "created_on", monitor.created_on.clone());
    insert_opt(&mut attrs, "modified_on", monitor.modified_on.clone());

    let monitor_type = monitor
        .monitor_type
        .as_deref()
        .and_then(|t| t.parse::<MonitorType>().ok());
    if matches!(monitor_type, Some(MonitorType::Http | MonitorType::Https)) {
        insert_opt(&mut attrs, "method", monitor.method.clone());
        insert_opt(&mut attrs, "path", monitor.path.clone());
        insert_opt(&mut attrs, "expected_codes", monitor.expected_codes.clone());
        insert_opt(&mut attrs, "expected_body", monitor.expected_body.clone());
        attrs.insert(
            "headers".to_string(),
            flatten_headers(monitor.headers.as_deref().unwrap_or_default()),
        );
    }
    if monitor_type == Some(MonitorType::Https) {
        insert_opt(&mut attrs, "allow_insecure", monitor.allow_insecure);
    }
    attrs
}

pub struct DnsGlbMonitor;

#[async_trait]
impl Resource for DnsGlbMonitor {
    fn type_name(&self) -> &'static str {
        "ibm_dns_glb_monitor"
    }

    async fn create(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()> {
        let spec = MonitorSpec::from_data(d)?;
        let dns = session.private_dns()?;
        let instance_id = d.get_str("instance_id").unwrap_or_default().to_string();

        let mut req = MonitorRequest {
            name: d.get_str("name").map(str::to_string),
            description: d.get_str("description").map(str::to_string),
            interval: d.get_i64("interval"),
            retries: d.get_i64("retries"),
            timeout: d.get_i64("timeout"),
            ..Default::default()
        };
        spec.apply_to(&mut req);

        let monitor = dns
            .create_monitor(&instance_id, &req)
            .await
            .map_err(|e| ProviderError::api("creating pdns GLB monitor", e))?;

        let id = MonitorId::new(&instance_id, &monitor.id)?;
        tracing::debug!("Created GLB monitor {}", id);
        d.set_id(id.to_string());
        d.set("monitor_id", monitor.id.as_str());

        self.read(session, d).await
    }

    async fn read(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()> {
        let id: MonitorId = d.id().parse()?;
        let dns = session.private_dns()?;
        let monitor = dns
            .get_monitor(&id.instance_id, &id.monitor_id)
            .await
            .map_err(|e| ProviderError::api("fetching pdns GLB monitor", e))?;

        d.set("instance_id", id.instance_id.as_str());
        apply_attributes(d, READ_FIELDS, monitor_attributes(&monitor));
        Ok(())
    }

    async fn update(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()> {
        let id: MonitorId = d.id().parse()?;
        let spec = MonitorSpec::from_data(d)?;
        let dns = session.private_dns()?;

        if d.has_any_change(GENERAL_FIELDS) {
            let req = MonitorRequest {
                name: d.get_str("name").map(str::to_string),
                description: Some(d.get_str("description").unwrap_or_default().to_string()),
                interval: d.get_i64("interval"),
                retries: d.get_i64("retries"),
                timeout: d.get_i64("timeout"),
                ..Default::default()
            };
            dns.update_monitor(&id.instance_id, &id.monitor_id, &req)
                .await
                .map_err(|e| ProviderError::api("updating pdns GLB monitor", e))?;
        }

        if d.has_any_change(PROTOCOL_FIELDS) {
            let mut req = MonitorRequest::default();
            spec.apply_to(&mut req);
            dns.update_monitor(&id.instance_id, &id.monitor_id, &req)
                .await
                .map_err(|e| ProviderError::api("updating pdns GLB monitor", e))?;
        }

        self.read(session, d).await
    }

    async fn delete(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()> {
        let id: MonitorId = d.id().parse()?;
        let dns = session.private_dns()?;
        dns.delete_monitor(&id.instance_id, &id.monitor_id)
            .await
            .map_err(|e| ProviderError::api("deleting pdns GLB monitor", e))?;
        d.clear_id();
        Ok(())
    }

    async fn exists(&self, session: &dyn ClientSession, d: &ResourceData) -> Result<bool> {
        let id: MonitorId = d.id().parse()?;
        let dns = session.private_dns()?;
        probe_result(
            dns.get_monitor(&id.instance_id, &id.monitor_id).await,
            "fetching pdns GLB monitor",
        )
    }
}

pub struct DnsGlbMonitors;

#[async_trait]
impl DataSource for DnsGlbMonitors {
    fn type_name(&self) -> &'static str {
        "ibm_dns_glb_monitors"
    }

    async fn read(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()> {
        let dns = session.private_dns()?;
        let instance_id = d.get_str("instance_id").unwrap_or_default().to_string();

        let mut monitors = Vec::new();
        let mut offset = 0;
        loop {
            let page = PageOptions {
                offset: Some(offset),
                limit: Some(PAGE_LIMIT),
            };
            let list = dns
                .list_monitors(&instance_id, &page)
                .await
                .map_err(|e| ProviderError::api("reading list of pdns GLB monitors", e))?;

            let fetched = list.monitors.len() as i64;
            monitors.extend(list.monitors.iter().map(|m| Value::Object(monitor_attributes(m))));
            offset += fetched;

            let exhausted = match list.total_count {
                Some(total) => offset >= total,
                None => fetched < PAGE_LIMIT,
            };
            if fetched == 0 || exhausted {
                break;
            }
        }

        tracing::debug!("Listed {} GLB monitors in {}", monitors.len(), instance_id);
        d.set_id(data_source_id());
        d.set("dns_glb_monitors", Value::Array(monitors));
        Ok(())
    }
}

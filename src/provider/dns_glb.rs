//! `ibm_dns_glb` resource and `ibm_dns_glbs` data source

use super::flatten::{expand_az_pools, flatten_az_pools, flatten_string_list};
use super::id::GlbId;
use super::{apply_attributes, data_source_id, insert_opt, probe_result, DataSource, Resource};
use crate::error::{ProviderError, Result};
use crate::ibm::dns::{LoadBalancer, LoadBalancerRequest, PageOptions};
use crate::ibm::ClientSession;
use crate::schema::ResourceData;
use async_trait::async_trait;
use serde_json::{Map, Value};

const UPDATABLE_FIELDS: &[&str] = &[
    "name",
    "description",
    "enabled",
    "ttl",
    "fallback_pool",
    "default_pools",
    "az_pools",
];

const READ_FIELDS: &[&str] = &[
    "glb_id",
    "name",
    "description",
    "enabled",
    "ttl",
    "health",
    "fallback_pool",
    "default_pools",
    "az_pools",
    "created_on",
    "modified_on",
];

const PAGE_LIMIT: i64 = 200;

fn load_balancer_attributes(lb: &LoadBalancer) -> Map<String, Value> {
    let mut attrs = Map::new();
    attrs.insert("glb_id".to_string(), Value::from(lb.id.as_str()));
    insert_opt(&mut attrs, "name", lb.name.clone());
    insert_opt(&mut attrs, "description", lb.description.clone());
    insert_opt(&mut attrs, "enabled", lb.enabled);
    insert_opt(&mut attrs, "ttl", lb.ttl);
    insert_opt(&mut attrs, "health", lb.health.clone());
    insert_opt(&mut attrs, "fallback_pool", lb.fallback_pool.clone());
    attrs.insert(
        "default_pools".to_string(),
        flatten_string_list(&lb.default_pools),
    );
    attrs.insert("az_pools".to_string(), flatten_az_pools(&lb.az_pools));
    insert_opt(&mut attrs, "created_on", lb.created_on.clone());
    insert_opt(&mut attrs, "modified_on", lb.modified_on.clone());
    attrs
}

/// Every field the user supplied; `enabled` counts even when false
fn load_balancer_request(d: &ResourceData) -> LoadBalancerRequest {
    LoadBalancerRequest {
        name: d.get_str("name").map(str::to_string),
        description: d.get_str("description").map(str::to_string),
        enabled: d.get_bool("enabled"),
        ttl: d.get_i64("ttl"),
        fallback_pool: d.get_str("fallback_pool").map(str::to_string),
        default_pools: d.get("default_pools").map(|_| d.get_string_list("default_pools")),
        az_pools: d.get("az_pools").map(|v| expand_az_pools(Some(v))),
    }
}

pub struct DnsGlb;

#[async_trait]
impl Resource for DnsGlb {
    fn type_name(&self) -> &'static str {
        "ibm_dns_glb"
    }

    async fn create(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()> {
        let dns = session.private_dns()?;
        let instance_id = d.get_str("instance_id").unwrap_or_default().to_string();
        let zone_id = d.get_str("zone_id").unwrap_or_default().to_string();

        let mut req = load_balancer_request(d);
        req.default_pools = Some(d.get_string_list("default_pools"));

        let lb = dns
            .create_load_balancer(&instance_id, &zone_id, &req)
            .await
            .map_err(|e| ProviderError::api("creating pdns GLB", e))?;

        let id = GlbId::new(&instance_id, &zone_id, &lb.id)?;
        tracing::debug!("Created GLB {}", id);
        d.set_id(id.to_string());

        self.read(session, d).await
    }

    async fn read(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()> {
        let id: GlbId = d.id().parse()?;
        let dns = session.private_dns()?;
        let lb = dns
            .get_load_balancer(&id.instance_id, &id.zone_id, &id.glb_id)
            .await
            .map_err(|e| ProviderError::api("fetching pdns GLB", e))?;

        d.set("instance_id", id.instance_id.as_str());
        d.set("zone_id", id.zone_id.as_str());
        apply_attributes(d, READ_FIELDS, load_balancer_attributes(&lb));
        Ok(())
    }

    async fn update(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()> {
        let id: GlbId = d.id().parse()?;
        let dns = session.private_dns()?;

        if d.has_any_change(UPDATABLE_FIELDS) {
            let req = load_balancer_request(d);
            let lb = dns
                .update_load_balancer(&id.instance_id, &id.zone_id, &id.glb_id, &req)
                .await
                .map_err(|e| ProviderError::api("updating pdns GLB", e))?;
            tracing::debug!("Load balancer update successful: {}", lb.id);
        }

        self.read(session, d).await
    }

    async fn delete(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()> {
        let id: GlbId = d.id().parse()?;
        let dns = session.private_dns()?;
        dns.delete_load_balancer(&id.instance_id, &id.zone_id, &id.glb_id)
            .await
            .map_err(|e| ProviderError::api("deleting pdns GLB", e))?;
        d.clear_id();
        Ok(())
    }

    async fn exists(&self, session: &dyn ClientSession, d: &ResourceData) -> Result<bool> {
        let id: GlbId = d.id().parse()?;
        let dns = session.private_dns()?;
        probe_result(
            dns.get_load_balancer(&id.instance_id, &id.zone_id, &id.glb_id)
                .await,
            "fetching pdns GLB",
        )
    }
}

pub struct DnsGlbs;

#[async_trait]
impl DataSource for DnsGlbs {
    fn type_name(&self) -> &'static str {
        "ibm_dns_glbs"
    }

    async fn read(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()> {
        let dns = session.private_dns()?;
        let instance_id = d.get_str("instance_id").unwrap_or_default().to_string();
        let zone_id = d.get_str("zone_id").unwrap_or_default().to_string();

        let mut glbs = Vec::new();
        let mut offset = 0;
        loop {
            let page = PageOptions {
                offset: Some(offset),
                limit: Some(PAGE_LIMIT),
            };
            let list = dns
                .list_load_balancers(&instance_id, &zone_id, &page)
                .await
                .map_err(|e| ProviderError::api("reading list of pdns GLBs", e))?;

            let fetched = list.load_balancers.len() as i64;
            glbs.extend(
                list.load_balancers
                    .iter()
                    .map(|lb| Value::Object(load_balancer_attributes(lb))),
            );
            offset += fetched;

            let exhausted = match list.total_count {
                Some(total) => offset >= total,
                None => fetched < PAGE_LIMIT,
            };
            if fetched == 0 || exhausted {
                break;
            }
        }

        d.set_id(data_source_id());
        d.set("dns_glbs", Value::Array(glbs));
        Ok(())
    }
}

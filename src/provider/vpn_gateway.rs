//! `ibm_is_vpn_gateway` resource and `ibm_is_vpn_gateways` data source

use super::flatten::flatten_vpn_members;
use super::id::parse_simple_id;
use super::{apply_attributes, data_source_id, insert_opt, probe_result, DataSource, Resource};
use crate::error::{ProviderError, Result};
use crate::ibm::vpc::{
    ListVpnGatewaysOptions, Reference, VpnGateway, VpnGatewayPatch, VpnGatewayPrototype,
};
use crate::ibm::ClientSession;
use crate::schema::ResourceData;
use async_trait::async_trait;
use serde_json::{Map, Value};

const READ_FIELDS: &[&str] = &[
    "name",
    "subnet",
    "mode",
    "resource_group",
    "created_at",
    "crn",
    "status",
    "resource_type",
    "members",
];

fn gateway_attributes(gateway: &VpnGateway) -> Map<String, Value> {
    let mut attrs = Map::new();
    insert_opt(&mut attrs, "name", gateway.name.clone());
    insert_opt(&mut attrs, "created_at", gateway.created_at.clone());
    insert_opt(&mut attrs, "crn", gateway.crn.clone());
    insert_opt(&mut attrs, "mode", gateway.mode.clone());
    insert_opt(&mut attrs, "resource_type", gateway.resource_type.clone());
    insert_opt(&mut attrs, "status", gateway.status.clone());
    insert_opt(
        &mut attrs,
        "resource_group",
        gateway.resource_group.as_ref().map(|r| r.id.clone()),
    );
    insert_opt(
        &mut attrs,
        "subnet",
        gateway.subnet.as_ref().map(|s| s.id.clone()),
    );
    attrs.insert("members".to_string(), flatten_vpn_members(&gateway.members));
    attrs
}

pub struct VpnGatewayResource;

#[async_trait]
impl Resource for VpnGatewayResource {
    fn type_name(&self) -> &'static str {
        "ibm_is_vpn_gateway"
    }

    async fn create(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()> {
        let vpc = session.vpc()?;
        let prototype = VpnGatewayPrototype {
            name: d.get_str("name").map(str::to_string),
            subnet: Reference::new(d.get_str("subnet").unwrap_or_default()),
            mode: d.get_str("mode").map(str::to_string),
            resource_group: d
                .configured("resource_group")
                .and_then(Value::as_str)
                .map(Reference::new),
        };

        let gateway = vpc
            .create_vpn_gateway(&prototype)
            .await
            .map_err(|e| ProviderError::api("creating VPN gateway", e))?;
        parse_simple_id(&gateway.id)?;

        tracing::debug!("Created VPN gateway {}", gateway.id);
        d.set_id(gateway.id.as_str());
        self.read(session, d).await
    }

    async fn read(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()> {
        let id = parse_simple_id(d.id())?.to_string();
        let vpc = session.vpc()?;
        let gateway = vpc
            .get_vpn_gateway(&id)
            .await
            .map_err(|e| ProviderError::api("getting VPN gateway", e))?;

        apply_attributes(d, READ_FIELDS, gateway_attributes(&gateway));
        Ok(())
    }

    async fn update(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()> {
        let id = parse_simple_id(d.id())?.to_string();
        let vpc = session.vpc()?;

        if d.has_change("name") {
            let patch = VpnGatewayPatch {
                name: d.get_str("name").map(str::to_string),
            };
            vpc.update_vpn_gateway(&id, &patch)
                .await
                .map_err(|e| ProviderError::api("updating VPN gateway", e))?;
        }

        self.read(session, d).await
    }

    async fn delete(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()> {
        let id = parse_simple_id(d.id())?.to_string();
        let vpc = session.vpc()?;
        vpc.delete_vpn_gateway(&id)
            .await
            .map_err(|e| ProviderError::api("deleting VPN gateway", e))?;
        d.clear_id();
        Ok(())
    }

    async fn exists(&self, session: &dyn ClientSession, d: &ResourceData) -> Result<bool> {
        let id = parse_simple_id(d.id())?;
        let vpc = session.vpc()?;
        probe_result(vpc.get_vpn_gateway(id).await, "getting VPN gateway")
    }
}

pub struct VpnGateways;

#[async_trait]
impl DataSource for VpnGateways {
    fn type_name(&self) -> &'static str {
        "ibm_is_vpn_gateways"
    }

    /// A supplied `start` or `limit` selects exactly one page; otherwise
    /// every page is followed
    async fn read(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()> {
        let vpc = session.vpc()?;
        let mut options = ListVpnGatewaysOptions {
            start: d.get_str("start").map(str::to_string),
            limit: d.get_i64("limit"),
            resource_group_id: d.get_str("resource_group_id").map(str::to_string),
            mode: d.get_str("mode").map(str::to_string),
        };
        let single_page = options.start.is_some() || options.limit.is_some();

        let mut gateways = Vec::new();
        loop {
            let page = vpc
                .list_vpn_gateways(&options)
                .await
                .map_err(|e| ProviderError::api("reading list of VPN gateways", e))?;

            gateways.extend(page.vpn_gateways.iter().map(|gateway| {
                let mut attrs = gateway_attributes(gateway);
                attrs.insert("id".to_string(), Value::from(gateway.id.as_str()));
                Value::Object(attrs)
            }));

            match page.next_start() {
                Some(start) if !single_page => options.start = Some(start),
                _ => break,
            }
        }

        tracing::debug!("Listed {} VPN gateways", gateways.len());
        d.set_id(data_source_id());
        d.set("vpn_gateways", Value::Array(gateways));
        Ok(())
    }
}

//! Handler dispatch
//!
//! Looks handlers up by type name, builds the [`ResourceData`] each
//! operation works on, and runs it under the schema's timeout.

use super::cr_namespace::{CrNamespace, CrNamespaces};
use super::dns_glb::{DnsGlb, DnsGlbs};
use super::dns_glb_monitor::{DnsGlbMonitor, DnsGlbMonitors};
use super::vpn_gateway::{VpnGatewayResource, VpnGateways};
use super::{DataSource, Resource};
use crate::error::{ProviderError, Result};
use crate::ibm::ClientSession;
use crate::schema::{get_schema, Operation, ResourceData, ResourceDef, SchemaKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::time::Duration;

/// Budget for operations whose schema names none
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20 * 60);

static RESOURCES: &[&dyn Resource] = &[
    &DnsGlbMonitor,
    &DnsGlb,
    &VpnGatewayResource,
    &CrNamespace,
];

static DATA_SOURCES: &[&dyn DataSource] = &[
    &DnsGlbMonitors,
    &DnsGlbs,
    &VpnGateways,
    &CrNamespaces,
];

/// Persisted state of one resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub id: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl ResourceState {
    fn from_data(d: ResourceData) -> Self {
        Self {
            id: d.id().to_string(),
            attributes: d.into_state(),
        }
    }
}

pub fn get_resource_handler(type_name: &str) -> Option<&'static dyn Resource> {
    RESOURCES
        .iter()
        .copied()
        .find(|handler| handler.type_name() == type_name)
}

pub fn get_data_source_handler(type_name: &str) -> Option<&'static dyn DataSource> {
    DATA_SOURCES
        .iter()
        .copied()
        .find(|handler| handler.type_name() == type_name)
}

fn definition(type_name: &str, kind: SchemaKind) -> Result<&'static ResourceDef> {
    get_schema(type_name)
        .filter(|def| def.kind == kind)
        .ok_or_else(|| ProviderError::UnknownType(type_name.to_string()))
}

fn resource(type_name: &str) -> Result<(&'static ResourceDef, &'static dyn Resource)> {
    let def = definition(type_name, SchemaKind::Resource)?;
    let handler = get_resource_handler(type_name)
        .ok_or_else(|| ProviderError::UnknownType(type_name.to_string()))?;
    Ok((def, handler))
}

/// Run `fut` within `limit`
pub(crate) async fn with_timeout<T, F>(operation: String, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("{} timed out after {:?}", operation, limit);
            Err(ProviderError::Timeout {
                operation,
                secs: limit.as_secs(),
            })
        }
    }
}

async fn run<T, F>(def: &ResourceDef, operation: Operation, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let limit = def
        .timeouts
        .for_operation(operation)
        .unwrap_or(DEFAULT_TIMEOUT);
    let label = format!("{} {}", operation.as_str(), def.type_name);
    with_timeout(label, limit, fut).await
}

/// Create the resource when there is no prior state, update it otherwise.
///
/// An update may not change a force-new field.
pub async fn apply(
    session: &dyn ClientSession,
    type_name: &str,
    prior: Option<&ResourceState>,
    config: Map<String, Value>,
) -> Result<ResourceState> {
    let (def, handler) = resource(type_name)?;

    let d = match prior {
        None => {
            tracing::info!("apply: creating {}", type_name);
            let mut d = ResourceData::new(def, config)?;
            run(def, Operation::Create, handler.create(session, &mut d)).await?;
            d
        }
        Some(state) => {
            tracing::info!("apply: updating {} {}", type_name, state.id);
            let mut d =
                ResourceData::for_update(def, &state.id, state.attributes.clone(), config)?;
            let replaced: Vec<&str> = def
                .force_new_fields()
                .filter(|field| d.has_change(field))
                .collect();
            if !replaced.is_empty() {
                return Err(ProviderError::validation(format!(
                    "{} cannot be changed in place on {} {}; destroy and recreate it",
                    replaced.join(", "),
                    type_name,
                    state.id
                )));
            }
            run(def, Operation::Update, handler.update(session, &mut d)).await?;
            d
        }
    };

    Ok(ResourceState::from_data(d))
}

/// Refresh stored state; `None` when the entity no longer exists
pub async fn refresh(
    session: &dyn ClientSession,
    type_name: &str,
    state: &ResourceState,
) -> Result<Option<ResourceState>> {
    let (def, handler) = resource(type_name)?;
    tracing::info!("refresh: {} {}", type_name, state.id);

    let mut d = ResourceData::from_state(def, &state.id, state.attributes.clone());
    let present = run(def, Operation::Read, async {
        if !handler.exists(session, &d).await? {
            return Ok(false);
        }
        handler.read(session, &mut d).await?;
        Ok::<_, ProviderError>(true)
    })
    .await?;

    if !present {
        tracing::info!("refresh: {} {} no longer exists", type_name, state.id);
        return Ok(None);
    }
    Ok(Some(ResourceState::from_data(d)))
}

pub async fn destroy(
    session: &dyn ClientSession,
    type_name: &str,
    state: &ResourceState,
) -> Result<()> {
    let (def, handler) = resource(type_name)?;
    tracing::info!("destroy: {} {}", type_name, state.id);

    let mut d = ResourceData::from_state(def, &state.id, state.attributes.clone());
    run(def, Operation::Delete, handler.delete(session, &mut d)).await
}

pub async fn exists(
    session: &dyn ClientSession,
    type_name: &str,
    state: &ResourceState,
) -> Result<bool> {
    let (def, handler) = resource(type_name)?;
    let d = ResourceData::from_state(def, &state.id, state.attributes.clone());
    run(def, Operation::Read, handler.exists(session, &d)).await
}

/// Read a data source
pub async fn query(
    session: &dyn ClientSession,
    type_name: &str,
    config: Map<String, Value>,
) -> Result<ResourceState> {
    let def = definition(type_name, SchemaKind::DataSource)?;
    let handler = get_data_source_handler(type_name)
        .ok_or_else(|| ProviderError::UnknownType(type_name.to_string()))?;
    tracing::info!("query: {}", type_name);

    let mut d = ResourceData::new(def, config)?;
    run(def, Operation::Read, handler.read(session, &mut d)).await?;
    Ok(ResourceState::from_data(d))
}

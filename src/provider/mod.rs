//! Resource lifecycle adapters
//!
//! Each managed entity type implements [`Resource`]: create, read, update,
//! delete, and an existence probe, all over a [`ClientSession`]. Read-only
//! collection queries implement [`DataSource`].
//!
//! # Architecture
//!
//! - [`id`] - Composite identifiers with exact-arity parsing
//! - [`flatten`] - Expand/flatten helpers for nested fields
//! - [`dispatch`] - Looks handlers up by type name and runs them under the
//!   schema's per-operation timeouts
//!
//! Handlers:
//!
//! | type name                | kind        | file                  |
//! |--------------------------|-------------|-----------------------|
//! | `ibm_dns_glb_monitor`    | resource    | `dns_glb_monitor.rs`  |
//! | `ibm_dns_glb`            | resource    | `dns_glb.rs`          |
//! | `ibm_is_vpn_gateway`     | resource    | `vpn_gateway.rs`      |
//! | `ibm_cr_namespace`       | resource    | `cr_namespace.rs`     |
//! | `ibm_dns_glb_monitors`   | data source | `dns_glb_monitor.rs`  |
//! | `ibm_dns_glbs`           | data source | `dns_glb.rs`          |
//! | `ibm_is_vpn_gateways`    | data source | `vpn_gateway.rs`      |
//! | `ibm_cr_namespaces`      | data source | `cr_namespace.rs`     |

pub mod cr_namespace;
pub mod dispatch;
pub mod dns_glb;
pub mod dns_glb_monitor;
pub mod flatten;
pub mod id;
pub mod vpn_gateway;

#[cfg(test)]
pub(crate) mod testing;

use crate::error::{ApiError, ProviderError, Result};
use crate::ibm::ClientSession;
use crate::schema::ResourceData;
use async_trait::async_trait;
use serde_json::{Map, Value};

pub use dispatch::{
    apply, destroy, exists, get_data_source_handler, get_resource_handler, query, refresh,
    ResourceState,
};

/// Lifecycle of a remotely managed entity
#[async_trait]
pub trait Resource: Send + Sync {
    fn type_name(&self) -> &'static str;

    /// Create the entity, store its id, then refresh every computed field
    async fn create(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()>;

    async fn read(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()>;

    /// Send changed fields, then refresh
    async fn update(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()>;

    /// Delete the entity and clear the id
    async fn delete(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()>;

    async fn exists(&self, session: &dyn ClientSession, d: &ResourceData) -> Result<bool>;
}

/// Read-only query against remote state
#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &'static str;

    async fn read(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()>;
}

/// Interpret the result of an existence probe.
///
/// A 404 means the entity is gone; any other failure, including one with
/// no response at all, is an error.
pub(crate) fn probe_result<T>(result: Result<T, ApiError>, context: &str) -> Result<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => {
            tracing::debug!("{}: not found", context);
            Ok(false)
        }
        Err(e) => Err(ProviderError::api(context, e)),
    }
}

/// Write remote attributes into `d`; any of `keys` absent from `attributes` is cleared
pub(crate) fn apply_attributes(d: &mut ResourceData, keys: &[&str], attributes: Map<String, Value>) {
    for key in keys {
        match attributes.get(*key) {
            Some(value) => d.set(key, value.clone()),
            None => d.remove(key),
        }
    }
}

/// Id for a data source read: the UTC time it ran
pub(crate) fn data_source_id() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Insert `value` under `key` unless it is `None`
pub(crate) fn insert_opt<T: Into<Value>>(map: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        map.insert(key.to_string(), value.into());
    }
}

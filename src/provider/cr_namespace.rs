//! `ibm_cr_namespace` resource and `ibm_cr_namespaces` data source

use super::id::parse_simple_id;
use super::{apply_attributes, data_source_id, insert_opt, probe_result, DataSource, Resource};
use crate::error::{ProviderError, Result};
use crate::ibm::cr::NamespaceDetails;
use crate::ibm::ClientSession;
use crate::schema::ResourceData;
use async_trait::async_trait;
use serde_json::{Map, Value};

const READ_FIELDS: &[&str] = &[
    "name",
    "resource_group_id",
    "crn",
    "account",
    "created_on",
    "updated_on",
];

fn namespace_attributes(ns: &NamespaceDetails) -> Map<String, Value> {
    let mut attrs = Map::new();
    attrs.insert("name".to_string(), Value::from(ns.name.as_str()));
    insert_opt(&mut attrs, "resource_group_id", ns.resource_group.clone());
    insert_opt(&mut attrs, "crn", ns.crn.clone());
    insert_opt(&mut attrs, "account", ns.account.clone());
    insert_opt(&mut attrs, "created_on", ns.created_date.clone());
    insert_opt(&mut attrs, "updated_on", ns.updated_date.clone());
    attrs
}

pub struct CrNamespace;

#[async_trait]
impl Resource for CrNamespace {
    fn type_name(&self) -> &'static str {
        "ibm_cr_namespace"
    }

    async fn create(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()> {
        let name = d.get_str("name").unwrap_or_default().to_string();
        parse_simple_id(&name)?;
        let cr = session.container_registry()?;

        cr.create_namespace(&name, d.get_str("resource_group_id"))
            .await
            .map_err(|e| ProviderError::api("creating container registry namespace", e))?;

        d.set_id(name);
        self.read(session, d).await
    }

    async fn read(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()> {
        let name = parse_simple_id(d.id())?.to_string();
        let cr = session.container_registry()?;
        let ns = cr
            .get_namespace(&name)
            .await
            .map_err(|e| ProviderError::api("reading container registry namespace", e))?;

        apply_attributes(d, READ_FIELDS, namespace_attributes(&ns));
        Ok(())
    }

    /// Every configurable field forces replacement
    async fn update(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()> {
        self.read(session, d).await
    }

    async fn delete(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()> {
        let name = parse_simple_id(d.id())?.to_string();
        let cr = session.container_registry()?;
        cr.delete_namespace(&name)
            .await
            .map_err(|e| ProviderError::api("deleting container registry namespace", e))?;
        d.clear_id();
        Ok(())
    }

    async fn exists(&self, session: &dyn ClientSession, d: &ResourceData) -> Result<bool> {
        let name = parse_simple_id(d.id())?;
        let cr = session.container_registry()?;
        probe_result(
            cr.get_namespace(name).await,
            "reading container registry namespace",
        )
    }
}

pub struct CrNamespaces;

#[async_trait]
impl DataSource for CrNamespaces {
    fn type_name(&self) -> &'static str {
        "ibm_cr_namespaces"
    }

    async fn read(&self, session: &dyn ClientSession, d: &mut ResourceData) -> Result<()> {
        let cr = session.container_registry()?;
        let namespaces = cr
            .list_namespace_details()
            .await
            .map_err(|e| ProviderError::api("listing container registry namespaces", e))?;

        let items: Vec<Value> = namespaces
            .iter()
            .map(|ns| {
                let mut attrs = namespace_attributes(ns);
                attrs.insert("id".to_string(), Value::from(ns.name.as_str()));
                Value::Object(attrs)
            })
            .collect();

        d.set_id(data_source_id());
        d.set("namespaces", Value::Array(items));
        Ok(())
    }
}

//! Schema Registry - Load resource and data source schemas from JSON
//!
//! Every resource and data source declares its fields in an embedded JSON
//! file. This module loads them once and provides lookup functions for the
//! rest of the crate.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;
use std::time::Duration;

/// Embedded schema JSON files (compiled into the binary)
const SCHEMA_FILES: &[&str] = &[
    include_str!("../resources/dns.json"),
    include_str!("../resources/vpc.json"),
    include_str!("../resources/cr.json"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int,
    Bool,
    List,
    Set,
}

/// Field definition from JSON
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldDef {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub computed: bool,
    /// Changing this field requires replacing the entity
    #[serde(default)]
    pub force_new: bool,
    #[serde(default)]
    pub default: Option<Value>,
    /// String enum constraint
    #[serde(default)]
    pub allowed_values: Vec<String>,
    #[serde(default)]
    pub description: String,
    /// Element type of a list or set of primitives
    #[serde(default)]
    pub elem_type: Option<FieldType>,
    /// Element fields of a list or set of objects
    #[serde(default)]
    pub fields: BTreeMap<String, FieldDef>,
}

impl FieldDef {
    /// Set only by the server, never by configuration
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    Resource,
    DataSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

/// Per-operation wall-clock budgets in seconds
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Timeouts {
    #[serde(default)]
    pub create: Option<u64>,
    #[serde(default)]
    pub read: Option<u64>,
    #[serde(default)]
    pub update: Option<u64>,
    #[serde(default)]
    pub delete: Option<u64>,
}

impl Timeouts {
    pub fn for_operation(&self, operation: Operation) -> Option<Duration> {
        let secs = match operation {
            Operation::Create => self.create,
            Operation::Read => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        };
        secs.map(Duration::from_secs)
    }
}

/// Resource or data source definition from JSON
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResourceDef {
    /// Filled in from the map key when the registry loads
    #[serde(skip)]
    pub type_name: String,
    pub kind: SchemaKind,
    pub description: String,
    pub service: String,
    #[serde(default)]
    pub timeouts: Timeouts,
    pub fields: BTreeMap<String, FieldDef>,
}

impl ResourceDef {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    pub fn force_new_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, f)| f.force_new)
            .map(|(name, _)| name.as_str())
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub schemas: HashMap<String, ResourceDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<SchemaConfig> = OnceLock::new();

/// Get the schema registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static SchemaConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = SchemaConfig {
            schemas: HashMap::new(),
        };

        for content in SCHEMA_FILES {
            let partial: SchemaConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded schema JSON: {}", e));
            for (name, mut def) in partial.schemas {
                def.type_name = name.clone();
                final_config.schemas.insert(name, def);
            }
        }

        final_config
    })
}

/// Get a schema by type name
pub fn get_schema(type_name: &str) -> Option<&'static ResourceDef> {
    get_registry().schemas.get(type_name)
}

/// Get all type names of a given kind, sorted
pub fn get_type_names(kind: SchemaKind) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = get_registry()
        .schemas
        .iter()
        .filter(|(_, def)| def.kind == kind)
        .map(|(name, _)| name.as_str())
        .collect();
    names.sort_unstable();
    names
}

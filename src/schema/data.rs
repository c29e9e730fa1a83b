//! Field values for one resource or data source invocation

use super::registry::{FieldType, ResourceDef};
use super::validate::validate_config;
use crate::error::Result;
use serde_json::{Map, Value};

/// Values a handler reads from and writes back to.
///
/// `values` is the desired view (config, defaults, and retained computed
/// values), `config` holds only what the user wrote, and `prior` is the
/// last refreshed state used for change detection.
#[derive(Debug, Clone)]
pub struct ResourceData {
    def: &'static ResourceDef,
    id: String,
    values: Map<String, Value>,
    config: Map<String, Value>,
    prior: Map<String, Value>,
}

impl ResourceData {
    /// Data for a create or a data source read
    pub fn new(def: &'static ResourceDef, config: Map<String, Value>) -> Result<Self> {
        validate_config(def, &config)?;
        let config = strip_nulls(config);
        let mut values = config.clone();
        apply_defaults(def, &mut values);

        Ok(Self {
            def,
            id: String::new(),
            values,
            config,
            prior: Map::new(),
        })
    }

    /// Data for read, delete, and exists, rebuilt from stored state
    pub fn from_state(def: &'static ResourceDef, id: &str, state: Map<String, Value>) -> Self {
        let state = strip_nulls(state);
        Self {
            def,
            id: id.to_string(),
            values: state.clone(),
            config: Map::new(),
            prior: state,
        }
    }

    /// Data for an update: new configuration on top of stored state.
    ///
    /// Computed fields the configuration leaves out keep their stored value.
    pub fn for_update(
        def: &'static ResourceDef,
        id: &str,
        prior: Map<String, Value>,
        config: Map<String, Value>,
    ) -> Result<Self> {
        validate_config(def, &config)?;
        let config = strip_nulls(config);
        let prior = strip_nulls(prior);
        let mut values = config.clone();
        apply_defaults(def, &mut values);

        for (name, field) in &def.fields {
            if field.computed && !values.contains_key(name) {
                if let Some(value) = prior.get(name) {
                    values.insert(name.clone(), value.clone());
                }
            }
        }

        Ok(Self {
            def,
            id: id.to_string(),
            values,
            config,
            prior,
        })
    }

    pub fn def(&self) -> &'static ResourceDef {
        self.def
    }

    pub fn type_name(&self) -> &str {
        &self.def.type_name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Strings of a primitive list field, in order
    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Value the user explicitly supplied; defaults and retained state don't count
    pub fn configured(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }

    pub fn is_configured(&self, key: &str) -> bool {
        self.config.contains_key(key)
    }

    /// Whether the desired value differs from the stored one.
    /// Sets compare without regard to element order.
    pub fn has_change(&self, key: &str) -> bool {
        let desired = self.values.get(key);
        let stored = self.prior.get(key);
        let is_set = self
            .def
            .field(key)
            .map(|f| f.field_type == FieldType::Set)
            .unwrap_or(false);

        if is_set {
            set_members(desired) != set_members(stored)
        } else {
            desired != stored
        }
    }

    pub fn has_any_change(&self, keys: &[&str]) -> bool {
        keys.iter().any(|key| self.has_change(key))
    }

    /// Write a field; null removes it
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        if value.is_null() {
            self.values.remove(key);
        } else {
            self.values.insert(key.to_string(), value);
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }

    pub fn state(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn into_state(self) -> Map<String, Value> {
        self.values
    }
}

fn strip_nulls(mut map: Map<String, Value>) -> Map<String, Value> {
    map.retain(|_, v| !v.is_null());
    map
}

fn apply_defaults(def: &ResourceDef, values: &mut Map<String, Value>) {
    for (name, field) in &def.fields {
        if let Some(default) = &field.default {
            values
                .entry(name.clone())
                .or_insert_with(|| default.clone());
        }
    }
}

fn set_members(value: Option<&Value>) -> Vec<String> {
    let mut members: Vec<String> = value
        .and_then(Value::as_array)
        .map(|items| items.iter().map(Value::to_string).collect())
        .unwrap_or_default();
    members.sort();
    members
}

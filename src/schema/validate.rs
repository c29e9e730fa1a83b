//! Configuration validation against a schema

use super::registry::{FieldDef, FieldType, ResourceDef};
use crate::error::{ProviderError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Check user configuration against a schema.
///
/// Every problem is collected so the caller sees them all at once.
pub fn validate_config(def: &ResourceDef, config: &Map<String, Value>) -> Result<()> {
    let mut errors = Vec::new();
    validate_fields(&def.fields, config, "", &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ProviderError::Schema {
            type_name: def.type_name.clone(),
            errors,
        })
    }
}

fn validate_fields(
    fields: &BTreeMap<String, FieldDef>,
    values: &Map<String, Value>,
    prefix: &str,
    errors: &mut Vec<String>,
) {
    for key in values.keys() {
        if !fields.contains_key(key) {
            errors.push(format!("{}{}: unsupported argument", prefix, key));
        }
    }

    for (name, field) in fields {
        let path = format!("{}{}", prefix, name);
        match values.get(name).filter(|v| !v.is_null()) {
            None => {
                if field.required {
                    errors.push(format!("{}: required field is missing", path));
                }
            }
            Some(_) if field.is_computed_only() => {
                errors.push(format!("{}: computed field cannot be set", path));
            }
            Some(value) => validate_value(field, value, &path, errors),
        }
    }
}

fn validate_value(field: &FieldDef, value: &Value, path: &str, errors: &mut Vec<String>) {
    match field.field_type {
        FieldType::List | FieldType::Set => {
            let Some(items) = value.as_array() else {
                errors.push(format!("{}: expected a list", path));
                return;
            };
            for (index, item) in items.iter().enumerate() {
                let item_path = format!("{}.{}", path, index);
                if !field.fields.is_empty() {
                    match item.as_object() {
                        Some(obj) => {
                            validate_fields(&field.fields, obj, &format!("{}.", item_path), errors)
                        }
                        None => errors.push(format!("{}: expected an object", item_path)),
                    }
                } else if let Some(elem_type) = field.elem_type {
                    validate_primitive(elem_type, &[], item, &item_path, errors);
                }
            }
        }
        primitive => validate_primitive(primitive, &field.allowed_values, value, path, errors),
    }
}

fn validate_primitive(
    field_type: FieldType,
    allowed: &[String],
    value: &Value,
    path: &str,
    errors: &mut Vec<String>,
) {
    match field_type {
        FieldType::String => match value.as_str() {
            Some(s) if !allowed.is_empty() && !allowed.iter().any(|a| a == s) => {
                errors.push(format!(
                    "{}: expected one of [{}], got {:?}",
                    path,
                    allowed.join(", "),
                    s
                ));
            }
            Some(_) => {}
            None => errors.push(format!("{}: expected a string", path)),
        },
        FieldType::Int => {
            if value.as_i64().is_none() {
                errors.push(format!("{}: expected an integer", path));
            }
        }
        FieldType::Bool => {
            if !value.is_boolean() {
                errors.push(format!("{}: expected a boolean", path));
            }
        }
        FieldType::List | FieldType::Set => {
            errors.push(format!("{}: nested collections are not supported", path));
        }
    }
}

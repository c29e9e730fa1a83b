//! Declarative schemas
//!
//! - [`registry`] - Loads schema definitions from embedded JSON
//! - [`validate`] - Checks user configuration against a schema
//! - [`data`] - [`ResourceData`], the field values a handler works on

pub mod data;
mod registry;
mod validate;

pub use data::ResourceData;
pub use registry::*;
pub use validate::validate_config;

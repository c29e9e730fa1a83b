//! ibmtf - IBM Cloud resource lifecycle handlers
//!
//! - [`ibm`] - HTTP transport, session, and typed service bindings
//! - [`schema`] - Declarative field schemas and [`schema::ResourceData`]
//! - [`provider`] - Resource and data source handlers plus the dispatcher

pub mod config;
pub mod error;
pub mod ibm;
pub mod provider;
pub mod schema;

/// Version injected at compile time via IBMTF_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("IBMTF_VERSION") {
    Some(v) => v,
    None => "dev",
};

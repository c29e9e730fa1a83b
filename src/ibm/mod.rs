//! IBM Cloud API interaction module
//!
//! Typed bindings for the three IBM Cloud services the handlers manage,
//! plus the HTTP wrapper they share and the session that hands them out.
//!
//! # Module Structure
//!
//! - [`http`] - HTTP utilities for REST API calls
//! - [`session`] - [`ClientSession`] trait and the REST-backed [`IbmSession`]
//! - [`dns`] - Private DNS Services (load balancers, monitors)
//! - [`vpc`] - VPC Infrastructure (VPN gateways)
//! - [`cr`] - Container Registry (namespaces)
//!
//! # Example
//!
//! ```ignore
//! use ibmtf::config::Config;
//! use ibmtf::ibm::{ClientSession, IbmSession};
//!
//! async fn example() -> ibmtf::error::Result<()> {
//!     let session = IbmSession::new(&Config::load())?;
//!     let monitor = session.private_dns()?.get_monitor("instance", "monitor").await;
//!     Ok(())
//! }
//! ```

pub mod cr;
pub mod dns;
pub mod http;
pub mod session;
pub mod vpc;

pub use session::{ClientSession, IbmSession};

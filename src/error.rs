//! Error types
//!
//! [`ApiError`] is what a service binding returns when a remote call fails.
//! [`ProviderError`] is what every lifecycle handler returns.

use thiserror::Error;

/// A failed call against an IBM Cloud API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiError {
    /// HTTP status, absent when no response was received
    pub status: Option<u16>,
    pub message: String,
    /// Raw response body, when the server sent one
    pub body: Option<String>,
}

impl ApiError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        let body = body.into();
        if !body.is_empty() {
            self.body = Some(body);
        }
        self
    }

    /// Error for a request that never produced a response
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Some(404), message)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }

    /// Response detail appended to wrapped handler errors
    pub fn detail(&self) -> String {
        match (self.status, &self.body) {
            (Some(status), Some(body)) => format!("status {}: {}", status, body),
            (Some(status), None) => format!("status {}", status),
            (None, Some(body)) => body.clone(),
            (None, None) => String::new(),
        }
    }
}

/// Errors surfaced by resource and data source handlers
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The session could not hand out a service client
    #[error("{0}")]
    Session(String),

    #[error("Error {context}: {source}\n{}", source.detail())]
    Api {
        context: String,
        #[source]
        source: ApiError,
    },

    #[error("invalid id {id:?}: expected {expected} parts separated by '/'")]
    InvalidId { id: String, expected: usize },

    #[error("{0}")]
    Validation(String),

    #[error("invalid configuration for {type_name}: {}", errors.join("; "))]
    Schema {
        type_name: String,
        errors: Vec<String>,
    },

    #[error("unknown resource or data source type: {0}")]
    UnknownType(String),

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },
}

impl ProviderError {
    /// Wrap a remote failure with a message naming the entity and operation
    pub fn api(context: impl Into<String>, source: ApiError) -> Self {
        Self::Api {
            context: context.into(),
            source,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Status code of the wrapped remote failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { source, .. } => source.status,
            _ => None,
        }
    }
}

pub type Result<T, E = ProviderError> = std::result::Result<T, E>;

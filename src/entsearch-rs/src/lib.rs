//! entsearch Client Library
//!
//! HTTP client for the hosted search service's content source API: document
//! indexing, destruction and per-user permissions.

mod client;
mod poller;
mod transport;

use std::time::Duration;

pub use client::Client;
pub use entsearch_core::{
    AccessToken, ClientConfig, ClientIdentity, DestroyOutcome, Document, DocumentId,
    DocumentReceipt, FieldRequirements, IndexOutcome, PageInfo, PageParams, PermissionsPage,
    PollingConfig, ReceiptStatus, UserPermissions, ValidationError, Variant,
};
pub use poller::AsyncIndexPoller;
pub use transport::{HttpTransport, Transport};

/// Reason a request never produced a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectFailure {
    DnsResolution,
    Refused,
    TimedOut,
    Other,
}

impl ConnectFailure {
    /// Conventional errno-style code
    pub fn code(self) -> &'static str {
        match self {
            ConnectFailure::DnsResolution => "ENOTFOUND",
            ConnectFailure::Refused => "ECONNREFUSED",
            ConnectFailure::TimedOut => "ETIMEDOUT",
            ConnectFailure::Other => "ECONNRESET",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Document at position {index} failed validation: {source}")]
    Validation {
        index: usize,
        #[source]
        source: ValidationError,
    },

    #[error("Server error: {status} - {body}")]
    Transport {
        status: u16,
        headers: reqwest::header::HeaderMap,
        body: serde_json::Value,
    },

    #[error("Connection to {host} failed ({}): {source}", .failure.code())]
    Connection {
        failure: ConnectFailure,
        host: String,
        port: Option<u16>,
        #[source]
        source: reqwest::Error,
    },

    #[error("Timed out after {waited:?} waiting for {} document receipts", .pending.len())]
    Timeout {
        waited: Duration,
        pending: Vec<String>,
    },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Status code of a server-reported failure
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

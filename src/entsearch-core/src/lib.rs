//! entsearch Core Library
//!
//! This crate provides the transport-agnostic pieces of the entsearch SDK:
//! - Request and response models for documents, receipts and permissions
//! - Pre-flight document validation
//! - Client configuration (credentials, variants, polling)

pub mod config;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{AccessToken, ClientConfig, ClientIdentity, PollingConfig, Variant};
pub use models::*;
pub use validation::{validate_document, validate_documents, FieldRequirements, ValidationError};

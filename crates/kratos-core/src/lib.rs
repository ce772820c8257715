//! kratos-core: Shared types, configuration, and error handling for the Kratos agent.
//!
//! This crate provides the foundational types used across all Kratos components:
//! - Schema snapshot and raw introspection types for the property graph
//! - Pipeline records and validation outcomes
//! - The agent-to-agent message envelope
//! - Layered configuration
//! - The pipeline error taxonomy

pub mod config;
pub mod envelope;
pub mod error;
pub mod types;

pub use error::{ErrorKind, PipelineError};
pub use types::{RawSchema, Record, SchemaSnapshot, ValidationOutcome};

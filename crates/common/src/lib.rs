//! Common types and utilities for micro-cli
//!
//! This crate contains the schema model recovered from `.proto` files, the
//! error taxonomy, identifier case helpers and the resolved path
//! configuration shared by the parser, database, generator and CLI crates.

pub mod case;
pub mod config;
pub mod schema;

pub use config::{Config, RpcKind};
pub use schema::{Enum, EnumField, Message, MessageField, Position, ProjectInfo, Rpc, Schema, Service};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while scaffolding projects or adding RPCs
#[derive(Error, Debug)]
pub enum MicroError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing package: {} does not declare a package", .0.display())]
    MissingPackage(PathBuf),

    #[error("Not initialized: {0}")]
    NotInitialized(String),

    #[error("Duplicate rpc: `{rpc}` already exists in service `{service}`")]
    DuplicateRpc { rpc: String, service: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing anchor: {0}")]
    MissingAnchor(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Codegen error: {0}")]
    Codegen(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MicroError {
    /// Whether this error is a user input problem answered with help text
    /// rather than a failure
    pub fn is_usage(&self) -> bool {
        matches!(self, MicroError::Validation(msg) if msg.starts_with(USAGE_PREFIX))
    }

    /// Build a usage error for a missing or malformed command-line argument
    pub fn usage(msg: impl std::fmt::Display) -> Self {
        MicroError::Validation(format!("{USAGE_PREFIX}{msg}"))
    }
}

const USAGE_PREFIX: &str = "usage: ";

/// Result type for micro-cli operations
pub type Result<T> = std::result::Result<T, MicroError>;

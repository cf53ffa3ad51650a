//! `.proto` parsing for micro-cli
//!
//! This crate parses a service's `.proto` file and walks the result into
//! the schema model (`Schema`) shared by the other crates.
//!
//! ## Parsing Strategy
//!
//! Declarations are visited in a fixed order:
//! - the `package` declaration (required)
//! - enums, including ones nested in messages
//! - messages, including nested ones (map entries excluded)
//! - the first service and its RPCs
//!
//! RPC request and reply types are resolved by name once all messages are
//! known.

mod protobuf;
mod type_mapper;

pub use protobuf::{convert_file_to_schema, ProtoParser};
pub use type_mapper::{FieldShape, TypeMapper};

use micro_cli_common::{Result, Schema};
use std::path::Path;

/// Parse a `.proto` file into a [`Schema`]
///
/// # Arguments
/// * `path` - Path of the `.proto` file; imports are not followed
///
/// # Returns
/// * `Schema` - Package, enums, messages and the service declared in the file
pub fn parse_proto_file<P: AsRef<Path>>(path: P) -> Result<Schema> {
    ProtoParser::from_file(path)?.parse()
}

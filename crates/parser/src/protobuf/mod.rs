//! Protobuf service parser
//!
//! Turns `.proto` files into the micro-cli schema model.
//!
//! ## Sources
//! - **`.proto` source**: parsed in-process with `protox-parse`, syntax
//!   only, with source info so every declaration keeps its line, column and
//!   comments
//! - **Encoded FileDescriptorSet**: produced by `protoc --include_source_info`
//!
//! ## Example
//! ```rust,ignore
//! use micro_cli_parser::ProtoParser;
//!
//! let schema = ProtoParser::from_file("proto/userpb/foreground.proto")?.parse()?;
//! println!("{} rpcs", schema.service.rpcs.len());
//! ```

mod converter;
mod locations;
mod parser;

pub use converter::convert_file_to_schema;
pub use parser::ProtoParser;

//! `.proto` source and FileDescriptorSet loading

use micro_cli_common::{MicroError, Result, Schema};
use prost::Message;
use prost_reflect::DescriptorPool;
use prost_types::{FileDescriptorProto, FileDescriptorSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Protobuf service parser
///
/// Parses a single `.proto` file (or picks one file out of an already
/// compiled FileDescriptorSet) and converts it into a [`Schema`].
pub struct ProtoParser {
    /// Descriptor of the target file
    file: FileDescriptorProto,

    /// Full text of the parsed file, used for byte offsets
    source: Option<String>,

    /// Path reported in errors and logs
    source_path: PathBuf,
}

impl ProtoParser {
    /// Parse a `.proto` file from disk
    ///
    /// Only the syntax is checked. Imports are never opened and type names
    /// are kept as written, so references to messages that are not declared
    /// yet, or that live in files outside the proto directory, still parse.
    ///
    /// # Example
    /// ```rust,ignore
    /// let schema = ProtoParser::from_file("proto/userpb/foreground.proto")?.parse()?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                MicroError::Parse(format!("Invalid proto file path {}", path.display()))
            })?;

        let file = protox_parse::parse(file_name, &source)
            .map_err(|e| MicroError::Parse(format!("{}: {}", path.display(), e)))?;

        log::debug!(
            "Parsed {} ({} messages, {} services)",
            path.display(),
            file.message_type.len(),
            file.service.len()
        );

        Ok(Self {
            file,
            source: Some(source),
            source_path: path.to_path_buf(),
        })
    }

    /// Decode an encoded FileDescriptorSet and select one file from it
    ///
    /// The set must be complete (every import included). Positions and
    /// comments are only available when the set was compiled with source
    /// info (`protoc --include_source_info`). Byte offsets are always zero
    /// since the source text is not part of the set.
    pub fn from_file_descriptor_set(bytes: &[u8], file_name: &str) -> Result<Self> {
        let file_descriptor_set = FileDescriptorSet::decode(bytes).map_err(|e| {
            MicroError::Parse(format!("Failed to decode FileDescriptorSet: {}", e))
        })?;

        let pool = DescriptorPool::from_file_descriptor_set(file_descriptor_set).map_err(|e| {
            MicroError::Parse(format!("Failed to create DescriptorPool: {}", e))
        })?;

        let file = pool.get_file_by_name(file_name).ok_or_else(|| {
            MicroError::Parse(format!("File {} not found in descriptor set", file_name))
        })?;

        Ok(Self {
            file: file.file_descriptor_proto().clone(),
            source: None,
            source_path: PathBuf::from(file_name),
        })
    }

    /// Convert the target file into a [`Schema`]
    pub fn parse(&self) -> Result<Schema> {
        super::converter::convert_file_to_schema(
            &self.file,
            self.source.as_deref(),
            &self.source_path,
        )
    }

    /// Get reference to the parsed file descriptor
    pub fn file_descriptor(&self) -> &FileDescriptorProto {
        &self.file
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_set_without_target_file() {
        let set = FileDescriptorSet { file: vec![] };
        let result = ProtoParser::from_file_descriptor_set(&set.encode_to_vec(), "missing.proto");
        assert!(matches!(result, Err(MicroError::Parse(_))));
    }

    #[test]
    fn test_descriptor_set_without_source_info() {
        let set = FileDescriptorSet {
            file: vec![FileDescriptorProto {
                name: Some("demo.proto".to_string()),
                package: Some("demo".to_string()),
                ..Default::default()
            }],
        };
        let parser =
            ProtoParser::from_file_descriptor_set(&set.encode_to_vec(), "demo.proto").unwrap();
        let schema = parser.parse().unwrap();
        assert_eq!(schema.package_name, "demo");
        assert!(!schema.service.position.is_known());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ProtoParser::from_file("/definitely/not/here.proto");
        assert!(matches!(result, Err(MicroError::Io(_))));
    }
}

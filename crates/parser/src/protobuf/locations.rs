//! Source positions and comments from `SourceCodeInfo`
//!
//! Every declaration in a `FileDescriptorProto` is addressed by a path of
//! field numbers and indexes (message 2 is `[4, 2]`, its field 0 is
//! `[4, 2, 2, 0]`). The index maps those paths back to spans and comments.

use micro_cli_common::Position;
use prost_types::source_code_info::Location;
use prost_types::SourceCodeInfo;
use std::collections::HashMap;

/// `FileDescriptorProto` field numbers
pub(crate) mod path {
    pub const PACKAGE: i32 = 2;
    pub const MESSAGE_TYPE: i32 = 4;
    pub const ENUM_TYPE: i32 = 5;
    pub const SERVICE: i32 = 6;

    /// `DescriptorProto` field numbers
    pub const MESSAGE_FIELD: i32 = 2;
    pub const MESSAGE_NESTED_TYPE: i32 = 3;
    pub const MESSAGE_ENUM_TYPE: i32 = 4;

    /// `EnumDescriptorProto.value`
    pub const ENUM_VALUE: i32 = 2;

    /// `ServiceDescriptorProto.method`
    pub const SERVICE_METHOD: i32 = 2;
}

pub(crate) struct SourceIndex<'a> {
    locations: HashMap<&'a [i32], &'a Location>,
    /// Byte offset of the start of each line
    line_starts: Vec<usize>,
}

impl<'a> SourceIndex<'a> {
    pub fn new(info: Option<&'a SourceCodeInfo>, source: Option<&str>) -> Self {
        let mut locations = HashMap::new();
        if let Some(info) = info {
            for location in &info.location {
                // protoc emits the outermost location first for a path
                locations.entry(location.path.as_slice()).or_insert(location);
            }
        }

        let line_starts = source
            .map(|text| {
                std::iter::once(0)
                    .chain(text.match_indices('\n').map(|(i, _)| i + 1))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            locations,
            line_starts,
        }
    }

    pub fn position(&self, path: &[i32]) -> Position {
        let Some(location) = self.locations.get(path) else {
            return Position::default();
        };

        // span is [start_line, start_col, end_line, end_col], or three
        // elements when start and end share a line; all zero-based
        let (start_line, start_col, end_line) = match location.span.as_slice() {
            [line, col, end_line, _] => (*line, *col, *end_line),
            [line, col, _] => (*line, *col, *line),
            _ => return Position::default(),
        };
        let (Ok(line), Ok(column), Ok(end_line)) = (
            usize::try_from(start_line),
            usize::try_from(start_col),
            usize::try_from(end_line),
        ) else {
            return Position::default();
        };

        let offset = self
            .line_starts
            .get(line)
            .map(|start| start + column)
            .unwrap_or_default();

        Position {
            line: line + 1,
            column: column + 1,
            offset,
            end_line: end_line + 1,
        }
    }

    /// Comment attached to a declaration
    ///
    /// Leading comments win and keep their line structure, each line
    /// prefixed with `//`. A trailing comment is used as a single trimmed
    /// line when there is no leading one.
    pub fn comment(&self, path: &[i32]) -> String {
        let Some(location) = self.locations.get(path) else {
            return String::new();
        };

        if let Some(leading) = location
            .leading_comments
            .as_deref()
            .filter(|c| !c.trim().is_empty())
        {
            return leading
                .trim_end_matches('\n')
                .split('\n')
                .map(|line| format!("//{}", line))
                .collect::<Vec<_>>()
                .join("\n");
        }

        location
            .trailing_comments
            .as_deref()
            .map(|c| c.trim().to_string())
            .unwrap_or_default()
    }
}

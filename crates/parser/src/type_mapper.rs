//! Field type normalisation
//!
//! Proto field declarations are reduced to a single type string that the
//! Go templates can paste verbatim:
//!
//! | declaration              | normalised          |
//! |--------------------------|---------------------|
//! | `int32 id`               | `int32`             |
//! | `repeated int32 ids`     | `[]int32`           |
//! | `repeated User users`    | `[]*pkg.User`       |
//! | `map<string, User> m`    | `map[string]*pkg.User` |
//! | `map<int32, int32> m`    | `map[int32]int32`   |
//! | `oneof` member `User u`  | `User`              |

/// Protobuf scalar type keywords
const SCALAR_TYPES: &[&str] = &[
    "double", "float", "int32", "int64", "uint32", "uint64", "sint32", "sint64", "fixed32",
    "fixed64", "sfixed32", "sfixed64", "bool", "string", "bytes",
];

/// How a field was declared, with type names as written in the proto file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape<'a> {
    Single(&'a str),
    Repeated(&'a str),
    Map { key: &'a str, value: &'a str },
    OneOf(&'a str),
}

/// Maps proto field declarations to normalised type strings
pub struct TypeMapper;

impl TypeMapper {
    /// Check whether a type name is a protobuf scalar
    pub fn is_basic_type(type_name: &str) -> bool {
        SCALAR_TYPES.contains(&type_name)
    }

    /// Normalise a field declaration
    ///
    /// # Examples
    /// ```
    /// use micro_cli_parser::{FieldShape, TypeMapper};
    ///
    /// assert_eq!(TypeMapper::normalize(FieldShape::Repeated("int32"), "foo"), "[]int32");
    /// assert_eq!(TypeMapper::normalize(FieldShape::Repeated("User"), "foo"), "[]*foo.User");
    /// assert_eq!(
    ///     TypeMapper::normalize(FieldShape::Map { key: "string", value: "User" }, "foo"),
    ///     "map[string]*foo.User"
    /// );
    /// ```
    pub fn normalize(shape: FieldShape<'_>, package: &str) -> String {
        match shape {
            FieldShape::Single(type_name) | FieldShape::OneOf(type_name) => type_name.to_string(),
            FieldShape::Repeated(type_name) if Self::is_basic_type(type_name) => {
                format!("[]{}", type_name)
            }
            FieldShape::Repeated(type_name) => format!("[]*{}.{}", package, type_name),
            FieldShape::Map { key, value } => {
                let mut normalized = if Self::is_basic_type(key) {
                    format!("map[{}]", key)
                } else {
                    format!("map[*{}.{}]", package, key)
                };
                if Self::is_basic_type(value) {
                    normalized.push_str(value);
                } else {
                    normalized.push_str(&format!("*{}.{}", package, value));
                }
                normalized
            }
        }
    }

    /// Strip the leading dot and the file's own package from a resolved
    /// type name (`.foo.User` -> `User`)
    ///
    /// Types from other packages keep their package (`.google.protobuf.Empty`
    /// -> `google.protobuf.Empty`).
    pub fn local_type_name<'a>(type_name: &'a str, package: &str) -> &'a str {
        let type_name = type_name.strip_prefix('.').unwrap_or(type_name);
        if package.is_empty() {
            return type_name;
        }
        type_name
            .strip_prefix(package)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(type_name)
    }
}

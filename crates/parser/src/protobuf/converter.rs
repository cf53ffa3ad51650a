//! Converts a proto file descriptor to the schema model
//!
//! The walk order is fixed: package, enums, messages, then the service and
//! its RPCs. RPC request/reply references are resolved only after every
//! message is collected, so declaration order in the file does not matter.

use super::locations::{path, SourceIndex};
use crate::type_mapper::{FieldShape, TypeMapper};
use micro_cli_common::case::to_pascal_case;
use micro_cli_common::{
    Enum, EnumField, Message, MessageField, MicroError, Result, Rpc, Schema, Service,
};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    ServiceDescriptorProto,
};
use std::path::Path;

/// Convert one file descriptor into a [`Schema`]
///
/// `source` is the full file text, used to turn line/column spans into
/// byte offsets. Fails with [`MicroError::MissingPackage`] when the file
/// has no `package` declaration.
pub fn convert_file_to_schema(
    file: &FileDescriptorProto,
    source: Option<&str>,
    source_path: &Path,
) -> Result<Schema> {
    let index = SourceIndex::new(file.source_code_info.as_ref(), source);

    let package_name = file.package().trim().to_string();
    if package_name.is_empty() {
        return Err(MicroError::MissingPackage(source_path.to_path_buf()));
    }

    let converter = Converter {
        index: &index,
        package: &package_name,
    };

    let mut schema = Schema {
        package_comment: index.comment(&[path::PACKAGE]),
        package_name: package_name.clone(),
        ..Default::default()
    };

    for (i, enum_type) in file.enum_type.iter().enumerate() {
        converter.collect_enums(
            enum_type,
            vec![path::ENUM_TYPE, i as i32],
            "",
            &mut schema.enums,
        );
    }
    for (i, message) in file.message_type.iter().enumerate() {
        converter.collect_nested_enums(
            message,
            vec![path::MESSAGE_TYPE, i as i32],
            "",
            &mut schema.enums,
        );
    }

    for (i, message) in file.message_type.iter().enumerate() {
        converter.collect_messages(
            message,
            vec![path::MESSAGE_TYPE, i as i32],
            "",
            &mut schema.messages,
        );
    }

    if let Some(service) = file.service.first() {
        schema.service = converter.convert_service(service, vec![path::SERVICE, 0]);
    }
    for extra in file.service.iter().skip(1) {
        log::warn!(
            "{}: ignoring service `{}`, only the first service is managed",
            source_path.display(),
            extra.name()
        );
    }

    schema.resolve_rpc_references();
    Ok(schema)
}

struct Converter<'a> {
    index: &'a SourceIndex<'a>,
    package: &'a str,
}

impl Converter<'_> {
    fn collect_enums(
        &self,
        enum_type: &EnumDescriptorProto,
        at: Vec<i32>,
        scope: &str,
        out: &mut Vec<Enum>,
    ) {
        let fields = enum_type
            .value
            .iter()
            .enumerate()
            .map(|(i, value)| EnumField {
                name: to_pascal_case(value.name()),
                value: value.number(),
                comment: self.index.comment(&child(&at, path::ENUM_VALUE, i)),
            })
            .collect();

        out.push(Enum {
            name: qualify(scope, enum_type.name()),
            fields,
            comment: self.index.comment(&at),
        });
    }

    /// Enums declared inside messages, depth-first
    fn collect_nested_enums(
        &self,
        message: &DescriptorProto,
        at: Vec<i32>,
        scope: &str,
        out: &mut Vec<Enum>,
    ) {
        let scope = qualify(scope, message.name());
        for (i, enum_type) in message.enum_type.iter().enumerate() {
            self.collect_enums(enum_type, child(&at, path::MESSAGE_ENUM_TYPE, i), &scope, out);
        }
        for (i, nested) in message.nested_type.iter().enumerate() {
            if is_map_entry(nested) {
                continue;
            }
            self.collect_nested_enums(
                nested,
                child(&at, path::MESSAGE_NESTED_TYPE, i),
                &scope,
                out,
            );
        }
    }

    /// Messages depth-first, nested ones named `Outer.Inner`
    fn collect_messages(
        &self,
        message: &DescriptorProto,
        at: Vec<i32>,
        scope: &str,
        out: &mut Vec<Message>,
    ) {
        let name = qualify(scope, message.name());
        let fields = message
            .field
            .iter()
            .enumerate()
            .map(|(i, field)| MessageField {
                name: to_pascal_case(field.name()),
                field_type: self.field_type(message, field),
                number: field.number(),
                comment: self.index.comment(&child(&at, path::MESSAGE_FIELD, i)),
            })
            .collect();

        out.push(Message {
            name: name.clone(),
            fields,
            comment: self.index.comment(&at),
        });

        for (i, nested) in message.nested_type.iter().enumerate() {
            if is_map_entry(nested) {
                continue;
            }
            self.collect_messages(nested, child(&at, path::MESSAGE_NESTED_TYPE, i), &name, out);
        }
    }

    fn field_type(&self, parent: &DescriptorProto, field: &FieldDescriptorProto) -> String {
        if let Some(entry) = map_entry_for(parent, field) {
            let key = entry.field.iter().find(|f| f.number() == 1);
            let value = entry.field.iter().find(|f| f.number() == 2);
            if let (Some(key), Some(value)) = (key, value) {
                let (key, value) = (self.type_name(key), self.type_name(value));
                return TypeMapper::normalize(
                    FieldShape::Map {
                        key: &key,
                        value: &value,
                    },
                    self.package,
                );
            }
            log::warn!("map entry `{}` lacks a key or value field", entry.name());
        }

        let type_name = self.type_name(field);
        // proto3 `optional` fields sit in synthetic oneofs
        let shape = if field.oneof_index.is_some() && !field.proto3_optional() {
            FieldShape::OneOf(&type_name)
        } else if field.label() == Label::Repeated {
            FieldShape::Repeated(&type_name)
        } else {
            FieldShape::Single(&type_name)
        };

        TypeMapper::normalize(shape, self.package)
    }

    /// Type name as written: scalar keyword or package-local message name
    fn type_name(&self, field: &FieldDescriptorProto) -> String {
        match scalar_keyword(field.r#type()) {
            Some(keyword) if field.type_name.is_none() => keyword.to_string(),
            _ => TypeMapper::local_type_name(field.type_name(), self.package).to_string(),
        }
    }

    fn convert_service(&self, service: &ServiceDescriptorProto, at: Vec<i32>) -> Service {
        let rpcs = service
            .method
            .iter()
            .enumerate()
            .map(|(i, method)| {
                let method_path = child(&at, path::SERVICE_METHOD, i);
                Rpc {
                    name: method.name().to_string(),
                    request_type: TypeMapper::local_type_name(method.input_type(), self.package)
                        .to_string(),
                    return_type: TypeMapper::local_type_name(method.output_type(), self.package)
                        .to_string(),
                    request: None,
                    ret: None,
                    comment: self.index.comment(&method_path),
                    position: self.index.position(&method_path),
                }
            })
            .collect();

        Service {
            name: service.name().to_string(),
            rpcs,
            comment: self.index.comment(&at),
            position: self.index.position(&at),
        }
    }
}

fn qualify(scope: &str, name: &str) -> String {
    let name = to_pascal_case(name);
    if scope.is_empty() {
        name
    } else {
        format!("{}.{}", scope, name)
    }
}

fn child(parent: &[i32], field_number: i32, index: usize) -> Vec<i32> {
    let mut path = parent.to_vec();
    path.push(field_number);
    path.push(index as i32);
    path
}

fn is_map_entry(message: &DescriptorProto) -> bool {
    message
        .options
        .as_ref()
        .map(|options| options.map_entry())
        .unwrap_or(false)
}

/// Synthetic `XxxEntry` message backing a `map<K, V>` field
fn map_entry_for<'a>(
    parent: &'a DescriptorProto,
    field: &FieldDescriptorProto,
) -> Option<&'a DescriptorProto> {
    if field.label() != Label::Repeated || field.type_name.is_none() {
        return None;
    }
    let entry_name = field.type_name().rsplit('.').next()?;
    parent
        .nested_type
        .iter()
        .find(|nested| nested.name() == entry_name && is_map_entry(nested))
}

fn scalar_keyword(kind: Type) -> Option<&'static str> {
    Some(match kind {
        Type::Double => "double",
        Type::Float => "float",
        Type::Int64 => "int64",
        Type::Uint64 => "uint64",
        Type::Int32 => "int32",
        Type::Fixed64 => "fixed64",
        Type::Fixed32 => "fixed32",
        Type::Bool => "bool",
        Type::String => "string",
        Type::Bytes => "bytes",
        Type::Uint32 => "uint32",
        Type::Sfixed32 => "sfixed32",
        Type::Sfixed64 => "sfixed64",
        Type::Sint32 => "sint32",
        Type::Sint64 => "sint64",
        Type::Group | Type::Message | Type::Enum => return None,
    })
}

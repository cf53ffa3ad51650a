//! Schema model recovered from a `.proto` file
//!
//! One [`Schema`] describes a single service: its RPCs, the messages and
//! enums declared next to it, and the package they live in. RPCs refer to
//! their request and reply messages by name; the resolved copies in
//! [`Rpc::request`] / [`Rpc::ret`] are filled by
//! [`Schema::resolve_rpc_references`] once every message is known.

use crate::case::to_pascal_case;
use serde::{Deserialize, Serialize};

/// Source location of a declaration
///
/// `line` and `column` are 1-based, `offset` is the byte offset of the
/// declaration start. All zero means the location is unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
    /// Last line of the declaration (its closing `;` or `}`)
    #[serde(default)]
    pub end_line: usize,
}

impl Position {
    pub fn is_known(&self) -> bool {
        self.line > 0
    }
}

/// A gRPC service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub rpcs: Vec<Rpc>,
    pub comment: String,
    #[serde(default)]
    pub position: Position,
}

impl Service {
    /// Look up an RPC, comparing Pascal-case normalised names
    pub fn rpc(&self, name: &str) -> Option<&Rpc> {
        let wanted = to_pascal_case(name);
        self.rpcs.iter().find(|rpc| to_pascal_case(&rpc.name) == wanted)
    }

    /// Line after which a new `rpc` declaration is spliced
    ///
    /// The last RPC's final line when the service already has RPCs,
    /// otherwise the `service` declaration line itself.
    pub fn insertion_anchor(&self) -> Option<usize> {
        self.rpcs
            .last()
            .map(|rpc| rpc.position.end_line.max(rpc.position.line))
            .filter(|line| *line > 0)
            .or_else(|| Some(self.position.line).filter(|line| *line > 0))
    }
}

/// A single RPC method of a service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rpc {
    pub name: String,
    pub request_type: String,
    pub return_type: String,
    /// Request message, when it is declared in the same file
    pub request: Option<Message>,
    /// Reply message, when it is declared in the same file
    #[serde(rename = "return")]
    pub ret: Option<Message>,
    pub comment: String,
    #[serde(default)]
    pub position: Position,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub name: String,
    pub fields: Vec<MessageField>,
    pub comment: String,
}

impl Message {
    pub fn field(&self, name: &str) -> Option<&MessageField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A message field
///
/// `type` holds the normalised type string: a bare scalar name, `[]T` for
/// repeated scalars, `[]*pkg.T` for repeated messages and `map[K]V` for maps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub number: i32,
    pub comment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enum {
    pub name: String,
    pub fields: Vec<EnumField>,
    pub comment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumField {
    pub name: String,
    pub value: i32,
    pub comment: String,
}

/// Free-form project metadata written by `project` and kept across re-parses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    pub src_path: String,
    pub description: String,
}

/// Everything parsed out of one `.proto` file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub service: Service,
    pub messages: Vec<Message>,
    pub enums: Vec<Enum>,
    pub package_name: String,
    pub package_comment: String,
}

impl Schema {
    /// Look up a message; nested messages are named `Outer.Inner`
    pub fn message(&self, name: &str) -> Option<&Message> {
        let wanted = to_pascal_path(name);
        self.messages.iter().find(|m| m.name == wanted)
    }

    pub fn enumeration(&self, name: &str) -> Option<&Enum> {
        let wanted = to_pascal_path(name);
        self.enums.iter().find(|e| e.name == wanted)
    }

    /// Point every RPC at its request and reply messages by name
    ///
    /// Types that are not declared in this schema (imports, typos) resolve
    /// to `None`. Running it again after adding messages picks them up.
    pub fn resolve_rpc_references(&mut self) {
        let resolved: Vec<(Option<Message>, Option<Message>)> = self
            .service
            .rpcs
            .iter()
            .map(|rpc| {
                (
                    self.message(&rpc.request_type).cloned(),
                    self.message(&rpc.return_type).cloned(),
                )
            })
            .collect();

        for (rpc, (request, ret)) in self.service.rpcs.iter_mut().zip(resolved) {
            rpc.request = request;
            rpc.ret = ret;
        }
    }
}

/// Pascal-case every segment of a dotted type path
fn to_pascal_path(name: &str) -> String {
    name.split('.')
        .map(to_pascal_case)
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rpc_at(name: &str, line: usize) -> Rpc {
        Rpc {
            name: name.to_string(),
            position: Position {
                line,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_anchor_is_service_line_without_rpcs() {
        let service = Service {
            name: "Demo".into(),
            position: Position {
                line: 10,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(service.insertion_anchor(), Some(10));
    }

    #[test]
    fn test_anchor_is_last_rpc_line() {
        let service = Service {
            name: "Demo".into(),
            rpcs: vec![rpc_at("Echo", 15)],
            position: Position {
                line: 10,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(service.insertion_anchor(), Some(15));
    }

    #[test]
    fn test_anchor_follows_multi_line_rpc() {
        let mut rpc = rpc_at("Echo", 15);
        rpc.position.end_line = 17;
        let service = Service {
            rpcs: vec![rpc_at("Ping", 12), rpc],
            ..Default::default()
        };
        assert_eq!(service.insertion_anchor(), Some(17));
    }

    #[test]
    fn test_anchor_missing_without_positions() {
        let service = Service {
            name: "Demo".into(),
            rpcs: vec![rpc_at("Echo", 0)],
            ..Default::default()
        };
        assert_eq!(service.insertion_anchor(), None);
        assert_eq!(Service::default().insertion_anchor(), None);
    }

    #[test]
    fn test_resolve_rpc_references_by_name() {
        let mut schema = Schema {
            service: Service {
                name: "Demo".into(),
                rpcs: vec![Rpc {
                    name: "Echo".into(),
                    request_type: "ping".into(),
                    return_type: "Pong".into(),
                    ..Default::default()
                }],
                ..Default::default()
            },
            messages: vec![Message {
                name: "Ping".into(),
                ..Default::default()
            }],
            ..Default::default()
        };

        schema.resolve_rpc_references();
        let rpc = &schema.service.rpcs[0];
        assert_eq!(rpc.request.as_ref().map(|m| m.name.as_str()), Some("Ping"));
        assert!(rpc.ret.is_none());

        // A later message declaration is picked up on the next pass
        schema.messages.push(Message {
            name: "Pong".into(),
            ..Default::default()
        });
        schema.resolve_rpc_references();
        let rpc = &schema.service.rpcs[0];
        assert_eq!(rpc.ret.as_ref().map(|m| m.name.as_str()), Some("Pong"));
    }

    #[test]
    fn test_nested_messages_resolve_by_path() {
        let mut schema = Schema {
            service: Service {
                rpcs: vec![Rpc {
                    name: "Sync".into(),
                    request_type: "Outer.Inner".into(),
                    return_type: "Other.Inner".into(),
                    ..Default::default()
                }],
                ..Default::default()
            },
            messages: vec![
                Message {
                    name: "Outer.Inner".into(),
                    comment: "// outer".into(),
                    ..Default::default()
                },
                Message {
                    name: "Other.Inner".into(),
                    comment: "// other".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        schema.resolve_rpc_references();
        let rpc = &schema.service.rpcs[0];
        assert_eq!(rpc.request.as_ref().map(|m| m.comment.as_str()), Some("// outer"));
        assert_eq!(rpc.ret.as_ref().map(|m| m.comment.as_str()), Some("// other"));
        assert!(schema.message("outer.inner").is_some());
        assert!(schema.message("Inner").is_none());
    }

    #[test]
    fn test_rpc_lookup_normalises_names() {
        let service = Service {
            rpcs: vec![rpc_at("GetUser", 3)],
            ..Default::default()
        };
        assert!(service.rpc("get_user").is_some());
        assert!(service.rpc("GetUser").is_some());
        assert!(service.rpc("get_users").is_none());
    }

    #[test]
    fn test_json_field_names() {
        let field = MessageField {
            name: "Ids".into(),
            field_type: "[]int32".into(),
            number: 1,
            comment: String::new(),
        };
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "[]int32");

        let rpc = Rpc::default();
        let json = serde_json::to_value(&rpc).unwrap();
        assert!(json.get("return").is_some());
        assert!(json.get("request_type").is_some());
    }
}

//! Adding an RPC to an existing service
//!
//! One call touches three files and the project database:
//!
//! 1. a method stub is appended to `program/services/<kind>.go`
//! 2. request and reply messages are appended to `<kind>.proto`
//! 3. the `rpc` line is spliced into the proto's service block, right after
//!    the last existing RPC (or the `service` line when there is none)
//!
//! The splice anchor always comes from parsing the proto file right before
//! the edit, never from a stored `db.json`. Once the text is in place the
//! proto is parsed again and `gen.sh` regenerates the Go bindings. The
//! database is written on every exit path; file edits are never rolled back.

use crate::insert::{Placement, TemplateRenderer};
use crate::params::RpcParams;
use crate::templates::{RPC_LINE, RPC_MESSAGES, RPC_STUB};
use micro_cli_common::case::to_pascal_case;
use micro_cli_common::{Config, MicroError, Result, RpcKind};
use micro_cli_database::{DatabaseSession, ProjectDatabase};
use std::path::Path;
use std::process::Command;

/// Regenerates language bindings after a proto file changed
#[cfg_attr(test, mockall::automock)]
pub trait CodeGenerator {
    fn generate(&self, proto_dir: &Path) -> Result<()>;
}

/// Runs `./gen.sh` inside the proto directory and waits for it
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellCodeGenerator;

impl CodeGenerator for ShellCodeGenerator {
    fn generate(&self, proto_dir: &Path) -> Result<()> {
        log::info!("Running gen.sh in {}", proto_dir.display());
        let status = Command::new("./gen.sh")
            .current_dir(proto_dir)
            .status()
            .map_err(|e| {
                MicroError::Codegen(format!(
                    "failed to start gen.sh in {}: {}",
                    proto_dir.display(),
                    e
                ))
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(MicroError::Codegen(format!(
                "gen.sh in {} exited with {}",
                proto_dir.display(),
                status
            )))
        }
    }
}

/// Arguments of one add-RPC run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddRpcRequest {
    /// Service name as given to `project`
    pub service: String,
    /// RPC name, any case
    pub rpc: String,
    pub kind: RpcKind,
    pub comment: String,
}

/// Adds RPCs to generated services
pub struct RpcAdder<G = ShellCodeGenerator> {
    config: Config,
    renderer: TemplateRenderer,
    generator: G,
}

impl RpcAdder<ShellCodeGenerator> {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_generator(config, ShellCodeGenerator)
    }
}

impl<G: CodeGenerator> RpcAdder<G> {
    pub fn with_generator(config: Config, generator: G) -> Result<Self> {
        Ok(Self {
            config,
            renderer: TemplateRenderer::new()?,
            generator,
        })
    }

    /// Add one RPC, returning its normalised name
    pub fn add_rpc(&self, request: &AddRpcRequest) -> Result<String> {
        let service = request.service.trim();
        if service.is_empty() {
            return Err(MicroError::usage("service name is required"));
        }
        if request.rpc.trim().is_empty() {
            return Err(MicroError::usage("rpc name is required"));
        }
        if !is_valid_rpc_name(&request.rpc) {
            return Err(MicroError::usage(format!(
                "rpc name `{}` is not a valid identifier",
                request.rpc.trim()
            )));
        }

        let params = RpcParams::new(service, request.rpc.trim(), request.kind, &request.comment);
        let proto_file = self.config.proto_file(service, request.kind);
        let service_file = self.config.service_file(service, request.kind);

        let mut db = ProjectDatabase::new(self.config.db_dir(service));
        db.initialize(&proto_file)?;
        carry_project_info(&mut db);

        let mut session = DatabaseSession::new(db);

        if session.has_rpc(&params.rpc_name)? {
            return Err(MicroError::DuplicateRpc {
                rpc: params.rpc_name,
                service: session.service()?.name.clone(),
            });
        }
        let anchor = session.rpc_anchor_line()?;
        log::debug!(
            "Inserting rpc {} after line {} of {}",
            params.rpc_name,
            anchor,
            proto_file.display()
        );

        self.renderer
            .insert(RPC_STUB, &params, &service_file, Placement::Append)?;
        self.renderer
            .insert(RPC_MESSAGES, &params, &proto_file, Placement::Append)?;
        self.renderer
            .insert(RPC_LINE, &params, &proto_file, Placement::SpliceAfter(anchor))?;
        log::info!(
            "Added rpc {} to {} and {}",
            params.rpc_name,
            service_file.display(),
            proto_file.display()
        );

        if let Err(e) = session.initialize(&proto_file) {
            log::warn!(
                "Failed to re-parse {}, db.json keeps the previous schema: {}",
                proto_file.display(),
                e
            );
        }

        self.generator.generate(&self.config.proto_dir(service))?;

        Ok(params.rpc_name)
    }
}

/// Keep the project info of an existing `db.json`, which a fresh parse of
/// the proto file cannot recover
fn carry_project_info(db: &mut ProjectDatabase) {
    let mut stored = ProjectDatabase::new(db.db_path());
    match stored.load() {
        Ok(()) => db.set_project_info(stored.project_info().clone()),
        Err(MicroError::NotInitialized(_)) => {
            log::debug!("No db.json at {} yet", db.db_path().display())
        }
        Err(e) => log::warn!("Ignoring unreadable {}: {}", stored.db_file_path().display(), e),
    }
}

/// Whether `name` normalises to a proto identifier
fn is_valid_rpc_name(name: &str) -> bool {
    let name = to_pascal_case(name.trim());
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use micro_cli_common::ProjectInfo;
    use micro_cli_database::SaveMode;
    use std::fs;
    use tempfile::TempDir;

    const PROTO: &str = r#"syntax = "proto3";

package userpb;

// User rpcs for client applications
service User {
    // Ping health check
    rpc Ping(PingRequest) returns (PingReply);
}

message PingRequest {
}

message PingReply {
}
"#;

    const SERVICE_GO: &str = "package services\n\ntype Foreground struct {\n\tBase\n}\n";

    fn setup(dir: &TempDir) -> Config {
        let config = Config::new(dir.path(), "github.com/acme", "github.com/acme/clients");
        let proto = config.proto_file("user", RpcKind::Foreground);
        fs::create_dir_all(proto.parent().unwrap()).unwrap();
        fs::write(&proto, PROTO).unwrap();

        let service = config.service_file("user", RpcKind::Foreground);
        fs::create_dir_all(service.parent().unwrap()).unwrap();
        fs::write(&service, SERVICE_GO).unwrap();
        config
    }

    fn request(rpc: &str) -> AddRpcRequest {
        AddRpcRequest {
            service: "user".into(),
            rpc: rpc.into(),
            kind: RpcKind::Foreground,
            comment: "fetch one user".into(),
        }
    }

    #[test]
    fn test_generator_runs_in_proto_dir() {
        let dir = TempDir::new().unwrap();
        let config = setup(&dir);
        let proto_dir = config.proto_dir("user");

        let mut generator = MockCodeGenerator::new();
        generator
            .expect_generate()
            .withf(move |path| *path == proto_dir)
            .times(1)
            .returning(|_| Ok(()));

        let adder = RpcAdder::with_generator(config.clone(), generator).unwrap();
        assert_eq!(adder.add_rpc(&request("get_user")).unwrap(), "GetUser");

        let proto = fs::read_to_string(config.proto_file("user", RpcKind::Foreground)).unwrap();
        assert!(proto.contains(
            "    rpc Ping(PingRequest) returns (PingReply);\n    // GetUser fetch one user\n    rpc GetUser(GetUserRequest) returns (GetUserReply);\n}"
        ));
        assert!(proto.contains("message GetUserRequest {\n}"));

        let go = fs::read_to_string(config.service_file("user", RpcKind::Foreground)).unwrap();
        assert!(go.starts_with(SERVICE_GO));
        assert!(go.contains("func (s *Foreground) GetUser("));

        let mut db = ProjectDatabase::new(config.db_dir("user"));
        db.load().unwrap();
        let names: Vec<&str> = db
            .service()
            .unwrap()
            .rpcs
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["Ping", "GetUser"]);
        assert!(db.find_message_by_name("GetUserReply").unwrap().is_some());
    }

    #[test]
    fn test_duplicate_never_reaches_generator() {
        let dir = TempDir::new().unwrap();
        let config = setup(&dir);

        let mut generator = MockCodeGenerator::new();
        generator.expect_generate().times(0);

        let adder = RpcAdder::with_generator(config.clone(), generator).unwrap();
        let err = adder.add_rpc(&request("ping")).unwrap_err();
        assert!(
            matches!(err, MicroError::DuplicateRpc { ref rpc, ref service } if rpc == "Ping" && service == "User"),
            "unexpected error: {err:?}"
        );

        let proto = fs::read_to_string(config.proto_file("user", RpcKind::Foreground)).unwrap();
        assert_eq!(proto, PROTO);
    }

    #[test]
    fn test_generator_failure_keeps_edits_and_database() {
        let dir = TempDir::new().unwrap();
        let config = setup(&dir);

        let mut generator = MockCodeGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_| Err(MicroError::Codegen("gen.sh exited with 1".into())));

        let adder = RpcAdder::with_generator(config.clone(), generator).unwrap();
        let err = adder.add_rpc(&request("get_user")).unwrap_err();
        assert!(matches!(err, MicroError::Codegen(_)));

        let proto = fs::read_to_string(config.proto_file("user", RpcKind::Foreground)).unwrap();
        assert!(proto.contains("rpc GetUser(GetUserRequest) returns (GetUserReply);"));

        let mut db = ProjectDatabase::new(config.db_dir("user"));
        db.load().unwrap();
        assert!(db.has_rpc("get_user").unwrap());
    }

    #[test]
    fn test_project_info_survives() {
        let dir = TempDir::new().unwrap();
        let config = setup(&dir);

        let info = ProjectInfo {
            name: "user-service".into(),
            src_path: "/go/src/github.com/acme/user-service".into(),
            description: "user accounts".into(),
        };
        let mut db = ProjectDatabase::new(config.db_dir("user"));
        db.initialize(&config.proto_file("user", RpcKind::Foreground))
            .unwrap();
        db.set_project_info(info.clone());
        db.save(SaveMode::Checked).unwrap();

        let mut generator = MockCodeGenerator::new();
        generator.expect_generate().returning(|_| Ok(()));
        let adder = RpcAdder::with_generator(config.clone(), generator).unwrap();
        adder.add_rpc(&request("get_user")).unwrap();

        let mut db = ProjectDatabase::new(config.db_dir("user"));
        db.load().unwrap();
        assert_eq!(db.project_info(), &info);
    }

    #[test]
    fn test_missing_names_are_usage_errors() {
        let dir = TempDir::new().unwrap();
        let config = setup(&dir);
        let mut generator = MockCodeGenerator::new();
        generator.expect_generate().times(0);
        let adder = RpcAdder::with_generator(config, generator).unwrap();

        let mut no_service = request("get_user");
        no_service.service = " ".into();
        assert!(adder.add_rpc(&no_service).unwrap_err().is_usage());
        assert!(adder.add_rpc(&request("")).unwrap_err().is_usage());
        assert!(adder.add_rpc(&request("get-user")).unwrap_err().is_usage());
    }

    #[test]
    fn test_rpc_name_validity() {
        assert!(is_valid_rpc_name("get_user"));
        assert!(is_valid_rpc_name("GetUser2"));
        assert!(!is_valid_rpc_name("1user"));
        assert!(!is_valid_rpc_name("get-user"));
        assert!(!is_valid_rpc_name(""));
    }
}

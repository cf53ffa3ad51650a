//! Project database for micro-cli services
//!
//! Each generated service keeps a `db.json` file in its `.micro-db`
//! directory. It holds the schema parsed from the service's `.proto` file
//! together with free-form project metadata that the `.proto` file cannot
//! carry. The JSON file is the only durable state; there is no locking, so
//! two commands running against the same project race (last writer wins).

mod session;

pub use session::DatabaseSession;

use micro_cli_common::{
    Enum, Message, MicroError, ProjectInfo, Result, Schema, Service,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the database inside its directory
pub const DB_FILE_NAME: &str = "db.json";

/// How [`ProjectDatabase::save`] treats the in-memory state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Validate the schema and keep the project info already on disk
    Checked,
    /// Write the in-memory state as is
    Unchecked,
}

/// On-disk layout of `db.json`
#[derive(Serialize)]
struct DocumentRef<'a> {
    #[serde(flatten)]
    schema: &'a Schema,
    project_info: &'a ProjectInfo,
}

#[derive(Deserialize)]
struct Document {
    #[serde(flatten)]
    schema: Schema,
    #[serde(default)]
    project_info: Option<ProjectInfo>,
}

/// Schema and project metadata of one service, persisted as JSON
///
/// Queries fail with [`MicroError::NotInitialized`] until the database was
/// filled by [`initialize`](Self::initialize), [`load`](Self::load) or
/// [`with_schema`](Self::with_schema).
#[derive(Debug, Clone)]
pub struct ProjectDatabase {
    initialized: bool,
    schema: Schema,
    project_info: ProjectInfo,
    db_path: PathBuf,
}

impl ProjectDatabase {
    /// Create an empty, uninitialised database stored under `db_path`
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            initialized: false,
            schema: Schema::default(),
            project_info: ProjectInfo::default(),
            db_path: db_path.into(),
        }
    }

    /// Create an initialised database from an existing schema
    pub fn with_schema(db_path: impl Into<PathBuf>, schema: Schema) -> Self {
        Self {
            initialized: true,
            schema,
            ..Self::new(db_path)
        }
    }

    /// Directory holding `db.json`
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn db_file_path(&self) -> PathBuf {
        self.db_path.join(DB_FILE_NAME)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Parse a `.proto` file and replace the in-memory schema with it
    ///
    /// On failure the previous state is kept untouched.
    pub fn initialize(&mut self, proto_path: &Path) -> Result<()> {
        let schema = micro_cli_parser::parse_proto_file(proto_path)?;
        log::debug!(
            "Parsed {}: service `{}` with {} rpcs, {} messages, {} enums",
            proto_path.display(),
            schema.service.name,
            schema.service.rpcs.len(),
            schema.messages.len(),
            schema.enums.len()
        );
        self.schema = schema;
        self.initialized = true;
        Ok(())
    }

    /// Load `db.json` from disk
    pub fn load(&mut self) -> Result<()> {
        let document = self.read_document()?.ok_or_else(|| {
            MicroError::NotInitialized(format!(
                "{} does not exist, run `micro-cli project` first",
                self.db_file_path().display()
            ))
        })?;

        self.schema = document.schema;
        self.project_info = document.project_info.unwrap_or_default();
        self.initialized = true;
        Ok(())
    }

    /// Write `db.json`, creating its directory when missing
    ///
    /// [`SaveMode::Checked`] requires a package name, a named service with
    /// at least one RPC, and carries over the `project_info` of an existing
    /// `db.json`.
    pub fn save(&mut self, mode: SaveMode) -> Result<()> {
        if mode == SaveMode::Checked {
            self.validate()?;
            if let Some(previous) = self.read_document()? {
                if let Some(project_info) = previous.project_info {
                    self.project_info = project_info;
                }
            }
        }

        fs::create_dir_all(&self.db_path)?;
        let body = serde_json::to_string_pretty(&DocumentRef {
            schema: &self.schema,
            project_info: &self.project_info,
        })?;
        fs::write(self.db_file_path(), body)?;

        log::debug!("Saved {}", self.db_file_path().display());
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.schema.package_name.is_empty() {
            return Err(MicroError::Validation("package name is empty".into()));
        }
        if self.schema.service.name.is_empty() {
            return Err(MicroError::Validation(
                "service name is empty, no rpc service is defined".into(),
            ));
        }
        if self.schema.service.rpcs.is_empty() {
            return Err(MicroError::Validation(format!(
                "service `{}` defines no rpc",
                self.schema.service.name
            )));
        }
        Ok(())
    }

    fn read_document(&self) -> Result<Option<Document>> {
        let path = self.db_file_path();
        if !path.try_exists()? {
            return Ok(None);
        }
        let body = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(MicroError::NotInitialized(format!(
                "database at {} has not been loaded",
                self.db_path.display()
            )))
        }
    }

    pub fn schema(&self) -> Result<&Schema> {
        self.ensure_initialized()?;
        Ok(&self.schema)
    }

    pub fn service(&self) -> Result<&Service> {
        Ok(&self.schema()?.service)
    }

    pub fn messages(&self) -> Result<&[Message]> {
        Ok(&self.schema()?.messages)
    }

    pub fn enums(&self) -> Result<&[Enum]> {
        Ok(&self.schema()?.enums)
    }

    pub fn package_name(&self) -> Result<&str> {
        Ok(&self.schema()?.package_name)
    }

    /// Service serialised as compact JSON
    pub fn service_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self.service()?)?)
    }

    /// Check whether the service already has an RPC with this name
    ///
    /// Names are compared after Pascal-case normalisation, so `get_user`
    /// and `GetUser` are the same RPC.
    pub fn has_rpc(&self, name: &str) -> Result<bool> {
        Ok(self.service()?.rpc(name).is_some())
    }

    pub fn find_message_by_name(&self, name: &str) -> Result<Option<&Message>> {
        Ok(self.schema()?.message(name))
    }

    pub fn find_enum_by_name(&self, name: &str) -> Result<Option<&Enum>> {
        Ok(self.schema()?.enumeration(name))
    }

    /// Line after which the next `rpc` declaration goes
    pub fn rpc_anchor_line(&self) -> Result<usize> {
        let service = self.service()?;
        service.insertion_anchor().ok_or_else(|| {
            MicroError::MissingAnchor(format!(
                "service `{}` has no recorded source position",
                service.name
            ))
        })
    }

    pub fn project_info(&self) -> &ProjectInfo {
        &self.project_info
    }

    pub fn set_project_info(&mut self, project_info: ProjectInfo) {
        self.project_info = project_info;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use micro_cli_common::{Position, Rpc};
    use tempfile::TempDir;

    fn schema_with_rpc() -> Schema {
        Schema {
            package_name: "demo".into(),
            service: Service {
                name: "Demo".into(),
                rpcs: vec![Rpc {
                    name: "Echo".into(),
                    position: Position {
                        line: 5,
                        column: 5,
                        offset: 60,
                        end_line: 5,
                    },
                    ..Default::default()
                }],
                position: Position {
                    line: 4,
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_queries_require_initialisation() {
        let db = ProjectDatabase::new("/tmp/unused");
        assert!(matches!(db.has_rpc("Echo"), Err(MicroError::NotInitialized(_))));
        assert!(matches!(
            db.find_message_by_name("Ping"),
            Err(MicroError::NotInitialized(_))
        ));
        assert!(matches!(
            db.find_enum_by_name("Color"),
            Err(MicroError::NotInitialized(_))
        ));
        assert!(matches!(db.rpc_anchor_line(), Err(MicroError::NotInitialized(_))));
    }

    #[test]
    fn test_anchor_line() {
        let db = ProjectDatabase::with_schema("/tmp/unused", schema_with_rpc());
        assert_eq!(db.rpc_anchor_line().unwrap(), 5);

        let db = ProjectDatabase::with_schema("/tmp/unused", Schema::default());
        assert!(matches!(db.rpc_anchor_line(), Err(MicroError::MissingAnchor(_))));
    }

    #[test]
    fn test_document_layout() {
        let dir = TempDir::new().unwrap();
        let mut db = ProjectDatabase::with_schema(dir.path(), schema_with_rpc());
        db.save(SaveMode::Unchecked).unwrap();

        let body = fs::read_to_string(db.db_file_path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        for key in [
            "service",
            "messages",
            "enums",
            "package_name",
            "package_comment",
            "project_info",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(json["service"]["rpcs"][0]["name"], "Echo");
        assert_eq!(json["service"]["rpcs"][0]["position"]["line"], 5);
    }

    #[test]
    fn test_load_tolerates_null_project_info() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(DB_FILE_NAME),
            r#"{"service":{"name":"Demo","rpcs":[],"comment":""},"messages":[],"enums":[],
               "package_name":"demo","package_comment":"","project_info":null}"#,
        )
        .unwrap();

        let mut db = ProjectDatabase::new(dir.path());
        db.load().unwrap();
        assert_eq!(db.project_info(), &ProjectInfo::default());
        assert_eq!(db.package_name().unwrap(), "demo");
        assert!(!db.service().unwrap().position.is_known());
    }
}

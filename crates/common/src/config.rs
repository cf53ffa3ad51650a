//! Resolved path configuration
//!
//! Defaults come from command-line flags, then environment variables, then
//! built-in values. They are resolved once, at the CLI boundary, and the
//! resulting [`Config`] is passed down to everything that touches the disk.

use crate::case::without_hyphens;
use crate::{MicroError, Result};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default parent of generated services, relative to `$GOPATH/src`
pub const DEFAULT_ROOT_PATH: &str = "github.com/micro-kit";

/// Default client library location, relative to `$GOPATH/src`
pub const DEFAULT_CLIENT_ROOT_PATH: &str = "github.com/micro-kit/microkit-client";

/// Name of the per-project metadata directory
pub const DB_DIR_NAME: &str = ".micro-db";

/// Category of an RPC method: served to the admin backend or to clients
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RpcKind {
    Admin,
    #[default]
    Foreground,
}

impl RpcKind {
    /// File stem shared by the proto file and the service implementation
    pub fn file_stem(&self) -> &'static str {
        match self {
            RpcKind::Admin => "admin",
            RpcKind::Foreground => "foreground",
        }
    }

    /// Implementation type name used in generated code
    pub fn type_name(&self) -> &'static str {
        match self {
            RpcKind::Admin => "Admin",
            RpcKind::Foreground => "Foreground",
        }
    }
}

impl fmt::Display for RpcKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_stem())
    }
}

impl FromStr for RpcKind {
    type Err = MicroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(RpcKind::Admin),
            "foreground" => Ok(RpcKind::Foreground),
            other => Err(MicroError::usage(format!(
                "rpc type must be admin | foreground, got `{other}`"
            ))),
        }
    }
}

/// Where projects and client libraries live on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub gopath: PathBuf,
    pub root_path: String,
    pub client_root_path: String,
}

impl Config {
    pub fn new(
        gopath: impl Into<PathBuf>,
        root_path: impl AsRef<str>,
        client_root_path: impl AsRef<str>,
    ) -> Self {
        Self {
            gopath: gopath.into(),
            root_path: root_path.as_ref().trim_end_matches('/').to_string(),
            client_root_path: client_root_path.as_ref().trim_end_matches('/').to_string(),
        }
    }

    /// Resolve flags against `ROOT_PATH`, `MICROKIT_CLIENT_ROOT` and `GOPATH`
    pub fn resolve(root_path: Option<&str>, client_root_path: Option<&str>) -> Self {
        let root = non_empty(root_path)
            .or_else(|| env_var("ROOT_PATH"))
            .unwrap_or_else(|| DEFAULT_ROOT_PATH.to_string());
        let client_root = non_empty(client_root_path)
            .or_else(|| env_var("MICROKIT_CLIENT_ROOT"))
            .unwrap_or_else(|| DEFAULT_CLIENT_ROOT_PATH.to_string());

        Self::new(default_gopath(), root, client_root)
    }

    /// Resolve like [`Config::resolve`], after loading the service's
    /// `.micro-db/.env` file when one exists
    ///
    /// Variables already present in the environment are not overridden.
    pub fn resolve_for_service(
        service: &str,
        root_path: Option<&str>,
        client_root_path: Option<&str>,
    ) -> Self {
        let env_file = Self::resolve(root_path, client_root_path).env_file(service);
        if env_file.is_file() {
            match dotenv::from_path(&env_file) {
                Ok(()) => log::debug!("Loaded environment from {}", env_file.display()),
                Err(e) => log::warn!("Failed to load {}: {}", env_file.display(), e),
            }
        }
        Self::resolve(root_path, client_root_path)
    }

    fn src_dir(&self) -> PathBuf {
        self.gopath.join("src")
    }

    /// `<gopath>/src/<root>/<service>-service`
    pub fn project_dir(&self, service: &str) -> PathBuf {
        join_relative(&self.src_dir(), &self.root_path).join(format!("{service}-service"))
    }

    /// Directory holding `db.json` for a service
    pub fn db_dir(&self, service: &str) -> PathBuf {
        self.project_dir(service).join(DB_DIR_NAME)
    }

    pub fn env_file(&self, service: &str) -> PathBuf {
        self.db_dir(service).join(".env")
    }

    /// Root of the shared client library
    pub fn client_dir(&self) -> PathBuf {
        join_relative(&self.src_dir(), &self.client_root_path)
    }

    /// Directory with the service's proto files and `gen.sh`
    pub fn proto_dir(&self, service: &str) -> PathBuf {
        self.client_dir()
            .join("proto")
            .join(format!("{}pb", without_hyphens(service)))
    }

    pub fn proto_file(&self, service: &str, kind: RpcKind) -> PathBuf {
        self.proto_dir(service)
            .join(format!("{}.proto", kind.file_stem()))
    }

    /// Generated service implementation that RPC stubs are appended to
    pub fn service_file(&self, service: &str, kind: RpcKind) -> PathBuf {
        self.project_dir(service)
            .join("program")
            .join("services")
            .join(format!("{}.go", kind.file_stem()))
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn env_var(key: &str) -> Option<String> {
    non_empty(env::var(key).ok().as_deref())
}

fn default_gopath() -> PathBuf {
    env_var("GOPATH")
        .map(PathBuf::from)
        .or_else(|| env_var("HOME").map(|home| Path::new(&home).join("go")))
        .unwrap_or_else(|| PathBuf::from("go"))
}

fn join_relative(base: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|part| !part.is_empty())
        .fold(base.to_path_buf(), |path, part| path.join(part))
}

//! New project scaffolding
//!
//! A project consists of two trees: the microservice itself under
//! `<gopath>/src/<root>/<name>-service`, and the service's entry in the shared
//! client library under `<gopath>/src/<croot>` (client constructors plus the
//! proto files and their `gen.sh`). Once both are written, the rendered
//! `foreground.proto` is parsed and stored as the project's `db.json`.

use crate::insert::TemplateRenderer;
use crate::params::ProjectParams;
use crate::templates::CLIENT_ROOT_README;
use micro_cli_common::case::without_hyphens;
use micro_cli_common::{Config, MicroError, ProjectInfo, Result, RpcKind};
use micro_cli_database::{ProjectDatabase, SaveMode};
use std::fs;
use std::path::Path;

/// Microservice templates and their paths relative to the project directory
const MICROSERVICE_FILES: &[(&str, &str)] = &[
    ("microservice/main.go", "main.go"),
    ("microservice/program/program.go", "program/program.go"),
    ("microservice/program/services/base.go", "program/services/base.go"),
    (
        "microservice/program/services/foreground.go",
        "program/services/foreground.go",
    ),
    ("microservice/program/services/admin.go", "program/services/admin.go"),
    ("microservice/test/main_test.go", "test/main_test.go"),
    ("microservice/README.md", "README.md"),
];

const CLIENT_FILES: &[(&str, &str)] = &[
    ("client/client/foreground.go", "foreground.go"),
    ("client/client/admin.go", "admin.go"),
    ("client/client/README.md", "README.md"),
];

const PROTO_FILES: &[(&str, &str)] = &[
    ("client/proto/foreground.proto", "foreground.proto"),
    ("client/proto/admin.proto", "admin.proto"),
    ("client/proto/gen.sh", "gen.sh"),
    ("client/proto/README.md", "README.md"),
];

/// Creates new microservice projects
pub struct ProjectScaffolder {
    config: Config,
    renderer: TemplateRenderer,
}

impl ProjectScaffolder {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            config,
            renderer: TemplateRenderer::new()?,
        })
    }

    /// Scaffold project `name` and return its freshly saved database
    ///
    /// The project directory must be missing or empty.
    pub fn create(&self, name: &str, description: &str) -> Result<ProjectDatabase> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MicroError::usage("service name is required"));
        }

        let project_dir = self.config.project_dir(name);
        ensure_empty_dir(&project_dir)?;
        log::info!("Creating project in {}", project_dir.display());

        let params = ProjectParams::new(name, description, &self.config);
        self.write_microservice(&project_dir, &params)?;
        self.write_client(name, &params)?;

        let mut db = ProjectDatabase::new(self.config.db_dir(name));
        db.initialize(&self.config.proto_file(name, RpcKind::Foreground))?;
        db.set_project_info(ProjectInfo {
            name: params.service_name.clone(),
            src_path: project_dir.display().to_string(),
            description: params.description.clone(),
        });
        db.save(SaveMode::Checked)?;

        Ok(db)
    }

    fn write_microservice(&self, project_dir: &Path, params: &ProjectParams) -> Result<()> {
        for (template, relative) in MICROSERVICE_FILES {
            self.renderer
                .write_file(template, params, &project_dir.join(relative))?;
        }
        let env_file = self.config.env_file(&params.base_service_name);
        self.renderer.write_file("microservice/env", params, &env_file)
    }

    fn write_client(&self, name: &str, params: &ProjectParams) -> Result<()> {
        let client_dir = self.config.client_dir();

        // Shared by every service, so an existing one is kept
        let readme = client_dir.join("README.md");
        if !readme.try_exists()? {
            self.renderer.write_file(CLIENT_ROOT_README, params, &readme)?;
        }

        let client_pkg_dir = client_dir.join("client").join(without_hyphens(name));
        for (template, file) in CLIENT_FILES {
            self.renderer
                .write_file(template, params, &client_pkg_dir.join(file))?;
        }

        let proto_dir = self.config.proto_dir(name);
        for (template, file) in PROTO_FILES {
            self.renderer
                .write_file(template, params, &proto_dir.join(file))?;
        }
        make_executable(&proto_dir.join("gen.sh"))
    }
}

fn ensure_empty_dir(dir: &Path) -> Result<()> {
    if !dir.try_exists()? {
        fs::create_dir_all(dir)?;
        return Ok(());
    }
    if fs::read_dir(dir)?.next().is_some() {
        return Err(MicroError::Validation(format!(
            "{} is not empty, run `project` in an empty directory",
            dir.display()
        )));
    }
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

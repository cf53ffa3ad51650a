//! Helm chart generation for an existing project

use crate::insert::TemplateRenderer;
use crate::params::HelmParams;
use crate::templates::{HELM_CHART, HELM_VALUES};
use micro_cli_common::{Config, MicroError, Result};
use micro_cli_database::ProjectDatabase;
use std::path::PathBuf;

/// Renders `deploy/helm/<name>-service` from a project's `db.json`
pub struct HelmGenerator {
    config: Config,
    renderer: TemplateRenderer,
}

impl HelmGenerator {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            config,
            renderer: TemplateRenderer::new()?,
        })
    }

    /// Write `Chart.yaml` and `values.yaml`, returning the chart directory
    ///
    /// Existing chart files are overwritten.
    pub fn generate(&self, name: &str) -> Result<PathBuf> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MicroError::usage("service name is required"));
        }

        let mut db = ProjectDatabase::new(self.config.db_dir(name));
        db.load()?;

        let rpcs = db
            .service()?
            .rpcs
            .iter()
            .map(|rpc| rpc.name.clone())
            .collect();
        let params = HelmParams::new(name, &db.project_info().description, rpcs, &self.config);

        let chart_dir = self
            .config
            .project_dir(name)
            .join("deploy")
            .join("helm")
            .join(&params.chart_name);
        self.renderer
            .write_file(HELM_CHART, &params, &chart_dir.join("Chart.yaml"))?;
        self.renderer
            .write_file(HELM_VALUES, &params, &chart_dir.join("values.yaml"))?;

        log::info!("Wrote helm chart {}", chart_dir.display());
        Ok(chart_dir)
    }
}

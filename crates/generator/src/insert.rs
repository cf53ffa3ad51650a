//! Rendering templates into new or existing files

use crate::templates;
use micro_cli_common::{MicroError, Result};
use serde::Serialize;
use std::error::Error as _;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tera::{Context, Tera};

/// Where rendered text goes in an existing file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// End of file, after a blank line; the file is created when missing
    Append,
    /// After the given 1-based line (0 puts the block first)
    SpliceAfter(usize),
}

/// Renders the embedded templates with typed parameters
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            tera: templates::load_templates()?,
        })
    }

    /// Render a template to a string
    pub fn render<P: Serialize>(&self, template: &str, params: &P) -> Result<String> {
        let context = Context::from_serialize(params)
            .map_err(|e| template_error(template, &e))?;
        self.tera
            .render(template, &context)
            .map_err(|e| template_error(template, &e))
    }

    /// Render a template and write it as a whole new file, creating parent
    /// directories as needed
    pub fn write_file<P: Serialize>(
        &self,
        template: &str,
        params: &P,
        target: &Path,
    ) -> Result<()> {
        let rendered = self.render(template, params)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, rendered)?;
        log::debug!("Wrote {}", target.display());
        Ok(())
    }

    /// Render a template and place it into `target`
    pub fn insert<P: Serialize>(
        &self,
        template: &str,
        params: &P,
        target: &Path,
        placement: Placement,
    ) -> Result<()> {
        let rendered = self.render(template, params)?;
        match placement {
            Placement::Append => append_block(target, &rendered),
            Placement::SpliceAfter(line) => splice_block(target, line, &rendered),
        }
    }
}

/// Append `block` to `path` behind a newline, never truncating the file
pub fn append_block(path: &Path, block: &str) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(b"\n")?;
    file.write_all(block.as_bytes())?;
    log::debug!("Appended {} bytes to {}", block.len() + 1, path.display());
    Ok(())
}

/// Insert `block` after line `line` of `path` and rewrite the file
///
/// Surrounding newlines of the block are dropped so it occupies exactly its
/// own lines.
pub fn splice_block(path: &Path, line: usize, block: &str) -> Result<()> {
    let body = fs::read_to_string(path)?;
    let mut lines: Vec<&str> = body.split('\n').collect();
    if line > lines.len() {
        return Err(MicroError::MissingAnchor(format!(
            "line {} is past the end of {} ({} lines)",
            line,
            path.display(),
            lines.len()
        )));
    }

    lines.insert(line, block.trim_matches('\n'));
    fs::write(path, lines.join("\n"))?;
    log::debug!("Spliced block after line {} of {}", line, path.display());
    Ok(())
}

/// Flatten a tera error and all of its sources into one message
fn template_error(template: &str, err: &tera::Error) -> MicroError {
    let mut message = format!("{}: {}", template, err);
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(&format!(": {}", cause));
        source = cause.source();
    }
    MicroError::Template(message)
}

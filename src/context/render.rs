//! Response body rendering.
//!
//! # Responsibilities
//! - Own the template set, loaded once at startup
//! - Serialize values as JSON, XML or rendered templates
//!
//! # Design Decisions
//! - Templates are compiled before serving begins and shared read-only via
//!   `Arc`, so lookups need no locking
//! - The template root may double as the static root: a file there that
//!   does not compile is skipped with a warning, and its error is only
//!   reported if that name is rendered
//! - Rendering never touches the response; the context decides what to write

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use minijinja::Environment;
use serde::Serialize;
use thiserror::Error;

/// Failure producing a response body.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML encoding failed: {0}")]
    Xml(String),

    #[error("template rendering failed: {0}")]
    Template(#[from] minijinja::Error),

    #[error("template {name} was skipped at load: {reason}")]
    Skipped { name: String, reason: String },
}

/// Failure loading the template directory.
#[derive(Debug, Error)]
pub enum TemplateLoadError {
    #[error("failed to read template {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to compile template {name}: {source}")]
    Syntax {
        name: String,
        #[source]
        source: minijinja::Error,
    },
}

/// Compiled templates, keyed by their path relative to the template root.
pub struct Templates {
    env: Environment<'static>,
    skipped: BTreeMap<String, String>,
}

impl Default for Templates {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Templates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Templates")
            .field("names", &self.names())
            .field("skipped", &self.skipped.keys())
            .finish()
    }
}

impl Templates {
    /// An empty template set.
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
            skipped: BTreeMap::new(),
        }
    }

    /// Compile every file below `root`. A missing root yields an empty set.
    pub fn load_dir(root: &Path) -> Result<Self, TemplateLoadError> {
        let mut templates = Self::new();
        if !root.is_dir() {
            tracing::warn!(root = %root.display(), "Template root not found, no templates loaded");
            return Ok(templates);
        }
        templates.load_recursive(root, root)?;
        tracing::info!(
            root = %root.display(),
            count = templates.names().len(),
            skipped = templates.skipped.len(),
            "Templates loaded"
        );
        Ok(templates)
    }

    fn load_recursive(&mut self, root: &Path, dir: &Path) -> Result<(), TemplateLoadError> {
        let io_err = |path: &Path| {
            let path = path.display().to_string();
            move |source| TemplateLoadError::Io { path, source }
        };

        for entry in fs::read_dir(dir).map_err(io_err(dir))? {
            let path = entry.map_err(io_err(dir))?.path();
            if path.is_dir() {
                self.load_recursive(root, &path)?;
                continue;
            }
            if !is_template(&path) {
                continue;
            }

            let name = path
                .strip_prefix(root)
                .unwrap_or(path.as_path())
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let source = match fs::read_to_string(&path) {
                Ok(source) => source,
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    tracing::warn!(template = %name, "Skipping template that is not UTF-8");
                    self.skipped.insert(name, e.to_string());
                    continue;
                }
                Err(e) => return Err(io_err(&path)(e)),
            };
            match self.add(name.clone(), source) {
                Ok(()) => {}
                Err(TemplateLoadError::Syntax { source, .. }) => {
                    tracing::warn!(
                        template = %name,
                        error = %source,
                        "Skipping template that does not compile"
                    );
                    self.skipped.insert(name, source.to_string());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Compile and register a single template.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<(), TemplateLoadError> {
        let name = name.into();
        self.env
            .add_template_owned(name.clone(), source.into())
            .map_err(|source| TemplateLoadError::Syntax { name, source })
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.env.templates().map(|(n, _)| n.to_string()).collect();
        names.sort();
        names
    }

    pub fn render<S: Serialize>(&self, name: &str, value: S) -> Result<String, RenderError> {
        if let Some(reason) = self.skipped.get(name) {
            return Err(RenderError::Skipped {
                name: name.to_string(),
                reason: reason.clone(),
            });
        }
        let template = self.env.get_template(name)?;
        Ok(template.render(value)?)
    }
}

/// Only markup and text files are compiled; assets sharing the directory are skipped.
fn is_template(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("html" | "htm" | "xml" | "txt" | "j2")
    )
}

pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, RenderError> {
    let mut body = serde_json::to_vec(value)?;
    body.push(b'\n');
    Ok(body)
}

pub(crate) fn to_xml<T: Serialize + ?Sized>(value: &T) -> Result<String, RenderError> {
    quick_xml::se::to_string(value).map_err(|e| RenderError::Xml(e.to_string()))
}

//! View rendering.
//!
//! The kernel only knows the [`ViewEngine`] contract: render a named template
//! with a JSON payload. [`JinjaViewEngine`] implements it with `minijinja`,
//! loading templates from the application's views directory.

use minijinja::{Environment, ErrorKind};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Why a template could not be rendered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("template could not be loaded: {reason}")]
    Load { reason: String },

    #[error("template has a syntax error: {reason}")]
    Syntax { reason: String },

    #[error("template failed while rendering: {reason}")]
    Runtime { reason: String },
}

impl RenderError {
    pub fn load<S: ToString>(str: S) -> Self {
        Self::Load { reason: str.to_string() }
    }

    pub fn syntax<S: ToString>(str: S) -> Self {
        Self::Syntax { reason: str.to_string() }
    }

    pub fn runtime<S: ToString>(str: S) -> Self {
        Self::Runtime { reason: str.to_string() }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait ViewEngine: Send + Sync {
    /// Renders `template` (a file name relative to the views directory) with `data`.
    ///
    /// # Errors
    /// See [`RenderError`].
    fn render(&self, template: &str, data: &Value) -> Result<String, RenderError>;
}

/// A [`ViewEngine`] backed by `minijinja`.
///
/// Templates are read from disk the first time they are used and kept in
/// memory afterwards.
pub struct JinjaViewEngine {
    env: Environment<'static>,
}

impl JinjaViewEngine {
    pub fn new(views_path: impl AsRef<Path>) -> Self {
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(views_path.as_ref().to_path_buf()));
        Self { env }
    }

    /// Wraps an already configured environment, e.g. one with custom filters.
    pub fn with_environment(env: Environment<'static>) -> Self {
        Self { env }
    }
}

impl ViewEngine for JinjaViewEngine {
    fn render(&self, template: &str, data: &Value) -> Result<String, RenderError> {
        let compiled = self.env.get_template(template).map_err(|e| match e.kind() {
            ErrorKind::SyntaxError | ErrorKind::BadEscape => RenderError::syntax(e),
            _ => RenderError::load(e),
        })?;

        debug!(template, "rendering view");
        compiled.render(data).map_err(RenderError::runtime)
    }
}

impl fmt::Debug for JinjaViewEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JinjaViewEngine").finish_non_exhaustive()
    }
}

//! Error kinds raised while building and running the kernel.
//!
//! Every failure that can reach the client is a [`KernelError`]. Its
//! [`status`](KernelError::status) decides the HTTP status of the converted
//! response and its `Display` output becomes the response body.

use crate::view::RenderError;
use http::StatusCode;
use std::borrow::Cow;
use thiserror::Error;

/// Errors raised while compiling a path pattern into a route matcher.
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("invalid path pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("path pattern '{pattern}' declares placeholder '{name}' more than once")]
    DuplicateParameter { pattern: String, name: String },

    #[error("path pattern '{pattern}' contains a malformed placeholder")]
    MalformedPlaceholder { pattern: String },
}

impl RouteError {
    pub fn duplicate_parameter<P: ToString, N: ToString>(pattern: P, name: N) -> Self {
        Self::DuplicateParameter { pattern: pattern.to_string(), name: name.to_string() }
    }

    pub fn malformed_placeholder<P: ToString>(pattern: P) -> Self {
        Self::MalformedPlaceholder { pattern: pattern.to_string() }
    }
}

/// Why a controller function could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerNotFoundCause {
    /// the namespaced class identifier names no registered controller
    Class,
    /// the class exists but does not expose the requested method
    Method,
}

/// A fault raised by application code inside a controller.
///
/// The kernel does not interpret faults: the carried status and message are
/// turned into the response as they are.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct Fault {
    status: StatusCode,
    message: Cow<'static, str>,
}

impl Fault {
    pub fn new(status: StatusCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Every way a request can fail once it entered the kernel.
#[derive(Error, Debug)]
pub enum KernelError {
    #[error("A suitable route could not be found")]
    RouteNotFound,

    #[error("The controller function {function} was not found")]
    ControllerNotFound { function: String, cause: ControllerNotFoundCause },

    #[error("The redirect target route '{name}' is not registered")]
    RedirectTargetNotFound { name: String },

    #[error("The view '{view}' could not be rendered")]
    Render {
        view: String,
        #[source]
        source: RenderError,
    },

    #[error("invalid response header: {reason}")]
    InvalidHeader { reason: String },

    #[error(transparent)]
    Application(#[from] Fault),
}

impl KernelError {
    pub fn controller_not_found<F: ToString>(function: F, cause: ControllerNotFoundCause) -> Self {
        Self::ControllerNotFound { function: function.to_string(), cause }
    }

    pub fn redirect_target_not_found<N: ToString>(name: N) -> Self {
        Self::RedirectTargetNotFound { name: name.to_string() }
    }

    pub fn render<V: ToString>(view: V, source: RenderError) -> Self {
        Self::Render { view: view.to_string(), source }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    /// The HTTP status the converted response carries.
    pub fn status(&self) -> StatusCode {
        match self {
            KernelError::RouteNotFound | KernelError::ControllerNotFound { .. } => StatusCode::NOT_FOUND,
            KernelError::RedirectTargetNotFound { .. }
            | KernelError::Render { .. }
            | KernelError::InvalidHeader { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            KernelError::Application(fault) => fault.status(),
        }
    }
}

/// Errors from the named service lookup on the application context.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ServiceError {
    #[error("service '{name}' is not registered")]
    NotFound { name: String },

    #[error("service '{name}' is registered with a different type")]
    TypeMismatch { name: String },
}

/// Errors raised while assembling a kernel.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("application must be set")]
    MissingApplication,

    #[error("route registration failed: {source}")]
    Route {
        #[from]
        source: RouteError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_kinds_map_to_404() {
        assert_eq!(KernelError::RouteNotFound.status(), StatusCode::NOT_FOUND);
        let err = KernelError::controller_not_found("ItemController::action", ControllerNotFoundCause::Method);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "The controller function ItemController::action was not found");
    }

    #[test]
    fn application_fault_keeps_its_status_and_message() {
        let err = KernelError::from(Fault::new(StatusCode::CONFLICT, "item already exists"));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "item already exists");
    }

    #[test]
    fn render_failure_is_server_error() {
        let err = KernelError::render("home", RenderError::load("home.html missing"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

//! The request lifecycle.
//!
//! [`Kernel::handle_request`] takes a request through
//! routing, parameter binding, controller resolution, invocation and response
//! emission. Every failure on the way is a [`KernelError`]; [`Kernel::handle`]
//! converts it into a plain text response through [`Kernel::handle_exception`].
//!
//! Responses are fully prepared before anything is written: templates are
//! rendered and redirect targets resolved first, so a failure never leaves a
//! half emitted response behind.

use crate::application::{Application, Bootstrap};
use crate::controller::{ControllerFunction, Instance};
use crate::error::{BuildError, ControllerNotFoundCause, KernelError, RouteError};
use crate::request::Request;
use crate::response::{Response, ResponseKind};
use crate::route::Route;
use crate::router::Router;
use crate::view::{JinjaViewEngine, ViewEngine};
use crate::writer::{HttpResponseWriter, ResponseWriter};
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HOST, LOCATION};
use http::{HeaderName, HeaderValue, StatusCode};
use mime::Mime;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{Instrument, debug, error, info_span, warn};

/// Kernel settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// appended to a view name to form the template file name
    pub template_suffix: String,
    /// when set, a route only matches requests using the method it was registered for
    pub method_aware: bool,
    /// root URL for requests that carry no `Host` header
    pub default_root_url: String,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self { template_suffix: ".html".into(), method_aware: false, default_root_url: "http://localhost".into() }
    }
}

pub struct Kernel {
    router: Router,
    app: Arc<Application>,
    view_engine: Box<dyn ViewEngine>,
    controllers: HashMap<String, OnceCell<Instance>>,
    config: KernelConfig,
}

impl Kernel {
    pub fn builder() -> KernelBuilder {
        KernelBuilder::new()
    }

    /// Boots `bootstrap` into an application, registers its routes and builds the kernel.
    ///
    /// Views are rendered with a [`JinjaViewEngine`] over the application's views path.
    ///
    /// # Errors
    /// Fails when a route pattern does not compile.
    pub fn bootstrap<B: Bootstrap>(bootstrap: &B, config: KernelConfig) -> Result<Self, BuildError> {
        let mut app = Application::builder();
        bootstrap.boot(&mut app);

        let mut router = Router::new();
        bootstrap.register_routes(&mut router)?;

        Self::builder().application(app.build()).router(router).config(config).build()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn application(&self) -> &Arc<Application> {
        &self.app
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Runs the whole lifecycle and converts any failure into a response.
    pub async fn handle<W: ResponseWriter>(&self, request: Request, writer: &mut W) {
        if let Err(e) = self.handle_request(request, writer).await {
            self.handle_exception(&e, writer);
        }
    }

    /// Routes `request`, invokes its controller and emits the response on `writer`.
    ///
    /// # Errors
    /// Returns the failure without emitting anything, see [`KernelError`].
    pub async fn handle_request<W: ResponseWriter>(&self, request: Request, writer: &mut W) -> Result<(), KernelError> {
        let span = info_span!("request", method = %request.method(), path = %request.path());
        self.process(request, writer).instrument(span).await
    }

    async fn process<W: ResponseWriter>(&self, mut request: Request, writer: &mut W) -> Result<(), KernelError> {
        let (route, values) = self.find_route(&request).ok_or_else(|| {
            warn!("no route matches");
            KernelError::RouteNotFound
        })?;
        debug!(%route, "route matched");

        let values = values.into_iter().map(str::to_string).collect::<Vec<_>>();
        for (name, value) in route.parameters().iter().zip(values) {
            request.set_parameter(name.as_str(), value);
        }

        let function = route.controller_function();
        let instance = self.controller_instance(function)?;

        let root_url = request.root_url().to_string();
        let response = function.invoke(&self.app, instance, request).await.ok_or_else(|| {
            warn!(%function, "controller has no such method");
            KernelError::controller_not_found(function, ControllerNotFoundCause::Method)
        })??;

        self.handle_response(response, &root_url, writer)
    }

    fn find_route<'p>(&self, request: &'p Request) -> Option<(&Route, Vec<&'p str>)> {
        let method = self.config.method_aware.then(|| request.method());
        self.router.match_captures(method, request.path())
    }

    /// Returns the cached instance of the function's controller class, creating it on first use.
    fn controller_instance(&self, function: &ControllerFunction) -> Result<Instance, KernelError> {
        let not_found = || {
            warn!(%function, "controller class not found");
            KernelError::controller_not_found(function, ControllerNotFoundCause::Class)
        };

        let class = function.resolve_class(&self.app).ok_or_else(not_found)?;
        let controller_type = self.app.controllers().get(&class).ok_or_else(not_found)?;
        let cell = self.controllers.get(&class).ok_or_else(not_found)?;

        let instance = cell.get_or_init(|| {
            debug!(%class, "instantiating controller");
            controller_type.instantiate(&self.app)
        });
        Ok(Arc::clone(instance))
    }

    /// Converts `error` into a plain text response, emits it and returns it.
    ///
    /// The error message becomes the response body as it is, including messages
    /// of application faults.
    pub fn handle_exception<W: ResponseWriter>(&self, error: &KernelError, writer: &mut W) -> Response {
        let status = error.status();
        if status.is_server_error() {
            error!(cause = %error, status = status.as_u16(), "request failed");
        } else {
            warn!(cause = %error, status = status.as_u16(), "request failed");
        }

        let response = Response::plain(status, error.to_string());
        if let Err(e) = self.handle_response(response.clone(), &self.config.default_root_url, writer) {
            error!(cause = %e, "failed to emit error response");
        }
        response
    }

    fn handle_response<W: ResponseWriter>(
        &self,
        response: Response,
        root_url: &str,
        writer: &mut W,
    ) -> Result<(), KernelError> {
        let (status, content_type, headers, kind) = response.into_parts();

        match kind {
            ResponseKind::Redirect { route, parameters } => {
                let location = self.redirect_location(&route, &parameters, root_url)?;
                writer.status(status);
                writer.header(LOCATION, location);
                writer.finish();
            }
            ResponseKind::Render { view, data } => {
                let template = format!("{view}{}", self.config.template_suffix);
                let html = self.view_engine.render(&template, &data).map_err(|e| KernelError::render(&view, e))?;
                emit_head(status, &content_type, headers, writer)?;
                writer.write(Bytes::from(html));
                writer.finish();
            }
            ResponseKind::Content(body) => {
                emit_head(status, &content_type, headers, writer)?;
                writer.write(body);
                writer.finish();
            }
        }
        Ok(())
    }

    fn redirect_location(
        &self,
        name: &str,
        parameters: &[(String, String)],
        root_url: &str,
    ) -> Result<HeaderValue, KernelError> {
        let target = self.router.find_by_name(name).ok_or_else(|| KernelError::redirect_target_not_found(name))?;
        let path = target.pattern().substitute(parameters.iter().map(|(key, value)| (key, value)));
        HeaderValue::try_from(format!("{root_url}{path}")).map_err(KernelError::invalid_header)
    }

    /// Hosts the kernel on `http` types: converts the request, runs the lifecycle
    /// and returns the emitted response.
    ///
    /// The root URL is taken from the `Host` header, or [`KernelConfig::default_root_url`].
    pub async fn dispatch(&self, request: http::Request<Bytes>) -> http::Response<Bytes> {
        let root_url = match request.headers().get(HOST).and_then(|host| host.to_str().ok()) {
            Some(host) => format!("{}://{host}", request.uri().scheme_str().unwrap_or("http")),
            None => self.config.default_root_url.clone(),
        };

        let mut writer = HttpResponseWriter::new();
        self.handle(Request::from_http(request, root_url), &mut writer).await;
        writer.into_response()
    }
}

/// Emits the status, a single `Content-Type` and the extra headers.
///
/// A `Content-Type` among the extra headers overrides the response's content type,
/// the last one wins. Other headers are appended in declaration order.
fn emit_head<W: ResponseWriter>(
    status: StatusCode,
    content_type: &Mime,
    headers: Vec<(HeaderName, HeaderValue)>,
    writer: &mut W,
) -> Result<(), KernelError> {
    let content_type = match headers.iter().rev().find(|(name, _)| name == CONTENT_TYPE) {
        Some((_, value)) => value.clone(),
        None => HeaderValue::from_str(content_type.as_ref()).map_err(KernelError::invalid_header)?,
    };
    writer.status(status);
    writer.header(CONTENT_TYPE, content_type);
    for (name, value) in headers.into_iter().filter(|(name, _)| name != CONTENT_TYPE) {
        writer.append_header(name, value);
    }
    Ok(())
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("router", &self.router)
            .field("app", &self.app)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

pub struct KernelBuilder {
    router: Router,
    route_error: Option<RouteError>,
    app: Option<Arc<Application>>,
    view_engine: Option<Box<dyn ViewEngine>>,
    config: KernelConfig,
}

impl KernelBuilder {
    fn new() -> Self {
        Self { router: Router::new(), route_error: None, app: None, view_engine: None, config: KernelConfig::default() }
    }

    #[must_use]
    pub fn application(mut self, app: impl Into<Arc<Application>>) -> Self {
        self.app = Some(app.into());
        self
    }

    /// Replaces the route table with `router`.
    #[must_use]
    pub fn router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    /// Registers routes on the route table; a failure is reported by [`build`](Self::build).
    #[must_use]
    pub fn routes<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut Router) -> Result<(), RouteError>,
    {
        if self.route_error.is_none() {
            self.route_error = f(&mut self.router).err();
        }
        self
    }

    #[must_use]
    pub fn view_engine(mut self, view_engine: impl ViewEngine + 'static) -> Self {
        self.view_engine = Some(Box::new(view_engine));
        self
    }

    #[must_use]
    pub fn config(mut self, config: KernelConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the kernel, defaulting to a [`JinjaViewEngine`] over the application's views path.
    ///
    /// # Errors
    /// Fails when no application was set or a route registration failed.
    pub fn build(self) -> Result<Kernel, BuildError> {
        if let Some(e) = self.route_error {
            return Err(e.into());
        }
        let app = self.app.ok_or(BuildError::MissingApplication)?;
        let view_engine = self.view_engine.unwrap_or_else(|| Box::new(JinjaViewEngine::new(app.views_path())));
        let controllers = app.controllers().identifiers().map(|id| (id.to_string(), OnceCell::new())).collect();

        Ok(Kernel { router: self.router, app, view_engine, controllers, config: self.config })
    }
}

impl fmt::Debug for KernelBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelBuilder")
            .field("router", &self.router)
            .field("app", &self.app)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

//! The application context handed to the kernel and to application aware controllers.
//!
//! An [`Application`] carries the controller namespace, the views location, a
//! set of named services and the registry of controller classes. It is
//! assembled once with an [`ApplicationBuilder`], usually from a [`Bootstrap`]
//! implementation, and is read-only afterwards.

use crate::controller::{ControllerClass, ControllerRegistry};
use crate::error::{RouteError, ServiceError};
use crate::router::Router;
use serde::Deserialize;
use std::any::Any;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const ENV_CONTROLLER_NAMESPACE: &str = "MVC_CONTROLLER_NAMESPACE";
pub const ENV_VIEWS_PATH: &str = "MVC_VIEWS_PATH";
pub const ENV_VIEWS_CACHE_PATH: &str = "MVC_VIEWS_CACHE_PATH";

/// Static application settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// prefix joined in front of every controller class identifier
    pub controller_namespace: String,
    pub views_path: PathBuf,
    /// where a view engine may keep compiled templates, if it supports that
    pub views_cache_path: Option<PathBuf>,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self { controller_namespace: String::new(), views_path: PathBuf::from("views"), views_cache_path: None }
    }
}

impl ApplicationConfig {
    /// Loads the settings from `MVC_*` environment variables, falling back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();
        Self {
            controller_namespace: lookup(ENV_CONTROLLER_NAMESPACE).unwrap_or(default.controller_namespace),
            views_path: lookup(ENV_VIEWS_PATH).map_or(default.views_path, PathBuf::from),
            views_cache_path: lookup(ENV_VIEWS_CACHE_PATH).map(PathBuf::from).or(default.views_cache_path),
        }
    }
}

/// Named services shared with controllers.
#[derive(Default)]
pub struct Services {
    entries: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl Services {
    pub fn insert<T: Any + Send + Sync>(&mut self, name: impl Into<String>, service: T) {
        self.entries.insert(name.into(), Arc::new(service));
    }

    /// Looks up service `name` as a `T`.
    ///
    /// # Errors
    /// [`ServiceError::NotFound`] when nothing is registered under `name`,
    /// [`ServiceError::TypeMismatch`] when the service has another type.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, ServiceError> {
        let service = self.entries.get(name).ok_or_else(|| ServiceError::NotFound { name: name.to_string() })?;
        Arc::clone(service).downcast::<T>().map_err(|_service| ServiceError::TypeMismatch { name: name.to_string() })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.entries.keys().collect::<Vec<_>>();
        names.sort();
        f.debug_struct("Services").field("names", &names).finish()
    }
}

/// The application context.
#[derive(Debug)]
pub struct Application {
    config: ApplicationConfig,
    services: Services,
    controllers: ControllerRegistry,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    pub fn controller_namespace(&self) -> &str {
        &self.config.controller_namespace
    }

    pub fn views_path(&self) -> &Path {
        &self.config.views_path
    }

    pub fn views_cache_path(&self) -> Option<&Path> {
        self.config.views_cache_path.as_deref()
    }

    /// Looks up a named service, see [`Services::get`].
    ///
    /// # Errors
    /// Fails when the service is missing or has another type.
    pub fn service<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, ServiceError> {
        self.services.get(name)
    }

    pub fn controllers(&self) -> &ControllerRegistry {
        &self.controllers
    }
}

pub struct ApplicationBuilder {
    config: ApplicationConfig,
    services: Services,
    controllers: ControllerRegistry,
}

impl ApplicationBuilder {
    fn new() -> Self {
        Self {
            config: ApplicationConfig::default(),
            services: Services::default(),
            controllers: ControllerRegistry::new(),
        }
    }

    #[must_use]
    pub fn config(mut self, config: ApplicationConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn controller_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.set_controller_namespace(namespace);
        self
    }

    #[must_use]
    pub fn views_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.set_views_path(path);
        self
    }

    #[must_use]
    pub fn views_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.set_views_cache_path(path);
        self
    }

    #[must_use]
    pub fn service<T: Any + Send + Sync>(mut self, name: impl Into<String>, service: T) -> Self {
        self.register_service(name, service);
        self
    }

    #[must_use]
    pub fn controller<C>(mut self, identifier: impl Into<String>, class: ControllerClass<C>) -> Self
    where
        C: Send + Sync + 'static,
    {
        self.register_controller(identifier, class);
        self
    }

    pub fn set_controller_namespace(&mut self, namespace: impl Into<String>) {
        self.config.controller_namespace = namespace.into();
    }

    pub fn set_views_path(&mut self, path: impl Into<PathBuf>) {
        self.config.views_path = path.into();
    }

    pub fn set_views_cache_path(&mut self, path: impl Into<PathBuf>) {
        self.config.views_cache_path = Some(path.into());
    }

    pub fn register_service<T: Any + Send + Sync>(&mut self, name: impl Into<String>, service: T) {
        self.services.insert(name, service);
    }

    pub fn register_controller<C>(&mut self, identifier: impl Into<String>, class: ControllerClass<C>)
    where
        C: Send + Sync + 'static,
    {
        self.controllers.register(identifier, class);
    }

    pub fn build(self) -> Application {
        Application { config: self.config, services: self.services, controllers: self.controllers }
    }
}

impl fmt::Debug for ApplicationBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationBuilder")
            .field("config", &self.config)
            .field("services", &self.services)
            .field("controllers", &self.controllers)
            .finish()
    }
}

/// Application setup run once, before the kernel accepts requests.
pub trait Bootstrap {
    /// Registers services, controllers and view settings.
    fn boot(&self, app: &mut ApplicationBuilder);

    fn register_routes(&self, router: &mut Router) -> Result<(), RouteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Greeting(&'static str);

    #[test]
    fn services_are_looked_up_by_name_and_type() {
        let app = Application::builder().service("greeting", Greeting("hello")).service("answer", 42_u32).build();

        assert_eq!(*app.service::<Greeting>("greeting").unwrap(), Greeting("hello"));
        assert_eq!(*app.service::<u32>("answer").unwrap(), 42);
        assert_eq!(
            app.service::<Greeting>("missing").unwrap_err(),
            ServiceError::NotFound { name: "missing".into() }
        );
        assert_eq!(
            app.service::<u32>("greeting").unwrap_err(),
            ServiceError::TypeMismatch { name: "greeting".into() }
        );
    }

    #[test]
    fn config_from_lookup_falls_back_to_defaults() {
        let config = ApplicationConfig::from_lookup(|key| (key == ENV_VIEWS_PATH).then(|| "templates".to_string()));
        assert_eq!(config.views_path, PathBuf::from("templates"));
        assert_eq!(config.controller_namespace, "");
        assert_eq!(config.views_cache_path, None);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: ApplicationConfig =
            serde_json::from_str(r#"{ "controller_namespace": "app::controllers", "views_cache_path": "/tmp/cache" }"#)
                .unwrap();
        assert_eq!(config.controller_namespace, "app::controllers");
        assert_eq!(config.views_path, PathBuf::from("views"));
        assert_eq!(config.views_cache_path, Some(PathBuf::from("/tmp/cache")));
    }
}

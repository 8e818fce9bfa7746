//! Controllers and the references routes hold to them.
//!
//! A controller is any `Send + Sync` type. It becomes dispatchable once it is
//! described by a [`ControllerClass`]: a factory creating the instance plus a
//! table of named actions. Classes are registered on the application under an
//! identifier, and routes point at them through a [`ControllerFunction`]
//! (class identifier + action name).
//!
//! ```
//! use micro_mvc::{ActionResult, ControllerClass, Request, Response};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct ItemController;
//!
//! impl ItemController {
//!     async fn action(self: Arc<Self>, request: Request) -> ActionResult {
//!         let id = request.parameter("id").unwrap_or("none");
//!         Ok(Response::plain(http::StatusCode::OK, format!("item {id}")))
//!     }
//! }
//!
//! let class = ControllerClass::new(ItemController::default).action("action", ItemController::action);
//! # let _ = class;
//! ```

use crate::application::Application;
use crate::error::Fault;
use crate::request::Request;
use crate::response::Response;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// The action invoked when a route names no method.
pub const DEFAULT_METHOD: &str = "action";

/// Separator between the controller namespace and a class identifier.
pub const NAMESPACE_SEPARATOR: &str = "::";

/// What a controller action returns.
pub type ActionResult = Result<Response, Fault>;

/// A live, type-erased controller instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Controllers that need the application context declare it with this trait
/// and register through [`ControllerClass::application_aware`].
pub trait ApplicationAware {
    fn set_app(&mut self, app: Arc<Application>);
}

/// An async controller method.
///
/// Implemented for every `Fn(Arc<C>, Request) -> impl Future<Output = ActionResult>`,
/// which includes methods declared as `async fn name(self: Arc<Self>, request: Request)`.
pub trait Action<C>: Send + Sync + 'static {
    fn call(&self, controller: Arc<C>, request: Request) -> BoxFuture<'static, ActionResult>;
}

impl<C, F, Fut> Action<C> for F
where
    F: Fn(Arc<C>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ActionResult> + Send + 'static,
{
    fn call(&self, controller: Arc<C>, request: Request) -> BoxFuture<'static, ActionResult> {
        Box::pin((self)(controller, request))
    }
}

type Factory<C> = Box<dyn Fn() -> C + Send + Sync>;

/// Describes how to create a controller and which actions it exposes.
pub struct ControllerClass<C> {
    factory: Factory<C>,
    attach: Option<fn(&mut C, &Arc<Application>)>,
    actions: HashMap<String, Box<dyn Action<C>>>,
}

impl<C> ControllerClass<C>
where
    C: Send + Sync + 'static,
{
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
    {
        Self { factory: Box::new(factory), attach: None, actions: HashMap::new() }
    }

    /// Exposes `action` under `name`. Registering a name twice replaces the first action.
    #[must_use]
    pub fn action<A: Action<C>>(mut self, name: impl Into<String>, action: A) -> Self {
        self.actions.insert(name.into(), Box::new(action));
        self
    }
}

impl<C> ControllerClass<C>
where
    C: ApplicationAware + Send + Sync + 'static,
{
    /// Hands the application context to every new instance before first use.
    #[must_use]
    pub fn application_aware(mut self) -> Self {
        self.attach = Some(attach_app::<C>);
        self
    }
}

fn attach_app<C: ApplicationAware>(controller: &mut C, app: &Arc<Application>) {
    controller.set_app(Arc::clone(app));
}

impl<C> fmt::Debug for ControllerClass<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut actions = self.actions.keys().collect::<Vec<_>>();
        actions.sort();
        f.debug_struct("ControllerClass")
            .field("type", &std::any::type_name::<C>())
            .field("application_aware", &self.attach.is_some())
            .field("actions", &actions)
            .finish()
    }
}

/// The type-erased view of a [`ControllerClass`] the kernel works with.
#[async_trait]
pub trait ControllerType: Send + Sync {
    /// Creates a new instance, attaching the application when the class is application aware.
    fn instantiate(&self, app: &Arc<Application>) -> Instance;

    fn is_application_aware(&self) -> bool;

    fn has_action(&self, name: &str) -> bool;

    /// Runs action `name` on `instance`, `None` when the class has no such action.
    async fn call(&self, instance: Instance, name: &str, request: Request) -> Option<ActionResult>;
}

#[async_trait]
impl<C> ControllerType for ControllerClass<C>
where
    C: Send + Sync + 'static,
{
    fn instantiate(&self, app: &Arc<Application>) -> Instance {
        let mut controller = (self.factory)();
        if let Some(attach) = self.attach {
            attach(&mut controller, app);
        }
        Arc::new(controller)
    }

    fn is_application_aware(&self) -> bool {
        self.attach.is_some()
    }

    fn has_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    async fn call(&self, instance: Instance, name: &str, request: Request) -> Option<ActionResult> {
        let action = self.actions.get(name)?;
        let Ok(controller) = instance.downcast::<C>() else {
            warn!(expected = std::any::type_name::<C>(), "controller instance has an unexpected type");
            return None;
        };
        Some(action.call(controller, request).await)
    }
}

/// All controller classes known to an application, keyed by class identifier.
#[derive(Default)]
pub struct ControllerRegistry {
    classes: HashMap<String, Box<dyn ControllerType>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<C>(&mut self, identifier: impl Into<String>, class: ControllerClass<C>)
    where
        C: Send + Sync + 'static,
    {
        self.classes.insert(identifier.into(), Box::new(class));
    }

    pub fn get(&self, identifier: &str) -> Option<&dyn ControllerType> {
        self.classes.get(identifier).map(AsRef::as_ref)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.classes.contains_key(identifier)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut identifiers = self.identifiers().collect::<Vec<_>>();
        identifiers.sort_unstable();
        f.debug_struct("ControllerRegistry").field("classes", &identifiers).finish()
    }
}

/// A "class + method" reference held by a route.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControllerFunction {
    class: String,
    method: String,
}

impl ControllerFunction {
    /// Creates a reference to `method` on `class`, [`DEFAULT_METHOD`] when no method is given.
    pub fn new(class: impl Into<String>, method: Option<&str>) -> Self {
        Self { class: class.into(), method: method.unwrap_or(DEFAULT_METHOD).to_string() }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// The class identifier prefixed with the application's controller namespace.
    pub fn qualified_class(&self, app: &Application) -> String {
        let namespace = app.controller_namespace().trim_end_matches(NAMESPACE_SEPARATOR);
        if namespace.is_empty() {
            self.class.clone()
        } else {
            format!("{namespace}{NAMESPACE_SEPARATOR}{}", self.class)
        }
    }

    /// Resolves the namespaced class identifier, `None` when no such controller is registered.
    pub fn resolve_class(&self, app: &Application) -> Option<String> {
        let qualified = self.qualified_class(app);
        app.controllers().contains(&qualified).then_some(qualified)
    }

    /// Invokes the referenced method on `instance`.
    ///
    /// Returns `None` when the class cannot be resolved or does not expose the method.
    pub async fn invoke(&self, app: &Application, instance: Instance, request: Request) -> Option<ActionResult> {
        let class = self.resolve_class(app)?;
        let controller_type = app.controllers().get(&class)?;
        controller_type.call(instance, &self.method, request).await
    }
}

impl fmt::Display for ControllerFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.class, self.method)
    }
}

//! A micro web application kernel.
//!
//! Requests are matched against an ordered route table, dispatched to a
//! controller action and the returned [`Response`] is emitted as plain
//! content, a redirect to a named route, or a rendered view.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use http::StatusCode;
//! use micro_mvc::{ActionResult, Application, ControllerClass, Kernel, Request, Response};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct ItemController;
//!
//! impl ItemController {
//!     async fn action(self: Arc<Self>, request: Request) -> ActionResult {
//!         let id = request.parameter("id").unwrap_or_default();
//!         Ok(Response::plain(StatusCode::OK, format!("item {id}")))
//!     }
//! }
//!
//! # futures::executor::block_on(async {
//! let app = Application::builder()
//!     .controller_namespace("app")
//!     .controller(
//!         "app::ItemController",
//!         ControllerClass::new(ItemController::default).action("action", ItemController::action),
//!     )
//!     .build();
//!
//! let kernel = Kernel::builder()
//!     .application(app)
//!     .routes(|router| {
//!         router.get("/items/{id}", "ItemController", None)?.name("item");
//!         Ok(())
//!     })
//!     .build()
//!     .unwrap();
//!
//! let response = kernel.dispatch(http::Request::get("/items/77").body(Bytes::new()).unwrap()).await;
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(response.body(), &Bytes::from_static(b"item 77"));
//! # });
//! ```

mod application;
mod controller;
mod error;
mod kernel;
mod request;
mod response;
mod route;
mod router;
mod view;
mod writer;

pub use application::{Application, ApplicationBuilder, ApplicationConfig, Bootstrap, Services};
pub use controller::{
    Action, ActionResult, ApplicationAware, ControllerClass, ControllerFunction, ControllerRegistry, ControllerType,
    Instance, DEFAULT_METHOD, NAMESPACE_SEPARATOR,
};
pub use error::{BuildError, ControllerNotFoundCause, Fault, KernelError, RouteError, ServiceError};
pub use kernel::{Kernel, KernelBuilder, KernelConfig};
pub use request::{Request, RequestBuilder};
pub use response::{Response, ResponseKind};
pub use route::{PathPattern, Route};
pub use router::Router;
pub use view::{JinjaViewEngine, RenderError, ViewEngine};
pub use writer::{HttpResponseWriter, ResponseWriter};

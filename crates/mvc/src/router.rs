//! The ordered route table.
//!
//! Routes are kept in registration order. Matching walks the table backwards,
//! so when two patterns accept the same path the route registered last wins.
//! There is no specificity ranking beyond that.
//!
//! # Examples
//!
//! ```
//! use micro_mvc::Router;
//!
//! let mut router = Router::new();
//! router.get("/", "HomeController", None)?.name("home");
//! router.get("/items/{id}", "ItemController", Some("show"))?.name("item");
//!
//! let route = router.match_route("/items/7").unwrap();
//! assert_eq!(route.route_name(), Some("item"));
//! assert_eq!(router.find_by_name("home").unwrap().path(), "/");
//! # Ok::<(), micro_mvc::RouteError>(())
//! ```

use crate::controller::ControllerFunction;
use crate::error::RouteError;
use crate::route::Route;
use http::Method;
use tracing::debug;

#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

macro_rules! method_route {
    ($method:ident, $http_method:expr) => {
        /// Registers a route for this HTTP method, see [`Router::register`].
        ///
        /// # Errors
        /// Fails when `path` is not a valid path pattern.
        pub fn $method(
            &mut self,
            path: &str,
            controller_class: impl Into<String>,
            method_name: Option<&str>,
        ) -> Result<&mut Route, RouteError> {
            self.register($http_method, path, ControllerFunction::new(controller_class, method_name))
        }
    };
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles `path`, appends the route and returns it so it can be named.
    ///
    /// # Errors
    /// Fails when `path` is not a valid path pattern.
    pub fn register(
        &mut self,
        method: Method,
        path: &str,
        function: ControllerFunction,
    ) -> Result<&mut Route, RouteError> {
        let route = Route::new(method, path, function)?;
        debug!(%route, "route registered");
        self.routes.push(route);
        let index = self.routes.len() - 1;
        Ok(&mut self.routes[index])
    }

    method_route!(get, Method::GET);
    method_route!(post, Method::POST);
    method_route!(put, Method::PUT);
    method_route!(delete, Method::DELETE);

    /// Finds the most recently registered route whose pattern matches `path`.
    ///
    /// The HTTP method recorded on the route plays no part here, see
    /// [`match_request`](Self::match_request) for method aware matching.
    pub fn match_route(&self, path: &str) -> Option<&Route> {
        self.routes.iter().rev().find(|route| route.pattern().is_match(path))
    }

    /// Like [`match_route`](Self::match_route), skipping routes registered for another method.
    pub fn match_request(&self, method: &Method, path: &str) -> Option<&Route> {
        self.routes.iter().rev().find(|route| route.method() == method && route.pattern().is_match(path))
    }

    /// Finds the matching route the way [`match_route`](Self::match_route) does, or
    /// [`match_request`](Self::match_request) when `method` is given, together with the
    /// captured placeholder values in order of appearance.
    pub fn match_captures<'r, 'p>(
        &'r self,
        method: Option<&Method>,
        path: &'p str,
    ) -> Option<(&'r Route, Vec<&'p str>)> {
        self.routes
            .iter()
            .rev()
            .filter(|route| method.is_none_or(|method| route.method() == method))
            .find_map(|route| route.pattern().captures(path).map(|values| (route, values)))
    }

    /// Returns the first route, in registration order, named `name`.
    ///
    /// Names are not checked for uniqueness when routes are registered.
    pub fn find_by_name(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.route_name() == Some(name))
    }

    /// All routes in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn router() -> Router {
        let mut router = Router::new();
        router.get("/", "HomeController", None).unwrap().name("home");
        router.get("/items/{id}", "ItemController", None).unwrap().name("item");
        router.post("/items/{id}", "ItemController", Some("update")).unwrap();
        router.put("/items/{id}/tags/{tag}", "TagController", None).unwrap();
        router.delete("/items/{id}", "ItemController", Some("remove")).unwrap().name("item");
        router
    }

    #[test]
    fn routes_keep_registration_order() {
        let router = router();
        let methods = router.routes().iter().map(|route| route.method().clone()).collect::<Vec<_>>();
        assert_eq!(methods, [Method::GET, Method::GET, Method::POST, Method::PUT, Method::DELETE]);
    }

    #[test]
    fn last_registered_route_wins() {
        let router = router();
        let route = router.match_route("/items/3").unwrap();
        assert_eq!(route.method(), Method::DELETE);
        assert_eq!(route.controller_function().method(), "remove");
    }

    #[test]
    fn literal_and_pattern_collision_prefers_later() {
        let mut router = Router::new();
        router.get("/items/{id}", "ItemController", None).unwrap();
        router.get("/items/new", "ItemController", Some("create")).unwrap();
        assert_eq!(router.match_route("/items/new").unwrap().controller_function().method(), "create");

        let mut router = Router::new();
        router.get("/items/new", "ItemController", Some("create")).unwrap();
        router.get("/items/{id}", "ItemController", None).unwrap();
        assert_eq!(router.match_route("/items/new").unwrap().controller_function().method(), "action");
    }

    #[test]
    fn match_ignores_method_by_default() {
        let router = router();
        let route = router.match_route("/items/3/tags/red").unwrap();
        assert_eq!(route.method(), Method::PUT);
    }

    #[test]
    fn match_request_filters_by_method() {
        let router = router();
        let route = router.match_request(&Method::POST, "/items/3").unwrap();
        assert_eq!(route.controller_function().method(), "update");
        assert!(router.match_request(&Method::PATCH, "/items/3").is_none());
    }

    #[test]
    fn match_captures_returns_the_winning_route_values() {
        let router = router();
        let (route, values) = router.match_captures(None, "/items/3/tags/red").unwrap();
        assert_eq!(route.method(), Method::PUT);
        assert_eq!(values, ["3", "red"]);

        let (route, values) = router.match_captures(Some(&Method::POST), "/items/9").unwrap();
        assert_eq!(route.controller_function().method(), "update");
        assert_eq!(values, ["9"]);

        assert!(router.match_captures(Some(&Method::PATCH), "/items/9").is_none());
        assert!(router.match_captures(None, "/nothing").is_none());
    }

    #[test]
    fn no_match_is_none() {
        let router = router();
        assert!(router.match_route("/does/not/exist").is_none());
        assert!(router.match_route("/items/").is_none());
    }

    #[test]
    fn find_by_name_returns_first_registered() {
        let router = router();
        let route = router.find_by_name("item").unwrap();
        assert_eq!(route.method(), Method::GET);
        assert!(router.find_by_name("missing").is_none());
    }

    proptest! {
        #[test]
        fn later_of_two_overlapping_routes_wins(segment in "[^/{}]+") {
            let path = format!("/items/{segment}");

            let mut router = Router::new();
            router.get("/items/{id}", "PatternController", None).unwrap();
            router.get(&path, "LiteralController", None).unwrap();
            let (route, values) = router.match_captures(None, &path).unwrap();
            prop_assert_eq!(route.controller_function().class(), "LiteralController");
            prop_assert!(values.is_empty());

            let mut router = Router::new();
            router.get(&path, "LiteralController", None).unwrap();
            router.get("/items/{id}", "PatternController", None).unwrap();
            let (route, values) = router.match_captures(None, &path).unwrap();
            prop_assert_eq!(route.controller_function().class(), "PatternController");
            prop_assert_eq!(values, vec![segment.as_str()]);
        }
    }

    #[test]
    fn invalid_pattern_is_not_registered() {
        let mut router = Router::new();
        assert!(router.get("/items/{", "ItemController", None).is_err());
        assert!(router.is_empty());
    }
}

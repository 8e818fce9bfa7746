//! Route definitions and path pattern compilation.
//!
//! A path pattern is a literal path with `{name}` placeholders, for example
//! `/users/{id}/posts/{post}`. Each placeholder matches a non-empty run of
//! characters that does not contain `/`. Patterns are compiled into an anchored
//! regex once, when the route is registered.

use crate::controller::ControllerFunction;
use crate::error::RouteError;
use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use tracing::warn;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^{}]*)\}").expect("placeholder regex is valid"));
static PARAMETER_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("parameter name regex is valid"));

const SEGMENT: &str = "([^/]+)";

/// A compiled path pattern.
///
/// The number of capture groups of the regex always equals the number of
/// parameter names.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    regex: Regex,
    parameters: Vec<String>,
}

impl PathPattern {
    /// Compiles `pattern` into a matcher and the ordered list of its placeholder names.
    ///
    /// # Errors
    /// Fails when a placeholder is malformed (`{}`, `{a b}`, an unbalanced brace)
    /// or when the same placeholder name appears twice.
    pub fn compile(pattern: &str) -> Result<Self, RouteError> {
        let mut regex_src = String::with_capacity(pattern.len() + 8);
        regex_src.push('^');
        let mut parameters = Vec::with_capacity(pattern.matches('{').count());

        let mut last = 0;
        for captures in PLACEHOLDER.captures_iter(pattern) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };

            let literal = &pattern[last..whole.start()];
            Self::push_literal(&mut regex_src, literal, pattern)?;

            let name = name.as_str();
            if !PARAMETER_NAME.is_match(name) {
                return Err(RouteError::malformed_placeholder(pattern));
            }
            if parameters.iter().any(|existing| existing == name) {
                return Err(RouteError::duplicate_parameter(pattern, name));
            }

            regex_src.push_str(SEGMENT);
            parameters.push(name.to_string());
            last = whole.end();
        }
        Self::push_literal(&mut regex_src, &pattern[last..], pattern)?;
        regex_src.push('$');

        let regex = Regex::new(&regex_src)
            .map_err(|source| RouteError::InvalidPattern { pattern: pattern.to_string(), source })?;

        Ok(Self { raw: pattern.to_string(), regex, parameters })
    }

    fn push_literal(regex_src: &mut String, literal: &str, pattern: &str) -> Result<(), RouteError> {
        if literal.contains(['{', '}']) {
            return Err(RouteError::malformed_placeholder(pattern));
        }
        regex_src.push_str(&regex::escape(literal));
        Ok(())
    }

    /// Returns the captured placeholder values in order of appearance, or `None`
    /// when `path` does not match.
    pub fn captures<'p>(&self, path: &'p str) -> Option<Vec<&'p str>> {
        let captures = self.regex.captures(path)?;
        Some(captures.iter().skip(1).map(|m| m.map_or("", |m| m.as_str())).collect())
    }

    #[inline]
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Substitutes `{name}` occurrences with the given values.
    ///
    /// This is a plain textual replacement: values are not validated against the
    /// matcher and placeholders without a value are left as they are.
    pub fn substitute<K, V>(&self, values: impl IntoIterator<Item = (K, V)>) -> String
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        values.into_iter().fold(self.raw.clone(), |path, (key, value)| {
            path.replace(&format!("{{{}}}", key.as_ref()), value.as_ref())
        })
    }
}

/// One registered endpoint.
#[derive(Debug)]
pub struct Route {
    method: Method,
    pattern: PathPattern,
    function: ControllerFunction,
    name: Option<String>,
}

impl Route {
    /// Compiles `path` and creates an unnamed route targeting `function`.
    ///
    /// # Errors
    /// See [`PathPattern::compile`].
    pub fn new(method: Method, path: &str, function: ControllerFunction) -> Result<Self, RouteError> {
        Ok(Self { method, pattern: PathPattern::compile(path)?, function, name: None })
    }

    /// Names the route. A route is named at most once, later calls keep the first name.
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        match &self.name {
            Some(existing) => {
                warn!(route = %self, existing = %existing, ignored = %name, "route is already named");
            }
            None => self.name = Some(name),
        }
        self
    }

    pub fn route_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The raw path pattern, placeholders included.
    pub fn path(&self) -> &str {
        self.pattern.raw()
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn parameters(&self) -> &[String] {
        self.pattern.parameters()
    }

    pub fn controller_function(&self) -> &ControllerFunction {
        &self.function
    }

    /// Matches `path` and pairs every captured value with its placeholder name.
    pub fn match_path<'r, 'p>(&'r self, path: &'p str) -> Option<Vec<(&'r str, &'p str)>> {
        let values = self.pattern.captures(path)?;
        Some(self.parameters().iter().map(String::as_str).zip(values).collect())
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.method, self.pattern.raw(), self.function)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn literal_pattern_matches_only_itself() {
        let pattern = PathPattern::compile("/about.html").unwrap();
        assert!(pattern.parameters().is_empty());
        assert_eq!(pattern.captures("/about.html"), Some(vec![]));
        assert!(!pattern.is_match("/aboutXhtml"));
        assert!(!pattern.is_match("/about.html/more"));
        assert!(!pattern.is_match("/prefix/about.html"));
    }

    #[test]
    fn placeholders_capture_in_order_of_appearance() {
        let pattern = PathPattern::compile("/users/{user}/posts/{post}").unwrap();
        assert_eq!(pattern.parameters(), ["user", "post"]);
        assert_eq!(pattern.captures("/users/alice/posts/7"), Some(vec!["alice", "7"]));
    }

    #[test]
    fn placeholders_do_not_cross_slashes() {
        let pattern = PathPattern::compile("/files/{name}").unwrap();
        assert!(!pattern.is_match("/files/a/b"));
        assert!(!pattern.is_match("/files/"));
        assert_eq!(pattern.captures("/files/report.pdf"), Some(vec!["report.pdf"]));
    }

    #[test]
    fn placeholder_inside_segment() {
        let pattern = PathPattern::compile("/archive/{year}-{month}").unwrap();
        assert_eq!(pattern.parameters(), ["year", "month"]);
        assert!(pattern.is_match("/archive/2024-05"));
    }

    proptest! {
        #[test]
        fn any_segment_values_are_captured_in_name_order(category in "[^/]+", id in "[^/]+") {
            let route = Route::new(
                Method::GET,
                "/shop/{category}/items/{id}",
                ControllerFunction::new("ItemController", None),
            )
            .unwrap();
            let uri = format!("/shop/{category}/items/{id}");

            prop_assert_eq!(
                route.match_path(&uri),
                Some(vec![("category", category.as_str()), ("id", id.as_str())])
            );
        }
    }

    #[test]
    fn malformed_placeholders_are_rejected() {
        for pattern in ["/a/{}", "/a/{b c}", "/a/{b", "/a/b}", "/a/{1x}"] {
            assert!(
                matches!(PathPattern::compile(pattern), Err(RouteError::MalformedPlaceholder { .. })),
                "pattern: {pattern}"
            );
        }
    }

    #[test]
    fn duplicate_placeholders_are_rejected() {
        let result = PathPattern::compile("/{id}/{id}");
        assert!(matches!(result, Err(RouteError::DuplicateParameter { ref name, .. }) if name == "id"));
    }

    #[test]
    fn substitute_is_plain_text_replacement() {
        let pattern = PathPattern::compile("/user/{id}/{tab}").unwrap();
        assert_eq!(pattern.substitute([("id", "42")]), "/user/42/{tab}");
        assert_eq!(pattern.substitute([("id", "a/b"), ("tab", "x")]), "/user/a/b/x");
    }

    #[test]
    fn route_is_named_once() {
        let mut route = Route::new(Method::GET, "/", ControllerFunction::new("HomeController", None)).unwrap();
        route.name("home").name("index");
        assert_eq!(route.route_name(), Some("home"));
    }

    #[test]
    fn match_path_pairs_names_and_values() {
        let route = Route::new(Method::GET, "/items/{id}", ControllerFunction::new("ItemController", None)).unwrap();
        assert_eq!(route.match_path("/items/77"), Some(vec![("id", "77")]));
        assert_eq!(route.match_path("/items"), None);
    }
}

//! The request value handed to controllers.
//!
//! A [`Request`] carries what the kernel needs for dispatch (the URI and the
//! root URL redirects are built against) plus the path parameters bound after
//! routing. Method, headers and body are passed through untouched.

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    root_url: String,
    headers: HeaderMap,
    body: Bytes,
    parameters: HashMap<String, String>,
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    /// Converts an `http` request, `root_url` is the scheme and authority redirects point to.
    pub fn from_http(request: http::Request<Bytes>, root_url: impl Into<String>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            root_url: normalize_root_url(root_url.into()),
            headers: parts.headers,
            body,
            parameters: HashMap::new(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The path part of the URI, which is what routes are matched against.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Scheme and authority without a trailing slash, for example `https://example.com`.
    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the path parameter bound under `name`.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    pub fn parameters(&self) -> &HashMap<String, String> {
        &self.parameters
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(name.into(), value.into());
    }
}

fn normalize_root_url(mut root_url: String) -> String {
    while root_url.ends_with('/') {
        root_url.pop();
    }
    root_url
}

#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    uri: Result<Uri, http::Error>,
    root_url: String,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestBuilder {
    fn new() -> Self {
        Self {
            method: Method::GET,
            uri: Ok(Uri::from_static("/")),
            root_url: String::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn uri<T>(mut self, uri: T) -> Self
    where
        Uri: TryFrom<T>,
        <Uri as TryFrom<T>>::Error: Into<http::Error>,
    {
        self.uri = Uri::try_from(uri).map_err(Into::into);
        self
    }

    #[must_use]
    pub fn root_url(mut self, root_url: impl Into<String>) -> Self {
        self.root_url = root_url.into();
        self
    }

    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// # Errors
    /// Fails when the URI given to [`uri`](Self::uri) could not be parsed.
    pub fn build(self) -> Result<Request, http::Error> {
        Ok(Request {
            method: self.method,
            uri: self.uri?,
            root_url: normalize_root_url(self.root_url),
            headers: self.headers,
            body: self.body,
            parameters: HashMap::new(),
        })
    }
}

//! Responses returned by controller actions.
//!
//! A [`Response`] always carries a status, a content type and a list of
//! additional headers. What produces the body depends on its [`ResponseKind`]:
//! - [`ResponseKind::Content`]: the raw bytes are written as they are
//! - [`ResponseKind::Render`]: the view engine renders a template with the payload
//! - [`ResponseKind::Redirect`]: no body, a `Location` header pointing at a named route

use bytes::Bytes;
use http::{HeaderName, HeaderValue, StatusCode};
use mime::Mime;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    content_type: Mime,
    headers: Vec<(HeaderName, HeaderValue)>,
    kind: ResponseKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseKind {
    Content(Bytes),
    Render { view: String, data: Value },
    Redirect { route: String, parameters: Vec<(String, String)> },
}

impl Response {
    pub fn new(status: StatusCode, content_type: Mime, body: impl Into<Bytes>) -> Self {
        Self { status, content_type, headers: Vec::new(), kind: ResponseKind::Content(body.into()) }
    }

    /// A `text/plain; charset=utf-8` response.
    pub fn plain(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self::new(status, mime::TEXT_PLAIN_UTF_8, body)
    }

    pub fn html(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self::new(status, mime::TEXT_HTML_UTF_8, body)
    }

    /// A `200 OK` html response rendered from `view` with `data`.
    pub fn render(view: impl Into<String>, data: impl Into<Value>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: mime::TEXT_HTML_UTF_8,
            headers: Vec::new(),
            kind: ResponseKind::Render { view: view.into(), data: data.into() },
        }
    }

    /// Like [`render`](Self::render), serializing `data` first.
    ///
    /// # Errors
    /// Fails when `data` cannot be represented as JSON.
    pub fn render_serialize<T: Serialize>(view: impl Into<String>, data: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::render(view, serde_json::to_value(data)?))
    }

    /// A `302 Found` redirect to the route named `route`.
    ///
    /// `parameters` fill the `{name}` placeholders of the target route's path.
    pub fn redirect<I, K, V>(route: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            status: StatusCode::FOUND,
            content_type: mime::TEXT_PLAIN_UTF_8,
            headers: Vec::new(),
            kind: ResponseKind::Redirect {
                route: route.into(),
                parameters: parameters.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            },
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: Mime) -> Self {
        self.content_type = content_type;
        self
    }

    /// Appends an additional header, headers are emitted in the order they were added.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn content_type(&self) -> &Mime {
        &self.content_type
    }

    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }

    pub fn kind(&self) -> &ResponseKind {
        &self.kind
    }

    /// The raw body, `None` for render and redirect responses.
    pub fn body(&self) -> Option<&Bytes> {
        match &self.kind {
            ResponseKind::Content(body) => Some(body),
            ResponseKind::Render { .. } | ResponseKind::Redirect { .. } => None,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.kind, ResponseKind::Redirect { .. })
    }

    pub(crate) fn into_parts(self) -> (StatusCode, Mime, Vec<(HeaderName, HeaderValue)>, ResponseKind) {
        (self.status, self.content_type, self.headers, self.kind)
    }
}

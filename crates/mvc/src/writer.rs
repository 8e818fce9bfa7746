//! The transport side of response emission.
//!
//! The kernel emits a response as a sequence of calls on a [`ResponseWriter`]:
//! the status first, then headers, then body bytes, and possibly an early
//! [`finish`](ResponseWriter::finish). [`HttpResponseWriter`] collects those
//! calls into an `http::Response` for hosting servers built on the `http` types.

use bytes::{Bytes, BytesMut};
use http::{HeaderName, HeaderValue, Response, StatusCode};

#[cfg_attr(test, mockall::automock)]
pub trait ResponseWriter {
    fn status(&mut self, status: StatusCode);

    /// Sets a header, replacing earlier values of the same name.
    fn header(&mut self, name: HeaderName, value: HeaderValue);

    /// Adds a header value, earlier values of the same name are kept.
    fn append_header(&mut self, name: HeaderName, value: HeaderValue);

    fn write(&mut self, body: Bytes);

    /// Ends the response, everything emitted afterwards is dropped.
    fn finish(&mut self);
}

/// Buffers an emitted response into an `http::Response<Bytes>`.
#[derive(Debug, Default)]
pub struct HttpResponseWriter {
    response: Response<BytesMut>,
    finished: bool,
}

impl HttpResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn into_response(self) -> Response<Bytes> {
        self.response.map(BytesMut::freeze)
    }
}

impl ResponseWriter for HttpResponseWriter {
    fn status(&mut self, status: StatusCode) {
        if !self.finished {
            *self.response.status_mut() = status;
        }
    }

    fn header(&mut self, name: HeaderName, value: HeaderValue) {
        if !self.finished {
            self.response.headers_mut().insert(name, value);
        }
    }

    fn append_header(&mut self, name: HeaderName, value: HeaderValue) {
        if !self.finished {
            self.response.headers_mut().append(name, value);
        }
    }

    fn write(&mut self, body: Bytes) {
        if !self.finished {
            self.response.body_mut().extend_from_slice(&body);
        }
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{CONTENT_TYPE, LOCATION, SET_COOKIE};

    #[test]
    fn collects_status_headers_and_body() {
        let mut writer = HttpResponseWriter::new();
        writer.status(StatusCode::CREATED);
        writer.header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        writer.write(Bytes::from_static(b"hello "));
        writer.write(Bytes::from_static(b"world"));

        let response = writer.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(response.body(), &Bytes::from_static(b"hello world"));
    }

    #[test]
    fn header_replaces_and_append_header_accumulates() {
        let mut writer = HttpResponseWriter::new();
        writer.header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        writer.header(CONTENT_TYPE, HeaderValue::from_static("text/csv"));
        writer.append_header(SET_COOKIE, HeaderValue::from_static("a=1"));
        writer.append_header(SET_COOKIE, HeaderValue::from_static("b=2"));

        let response = writer.into_response();
        let content_types = response.headers().get_all(CONTENT_TYPE).iter().collect::<Vec<_>>();
        assert_eq!(content_types, ["text/csv"]);
        let cookies = response.headers().get_all(SET_COOKIE).iter().collect::<Vec<_>>();
        assert_eq!(cookies, ["a=1", "b=2"]);
    }

    #[test]
    fn nothing_is_written_after_finish() {
        let mut writer = HttpResponseWriter::new();
        writer.status(StatusCode::FOUND);
        writer.header(LOCATION, HeaderValue::from_static("/home"));
        writer.finish();
        writer.header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        writer.append_header(LOCATION, HeaderValue::from_static("/elsewhere"));
        writer.write(Bytes::from_static(b"ignored"));

        assert!(writer.is_finished());
        let response = writer.into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
        assert_eq!(response.headers().get_all(LOCATION).iter().count(), 1);
        assert!(response.body().is_empty());
    }
}

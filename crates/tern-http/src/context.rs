//! Per-request context
//!
//! # Responsibilities
//! - Carry the decomposed request (method, URI, headers, collected body)
//! - Carry the merged parameter set (path + query + form)
//! - Buffer the outgoing response and track whether it has been committed
//! - Provide the encoding helpers handlers respond through
//!
//! # Design Decisions
//! - One context per dispatch, owned by that dispatch, never shared or
//!   reused across requests; it is threaded explicitly through every call
//! - The response is buffered and materialized once at the end of dispatch,
//!   so "committed" is a flag, not a wire event; a second write attempt is
//!   logged and dropped rather than corrupting the response
//! - A value that cannot be JSON-encoded becomes a local 500 response, it
//!   is not propagated as a handler failure

use std::collections::HashMap;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, LOCATION};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Response, StatusCode, Uri};
use http_body_util::Full;
use serde::Serialize;
use tracing::{error, warn};

use crate::error::{HandlerError, HandlerResult};

const TEXT_HTML: HeaderValue = HeaderValue::from_static("text/html;charset=utf-8");
const APPLICATION_JSON: HeaderValue = HeaderValue::from_static("application/json");

#[derive(Debug, Default)]
struct ResponseBuffer {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    committed: bool,
}

/// The per-request carrier of request data, extracted parameters, and the
/// buffered response.
#[derive(Debug)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    params: HashMap<String, String>,
    response: ResponseBuffer,
}

impl RequestContext {
    /// Create a fresh context from decomposed request parts and the
    /// already-collected body bytes.
    pub fn new(parts: http::request::Parts, body: Bytes) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            params: HashMap::new(),
            response: ResponseBuffer::default(),
        }
    }

    /// The request method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request URI
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The request path (target before any `?`)
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// All request headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A request header as a string, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// The collected request body
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Merge a batch of parameters into the context; existing keys are
    /// overwritten (last write wins).
    pub fn add_params(&mut self, params: HashMap<String, String>) {
        self.params.extend(params);
    }

    /// Look up a single parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// The full merged parameter set
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Whether a parameter is present
    pub fn has_param(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Set a response header, replacing any previous value
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response.headers.insert(name, value);
    }

    /// Append a response header, keeping previous values (e.g. `Vary`)
    pub fn append_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response.headers.append(name, value);
    }

    /// Whether a response has already been committed
    pub fn committed(&self) -> bool {
        self.response.committed
    }

    /// The buffered response status
    pub fn status(&self) -> StatusCode {
        self.response.status
    }

    /// Respond with a JSON-encoded value.
    ///
    /// A value that cannot be encoded is turned into a 500 response here;
    /// the error is not propagated further.
    pub fn json<T: Serialize>(&mut self, code: StatusCode, value: &T) -> HandlerResult {
        let body = match serde_json::to_vec(value) {
            Ok(body) => body,
            Err(err) => {
                error!(error = %err, "response serialization failed");
                return self.http_error(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string());
            }
        };
        self.set_header(CONTENT_TYPE, APPLICATION_JSON);
        self.write(code, Bytes::from(body))
    }

    /// Respond with a text body
    pub fn string(&mut self, code: StatusCode, body: &str) -> HandlerResult {
        self.set_header(CONTENT_TYPE, TEXT_HTML);
        self.write(code, Bytes::copy_from_slice(body.as_bytes()))
    }

    /// Respond with a status code and no body
    pub fn code(&mut self, code: StatusCode) -> HandlerResult {
        self.write(code, Bytes::new())
    }

    /// Respond with an error status and message body
    pub fn http_error(&mut self, code: StatusCode, message: &str) -> HandlerResult {
        self.set_header(CONTENT_TYPE, TEXT_HTML);
        self.write(code, Bytes::copy_from_slice(message.as_bytes()))
    }

    /// Respond with a redirect to `location`
    pub fn redirect(&mut self, code: StatusCode, location: &str) -> HandlerResult {
        let value = HeaderValue::from_str(location)
            .map_err(|err| HandlerError::Other(anyhow::Error::new(err)))?;
        self.set_header(LOCATION, value);
        self.write(code, Bytes::new())
    }

    fn write(&mut self, code: StatusCode, body: Bytes) -> HandlerResult {
        if self.response.committed {
            warn!(status = %code, "response already committed, dropping write");
            return Ok(());
        }
        self.response.status = code;
        self.response.body = body;
        self.response.committed = true;
        Ok(())
    }

    /// Materialize the buffered response. An uncommitted context yields an
    /// empty 200, matching the behavior of a handler that wrote nothing.
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.response.body));
        *response.status_mut() = self.response.status;
        *response.headers_mut() = self.response.headers;
        response
    }
}

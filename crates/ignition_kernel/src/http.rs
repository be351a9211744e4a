//! The request-handling boundary.
//!
//! The HTTP façade itself lives outside this crate; these are the minimal
//! types the kernel needs to hand a request to whatever handler component
//! the container provides, or to answer with its own fallback.

/// Well-known container identifier the kernel queries for a request
/// handler. Registration hooks bind their handler definition under this id.
pub const REQUEST_HANDLER_ID: &str = "ignition.request_handler";

/// A request, reduced to what the kernel boundary needs.
#[derive(Debug, Clone)]
pub struct Request {
    /// Request method.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Request body bytes.
    pub body: Vec<u8>,
}

impl Request {
    /// Convenience constructor for a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            path: path.into(),
            body: Vec::new(),
        }
    }
}

/// A response produced by a handler or by the kernel's fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl Response {
    /// A 200 response with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// The kernel's minimal answer when the container has no handler.
    pub fn fallback() -> Self {
        Self::ok("<h1>It Works!</h1>")
    }
}

/// A component that turns requests into responses.
pub trait RequestHandler {
    /// Handles one request.
    fn handle(&self, request: &Request) -> Response;
}

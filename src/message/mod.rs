//! JSON-RPC 2.0 message model.
//!
//! A [`Message`] is one of four closed variants:
//!
//! - [`Request`] - `{"jsonrpc":"2.0","id":..,"method":..,"params":..}`
//! - [`Notification`] - a request without an `id`
//! - [`SuccessResponse`] - `{"jsonrpc":"2.0","id":..,"result":..}`
//! - [`ErrorResponse`] - `{"jsonrpc":"2.0","id":..,"error":{"code":..,"message":..,"data":..}}`
//!
//! Requests and responses always carry an integer or string id. Messages are
//! plain immutable values; formatters build them on decode and the dispatch
//! layer builds them for encode.
//!
//! # Example
//!
//! ```
//! use jsonrpc_wire::message::{Message, Params, Request};
//! use serde_json::json;
//!
//! let msg: Message = Request::new(1, "add", Some(Params::from(vec![json!(1), json!(2)]))).into();
//! assert_eq!(msg.method(), Some("add"));
//! assert!(msg.is_request());
//! ```

mod wire;

use std::fmt;

use serde_json::{Map, Value};

/// Protocol version string carried in every message.
pub const JSONRPC_VERSION: &str = "2.0";

// Standard JSON-RPC 2.0 error codes
/// Invalid JSON was received.
pub const PARSE_ERROR: i64 = -32700;
/// The JSON sent is not a valid Request object.
pub const INVALID_REQUEST: i64 = -32600;
/// The method does not exist / is not available.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Invalid method parameter(s).
pub const INVALID_PARAMS: i64 = -32602;
/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i64 = -32603;

/// Request identifier: an integer or a string, never both.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestId {
    /// Integer id.
    Number(i64),
    /// String id.
    String(String),
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        RequestId::Number(id)
    }
}

impl From<i32> for RequestId {
    fn from(id: i32) -> Self {
        RequestId::Number(id.into())
    }
}

impl From<u32> for RequestId {
    fn from(id: u32) -> Self {
        RequestId::Number(id.into())
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        RequestId::String(id)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        RequestId::String(id.to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::String(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// Method parameters: positional (array) or named (object).
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// Positional parameters.
    Array(Vec<Value>),
    /// Named parameters.
    Object(Map<String, Value>),
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Params::Array(values)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Params::Object(map)
    }
}

/// A method call that expects a response.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: RequestId,
    pub method: String,
    pub params: Option<Params>,
}

impl Request {
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>, params: Option<Params>) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            params,
        }
    }
}

/// A method call without an id; no response is expected.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub method: String,
    pub params: Option<Params>,
}

impl Notification {
    pub fn new(method: impl Into<String>, params: Option<Params>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// A successful result for the request with the same id.
#[derive(Debug, Clone, PartialEq)]
pub struct SuccessResponse {
    pub id: RequestId,
    pub result: Value,
}

impl SuccessResponse {
    pub fn new(id: impl Into<RequestId>, result: Value) -> Self {
        Self {
            id: id.into(),
            result,
        }
    }
}

/// A failed result for the request with the same id.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub id: RequestId,
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

impl ErrorResponse {
    pub fn new(id: impl Into<RequestId>, code: i64, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach additional error data.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Create a parse error (-32700).
    pub fn parse_error(id: impl Into<RequestId>) -> Self {
        Self::new(id, PARSE_ERROR, "Parse error")
    }

    /// Create an invalid request error (-32600).
    pub fn invalid_request(id: impl Into<RequestId>) -> Self {
        Self::new(id, INVALID_REQUEST, "Invalid Request")
    }

    /// Create a method not found error (-32601).
    pub fn method_not_found(id: impl Into<RequestId>) -> Self {
        Self::new(id, METHOD_NOT_FOUND, "Method not found")
    }

    /// Create an invalid params error (-32602).
    pub fn invalid_params(id: impl Into<RequestId>) -> Self {
        Self::new(id, INVALID_PARAMS, "Invalid params")
    }

    /// Create an internal error (-32603).
    pub fn internal_error(id: impl Into<RequestId>) -> Self {
        Self::new(id, INTERNAL_ERROR, "Internal error")
    }
}

/// One decoded JSON-RPC unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request(Request),
    Notification(Notification),
    SuccessResponse(SuccessResponse),
    ErrorResponse(ErrorResponse),
}

impl Message {
    /// The id, if this variant carries one (every variant except notifications).
    pub fn id(&self) -> Option<&RequestId> {
        match self {
            Message::Request(r) => Some(&r.id),
            Message::Notification(_) => None,
            Message::SuccessResponse(r) => Some(&r.id),
            Message::ErrorResponse(r) => Some(&r.id),
        }
    }

    /// The method name for requests and notifications.
    pub fn method(&self) -> Option<&str> {
        match self {
            Message::Request(r) => Some(&r.method),
            Message::Notification(n) => Some(&n.method),
            _ => None,
        }
    }

    #[inline]
    pub fn is_request(&self) -> bool {
        matches!(self, Message::Request(_))
    }

    #[inline]
    pub fn is_notification(&self) -> bool {
        matches!(self, Message::Notification(_))
    }

    /// Check if this is a response (success or error).
    #[inline]
    pub fn is_response(&self) -> bool {
        matches!(
            self,
            Message::SuccessResponse(_) | Message::ErrorResponse(_)
        )
    }
}

impl From<Request> for Message {
    fn from(r: Request) -> Self {
        Message::Request(r)
    }
}

impl From<Notification> for Message {
    fn from(n: Notification) -> Self {
        Message::Notification(n)
    }
}

impl From<SuccessResponse> for Message {
    fn from(r: SuccessResponse) -> Self {
        Message::SuccessResponse(r)
    }
}

impl From<ErrorResponse> for Message {
    fn from(r: ErrorResponse) -> Self {
        Message::ErrorResponse(r)
    }
}

//! Structural mapping between [`Message`] and its wire document.
//!
//! Serialization writes fields in a fixed order (`jsonrpc`, `id`, `method`,
//! `params` / `result` / `error`) through `serde::Serialize`, so any serde
//! data format can carry a message. Decoding goes through a
//! `serde_json::Value` and validates the shape explicitly.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use super::{
    ErrorResponse, Message, Notification, Params, Request, RequestId, SuccessResponse,
    JSONRPC_VERSION,
};
use crate::error::{Result, WireError};

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            RequestId::Number(n) => serializer.serialize_i64(*n),
            RequestId::String(s) => serializer.serialize_str(s),
        }
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Params::Array(values) => values.serialize(serializer),
            Params::Object(map) => map.serialize(serializer),
        }
    }
}

/// The `error` member of an error response.
struct ErrorObject<'a>(&'a ErrorResponse);

impl Serialize for ErrorObject<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let err = self.0;
        let len = if err.data.is_some() { 3 } else { 2 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("code", &err.code)?;
        map.serialize_entry("message", &err.message)?;
        if let Some(data) = &err.data {
            map.serialize_entry("data", data)?;
        }
        map.end()
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Message::Request(r) => {
                let len = 3 + usize::from(r.params.is_some());
                let mut map = serializer.serialize_map(Some(len))?;
                map.serialize_entry("jsonrpc", JSONRPC_VERSION)?;
                map.serialize_entry("id", &r.id)?;
                map.serialize_entry("method", &r.method)?;
                if let Some(params) = &r.params {
                    map.serialize_entry("params", params)?;
                }
                map.end()
            }
            Message::Notification(n) => {
                let len = 2 + usize::from(n.params.is_some());
                let mut map = serializer.serialize_map(Some(len))?;
                map.serialize_entry("jsonrpc", JSONRPC_VERSION)?;
                map.serialize_entry("method", &n.method)?;
                if let Some(params) = &n.params {
                    map.serialize_entry("params", params)?;
                }
                map.end()
            }
            Message::SuccessResponse(r) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("jsonrpc", JSONRPC_VERSION)?;
                map.serialize_entry("id", &r.id)?;
                map.serialize_entry("result", &r.result)?;
                map.end()
            }
            Message::ErrorResponse(r) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("jsonrpc", JSONRPC_VERSION)?;
                map.serialize_entry("id", &r.id)?;
                map.serialize_entry("error", &ErrorObject(r))?;
                map.end()
            }
        }
    }
}

impl TryFrom<Value> for Message {
    type Error = WireError;

    fn try_from(value: Value) -> Result<Self> {
        let mut doc = match value {
            Value::Object(doc) => doc,
            other => {
                return Err(WireError::malformed(format!(
                    "expected a JSON object, found {}",
                    kind_of(&other)
                )))
            }
        };

        match doc.remove("jsonrpc") {
            Some(Value::String(v)) if v == JSONRPC_VERSION => {}
            Some(other) => {
                return Err(WireError::malformed(format!(
                    "unsupported jsonrpc version {}",
                    other
                )))
            }
            None => return Err(WireError::malformed("missing \"jsonrpc\" member")),
        }

        if let Some(method) = doc.remove("method") {
            let Value::String(method) = method else {
                return Err(WireError::malformed("\"method\" must be a string"));
            };
            if doc.contains_key("result") || doc.contains_key("error") {
                return Err(WireError::malformed(
                    "a request cannot carry \"result\" or \"error\"",
                ));
            }
            let params = take_params(&mut doc)?;
            return Ok(match doc.remove("id") {
                Some(id) => Message::Request(Request {
                    id: parse_id(id)?,
                    method,
                    params,
                }),
                None => Message::Notification(Notification { method, params }),
            });
        }

        let id = match doc.remove("id") {
            Some(id) => parse_id(id)?,
            None => return Err(WireError::malformed("response is missing \"id\"")),
        };

        match (doc.remove("result"), doc.remove("error")) {
            (Some(result), None) => Ok(Message::SuccessResponse(SuccessResponse { id, result })),
            (None, Some(error)) => parse_error_object(id, error),
            (Some(_), Some(_)) => Err(WireError::malformed(
                "response carries both \"result\" and \"error\"",
            )),
            (None, None) => Err(WireError::malformed(
                "message has neither \"method\", \"result\" nor \"error\"",
            )),
        }
    }
}

fn parse_id(id: Value) -> Result<RequestId> {
    match id {
        Value::String(s) => Ok(RequestId::String(s)),
        Value::Number(n) => n
            .as_i64()
            .map(RequestId::Number)
            .ok_or_else(|| WireError::malformed(format!("\"id\" {} is not an integer", n))),
        other => Err(WireError::malformed(format!(
            "\"id\" must be an integer or string, found {}",
            kind_of(&other)
        ))),
    }
}

// A null "params" is read as absent.
fn take_params(doc: &mut Map<String, Value>) -> Result<Option<Params>> {
    match doc.remove("params") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(values)) => Ok(Some(Params::Array(values))),
        Some(Value::Object(map)) => Ok(Some(Params::Object(map))),
        Some(other) => Err(WireError::malformed(format!(
            "\"params\" must be an array or object, found {}",
            kind_of(&other)
        ))),
    }
}

fn parse_error_object(id: RequestId, error: Value) -> Result<Message> {
    let Value::Object(mut error) = error else {
        return Err(WireError::malformed("\"error\" must be an object"));
    };
    let code = error
        .remove("code")
        .and_then(|c| c.as_i64())
        .ok_or_else(|| WireError::malformed("\"error.code\" must be an integer"))?;
    let message = match error.remove("message") {
        Some(Value::String(m)) => m,
        _ => return Err(WireError::malformed("\"error.message\" must be a string")),
    };
    Ok(Message::ErrorResponse(ErrorResponse {
        id,
        code,
        message,
        data: error.remove("data"),
    }))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Control protocol messages exchanged with the engine
//!
//! Wire shape (one JSON document per record):
//! - request:  `{"command": "set_asl", "value": true}`
//! - response: `{"status": "ok", "message": "...", "data": {"fps": 30}}`

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ControlError, Result};

/// Command names understood by the engine. The vocabulary is open: any other
/// name is passed through as-is.
pub mod commands {
    pub const GET_STATUS: &str = "get_status";
    pub const SET_ASL: &str = "set_asl";
    pub const TOGGLE_ASL: &str = "toggle_asl";
    pub const SET_CAMERA: &str = "set_camera";
    pub const START: &str = "start";
    pub const STOP: &str = "stop";
}

/// Scalar request argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Argument {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Argument {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Argument::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Argument::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Argument::Int(n) => Some(*n as f64),
            Argument::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Argument::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Bool(b) => write!(f, "{}", b),
            Argument::Int(n) => write!(f, "{}", n),
            Argument::Float(x) => write!(f, "{}", x),
            Argument::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<bool> for Argument {
    fn from(value: bool) -> Self {
        Argument::Bool(value)
    }
}

impl From<i64> for Argument {
    fn from(value: i64) -> Self {
        Argument::Int(value)
    }
}

impl From<i32> for Argument {
    fn from(value: i32) -> Self {
        Argument::Int(value.into())
    }
}

impl From<f64> for Argument {
    fn from(value: f64) -> Self {
        Argument::Float(value)
    }
}

impl From<&str> for Argument {
    fn from(value: &str) -> Self {
        Argument::Text(value.to_string())
    }
}

impl From<String> for Argument {
    fn from(value: String) -> Self {
        Argument::Text(value)
    }
}

/// Request from client to engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "command")]
    pub name: String,

    #[serde(rename = "value", default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<Argument>,
}

impl Request {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            argument: None,
        }
    }

    pub fn with_argument(name: impl Into<String>, argument: impl Into<Argument>) -> Self {
        Self {
            name: name.into(),
            argument: Some(argument.into()),
        }
    }

    pub fn get_status() -> Self {
        Self::new(commands::GET_STATUS)
    }

    pub fn toggle_asl() -> Self {
        Self::new(commands::TOGGLE_ASL)
    }

    pub fn set_asl(enabled: bool) -> Self {
        Self::with_argument(commands::SET_ASL, enabled)
    }

    pub fn set_camera(index: i64) -> Self {
        Self::with_argument(commands::SET_CAMERA, index)
    }

    pub fn start() -> Self {
        Self::new(commands::START)
    }

    pub fn stop() -> Self {
        Self::new(commands::STOP)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Error,
}

/// Response from engine to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Command-specific payload, not schema-checked here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,

    /// Top-level keys outside the envelope, kept for forward compatibility
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            message: None,
            data: None,
            extra: Map::new(),
        }
    }

    pub fn ok_with_data(data: Map<String, Value>) -> Self {
        Self {
            data: Some(data),
            ..Self::ok()
        }
    }

    pub fn ok_with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: Some(message.into()),
            data: None,
            extra: Map::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Error text for `status=error`, tolerating engines that omit it
    pub fn error_message(&self) -> &str {
        self.message
            .as_deref()
            .unwrap_or("engine reported an error without a message")
    }

    /// Turn an application-level error into a protocol error
    pub fn into_result(self, command: &str) -> Result<Self> {
        match self.status {
            Status::Ok => Ok(self),
            Status::Error => Err(ControlError::Rejected {
                command: command.to_string(),
                message: self.error_message().to_string(),
            }),
        }
    }

    /// Look a key up in `data` first, then among top-level extras
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data
            .as_ref()
            .and_then(|d| d.get(key))
            .or_else(|| self.extra.get(key))
    }
}

/// Typed view of a `get_status` payload
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_processing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asl_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    /// Keys this client does not know about
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StatusReport {
    /// Read known keys defensively: a missing or mistyped key is `None`
    pub fn from_data(data: &Map<String, Value>) -> Self {
        let extra = data
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "is_processing" | "asl_enabled" | "fps"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self {
            is_processing: get_bool(data, "is_processing"),
            asl_enabled: get_bool(data, "asl_enabled"),
            fps: get_number(data, "fps"),
            extra,
        }
    }

    pub fn from_response(response: &Response) -> Self {
        response
            .data
            .as_ref()
            .map(Self::from_data)
            .unwrap_or_default()
    }

    /// Frame rate with the fraction dropped, negative values clamp to zero
    pub fn fps_whole(&self) -> Option<u32> {
        self.fps
            .filter(|f| f.is_finite())
            .map(|f| f.trunc().clamp(0.0, u32::MAX as f64) as u32)
    }
}

/// Typed view of a boolean feature after a set/toggle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureState {
    pub enabled: Option<bool>,
}

impl FeatureState {
    pub fn from_response(response: &Response, key: &str) -> Self {
        Self {
            enabled: response.field(key).and_then(Value::as_bool),
        }
    }
}

/// Get-or-none accessor for boolean payload keys
pub fn get_bool(data: &Map<String, Value>, key: &str) -> Option<bool> {
    data.get(key).and_then(Value::as_bool)
}

/// Get-or-none accessor for numeric payload keys (integer or float)
pub fn get_number(data: &Map<String, Value>, key: &str) -> Option<f64> {
    data.get(key).and_then(Value::as_f64)
}

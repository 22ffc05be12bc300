//! Command dispatch on the engine side

use parking_lot::Mutex;
use serde_json::{json, Value};

use handmouse_core::protocol::{commands, Request, Response};

/// Turns one request into one response. Unknown commands must be answered
/// with `status=error`, never by dropping the connection.
pub trait CommandHandler: Send + Sync + 'static {
    fn handle(&self, request: &Request) -> Response;
}

/// Live engine values exposed over the control channel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineSnapshot {
    pub is_processing: bool,
    pub asl_enabled: bool,
    pub fps: f64,
    pub camera_index: i64,
}

/// Reference control surface over an in-memory snapshot. The processing
/// pipeline updates counters through [`EngineControls::record_fps`].
#[derive(Debug, Default)]
pub struct EngineControls {
    state: Mutex<EngineSnapshot>,
}

impl EngineControls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: EngineSnapshot) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.state.lock().clone()
    }

    pub fn record_fps(&self, fps: f64) {
        self.state.lock().fps = fps;
    }
}

impl CommandHandler for EngineControls {
    fn handle(&self, request: &Request) -> Response {
        let mut state = self.state.lock();
        let arg = request.argument.as_ref();

        match request.name.as_str() {
            commands::GET_STATUS => {
                let data = json!({
                    "is_processing": state.is_processing,
                    "asl_enabled": state.asl_enabled,
                    "fps": state.fps,
                });
                match data {
                    Value::Object(map) => Response::ok_with_data(map),
                    _ => Response::error("status payload is not an object"),
                }
            }
            commands::TOGGLE_ASL => {
                state.asl_enabled = !state.asl_enabled;
                with_field(Response::ok(), "asl_enabled", state.asl_enabled.into())
            }
            commands::SET_ASL => match arg.and_then(|a| a.as_bool()) {
                Some(enabled) => {
                    state.asl_enabled = enabled;
                    with_field(Response::ok(), "asl_enabled", enabled.into())
                }
                None => Response::error("set_asl expects a boolean value"),
            },
            commands::SET_CAMERA => match arg.and_then(|a| a.as_i64()) {
                Some(index) if index >= 0 => {
                    state.camera_index = index;
                    with_field(Response::ok(), "camera_index", index.into())
                }
                _ => Response::error("set_camera expects a non-negative integer"),
            },
            commands::START => {
                state.is_processing = true;
                Response::ok_with_message("Engine started")
            }
            commands::STOP => {
                state.is_processing = false;
                Response::ok_with_message("Engine stopped")
            }
            other => Response::error(format!("Unknown command: {}", other)),
        }
    }
}

fn with_field(mut response: Response, key: &str, value: Value) -> Response {
    response.extra.insert(key.to_string(), value);
    response
}

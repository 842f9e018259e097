// src/bridge.rs
//! Thin script-facing shims matching the stable JSON surface scripted code
//! submits through and drains results from. This is the anti-corruption
//! boundary: everything on the far side of it is host-language-shaped JSON;
//! everything on the near side is the crate's own typed payloads.

use std::any::Any;
use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::host::HostLoop;
use crate::payload::{CallbackData, FrameEvent, GenericCommand};
use crate::ring::PushOutcome;

/// Script-facing bridge over one `HostLoop`. Cheap to construct; borrows the
/// host for the duration of each call.
pub struct ScriptBridge<'a> {
    host: &'a HostLoop,
    clock: &'a dyn Clock,
}

impl<'a> ScriptBridge<'a> {
    pub fn new(host: &'a HostLoop, clock: &'a dyn Clock) -> Self {
        Self { host, clock }
    }

    /// Submit a generic command. `payload_json` is handed to the handler
    /// verbatim (as a `String` payload) for it to parse; `callback`, if
    /// present, is stored and later retrieved by `callback_id` when the result
    /// is drained. Returns the allocated callback id (0 if `callback` was
    /// `None`).
    pub fn submit(
        &self,
        command_type: &str,
        payload_json: &str,
        agent_id: &str,
        callback: Option<Box<dyn Any + Send>>,
    ) -> Result<u64> {
        let callback_id = match callback {
            Some(handle) => {
                let id = self.host.callback_ids().allocate();
                self.host.executor.store_callback(id, handle);
                id
            }
            None => 0,
        };

        let command = GenericCommand {
            command_type: command_type.to_string(),
            payload: Some(Box::new(payload_json.to_string())),
            agent_id: agent_id.to_string(),
            callback_id,
            timestamp_millis: crate::clock::timestamp_millis(self.clock),
        };

        match self.host.generic_queue.push(command) {
            PushOutcome::Ok => Ok(callback_id),
            PushOutcome::Full => Err(Error::QueueFull {
                queue: "generic".to_string(),
                used: self.host.generic_queue.approx_len(),
                capacity: self.host.generic_queue.capacity(),
            }),
        }
    }

    pub fn register_handler(&self, command_type: &str, handler: crate::executor::HandlerFunc) -> bool {
        self.host.executor.register_handler(command_type, handler)
    }

    pub fn unregister_handler(&self, command_type: &str) -> bool {
        self.host.executor.unregister_handler(command_type)
    }

    pub fn get_registered_types(&self) -> Vec<String> {
        self.host.executor.registered_types()
    }

    /// Drain the callback queue and return each record as JSON, matching the
    /// `{callbackId, resultId, errorMessage, type, resultJson?}` shape.
    pub fn drain_callbacks_json(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.host.callback_queue.drain(|data| {
            out.push(CallbackWire::from(&data).to_json());
        });
        out
    }

    /// Drain the frame-event queue and return each event as JSON.
    pub fn drain_frame_events_json(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.host.frame_event_queue.drain(|event| {
            if let Some(wire) = frame_event_to_json(&event) {
                out.push(wire);
            }
        });
        out
    }

    /// Retrieve a stored scripting-side callback handle by id, for the
    /// scripting runtime to invoke after matching a drained callback record.
    pub fn take_callback(&self, callback_id: u64) -> Option<Box<dyn Any + Send>> {
        self.host.executor.retrieve_callback(callback_id)
    }
}

#[derive(Serialize)]
struct CallbackWire {
    #[serde(rename = "callbackId")]
    callback_id: u64,
    #[serde(rename = "resultId")]
    result_id: u64,
    #[serde(rename = "errorMessage")]
    error_message: String,
    #[serde(rename = "type")]
    callback_type: &'static str,
    #[serde(rename = "resultJson", skip_serializing_if = "Option::is_none")]
    result_json: Option<String>,
}

impl From<&CallbackData> for CallbackWire {
    fn from(data: &CallbackData) -> Self {
        Self {
            callback_id: data.callback_id,
            result_id: data.result_id,
            error_message: data.error_message.clone(),
            callback_type: match data.callback_type {
                crate::payload::CallbackType::EntityCreated => "ENTITY_CREATED",
                crate::payload::CallbackType::CameraCreated => "CAMERA_CREATED",
                crate::payload::CallbackType::ResourceLoaded => "RESOURCE_LOADED",
                crate::payload::CallbackType::Generic => "GENERIC",
                crate::payload::CallbackType::Unknown => "UNKNOWN",
            },
            result_json: data.result_json.clone(),
        }
    }
}

impl CallbackWire {
    fn to_json(&self) -> String {
        serde_json::to_string(self).expect("CallbackWire is always serializable")
    }
}

fn frame_event_to_json(event: &FrameEvent) -> Option<String> {
    let value: Value = match *event {
        FrameEvent::None => return None,
        FrameEvent::KeyDown { key_code } => serde_json::json!({"type": "keyDown", "keyCode": key_code}),
        FrameEvent::KeyUp { key_code } => serde_json::json!({"type": "keyUp", "keyCode": key_code}),
        FrameEvent::MouseButtonDown { key_code } => {
            serde_json::json!({"type": "mouseButtonDown", "keyCode": key_code})
        }
        FrameEvent::MouseButtonUp { key_code } => {
            serde_json::json!({"type": "mouseButtonUp", "keyCode": key_code})
        }
        FrameEvent::CursorUpdate { x, y, dx, dy } => {
            serde_json::json!({"type": "cursorUpdate", "x": x, "y": y, "dx": dx, "dy": dy})
        }
    };
    Some(value.to_string())
}

// src/payload.rs
//! Wire payloads carried by each queue in `queues`.
//!
//! Every type here is `Default` so a drained `Ring` slot can be replaced with a
//! cheap placeholder (see `ring::Ring::drain`); the placeholder is never observed
//! by a consumer, only ever sitting in a slot between drains.

use std::any::Any;

pub type Vector3 = [f32; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetId(pub u64);

/// Render-thread-bound commands produced by the scripting side.
///
/// `UpdateEntityRelative` is first-class rather than synthesized client-side
/// from a read-modify-write: the consumer applies the delta directly.
#[derive(Debug, Clone, Default)]
pub enum RenderCommand {
    #[default]
    Noop,
    CreateMesh { entity: EntityId, mesh: AssetId, position: Vector3 },
    DestroyEntity(EntityId),
    UpdateEntity { entity: EntityId, position: Vector3 },
    UpdateEntityRelative { entity: EntityId, delta: Vector3 },
    CreateCamera { camera: CameraId, position: Vector3 },
    DestroyCamera(CameraId),
    UpdateCamera { camera: CameraId, position: Vector3 },
    SetActiveCamera(CameraId),
    UpdateCameraType { camera: CameraId, perspective: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceCommandKind {
    #[default]
    LoadTexture,
    LoadModel,
    LoadShader,
    LoadAudio,
    LoadFont,
    Unload,
}

/// A resource-loading request, serviced asynchronously by `jobs::ResourceJobPool`.
#[derive(Debug, Clone, Default)]
pub struct ResourceCommand {
    pub kind: ResourceCommandKind,
    pub path: String,
    /// [-100, 100]; higher runs sooner. Not validated here — the job pool clamps.
    pub priority: i8,
    pub is_async: bool,
    /// 0 ⇒ fire-and-forget.
    pub callback_id: u64,
}

/// Type-erased command dispatched through `GenericCommandExecutor`.
///
/// The scripting-side callback handle (if any) is *not* carried here — it is
/// stored separately via `executor::GenericCommandExecutor::store_callback`
/// before the command is submitted, keyed by `callback_id`, mirroring the split
/// between command payload and callback storage in the original design.
pub struct GenericCommand {
    pub command_type: String,
    pub payload: Option<Box<dyn Any + Send>>,
    pub agent_id: String,
    pub callback_id: u64,
    pub timestamp_millis: u64,
}

impl Default for GenericCommand {
    fn default() -> Self {
        Self {
            command_type: String::new(),
            payload: None,
            agent_id: String::new(),
            callback_id: 0,
            timestamp_millis: 0,
        }
    }
}

impl std::fmt::Debug for GenericCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericCommand")
            .field("command_type", &self.command_type)
            .field("agent_id", &self.agent_id)
            .field("callback_id", &self.callback_id)
            .field("timestamp_millis", &self.timestamp_millis)
            .field("has_payload", &self.payload.is_some())
            .finish()
    }
}

impl GenericCommand {
    pub fn has_callback(&self) -> bool {
        self.callback_id != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallbackType {
    EntityCreated,
    CameraCreated,
    ResourceLoaded,
    Generic,
    #[default]
    Unknown,
}

/// Result record delivered back to the scripting side through the callback queue.
#[derive(Debug, Clone, Default)]
pub struct CallbackData {
    pub callback_id: u64,
    pub result_id: u64,
    /// Empty ⇒ success.
    pub error_message: String,
    pub callback_type: CallbackType,
    /// Present only for `Generic` successes whose handler returned a JSON body.
    pub result_json: Option<String>,
}

impl CallbackData {
    pub fn is_success(&self) -> bool {
        self.error_message.is_empty()
    }
}

/// Main-thread-produced input events, drained once per script tick.
#[derive(Debug, Clone, Copy, Default)]
pub enum FrameEvent {
    #[default]
    None,
    KeyDown { key_code: u8 },
    KeyUp { key_code: u8 },
    MouseButtonDown { key_code: u8 },
    MouseButtonUp { key_code: u8 },
    CursorUpdate { x: f32, y: f32, dx: f32, dy: f32 },
}

// src/queues.rs
//! Per-flow specializations of `Ring`, one for each direction of traffic
//! crossing the script-worker / main-thread boundary.
//!
//! Each queue only adds one thing over the bare `Ring`: an `on_full` observer
//! that logs a warning naming the queue and its current submitted/consumed
//! counters, so a saturated queue shows up in the trace log instead of
//! silently dropping work.

use crate::error::Result;
use crate::payload::{CallbackData, FrameEvent, GenericCommand, RenderCommand, ResourceCommand};
use crate::ring::{QueueObserver, Ring};

pub const DEFAULT_RENDER_CAPACITY: usize = 1000;
pub const DEFAULT_GENERIC_CAPACITY: usize = 500;
pub const DEFAULT_CALLBACK_CAPACITY: usize = 100;
pub const DEFAULT_FRAME_EVENT_CAPACITY: usize = 256;
pub const DEFAULT_RESOURCE_CAPACITY: usize = 200;

/// Logs once, at warn level, every time the owning queue rejects a `push`.
pub struct QueueFullLogger {
    name: &'static str,
}

impl QueueFullLogger {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl<T> QueueObserver<T> for QueueFullLogger {
    fn on_full(&self, submitted: u64, consumed: u64) {
        tracing::warn!(queue = self.name, submitted, consumed, "queue full, rejecting submission");
    }
}

pub type RenderQueue = Ring<RenderCommand, QueueFullLogger>;
pub type ResourceQueue = Ring<ResourceCommand, QueueFullLogger>;
pub type GenericQueue = Ring<GenericCommand, QueueFullLogger>;
pub type CallbackQueue = Ring<CallbackData, QueueFullLogger>;
pub type FrameEventQueue = Ring<FrameEvent, QueueFullLogger>;

pub fn render_queue(capacity: usize) -> Result<RenderQueue> {
    RenderQueue::with_observer(capacity, QueueFullLogger::new("render"))
}

pub fn resource_queue(capacity: usize) -> Result<ResourceQueue> {
    ResourceQueue::with_observer(capacity, QueueFullLogger::new("resource"))
}

pub fn generic_queue(capacity: usize) -> Result<GenericQueue> {
    GenericQueue::with_observer(capacity, QueueFullLogger::new("generic"))
}

pub fn callback_queue(capacity: usize) -> Result<CallbackQueue> {
    CallbackQueue::with_observer(capacity, QueueFullLogger::new("callback"))
}

pub fn frame_event_queue(capacity: usize) -> Result<FrameEventQueue> {
    FrameEventQueue::with_observer(capacity, QueueFullLogger::new("frame_event"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{CameraId, EntityId, FrameEvent as FE};
    use crate::ring::PushOutcome;

    #[test]
    fn default_capacities_match_flow_table() {
        assert_eq!(render_queue(DEFAULT_RENDER_CAPACITY).unwrap().capacity(), 1000);
        assert_eq!(generic_queue(DEFAULT_GENERIC_CAPACITY).unwrap().capacity(), 500);
        assert_eq!(callback_queue(DEFAULT_CALLBACK_CAPACITY).unwrap().capacity(), 100);
        assert_eq!(frame_event_queue(DEFAULT_FRAME_EVENT_CAPACITY).unwrap().capacity(), 256);
        assert_eq!(resource_queue(DEFAULT_RESOURCE_CAPACITY).unwrap().capacity(), 200);
    }

    #[test]
    fn frame_events_preserve_order() {
        let queue = frame_event_queue(16).unwrap();
        assert_eq!(queue.push(FE::KeyDown { key_code: 65 }), PushOutcome::Ok);
        assert_eq!(queue.push(FE::KeyDown { key_code: 66 }), PushOutcome::Ok);
        assert_eq!(
            queue.push(FE::CursorUpdate { x: 1.0, y: 2.0, dx: 0.0, dy: 0.0 }),
            PushOutcome::Ok
        );
        assert_eq!(queue.push(FE::KeyUp { key_code: 65 }), PushOutcome::Ok);

        let mut drained = Vec::new();
        queue.drain(|ev| drained.push(ev));
        assert_eq!(drained.len(), 4);
        assert!(matches!(drained[0], FE::KeyDown { key_code: 65 }));
        assert!(matches!(drained[1], FE::KeyDown { key_code: 66 }));
        assert!(matches!(drained[2], FE::CursorUpdate { x, y, .. } if x == 1.0 && y == 2.0));
        assert!(matches!(drained[3], FE::KeyUp { key_code: 65 }));
    }

    #[test]
    fn render_queue_accepts_entity_and_camera_commands() {
        let queue = render_queue(4).unwrap();
        assert_eq!(
            queue.push(RenderCommand::DestroyEntity(EntityId(1))),
            PushOutcome::Ok
        );
        assert_eq!(
            queue.push(RenderCommand::SetActiveCamera(CameraId(0))),
            PushOutcome::Ok
        );
        assert_eq!(queue.drain(|_| {}), 2);
    }
}

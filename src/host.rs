// src/host.rs
//! Owns every queue and the dispatcher for the lifetime of the engine, and
//! exposes the single per-frame entry point the host calls.

use std::sync::Arc;

use crate::callback_id::CallbackIdAllocator;
use crate::clock::Clock;
use crate::config::CommandPlaneConfig;
use crate::error::Result;
use crate::executor::GenericCommandExecutor;
use crate::jobs::ResourceJobPool;
use crate::payload::RenderCommand;
use crate::queues::{
    self, CallbackQueue, FrameEventQueue, GenericQueue, RenderQueue, ResourceQueue,
};

pub struct HostLoop {
    pub render_queue: RenderQueue,
    pub resource_queue: ResourceQueue,
    pub generic_queue: GenericQueue,
    pub callback_queue: CallbackQueue,
    pub frame_event_queue: FrameEventQueue,
    pub executor: GenericCommandExecutor,
    pub resource_jobs: ResourceJobPool,
    callback_ids: CallbackIdAllocator,
}

impl HostLoop {
    pub fn new(config: &CommandPlaneConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Ok(Self {
            render_queue: queues::render_queue(config.render_capacity)?,
            resource_queue: queues::resource_queue(config.resource_capacity)?,
            generic_queue: queues::generic_queue(config.generic_capacity)?,
            callback_queue: queues::callback_queue(config.callback_capacity)?,
            frame_event_queue: queues::frame_event_queue(config.frame_event_capacity)?,
            executor: {
                let executor = GenericCommandExecutor::new(clock);
                executor.set_rate_limit_per_agent(config.rate_limit_per_agent);
                executor.set_audit_logging_enabled(config.audit_logging_enabled);
                executor
            },
            resource_jobs: ResourceJobPool::new(config.resource_job_workers),
            callback_ids: CallbackIdAllocator::new(),
        })
    }

    pub fn callback_ids(&self) -> &CallbackIdAllocator {
        &self.callback_ids
    }

    /// The one function the host calls, once per frame: drain every
    /// script→main queue, run the dispatcher, service resource-job results,
    /// then flush whatever became ready for delivery back to the script side.
    ///
    /// `on_render_command` is the caller's render-command consumer; everything
    /// else (generic dispatch, callback delivery, resource-job bookkeeping) is
    /// handled internally.
    #[tracing::instrument(skip_all)]
    pub fn pump_main_thread(&self, mut on_render_command: impl FnMut(RenderCommand)) {
        self.render_queue.drain(&mut on_render_command);

        self.resource_queue.drain(|command| {
            self.resource_jobs.submit(command);
        });

        self.generic_queue.drain(|command| {
            self.executor.execute_command(command);
        });

        self.executor.drain_pending_callbacks(&self.callback_queue);
        self.resource_jobs.deliver_results(&self.callback_queue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::payload::{EntityId, GenericCommand};
    use crate::ring::PushOutcome;
    use std::collections::HashMap;

    #[test]
    fn pump_drains_render_and_generic_queues() {
        let host = HostLoop::new(&CommandPlaneConfig::default(), Arc::new(SystemClock::new())).unwrap();
        host.executor.register_handler(
            "echo",
            Box::new(|_| crate::handler_result::HandlerResult::success(HashMap::new())),
        );

        assert_eq!(
            host.render_queue.push(RenderCommand::DestroyEntity(EntityId(1))),
            PushOutcome::Ok
        );
        assert_eq!(
            host.generic_queue.push(GenericCommand {
                command_type: "echo".to_string(),
                payload: None,
                agent_id: "ai-1".to_string(),
                callback_id: 0,
                timestamp_millis: 0,
            }),
            PushOutcome::Ok
        );

        let mut rendered = Vec::new();
        host.pump_main_thread(|cmd| rendered.push(cmd));

        assert_eq!(rendered.len(), 1);
        assert_eq!(host.executor.total_executed(), 1);
    }

    #[test]
    fn queue_full_backpressure_then_recovers() {
        let mut config = CommandPlaneConfig::default();
        config.generic_capacity = 4;
        let host = HostLoop::new(&config, Arc::new(SystemClock::new())).unwrap();

        let mut ok_count = 0;
        let mut full_count = 0;
        for _ in 0..5 {
            match host.generic_queue.push(GenericCommand::default()) {
                PushOutcome::Ok => ok_count += 1,
                PushOutcome::Full => full_count += 1,
            }
        }
        assert_eq!(ok_count, 3);
        assert_eq!(full_count, 2);

        host.pump_main_thread(|_| {});

        let mut ok_after = 0;
        for _ in 0..2 {
            if host.generic_queue.push(GenericCommand::default()) == PushOutcome::Ok {
                ok_after += 1;
            }
        }
        assert_eq!(ok_after, 2);
    }
}

// tests/command_plane_scenarios.rs
//! End-to-end scenarios exercising the whole dispatcher + queue wiring
//! together, rather than one module in isolation.

use std::collections::HashMap;
use std::sync::Arc;

use command_plane::clock::SystemClock;
use command_plane::config::CommandPlaneConfig;
use command_plane::handler_result::HandlerResult;
use command_plane::host::HostLoop;
use command_plane::payload::{EntityId, FrameEvent, GenericCommand, RenderCommand};
use command_plane::ring::PushOutcome;

fn command(command_type: &str, agent_id: &str, callback_id: u64) -> GenericCommand {
    GenericCommand {
        command_type: command_type.to_string(),
        payload: None,
        agent_id: agent_id.to_string(),
        callback_id,
        timestamp_millis: 0,
    }
}

fn new_host() -> HostLoop {
    HostLoop::new(&CommandPlaneConfig::default(), Arc::new(SystemClock::new())).unwrap()
}

#[test]
fn fire_and_forget_produces_no_callbacks() {
    let host = new_host();
    host.executor
        .register_handler("echo", Box::new(|_| HandlerResult::success(HashMap::new())));

    for _ in 0..10 {
        assert_eq!(host.generic_queue.push(command("echo", "", 0)), PushOutcome::Ok);
    }

    host.pump_main_thread(|_| {});

    assert_eq!(host.executor.total_executed(), 10);
    let mut callbacks = Vec::new();
    host.callback_queue.drain(|cb| callbacks.push(cb));
    assert!(callbacks.is_empty());
}

#[test]
fn request_reply_delivers_exactly_one_callback() {
    let host = new_host();
    host.executor.register_handler(
        "create",
        Box::new(|_| {
            let mut data = HashMap::new();
            data.insert("resultId".to_string(), serde_json::json!(42));
            HandlerResult::success(data)
        }),
    );

    assert_eq!(host.generic_queue.push(command("create", "ai-1", 7)), PushOutcome::Ok);
    host.pump_main_thread(|_| {});

    let mut callbacks = Vec::new();
    host.callback_queue.drain(|cb| callbacks.push(cb));
    assert_eq!(callbacks.len(), 1);
    assert_eq!(callbacks[0].callback_id, 7);
    assert_eq!(callbacks[0].result_id, 42);
    assert!(callbacks[0].is_success());
}

#[test]
fn handler_failure_is_isolated_from_later_commands() {
    let host = new_host();
    host.executor
        .register_handler("boom", Box::new(|_| panic!("handler exploded")));
    host.executor
        .register_handler("echo", Box::new(|_| HandlerResult::success(HashMap::new())));

    for _ in 0..3 {
        host.generic_queue.push(command("boom", "ai-1", 0));
    }
    host.generic_queue.push(command("echo", "ai-1", 0));

    host.pump_main_thread(|_| {});

    assert_eq!(host.executor.total_errors(), 3);
    assert_eq!(host.executor.total_executed(), 1);
}

#[test]
fn queue_full_backpressure_with_capacity_four() {
    let mut config = CommandPlaneConfig::default();
    config.generic_capacity = 4;
    let host = HostLoop::new(&config, Arc::new(SystemClock::new())).unwrap();

    let mut ok = 0;
    let mut full = 0;
    for _ in 0..5 {
        match host.generic_queue.push(GenericCommand::default()) {
            PushOutcome::Ok => ok += 1,
            PushOutcome::Full => full += 1,
        }
    }
    assert_eq!(ok, 3);
    assert_eq!(full, 2);

    host.pump_main_thread(|_| {});

    let mut ok_after = 0;
    for _ in 0..2 {
        if host.generic_queue.push(GenericCommand::default()) == PushOutcome::Ok {
            ok_after += 1;
        }
    }
    assert_eq!(ok_after, 2);
}

#[test]
fn frame_events_drain_in_submission_order() {
    let host = new_host();
    host.frame_event_queue.push(FrameEvent::KeyDown { key_code: 65 });
    host.frame_event_queue.push(FrameEvent::KeyDown { key_code: 66 });
    host.frame_event_queue.push(FrameEvent::CursorUpdate { x: 1.0, y: 2.0, dx: 0.0, dy: 0.0 });
    host.frame_event_queue.push(FrameEvent::KeyUp { key_code: 65 });

    let mut drained = Vec::new();
    host.frame_event_queue.drain(|ev| drained.push(ev));

    assert_eq!(drained.len(), 4);
    assert!(matches!(drained[0], FrameEvent::KeyDown { key_code: 65 }));
    assert!(matches!(drained[1], FrameEvent::KeyDown { key_code: 66 }));
    assert!(matches!(drained[2], FrameEvent::CursorUpdate { .. }));
    assert!(matches!(drained[3], FrameEvent::KeyUp { key_code: 65 }));
}

#[test]
fn rate_limited_commands_carry_error_code_in_callback() {
    let host = new_host();
    host.executor
        .register_handler("spam", Box::new(|_| HandlerResult::success(HashMap::new())));
    host.executor.set_rate_limit_per_agent(2);

    for i in 0..10 {
        host.generic_queue.push(command("spam", "spammer", 100 + i));
    }
    host.pump_main_thread(|_| {});

    let mut callbacks = Vec::new();
    host.callback_queue.drain(|cb| callbacks.push(cb));
    assert!(callbacks.iter().any(|cb| cb.error_message == "ERR_RATE_LIMITED"));
}

#[test]
fn render_commands_reach_the_hosts_consumer() {
    let host = new_host();
    host.render_queue.push(RenderCommand::DestroyEntity(EntityId(7)));

    let mut seen = Vec::new();
    host.pump_main_thread(|cmd| seen.push(cmd));

    assert_eq!(seen.len(), 1);
    assert!(matches!(seen[0], RenderCommand::DestroyEntity(EntityId(7))));
}

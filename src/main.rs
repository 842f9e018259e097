// src/main.rs
//! Minimal host binary demonstrating the command plane wiring: a script-worker
//! thread submitting commands and draining callbacks/frame events, and a main
//! thread running `HostLoop::pump_main_thread` in a loop. This is a wiring
//! demonstration, not a real engine — the render/resource consumers here just
//! log what they would otherwise hand off to the renderer/asset pipeline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use command_plane::clock::SystemClock;
use command_plane::config::CommandPlaneConfig;
use command_plane::handler_result::HandlerResult;
use command_plane::host::HostLoop;
use command_plane::payload::{FrameEvent, GenericCommand};
use command_plane::ring::PushOutcome;

fn main() {
    setup_diagnostics();

    let config = CommandPlaneConfig::from_env();
    let host = Arc::new(
        HostLoop::new(&config, Arc::new(SystemClock::new())).expect("invalid command plane config"),
    );

    host.executor.register_handler(
        "entity.create",
        Box::new(|_payload| {
            let mut data = HashMap::new();
            data.insert("resultId".to_string(), serde_json::json!(1));
            HandlerResult::success(data)
        }),
    );

    let running = Arc::new(AtomicBool::new(true));

    let script_worker = {
        let host = host.clone();
        let running = running.clone();
        std::thread::Builder::new()
            .name("script-worker".to_string())
            .spawn(move || script_worker_loop(&host, &running))
            .expect("failed to spawn script worker")
    };

    let main_thread_budget = Duration::from_millis(500);
    let deadline = std::time::Instant::now() + main_thread_budget;
    while std::time::Instant::now() < deadline {
        host.pump_main_thread(|render_command| {
            tracing::trace!(?render_command, "render command drained");
        });
        host.frame_event_queue.push(FrameEvent::CursorUpdate { x: 0.0, y: 0.0, dx: 0.0, dy: 0.0 });
        std::thread::sleep(Duration::from_millis(16));
    }

    running.store(false, Ordering::Relaxed);
    script_worker.join().expect("script worker panicked");

    let stats = host.executor.statistics();
    tracing::info!(
        executed = stats.total_executed,
        errors = stats.total_errors,
        unhandled = stats.total_unhandled,
        rate_limited = stats.total_rate_limited,
        "command plane shutting down"
    );
}

fn script_worker_loop(host: &HostLoop, running: &AtomicBool) {
    let mut submitted = 0u64;
    while running.load(Ordering::Relaxed) {
        let command = GenericCommand {
            command_type: "entity.create".to_string(),
            payload: None,
            agent_id: "demo-agent".to_string(),
            callback_id: 0,
            timestamp_millis: 0,
        };
        if host.generic_queue.push(command) == PushOutcome::Ok {
            submitted += 1;
        }

        let mut frame_events = 0;
        host.frame_event_queue.drain(|_| frame_events += 1);
        if frame_events > 0 {
            tracing::trace!(frame_events, submitted, "script worker drained frame events");
        }

        std::thread::sleep(Duration::from_millis(8));
    }
}

fn setup_diagnostics() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    std::panic::set_hook(Box::new(|panic_info| {
        let message = match panic_info.payload().downcast_ref::<&'static str>() {
            Some(s) => (*s).to_string(),
            None => match panic_info.payload().downcast_ref::<String>() {
                Some(s) => s.clone(),
                None => "unknown panic payload".to_string(),
            },
        };
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown location".to_string());
        tracing::error!(%message, %location, "command plane host crashed");
    }));
}

// src/config.rs
//! Aggregates every per-queue capacity and dispatcher knob in one place.
//!
//! Construct directly for the common embedded-engine case; `from_env` reads a
//! `COMMAND_PLANE_*` environment layer as an override, mirroring how the rest
//! of the crate treats `RUST_LOG` as an override over programmatic defaults.

use crate::queues::{
    DEFAULT_CALLBACK_CAPACITY, DEFAULT_FRAME_EVENT_CAPACITY, DEFAULT_GENERIC_CAPACITY,
    DEFAULT_RENDER_CAPACITY, DEFAULT_RESOURCE_CAPACITY,
};

#[derive(Debug, Clone)]
pub struct CommandPlaneConfig {
    pub render_capacity: usize,
    pub resource_capacity: usize,
    pub generic_capacity: usize,
    pub callback_capacity: usize,
    pub frame_event_capacity: usize,
    /// 0 disables rate limiting.
    pub rate_limit_per_agent: u32,
    pub audit_logging_enabled: bool,
    pub resource_job_workers: usize,
}

impl Default for CommandPlaneConfig {
    fn default() -> Self {
        Self {
            render_capacity: DEFAULT_RENDER_CAPACITY,
            resource_capacity: DEFAULT_RESOURCE_CAPACITY,
            generic_capacity: DEFAULT_GENERIC_CAPACITY,
            callback_capacity: DEFAULT_CALLBACK_CAPACITY,
            frame_event_capacity: DEFAULT_FRAME_EVENT_CAPACITY,
            rate_limit_per_agent: 100,
            audit_logging_enabled: false,
            resource_job_workers: default_worker_count(),
        }
    }
}

fn default_worker_count() -> usize {
    std::thread::available_parallelism().map(|n| n.get().saturating_sub(1).max(1)).unwrap_or(1)
}

impl CommandPlaneConfig {
    /// Start from defaults, then apply any `COMMAND_PLANE_*` environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_usize("COMMAND_PLANE_RENDER_CAPACITY") {
            config.render_capacity = v;
        }
        if let Some(v) = env_usize("COMMAND_PLANE_RESOURCE_CAPACITY") {
            config.resource_capacity = v;
        }
        if let Some(v) = env_usize("COMMAND_PLANE_GENERIC_CAPACITY") {
            config.generic_capacity = v;
        }
        if let Some(v) = env_usize("COMMAND_PLANE_CALLBACK_CAPACITY") {
            config.callback_capacity = v;
        }
        if let Some(v) = env_usize("COMMAND_PLANE_FRAME_EVENT_CAPACITY") {
            config.frame_event_capacity = v;
        }
        if let Some(v) = std::env::var("COMMAND_PLANE_RATE_LIMIT_PER_AGENT")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
        {
            config.rate_limit_per_agent = v;
        }
        if let Some(v) = std::env::var("COMMAND_PLANE_AUDIT_LOGGING")
            .ok()
            .and_then(|s| s.parse::<bool>().ok())
        {
            config.audit_logging_enabled = v;
        }
        if let Some(v) = env_usize("COMMAND_PLANE_RESOURCE_JOB_WORKERS") {
            config.resource_job_workers = v;
        }
        config
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|s| s.parse::<usize>().ok())
}

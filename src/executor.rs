// src/executor.rs
//! Dispatches `GenericCommand`s drawn off the generic-command queue to named
//! handlers, with per-agent token-bucket rate limiting, panic-isolated
//! invocation, per-agent/per-type statistics, and async result delivery
//! through the callback queue.
//!
//! Handler registration is expected to complete before the first command is
//! consumed (startup-time only), so registry reads take a shared `RwLock` read
//! guard rather than a full mutex — cheap and effectively lock-free once the
//! registry has settled.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::clock::Clock;
use crate::error::Error;
use crate::handler_result::HandlerResult;
use crate::payload::{CallbackData, CallbackType, GenericCommand};
use crate::queues::CallbackQueue;

pub type HandlerFunc = Box<dyn Fn(Option<&(dyn Any + Send)>) -> HandlerResult + Send + Sync>;

/// Per-agent token bucket. Refills linearly with elapsed wall-clock time up to
/// `max_tokens`; each admitted command consumes one token.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    tokens: f64,
    last_refill_time: f64,
    max_tokens: u32,
    rejected_count: u32,
}

impl RateLimitState {
    fn new(now: f64, max_tokens: u32) -> Self {
        Self { tokens: max_tokens as f64, last_refill_time: now, max_tokens, rejected_count: 0 }
    }

    fn try_consume(&mut self, now: f64) -> bool {
        let elapsed = now - self.last_refill_time;
        if elapsed > 0.0 {
            self.tokens = (self.tokens + elapsed * self.max_tokens as f64).min(self.max_tokens as f64);
            self.last_refill_time = now;
        }
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            self.rejected_count += 1;
            false
        }
    }

    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    pub fn rejected_count(&self) -> u32 {
        self.rejected_count
    }
}

#[derive(Debug, Clone, Default)]
pub struct AgentStatistics {
    pub submitted: u64,
    pub executed: u64,
    pub failed: u64,
    pub rate_limited: u64,
    pub unhandled: u64,
}

#[derive(Debug, Clone, Default)]
pub struct TypeStats {
    pub executed: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Default)]
pub struct CommandStatistics {
    pub total_executed: u64,
    pub total_errors: u64,
    pub total_unhandled: u64,
    pub total_rate_limited: u64,
    pub agent_stats: HashMap<String, AgentStatistics>,
    pub type_stats: HashMap<String, TypeStats>,
}

struct PendingResult {
    result: Result<HandlerResult, Error>,
}

pub struct GenericCommandExecutor {
    handlers: RwLock<HashMap<String, Arc<HandlerFunc>>>,
    stored_callbacks: Mutex<HashMap<u64, Box<dyn Any + Send>>>,
    pending_results: Mutex<HashMap<u64, PendingResult>>,

    total_executed: AtomicU64,
    total_errors: AtomicU64,
    total_unhandled: AtomicU64,
    total_rate_limited: AtomicU64,

    agent_rate_limits: Mutex<HashMap<String, RateLimitState>>,
    rate_limit_per_agent: AtomicU32,

    agent_stats: Mutex<HashMap<String, AgentStatistics>>,
    type_stats: Mutex<HashMap<String, TypeStats>>,

    audit_logging_enabled: AtomicBool,
    clock: Arc<dyn Clock>,
}

impl GenericCommandExecutor {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            stored_callbacks: Mutex::new(HashMap::new()),
            pending_results: Mutex::new(HashMap::new()),
            total_executed: AtomicU64::new(0),
            total_errors: AtomicU64::new(0),
            total_unhandled: AtomicU64::new(0),
            total_rate_limited: AtomicU64::new(0),
            agent_rate_limits: Mutex::new(HashMap::new()),
            rate_limit_per_agent: AtomicU32::new(100),
            agent_stats: Mutex::new(HashMap::new()),
            type_stats: Mutex::new(HashMap::new()),
            audit_logging_enabled: AtomicBool::new(false),
            clock,
        }
    }

    // ---- Registration (quiescent, startup-time) ----

    pub fn register_handler(&self, command_type: impl Into<String>, handler: HandlerFunc) -> bool {
        let mut handlers = self.handlers.write();
        let command_type = command_type.into();
        if handlers.contains_key(&command_type) {
            return false;
        }
        handlers.insert(command_type, Arc::new(handler));
        true
    }

    pub fn unregister_handler(&self, command_type: &str) -> bool {
        self.handlers.write().remove(command_type).is_some()
    }

    pub fn has_handler(&self, command_type: &str) -> bool {
        self.handlers.read().contains_key(command_type)
    }

    pub fn registered_types(&self) -> Vec<String> {
        self.handlers.read().keys().cloned().collect()
    }

    // ---- Execution (steady state, main thread) ----

    pub fn execute_command(&self, command: GenericCommand) {
        let agent_id = command.agent_id.clone();
        let command_type = command.command_type.clone();
        let callback_id = command.callback_id;

        if !agent_id.is_empty() {
            self.agent_stats.lock().entry(agent_id.clone()).or_default().submitted += 1;
        }

        if !self.check_rate_limit(&agent_id) {
            self.total_rate_limited.fetch_add(1, Ordering::Relaxed);
            if !agent_id.is_empty() {
                self.agent_stats.lock().entry(agent_id.clone()).or_default().rate_limited += 1;
            }
            let rejected = self
                .agent_rate_limits
                .lock()
                .get(&agent_id)
                .map(|s| s.rejected_count())
                .unwrap_or(0);
            if rejected <= 1 || rejected % 100 == 0 {
                tracing::warn!(agent = %agent_id, %command_type, rejected, "rate limited");
            }
            if callback_id != 0 {
                self.store_pending(callback_id, Err(Error::RateLimited { agent_id: agent_id.clone() }));
            }
            return;
        }

        if !self.has_handler(&command_type) {
            self.total_unhandled.fetch_add(1, Ordering::Relaxed);
            if !agent_id.is_empty() {
                self.agent_stats.lock().entry(agent_id.clone()).or_default().unhandled += 1;
            }
            tracing::warn!(%command_type, "no handler registered");
            if callback_id != 0 {
                self.store_pending(callback_id, Err(Error::NoHandler(command_type.clone())));
            }
            return;
        }

        let payload_ref: Option<&(dyn Any + Send)> = command.payload.as_deref();
        let handler = {
            let handlers = self.handlers.read();
            match handlers.get(&command_type) {
                Some(handler) => handler.clone(),
                // unregistered between the check above and here; treat as unhandled.
                None => {
                    self.total_unhandled.fetch_add(1, Ordering::Relaxed);
                    if callback_id != 0 {
                        self.store_pending(callback_id, Err(Error::NoHandler(command_type.clone())));
                    }
                    return;
                }
            }
        };
        let outcome = catch_unwind(AssertUnwindSafe(|| handler(payload_ref)));

        let result = match outcome {
            Ok(handler_result) if handler_result.is_success() => {
                self.total_executed.fetch_add(1, Ordering::Relaxed);
                if !agent_id.is_empty() {
                    self.agent_stats.lock().entry(agent_id.clone()).or_default().executed += 1;
                }
                self.type_stats.lock().entry(command_type.clone()).or_default().executed += 1;
                Ok(handler_result)
            }
            Ok(handler_result) => {
                let detail = handler_result.error_message().unwrap_or("handler reported failure").to_string();
                self.record_failure(&agent_id, &command_type);
                Err(Error::HandlerError { command_type: command_type.clone(), detail })
            }
            Err(panic_payload) => {
                let detail = panic_message(&panic_payload);
                self.record_failure(&agent_id, &command_type);
                Err(Error::HandlerError { command_type: command_type.clone(), detail })
            }
        };

        if self.audit_logging_enabled.load(Ordering::Relaxed) {
            match &result {
                Ok(_) => tracing::info!(agent = %agent_id, %command_type, callback_id, "executed"),
                Err(err) => tracing::info!(agent = %agent_id, %command_type, callback_id, error = %err, "failed"),
            }
        }

        if callback_id != 0 {
            self.store_pending(callback_id, result);
        }
    }

    fn check_rate_limit(&self, agent_id: &str) -> bool {
        let limit = self.rate_limit_per_agent.load(Ordering::Relaxed);
        if limit == 0 || agent_id.is_empty() {
            return true;
        }
        let now = self.clock.now_seconds();
        let mut limits = self.agent_rate_limits.lock();
        let state = limits
            .entry(agent_id.to_string())
            .or_insert_with(|| RateLimitState::new(now, limit));
        state.try_consume(now)
    }

    fn record_failure(&self, agent_id: &str, command_type: &str) {
        self.total_errors.fetch_add(1, Ordering::Relaxed);
        if !agent_id.is_empty() {
            self.agent_stats.lock().entry(agent_id.to_string()).or_default().failed += 1;
        }
        self.type_stats.lock().entry(command_type.to_string()).or_default().failed += 1;
    }

    fn store_pending(&self, callback_id: u64, result: Result<HandlerResult, Error>) {
        self.pending_results.lock().insert(callback_id, PendingResult { result });
    }

    // ---- Callback delivery (main thread, after command drain) ----

    pub fn drain_pending_callbacks(&self, callback_queue: &CallbackQueue) -> usize {
        let mut pending = self.pending_results.lock();
        let mut delivered = 0;
        let mut retry = HashMap::new();
        for (callback_id, entry) in pending.drain() {
            let data = match &entry.result {
                Ok(handler_result) => CallbackData {
                    callback_id,
                    result_id: handler_result.result_id(),
                    error_message: String::new(),
                    callback_type: CallbackType::Generic,
                    result_json: handler_result.result_json(),
                },
                Err(err) => CallbackData {
                    callback_id,
                    result_id: 0,
                    error_message: err.as_callback_code(),
                    callback_type: CallbackType::Generic,
                    result_json: None,
                },
            };
            if callback_queue.push(data) == crate::ring::PushOutcome::Ok {
                delivered += 1;
            } else {
                tracing::warn!(callback_id, "callback queue full, deferring delivery");
                retry.insert(callback_id, entry);
            }
        }
        pending.extend(retry);
        delivered
    }

    // ---- Stored callback handles ----

    pub fn store_callback(&self, callback_id: u64, handle: Box<dyn Any + Send>) {
        self.stored_callbacks.lock().insert(callback_id, handle);
    }

    pub fn retrieve_callback(&self, callback_id: u64) -> Option<Box<dyn Any + Send>> {
        self.stored_callbacks.lock().remove(&callback_id)
    }

    // ---- Statistics & configuration ----

    pub fn total_executed(&self) -> u64 {
        self.total_executed.load(Ordering::Relaxed)
    }

    pub fn total_errors(&self) -> u64 {
        self.total_errors.load(Ordering::Relaxed)
    }

    pub fn total_unhandled(&self) -> u64 {
        self.total_unhandled.load(Ordering::Relaxed)
    }

    pub fn total_rate_limited(&self) -> u64 {
        self.total_rate_limited.load(Ordering::Relaxed)
    }

    pub fn statistics(&self) -> CommandStatistics {
        CommandStatistics {
            total_executed: self.total_executed(),
            total_errors: self.total_errors(),
            total_unhandled: self.total_unhandled(),
            total_rate_limited: self.total_rate_limited(),
            agent_stats: self.agent_stats.lock().clone(),
            type_stats: self.type_stats.lock().clone(),
        }
    }

    pub fn set_audit_logging_enabled(&self, enabled: bool) {
        self.audit_logging_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_audit_logging_enabled(&self) -> bool {
        self.audit_logging_enabled.load(Ordering::Relaxed)
    }

    pub fn set_rate_limit_per_agent(&self, max_commands_per_second: u32) {
        self.rate_limit_per_agent.store(max_commands_per_second, Ordering::Relaxed);
        let mut limits = self.agent_rate_limits.lock();
        for state in limits.values_mut() {
            state.max_tokens = max_commands_per_second;
        }
    }

    pub fn rate_limit_per_agent(&self) -> u32 {
        self.rate_limit_per_agent.load(Ordering::Relaxed)
    }

    pub fn agent_rate_limit_state(&self, agent_id: &str) -> Option<RateLimitState> {
        self.agent_rate_limits.lock().get(agent_id).cloned()
    }
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

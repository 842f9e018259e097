// src/error.rs
//! Error types for the command plane.
//!
//! - **Performance**: enum discriminant (cheap match), `#[inline]` everywhere, allocations
//!   only on error paths.
//! - **Confinement**: every variant here is caught at a single dispatcher frame. Nothing in
//!   this enum crosses a thread boundary directly — cross-thread failures travel as a
//!   callback record (see `callback`), never as a propagated `Error`.

use std::fmt;
use thiserror::Error;

/// Main error type — lightweight, Send + Sync + 'static, perfect for async and libraries.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// Invalid configuration at construction time (e.g. zero capacity).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// `Ring::push` found the queue at capacity.
    #[error("queue '{queue}' is full ({used}/{capacity} used)")]
    QueueFull { queue: String, used: usize, capacity: usize },

    /// Agent exceeded its token-bucket allowance.
    #[error("agent '{agent_id}' rate limited")]
    RateLimited { agent_id: String },

    /// No handler registered for a command type.
    #[error("no handler registered for command type '{0}'")]
    NoHandler(String),

    /// A handler's payload did not match the shape it expected.
    #[error("payload cast error in handler '{command_type}': {detail}")]
    PayloadCastError { command_type: String, detail: String },

    /// A handler ran and failed (including panics, caught at the dispatch frame).
    #[error("handler '{command_type}' failed: {detail}")]
    HandlerError { command_type: String, detail: String },

    /// Simple custom message (allocation only when the error happens).
    #[error("{0}")]
    Custom(String),

    /// Rich context chaining (like anyhow but zero-cost when you control the types).
    #[error("{message}: {source}")]
    WithContext {
        message: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a custom error message.
    #[inline]
    pub fn custom<S: Into<String>>(msg: S) -> Self {
        Self::Custom(msg.into())
    }

    /// Create a formatted custom error (like `format!` but returns `Error`).
    #[inline]
    pub fn format(args: fmt::Arguments) -> Self {
        Self::Custom(fmt::format(args))
    }

    /// Add context to any error (chainable, like `.context()` in anyhow).
    #[inline]
    pub fn context<C: Into<String>>(self, context: C) -> Self {
        Self::WithContext {
            message: context.into(),
            source: Box::new(self),
        }
    }

    /// Quick static message (no allocation if you pass a `&'static str`).
    #[inline]
    pub fn msg(msg: &'static str) -> Self {
        Self::Custom(msg.into())
    }

    #[inline]
    pub fn is_queue_full(&self) -> bool {
        matches!(self, Error::QueueFull { .. })
    }

    #[inline]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }

    #[inline]
    pub fn is_no_handler(&self) -> bool {
        matches!(self, Error::NoHandler(_))
    }

    #[inline]
    pub fn is_handler_failure(&self) -> bool {
        matches!(self, Error::PayloadCastError { .. } | Error::HandlerError { .. })
    }

    /// Stable, script-facing identifier used in callback error messages.
    /// `ERR_RATE_LIMITED` and `ERR_NO_HANDLER` are contractual; everything else
    /// is a human-readable diagnostic whose exact wording is not.
    pub fn as_callback_code(&self) -> String {
        match self {
            Error::RateLimited { .. } => "ERR_RATE_LIMITED".to_string(),
            Error::NoHandler(_) => "ERR_NO_HANDLER".to_string(),
            other => other.to_string(),
        }
    }
}

/// Convenient `Result` alias — use `crate::Result<T>` everywhere.
pub type Result<T> = std::result::Result<T, Error>;

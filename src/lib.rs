// src/lib.rs
//! Cross-thread command plane connecting a scripting worker thread to the
//! main/render thread: bounded lock-free SPSC queues for each direction of
//! traffic, plus a generic command dispatcher with per-agent rate limiting,
//! panic-isolated handler execution, and async callback delivery.
//!
//! `host::HostLoop` is the entry point for an embedding engine: it owns every
//! queue and the dispatcher, and exposes the one function (`pump_main_thread`)
//! the host calls once per frame.

#![allow(dead_code)]

pub mod bridge;
pub mod callback_id;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod handler_result;
pub mod host;
pub mod jobs;
pub mod payload;
pub mod queues;
pub mod ring;

pub use error::{Error, Result};

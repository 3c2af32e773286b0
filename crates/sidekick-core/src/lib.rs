//! # Sidekick Core
//!
//! Shared logic for Sidekick: data models, context extraction, request
//! scheduling, prompt assembly, and the inference backend trait.
//!
//! This crate contains no tokio, HTTP, filesystem I/O, or other
//! native-only dependencies. The only async seam is the
//! [`ChatBackend`](engine::ChatBackend) trait; everything else is
//! synchronous bookkeeping the calling application drives from its own
//! event loop.

pub mod complete;
pub mod context;
pub mod engine;
pub mod models;
pub mod platform;
pub mod retrieve;
pub mod scheduler;

//! # incubator
//!
//! Application layer around `incubator-core`: HTTP API, CLI, configuration
//! and tracing-backed notifications. The binary in `main.rs` is a thin
//! wrapper over this library so integration tests can build the router
//! directly.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod notify;

pub use error::AppError;

//! # Configuration
//!
//! Client configuration: backend location, request deadline, durable storage
//! location and logging.

pub mod client;

pub use client::{Config, ConfigError, LogFormat};

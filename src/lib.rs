//! Charla - a terminal client for streaming chat backends
//!
//! This library exposes modules for use in integration tests.

pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod sse;

//! GrowLight firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod protocol;
pub mod recipes;
pub mod scheduler;

// The adapters and drivers carry simulation backends on the host, so the
// crate compiles and tests everywhere.
pub mod adapters;
pub mod drivers;

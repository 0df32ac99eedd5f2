//! Application core: pure domain logic, zero I/O.
//!
//! This module holds the rules of the grow light: the light engine, the
//! write dispatcher, and the run loop that ties them to the scheduler and
//! the connection manager.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod events;
pub mod light_engine;
pub mod ports;
pub mod runtime;
pub mod service;

//! Peripheral drivers: the pixel strip and the task watchdog.

pub mod pixel_strip;
pub mod watchdog;

//! Kiln engine crate.
//!
//! Owns the platform + GPU runtime used by the scene editor: window and event
//! loop, device/surface lifecycle (including device loss), frame stepping,
//! input translation and logging.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;
pub mod paint;

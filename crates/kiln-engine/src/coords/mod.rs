//! Surface geometry shared by the runtime and renderers.
//!
//! Sizes are logical pixels (DPI-aware).

mod viewport;

pub use viewport::Viewport;

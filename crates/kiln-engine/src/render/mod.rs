//! Renderer-facing handles.
//!
//! Renderers own their GPU resources; the runtime hands them a [`RenderCtx`]
//! (device, queue, formats, viewport) and a [`RenderTarget`] (encoder plus the
//! color and depth attachments of the current frame).

mod ctx;

pub use ctx::{RenderCtx, RenderTarget};

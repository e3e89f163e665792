use anyhow::Result;
use winit::event::WindowEvent;
use winit::window::WindowId;

use crate::coords::Viewport;
use crate::device::Gpu;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
///
/// Device notifications are delivered on the event-loop thread, between
/// frames, never while `on_frame` runs:
/// 1. `on_device_restored` once the window's device exists (first creation
///    and after every restore);
/// 2. `on_device_lost` when the device became unusable; every resource built
///    against it must be dropped.
pub trait App {
    /// Called for window events.
    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// A device is available for this window. Errors are fatal for the
    /// runtime: the failure is logged and the loop exits.
    fn on_device_restored(&mut self, window_id: WindowId, gpu: &Gpu<'_>) -> Result<()>;

    /// The window's device was lost.
    fn on_device_lost(&mut self, window_id: WindowId) {
        let _ = window_id;
    }

    /// The drawable size changed (logical pixels).
    fn on_resize(&mut self, window_id: WindowId, viewport: Viewport) {
        let _ = (window_id, viewport);
    }

    /// Called once per rendered frame per window.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}

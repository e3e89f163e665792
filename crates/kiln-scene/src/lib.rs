//! Kiln scene crate.
//!
//! The editor core: an ordered store of object transforms, the device
//! resource manager that owns GPU handles across device loss and resize,
//! the per-frame update → render pipeline, and the drag-to-rotate tracking
//! state machine. GPU access goes through the [`GpuBackend`] trait; the wgpu
//! implementation lives in [`gpu`].

mod backend;
mod config;
mod draw;
mod error;
mod geometry;
mod renderer;
mod resources;
mod session;
mod store;
mod tracking;
mod transform;

pub mod gpu;

#[cfg(test)]
mod testing;

pub use backend::{GpuBackend, LoadSignal, ResourceSet};
pub use config::SceneConfig;
pub use draw::{DrawCmd, DrawList, ModelViewProjection};
pub use error::{Result, SceneError};
pub use geometry::{MeshData, VertexPositionColor};
pub use renderer::{RenderOutcome, SceneRenderer, SkipReason};
pub use resources::{DeviceResources, ResourceState};
pub use session::{wrap_angle, EditorSession, TransformField};
pub use store::TransformStore;
pub use tracking::{Tracker, TrackingState, DEGREES_PER_DRAG_UNIT};
pub use transform::Transform;

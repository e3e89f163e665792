//! Seam between the scene core and a GPU API.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::draw::DrawList;
use crate::error::Result;
use crate::geometry::MeshData;

/// Completion flag for asynchronous resource uploads.
///
/// Cloned into the backend's GPU completion callback; the resource manager
/// polls it and treats it as the only readiness gate.
#[derive(Debug, Clone, Default)]
pub struct LoadSignal(Arc<AtomicBool>);

impl LoadSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn complete(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_complete(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Every device handle built for one resource generation.
///
/// Dropped as a unit on release; never shared between generations.
pub struct ResourceSet<B: GpuBackend> {
    pub generation: u64,
    pub geometry: B::Geometry,
    pub programs: B::Programs,
    pub constants: B::ConstantBuffer,
    pub index_count: u32,
}

/// GPU operations the scene needs.
///
/// Creation calls may enqueue uploads; the backend must complete the signal
/// given to [`signal_when_idle`](GpuBackend::signal_when_idle) once all work
/// queued so far has been consumed by the GPU.
pub trait GpuBackend {
    type Geometry;
    type Programs;
    type ConstantBuffer;
    /// Per-frame target handed to [`execute`](GpuBackend::execute).
    type Target<'a>;

    fn create_geometry(&mut self, mesh: &MeshData) -> Result<Self::Geometry>;

    fn create_programs(&mut self) -> Result<Self::Programs>;

    fn create_constant_buffer(&mut self, programs: &Self::Programs) -> Result<Self::ConstantBuffer>;

    fn signal_when_idle(&mut self, signal: LoadSignal);

    /// Gives the backend a chance to run completion callbacks. Non-blocking.
    fn poll(&mut self);

    /// Plays `list` into `target` using the handles in `set`.
    fn execute(
        &mut self,
        set: &mut ResourceSet<Self>,
        list: &DrawList,
        target: &mut Self::Target<'_>,
    ) -> Result<()>
    where
        Self: Sized;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_is_shared_between_clones() {
        let signal = LoadSignal::new();
        let remote = signal.clone();
        assert!(!signal.is_complete());
        remote.complete();
        assert!(signal.is_complete());
    }
}

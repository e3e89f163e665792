//! Per-frame update and render of the transform store.

use glam::Mat4;
use kiln_engine::coords::Viewport;
use kiln_engine::time::StepTimer;

use crate::backend::GpuBackend;
use crate::config::SceneConfig;
use crate::draw::{DrawCmd, DrawList, ModelViewProjection};
use crate::error::Result;
use crate::resources::{DeviceResources, ResourceState};
use crate::session::wrap_angle;
use crate::store::TransformStore;
use crate::tracking::Tracker;

/// Why a frame was not drawn.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SkipReason {
    /// Device resources are unloaded or still uploading.
    NotLoaded,
    /// The timer has not produced an update step yet.
    NoFrameYet,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RenderOutcome {
    Skipped(SkipReason),
    /// Number of objects drawn.
    Drawn(usize),
}

/// Turns the transform store into draw calls.
///
/// `update` runs once per timer step and rebuilds the combined matrices;
/// `render` records one frame against the backend. Combined matrices are
/// transient render state and never written back into the store.
pub struct SceneRenderer<B: GpuBackend> {
    resources: DeviceResources<B>,
    transforms: TransformStore,
    tracker: Tracker,

    combined: Vec<Mat4>,
    /// Store revision the combined matrices were built from.
    combined_revision: Option<u64>,
    draw_list: DrawList,
    frames_seen: u64,
}

impl<B: GpuBackend> SceneRenderer<B> {
    pub fn new(config: &SceneConfig) -> Self {
        Self::with_store(config, TransformStore::new())
    }

    pub fn with_store(config: &SceneConfig, transforms: TransformStore) -> Self {
        Self {
            resources: DeviceResources::new(config),
            transforms,
            tracker: Tracker::new(config.degrees_per_drag_unit),
            combined: Vec::new(),
            combined_revision: None,
            draw_list: DrawList::new(),
            frames_seen: 0,
        }
    }

    // ── resource lifecycle ────────────────────────────────────────────────

    pub fn create_device_dependent_resources(&mut self, backend: &mut B) -> Result<u64> {
        self.resources.create_device_dependent_resources(backend)
    }

    pub fn create_window_size_dependent_resources(&mut self, viewport: Viewport) {
        self.resources.create_window_size_dependent_resources(viewport);
        self.refresh_matrices();
    }

    pub fn release_device_dependent_resources(&mut self) {
        self.resources.release_device_dependent_resources();
    }

    #[inline]
    pub fn resources(&self) -> &DeviceResources<B> {
        &self.resources
    }

    // ── store & tracking ──────────────────────────────────────────────────

    #[inline]
    pub fn transforms(&self) -> &TransformStore {
        &self.transforms
    }

    #[inline]
    pub fn transforms_mut(&mut self) -> &mut TransformStore {
        &mut self.transforms
    }

    pub fn start_tracking(&mut self) {
        self.tracker.start_tracking();
    }

    pub fn tracking_update(&mut self, position_delta: f32) {
        self.tracker.tracking_update(position_delta);
    }

    pub fn stop_tracking(&mut self) {
        self.tracker.stop_tracking();
    }

    /// Ends tracking and drops rotation not yet applied.
    pub fn cancel_tracking(&mut self) {
        self.tracker.cancel();
    }

    #[inline]
    pub fn is_tracking(&self) -> bool {
        self.tracker.is_tracking()
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Applies pending drag rotation to `selection` (Y axis) and rebuilds the
    /// combined matrix of every transform.
    ///
    /// A selection outside the store drops the pending rotation.
    pub fn update(&mut self, timer: &StepTimer, selection: Option<usize>) {
        if let Some(delta) = self.tracker.take_delta() {
            match selection.map(|i| self.transforms.get_mut(i)) {
                Some(Ok(t)) => t.rotation.y = wrap_angle(t.rotation.y + delta),
                Some(Err(err)) => log::debug!("tracking: dropping rotation, {err}"),
                None => {}
            }
        }

        self.refresh_matrices();
        self.frames_seen = timer.frame_count();
    }

    /// Records and executes one frame.
    ///
    /// Skips without touching the backend's command stream while resources
    /// are not ready or before the first update.
    pub fn render(&mut self, backend: &mut B, target: &mut B::Target<'_>) -> Result<RenderOutcome> {
        if self.resources.poll_loading(backend) != ResourceState::Ready {
            return Ok(RenderOutcome::Skipped(SkipReason::NotLoaded));
        }
        if self.frames_seen == 0 {
            return Ok(RenderOutcome::Skipped(SkipReason::NoFrameYet));
        }

        // Edits made since the last step are drawn this frame.
        if self.combined_revision != Some(self.transforms.revision()) {
            self.refresh_matrices();
        }

        let Some(set) = self.resources.ready_set_mut() else {
            return Ok(RenderOutcome::Skipped(SkipReason::NotLoaded));
        };

        self.draw_list.clear();
        if !self.combined.is_empty() {
            self.draw_list.push(DrawCmd::BindShared);
        }
        for m in &self.combined {
            self.draw_list.push(DrawCmd::UploadConstants(ModelViewProjection::from_mat4(*m)));
            self.draw_list.push(DrawCmd::DrawIndexed {
                index_count: set.index_count,
            });
        }

        backend.execute(set, &self.draw_list, target)?;
        Ok(RenderOutcome::Drawn(self.combined.len()))
    }

    /// Combined matrices from the last refresh, in store order.
    #[inline]
    pub fn combined_matrices(&self) -> &[Mat4] {
        &self.combined
    }

    fn refresh_matrices(&mut self) {
        let view_proj = self.resources.projection() * self.resources.view();
        self.combined.clear();
        self.combined
            .extend(self.transforms.iter().map(|t| view_proj * t.model_matrix()));
        self.combined_revision = Some(self.transforms.revision());
    }
}

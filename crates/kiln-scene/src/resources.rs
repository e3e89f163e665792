//! Device-dependent and window-size-dependent resources.

use glam::Mat4;
use kiln_engine::coords::Viewport;

use crate::backend::{GpuBackend, LoadSignal, ResourceSet};
use crate::config::SceneConfig;
use crate::error::{Result, SceneError};
use crate::geometry::MeshData;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResourceState {
    Unloaded,
    /// Handles exist; the GPU has not consumed the uploads yet.
    Loading,
    Ready,
}

enum Slot<B: GpuBackend> {
    Unloaded,
    Loading { set: ResourceSet<B>, signal: LoadSignal },
    Ready(ResourceSet<B>),
}

/// Owns the GPU handles of the scene and the camera matrices.
///
/// Lifecycle:
/// - `create_device_dependent_resources` builds a new generation and enters
///   `Loading`; `poll_loading` moves to `Ready` once the upload signal fired
/// - `release_device_dependent_resources` drops the generation (any state)
/// - `create_window_size_dependent_resources` only recomputes the projection
pub struct DeviceResources<B: GpuBackend> {
    slot: Slot<B>,
    next_generation: u64,

    mesh: MeshData,

    fov_y: f32,
    near: f32,
    far: f32,

    view: Mat4,
    projection: Mat4,
}

impl<B: GpuBackend> DeviceResources<B> {
    pub fn new(config: &SceneConfig) -> Self {
        Self::with_mesh(config, MeshData::cube())
    }

    pub fn with_mesh(config: &SceneConfig, mesh: MeshData) -> Self {
        Self {
            slot: Slot::Unloaded,
            next_generation: 1,
            mesh,
            fov_y: config.fov_y_degrees.to_radians(),
            near: config.near_plane,
            far: config.far_plane,
            view: Mat4::look_at_rh(config.eye(), config.target(), config.up()),
            projection: Mat4::IDENTITY,
        }
    }

    /// Builds geometry, programs and the per-draw constant buffer for a new
    /// generation and returns its number.
    ///
    /// Loaded resources are released first. On failure nothing of the new
    /// generation is kept and the manager stays `Unloaded`.
    pub fn create_device_dependent_resources(&mut self, backend: &mut B) -> Result<u64> {
        if !matches!(self.slot, Slot::Unloaded) {
            self.release_device_dependent_resources();
        }

        let generation = self.next_generation;
        self.next_generation += 1;

        let creation_error = move |resource: &'static str| {
            move |err: SceneError| {
                log::error!("resource generation {generation}: {resource} failed: {err}");
                SceneError::ResourceCreation {
                    resource,
                    generation,
                    reason: err.to_string(),
                }
            }
        };

        let geometry = backend
            .create_geometry(&self.mesh)
            .map_err(creation_error("geometry"))?;
        let programs = backend
            .create_programs()
            .map_err(creation_error("programs"))?;
        let constants = backend
            .create_constant_buffer(&programs)
            .map_err(creation_error("constant buffer"))?;

        let signal = LoadSignal::new();
        backend.signal_when_idle(signal.clone());

        self.slot = Slot::Loading {
            set: ResourceSet {
                generation,
                geometry,
                programs,
                constants,
                index_count: self.mesh.index_count(),
            },
            signal,
        };

        log::info!("resource generation {generation}: created, waiting for upload");
        Ok(generation)
    }

    /// Advances `Loading → Ready` if the upload completed.
    pub fn poll_loading(&mut self, backend: &mut B) -> ResourceState {
        if let Slot::Loading { .. } = self.slot {
            backend.poll();
            self.slot = match std::mem::replace(&mut self.slot, Slot::Unloaded) {
                Slot::Loading { set, signal } if signal.is_complete() => {
                    log::debug!("resource generation {}: ready", set.generation);
                    Slot::Ready(set)
                }
                other => other,
            };
        }
        self.state()
    }

    pub fn state(&self) -> ResourceState {
        match self.slot {
            Slot::Unloaded => ResourceState::Unloaded,
            Slot::Loading { .. } => ResourceState::Loading,
            Slot::Ready(_) => ResourceState::Ready,
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self.slot, Slot::Ready(_))
    }

    pub fn ready_set(&self) -> Option<&ResourceSet<B>> {
        match &self.slot {
            Slot::Ready(set) => Some(set),
            _ => None,
        }
    }

    pub fn ready_set_mut(&mut self) -> Option<&mut ResourceSet<B>> {
        match &mut self.slot {
            Slot::Ready(set) => Some(set),
            _ => None,
        }
    }

    /// Generation of the handles currently held, loading or ready.
    pub fn generation(&self) -> Option<u64> {
        match &self.slot {
            Slot::Unloaded => None,
            Slot::Loading { set, .. } | Slot::Ready(set) => Some(set.generation),
        }
    }

    /// Drops every device handle. Safe in any state, including before the
    /// first creation.
    pub fn release_device_dependent_resources(&mut self) {
        let released = std::mem::replace(&mut self.slot, Slot::Unloaded);
        match released {
            Slot::Unloaded => {}
            Slot::Loading { set, .. } | Slot::Ready(set) => {
                log::info!("resource generation {}: released", set.generation);
            }
        }
    }

    /// Recomputes the projection for `viewport`. Device handles are untouched.
    ///
    /// An empty viewport (minimized window) keeps the previous projection.
    pub fn create_window_size_dependent_resources(&mut self, viewport: Viewport) {
        if !viewport.is_valid() {
            log::debug!("ignoring empty viewport {}x{}", viewport.width, viewport.height);
            return;
        }

        let aspect = viewport.aspect_ratio();
        let fov = if viewport.is_portrait() {
            self.fov_y * 2.0
        } else {
            self.fov_y
        };

        self.projection = Mat4::perspective_rh(fov, aspect, self.near, self.far);
        log::debug!(
            "projection: {}x{} aspect {aspect:.3} fov {:.1}°",
            viewport.width,
            viewport.height,
            fov.to_degrees()
        );
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        self.view
    }

    #[inline]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    #[inline]
    pub fn mesh(&self) -> &MeshData {
        &self.mesh
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::testing::RecordingBackend;

    fn manager() -> DeviceResources<RecordingBackend> {
        DeviceResources::new(&SceneConfig::default())
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn ready_only_after_signal() {
        let mut backend = RecordingBackend::default();
        let mut res = manager();
        assert_eq!(res.state(), ResourceState::Unloaded);

        let generation = res.create_device_dependent_resources(&mut backend).unwrap();
        assert_eq!(generation, 1);
        assert_eq!(res.poll_loading(&mut backend), ResourceState::Loading);
        assert!(res.ready_set().is_none());

        backend.finish_uploads();
        assert_eq!(res.poll_loading(&mut backend), ResourceState::Ready);
        assert_eq!(res.ready_set().map(|s| s.index_count), Some(36));
    }

    #[test]
    fn release_is_idempotent_and_safe_before_create() {
        let mut backend = RecordingBackend::default();
        let mut res = manager();
        res.release_device_dependent_resources();
        res.release_device_dependent_resources();
        assert_eq!(res.state(), ResourceState::Unloaded);

        res.create_device_dependent_resources(&mut backend).unwrap();
        res.release_device_dependent_resources();
        res.release_device_dependent_resources();
        assert_eq!(res.state(), ResourceState::Unloaded);
        assert_eq!(res.generation(), None);
    }

    #[test]
    fn generations_are_monotonic_and_handles_fresh() {
        let mut backend = RecordingBackend::auto_complete();
        let mut res = manager();

        res.create_device_dependent_resources(&mut backend).unwrap();
        res.poll_loading(&mut backend);
        let first_geometry = res.ready_set().map(|s| s.geometry.id);

        res.release_device_dependent_resources();
        let generation = res.create_device_dependent_resources(&mut backend).unwrap();
        res.poll_loading(&mut backend);

        assert_eq!(generation, 2);
        assert_ne!(res.ready_set().map(|s| s.geometry.id), first_geometry);
        assert_eq!(backend.geometry_created, 2);
    }

    #[test]
    fn create_while_loaded_replaces_generation() {
        let mut backend = RecordingBackend::auto_complete();
        let mut res = manager();
        res.create_device_dependent_resources(&mut backend).unwrap();
        res.poll_loading(&mut backend);

        assert_eq!(res.create_device_dependent_resources(&mut backend).unwrap(), 2);
        assert_eq!(res.generation(), Some(2));
    }

    #[test]
    fn creation_failure_leaves_unloaded() {
        let mut backend = RecordingBackend::default();
        backend.fail_programs = true;
        let mut res = manager();

        let err = res.create_device_dependent_resources(&mut backend).unwrap_err();
        assert!(matches!(
            err,
            SceneError::ResourceCreation { resource: "programs", generation: 1, .. }
        ));
        assert_eq!(res.state(), ResourceState::Unloaded);
        assert!(backend.pending_signals.is_empty());

        // The failed generation number is not reused.
        backend.fail_programs = false;
        assert_eq!(res.create_device_dependent_resources(&mut backend).unwrap(), 2);
    }

    #[test]
    fn signal_from_released_generation_does_not_ready_the_next() {
        let mut backend = RecordingBackend::default();
        let mut res = manager();
        res.create_device_dependent_resources(&mut backend).unwrap();
        let stale = backend.pending_signals.remove(0);

        res.release_device_dependent_resources();
        res.create_device_dependent_resources(&mut backend).unwrap();
        stale.complete();

        assert_eq!(res.poll_loading(&mut backend), ResourceState::Loading);
    }

    // ── projection ────────────────────────────────────────────────────────

    #[test]
    fn resize_changes_projection_only() {
        let mut backend = RecordingBackend::auto_complete();
        let mut res = manager();
        res.create_device_dependent_resources(&mut backend).unwrap();
        res.poll_loading(&mut backend);
        let geometry = res.ready_set().map(|s| s.geometry.id);

        res.create_window_size_dependent_resources(Viewport::new(1600.0, 900.0));
        let wide = res.projection();
        res.create_window_size_dependent_resources(Viewport::new(800.0, 600.0));
        let narrow = res.projection();

        assert_ne!(wide, narrow);
        assert_eq!(res.ready_set().map(|s| s.geometry.id), geometry);
        assert_eq!(backend.geometry_created, 1);
        assert_eq!(backend.programs_created, 1);
        assert_eq!(backend.constant_buffers_created, 1);
        assert_eq!(res.generation(), Some(1));
    }

    #[test]
    fn projection_uses_aspect_ratio() {
        let mut res = manager();
        res.create_window_size_dependent_resources(Viewport::new(1600.0, 900.0));
        let p = res.projection();
        let aspect = 1600.0 / 900.0;
        // x scale = y scale / aspect for a perspective projection.
        assert_relative_eq!(p.x_axis.x * aspect, p.y_axis.y, epsilon = 1e-5);
        assert_relative_eq!(p.y_axis.y, 1.0 / (35.0f32.to_radians()).tan(), epsilon = 1e-5);
    }

    #[test]
    fn portrait_doubles_field_of_view() {
        let mut res = manager();
        res.create_window_size_dependent_resources(Viewport::new(600.0, 800.0));
        let p = res.projection();
        assert_relative_eq!(p.y_axis.y, 1.0 / (70.0f32.to_radians()).tan(), epsilon = 1e-5);
    }

    #[test]
    fn empty_viewport_keeps_previous_projection() {
        let mut res = manager();
        res.create_window_size_dependent_resources(Viewport::new(800.0, 600.0));
        let before = res.projection();
        res.create_window_size_dependent_resources(Viewport::new(0.0, 0.0));
        assert_eq!(res.projection(), before);
    }
}

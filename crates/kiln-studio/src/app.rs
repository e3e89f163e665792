use anyhow::{Context, Result};
use glam::Vec3;
use kiln_engine::core::{App, AppControl, FrameCtx};
use kiln_engine::coords::Viewport;
use kiln_engine::device::Gpu;
use kiln_engine::input::{InputFrame, InputState, Key, MouseButton};
use kiln_engine::paint::Color;
use kiln_engine::time::StepTimer;
use kiln_engine::window::CursorIcon;
use kiln_scene::gpu::WgpuBackend;
use kiln_scene::{
    EditorSession, RenderOutcome, SceneConfig, SceneRenderer, SkipReason, Transform,
    TransformField,
};
use winit::window::WindowId;

const POSITION_STEP: f32 = 0.1;
const ROTATION_STEP: f32 = 0.1;
const SCALE_STEP: f32 = 0.1;

/// Scene editor wired to the runtime.
///
/// Key bindings:
/// - left drag: rotate the selected object about Y
/// - `N` add an object, `Delete` remove the selected one
/// - `Tab` / `Shift+Tab` cycle the selection
/// - arrows, `PageUp`/`PageDown`: move the selection on X/Y/Z
///   (hold `R` to rotate, `S` to scale instead)
/// - `L` locked 60 Hz stepping, `F1` stats log, `F5` simulate device loss
/// - `Escape` exit
pub struct StudioApp {
    backend: Option<WgpuBackend>,
    renderer: SceneRenderer<WgpuBackend>,
    session: EditorSession,
    clear: Color,

    last_stats_second: u64,
    title_dirty: bool,
}

impl StudioApp {
    pub fn new(scene: &SceneConfig, mut session: EditorSession) -> Self {
        let mut renderer = SceneRenderer::new(scene);
        session.seed_default_scene(renderer.transforms_mut());

        Self {
            backend: None,
            renderer,
            session,
            clear: scene.clear_color(),
            last_stats_second: 0,
            title_dirty: true,
        }
    }

    fn handle_input(&mut self, input: &InputState, frame: &InputFrame) -> AppControl {
        if frame.key_pressed(Key::Escape) {
            return AppControl::Exit;
        }

        // ── tracking ──
        if frame.buttons_pressed.contains(&MouseButton::Left) {
            self.renderer.start_tracking();
        }
        if self.renderer.is_tracking() {
            self.renderer.tracking_update(frame.pointer_delta.0);
        }
        if frame.buttons_released.contains(&MouseButton::Left)
            || !input.button_down(MouseButton::Left)
        {
            self.renderer.stop_tracking();
        }

        // ── store edits ──
        if frame.key_pressed(Key::N) {
            let index = self.session.add_object(
                self.renderer.transforms_mut(),
                Transform::default().with_position(Vec3::new(0.0, 0.0, -2.0)),
            );
            log::info!("added object #{index}");
            self.title_dirty = true;
        }
        if frame.key_pressed(Key::Delete) {
            match self.session.remove_selected(self.renderer.transforms_mut()) {
                Ok(Some(_)) => {
                    log::info!("removed object, selection now {:?}", self.session.selection);
                    self.title_dirty = true;
                }
                Ok(None) => log::debug!("delete: nothing selected"),
                Err(err) => {
                    log::warn!("delete failed: {err}");
                    self.session.revalidate(self.renderer.transforms());
                }
            }
        }

        // ── selection ──
        if frame.key_pressed(Key::Tab) {
            if input.modifiers.shift {
                self.session.select_previous(self.renderer.transforms());
            } else {
                self.session.select_next(self.renderer.transforms());
            }
            self.title_dirty = true;
        }

        // ── field nudges ──
        let mode = if input.key_down(Key::R) {
            Mode::Rotate
        } else if input.key_down(Key::S) {
            Mode::Scale
        } else {
            Mode::Move
        };
        for (key, axis, sign) in [
            (Key::ArrowLeft, 0, -1.0),
            (Key::ArrowRight, 0, 1.0),
            (Key::ArrowDown, 1, -1.0),
            (Key::ArrowUp, 1, 1.0),
            (Key::PageDown, 2, -1.0),
            (Key::PageUp, 2, 1.0),
        ] {
            if !frame.key_pressed(key) {
                continue;
            }
            let (field, step) = mode.field(axis);
            if let Err(err) = self.session.nudge(self.renderer.transforms_mut(), field, sign * step) {
                log::warn!("edit of {field:?} failed: {err}");
                self.session.revalidate(self.renderer.transforms());
            }
        }

        // ── toggles ──
        if frame.key_pressed(Key::L) {
            let locked = self.session.toggle_locked_fps();
            log::info!("locked fps: {locked}");
        }
        if frame.key_pressed(Key::F1) {
            let shown = self.session.toggle_stats();
            log::info!("stats: {}", if shown { "on" } else { "off" });
        }

        AppControl::Continue
    }

    fn log_stats(&mut self, timer: &StepTimer) {
        if !self.session.show_stats {
            return;
        }
        let second = timer.total_seconds() as u64;
        if second == self.last_stats_second {
            return;
        }
        self.last_stats_second = second;

        let fps = timer.frames_per_second();
        let frame_ms = if fps > 0 { 1000.0 / f64::from(fps) } else { 0.0 };
        log::info!(
            "{fps} fps ({frame_ms:.2} ms), {} objects, step {}",
            self.renderer.transforms().count(),
            if timer.is_fixed_time_step() { "fixed" } else { "variable" }
        );
    }

    fn title(&self) -> String {
        let count = self.renderer.transforms().count();
        match self.session.selection {
            Some(sel) => format!("Kiln Studio: {count} objects, #{sel} selected"),
            None => format!("Kiln Studio: {count} objects"),
        }
    }
}

#[derive(Debug, Copy, Clone)]
enum Mode {
    Move,
    Rotate,
    Scale,
}

impl Mode {
    fn field(self, axis: usize) -> (TransformField, f32) {
        use TransformField::*;
        let fields = match self {
            Mode::Move => [PositionX, PositionY, PositionZ],
            Mode::Rotate => [RotationX, RotationY, RotationZ],
            Mode::Scale => [ScaleX, ScaleY, ScaleZ],
        };
        let step = match self {
            Mode::Move => POSITION_STEP,
            Mode::Rotate => ROTATION_STEP,
            Mode::Scale => SCALE_STEP,
        };
        (fields[axis.min(2)], step)
    }
}

impl App for StudioApp {
    fn on_device_restored(&mut self, _window_id: WindowId, gpu: &Gpu<'_>) -> Result<()> {
        let mut backend = WgpuBackend::new(gpu);
        let generation = self
            .renderer
            .create_device_dependent_resources(&mut backend)
            .context("failed to create scene resources")?;
        log::info!(
            "scene resources generation {generation} on {} (device generation {})",
            gpu.adapter_info().name,
            gpu.generation()
        );
        self.backend = Some(backend);
        Ok(())
    }

    fn on_device_lost(&mut self, _window_id: WindowId) {
        self.renderer.cancel_tracking();
        self.renderer.release_device_dependent_resources();
        self.backend = None;
    }

    fn on_resize(&mut self, _window_id: WindowId, viewport: Viewport) {
        self.renderer.create_window_size_dependent_resources(viewport);
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.handle_input(ctx.input, ctx.input_frame) == AppControl::Exit {
            return AppControl::Exit;
        }
        if ctx.input_frame.key_pressed(Key::F5) {
            log::warn!("simulating device loss");
            ctx.gpu.mark_device_lost();
        }

        ctx.window.set_cursor(if self.renderer.is_tracking() {
            CursorIcon::Grabbing
        } else {
            CursorIcon::Default
        });
        if self.title_dirty {
            ctx.window.set_title(&self.title());
            self.title_dirty = false;
        }

        ctx.timer.set_fixed_time_step(self.session.locked_fps);
        let selection = self.session.selection;
        let renderer = &mut self.renderer;
        ctx.timer.tick(|timer| renderer.update(timer, selection));

        let Some(backend) = self.backend.as_mut() else {
            return AppControl::Continue;
        };

        let mut outcome = Ok(RenderOutcome::Skipped(SkipReason::NotLoaded));
        let control = ctx.render(self.clear, |_, target| {
            outcome = renderer.render(backend, target);
        });

        match outcome {
            Ok(RenderOutcome::Skipped(reason)) => log::trace!("frame skipped: {reason:?}"),
            Ok(RenderOutcome::Drawn(_)) => {}
            Err(err) => log::error!("scene render failed: {err}"),
        }

        self.log_stats(ctx.timer);
        control
    }
}

//! In-memory backend used by the unit tests.

use crate::backend::{GpuBackend, LoadSignal, ResourceSet};
use crate::draw::{DrawCmd, DrawList};
use crate::error::{Result, SceneError};
use crate::geometry::MeshData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handle {
    pub id: u32,
}

/// One `execute` call as seen by the backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutedFrame {
    pub generation: u64,
    pub binds: usize,
    pub uploads: usize,
    pub draws: usize,
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: u32,
    /// Complete signals as soon as they are registered.
    pub auto_complete: bool,
    pub pending_signals: Vec<LoadSignal>,

    pub geometry_created: usize,
    pub programs_created: usize,
    pub constant_buffers_created: usize,
    pub polls: usize,

    pub fail_geometry: bool,
    pub fail_programs: bool,
    pub fail_execute: bool,

    pub frames: Vec<ExecutedFrame>,
}

impl RecordingBackend {
    pub fn auto_complete() -> Self {
        Self {
            auto_complete: true,
            ..Self::default()
        }
    }

    /// Simulates the GPU consuming every queued upload.
    pub fn finish_uploads(&mut self) {
        for signal in self.pending_signals.drain(..) {
            signal.complete();
        }
    }

    fn handle(&mut self) -> Handle {
        self.next_id += 1;
        Handle { id: self.next_id }
    }
}

impl GpuBackend for RecordingBackend {
    type Geometry = Handle;
    type Programs = Handle;
    type ConstantBuffer = Handle;
    type Target<'a> = ();

    fn create_geometry(&mut self, mesh: &MeshData) -> Result<Handle> {
        if self.fail_geometry || mesh.is_empty() {
            return Err(SceneError::Backend("geometry rejected".into()));
        }
        self.geometry_created += 1;
        Ok(self.handle())
    }

    fn create_programs(&mut self) -> Result<Handle> {
        if self.fail_programs {
            return Err(SceneError::Backend("shader compilation failed".into()));
        }
        self.programs_created += 1;
        Ok(self.handle())
    }

    fn create_constant_buffer(&mut self, _programs: &Handle) -> Result<Handle> {
        self.constant_buffers_created += 1;
        Ok(self.handle())
    }

    fn signal_when_idle(&mut self, signal: LoadSignal) {
        if self.auto_complete {
            signal.complete();
        } else {
            self.pending_signals.push(signal);
        }
    }

    fn poll(&mut self) {
        self.polls += 1;
    }

    fn execute(
        &mut self,
        set: &mut ResourceSet<Self>,
        list: &DrawList,
        _target: &mut (),
    ) -> Result<()> {
        if self.fail_execute {
            return Err(SceneError::Backend("submission failed".into()));
        }
        let mut frame = ExecutedFrame {
            generation: set.generation,
            ..ExecutedFrame::default()
        };
        for cmd in list.items() {
            match cmd {
                DrawCmd::BindShared => frame.binds += 1,
                DrawCmd::UploadConstants(_) => frame.uploads += 1,
                DrawCmd::DrawIndexed { .. } => frame.draws += 1,
            }
        }
        self.frames.push(frame);
        Ok(())
    }
}

use std::num::NonZeroU64;

use kiln_engine::device::Gpu;
use kiln_engine::render::RenderTarget;
use wgpu::util::DeviceExt;

use crate::backend::{GpuBackend, LoadSignal, ResourceSet};
use crate::draw::{DrawCmd, DrawList, ModelViewProjection};
use crate::error::{Result, SceneError};
use crate::geometry::{MeshData, VertexPositionColor};

const CONSTANTS_SIZE: u64 = std::mem::size_of::<ModelViewProjection>() as u64;
const MIN_CONSTANT_SLOTS: usize = 16;

pub struct WgpuGeometry {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

pub struct WgpuPrograms {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

/// Per-draw constants: one uniform buffer addressed with dynamic offsets,
/// one slot per draw of the frame.
pub struct WgpuConstantBuffer {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    /// Slot size, aligned to the device's uniform offset alignment.
    stride: u64,
    capacity: usize,
}

/// Scene backend over a wgpu device.
///
/// Built from the [`Gpu`] of one device generation; a restored device needs a
/// new backend.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    depth_format: wgpu::TextureFormat,
    constant_stride: u64,

    /// Reused per frame for the constant upload.
    staging: Vec<u8>,
}

impl WgpuBackend {
    pub fn new(gpu: &Gpu<'_>) -> Self {
        Self::from_device(
            gpu.device().clone(),
            gpu.queue().clone(),
            gpu.surface_format(),
            gpu.depth_format(),
        )
    }

    pub fn from_device(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> Self {
        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        Self {
            queue,
            surface_format,
            depth_format,
            constant_stride: CONSTANTS_SIZE.next_multiple_of(alignment.max(1)),
            staging: Vec::new(),
            device,
        }
    }

    /// Runs `build` inside validation and out-of-memory error scopes so wgpu
    /// errors come back as `Err` instead of reaching the uncaptured handler.
    fn scoped<T>(&self, what: &str, build: impl FnOnce(&Self) -> T) -> Result<T> {
        let out_of_memory = self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let validation = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = build(self);
        let validation = pollster::block_on(validation.pop());
        let out_of_memory = pollster::block_on(out_of_memory.pop());

        match validation.or(out_of_memory) {
            Some(err) => Err(SceneError::Backend(format!("{what}: {err}"))),
            None => Ok(value),
        }
    }

    fn constant_buffer(&self, layout: &wgpu::BindGroupLayout, capacity: usize) -> WgpuConstantBuffer {
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("kiln scene constants"),
            size: self.constant_stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("kiln scene constants bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(CONSTANTS_SIZE),
                }),
            }],
        });

        WgpuConstantBuffer {
            buffer,
            bind_group,
            stride: self.constant_stride,
            capacity,
        }
    }

    fn build_programs(&self, source: &str) -> WgpuPrograms {
        let shader = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("kiln scene shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let bind_group_layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("kiln scene bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: NonZeroU64::new(CONSTANTS_SIZE),
                    },
                    count: None,
                }],
            });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("kiln scene pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
            0 => Float32x3, // position
            1 => Float32x3  // color
        ];

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("kiln scene pipeline"),
                layout: Some(&pipeline_layout),

                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<VertexPositionColor>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &ATTRS,
                    }],
                },

                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.surface_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: Some(wgpu::DepthStencilState {
                    format: self.depth_format,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),

                multiview_mask: None,
                cache: None,
            });

        WgpuPrograms {
            pipeline,
            bind_group_layout,
        }
    }

    fn ensure_constant_capacity(&self, set: &mut ResourceSet<Self>, draws: usize) -> Result<()> {
        if draws <= set.constants.capacity {
            return Ok(());
        }
        let capacity = draws.next_power_of_two().max(MIN_CONSTANT_SLOTS);
        log::debug!(
            "resource generation {}: growing constant buffer to {capacity} slots",
            set.generation
        );
        set.constants = self.scoped("constant buffer", |b| {
            b.constant_buffer(&set.programs.bind_group_layout, capacity)
        })?;
        Ok(())
    }
}

impl GpuBackend for WgpuBackend {
    type Geometry = WgpuGeometry;
    type Programs = WgpuPrograms;
    type ConstantBuffer = WgpuConstantBuffer;
    type Target<'a> = RenderTarget<'a>;

    fn create_geometry(&mut self, mesh: &MeshData) -> Result<WgpuGeometry> {
        if mesh.is_empty() {
            return Err(SceneError::Backend("mesh has no vertices or indices".into()));
        }

        self.scoped("geometry", |b| {
            let vertex_buffer = b.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("kiln scene vbo"),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

            // Index buffers must be a multiple of 4 bytes.
            let mut indices = mesh.indices.clone();
            if indices.len() % 2 != 0 {
                indices.push(0);
            }
            let index_buffer = b.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("kiln scene ibo"),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            });

            WgpuGeometry {
                vertex_buffer,
                index_buffer,
                index_count: mesh.index_count(),
            }
        })
    }

    fn create_programs(&mut self) -> Result<WgpuPrograms> {
        self.scoped("programs", |b| b.build_programs(include_str!("shaders/scene.wgsl")))
    }

    fn create_constant_buffer(&mut self, programs: &WgpuPrograms) -> Result<WgpuConstantBuffer> {
        self.scoped("constant buffer", |b| {
            b.constant_buffer(&programs.bind_group_layout, MIN_CONSTANT_SLOTS)
        })
    }

    fn signal_when_idle(&mut self, signal: LoadSignal) {
        // Flush pending buffer writes, then fire once the queue drained them.
        self.queue.submit(std::iter::empty());
        self.queue.on_submitted_work_done(move || signal.complete());
    }

    fn poll(&mut self) {
        if let Err(err) = self.device.poll(wgpu::PollType::Poll) {
            log::warn!("device poll failed: {err}");
        }
    }

    fn execute(
        &mut self,
        set: &mut ResourceSet<Self>,
        list: &DrawList,
        target: &mut RenderTarget<'_>,
    ) -> Result<()> {
        if list.is_empty() {
            return Ok(());
        }

        let uploads = list.upload_count();
        self.ensure_constant_capacity(set, uploads)?;

        let stride = set.constants.stride as usize;
        self.staging.clear();
        self.staging.resize(uploads * stride, 0);
        let mut slot = 0usize;
        for cmd in list.items() {
            if let DrawCmd::UploadConstants(c) = cmd {
                let start = slot * stride;
                self.staging[start..start + CONSTANTS_SIZE as usize]
                    .copy_from_slice(bytemuck::bytes_of(c));
                slot += 1;
            }
        }
        if !self.staging.is_empty() {
            self.queue.write_buffer(&set.constants.buffer, 0, &self.staging);
        }

        let geometry = &set.geometry;
        let programs = &set.programs;
        let constants = &set.constants;

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("kiln scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: target.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let mut slot = 0u32;
        for cmd in list.items() {
            match cmd {
                DrawCmd::BindShared => {
                    rpass.set_pipeline(&programs.pipeline);
                    rpass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
                    rpass.set_index_buffer(geometry.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                }
                DrawCmd::UploadConstants(_) => {
                    let offset = u64::from(slot) * constants.stride;
                    let offset = u32::try_from(offset).map_err(|_| {
                        SceneError::Backend(format!("constant offset {offset} exceeds u32"))
                    })?;
                    rpass.set_bind_group(0, &constants.bind_group, &[offset]);
                    slot += 1;
                }
                DrawCmd::DrawIndexed { index_count } => {
                    let count = (*index_count).min(geometry.index_count);
                    rpass.draw_indexed(0..count, 0, 0..1);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use kiln_engine::device::DEPTH_FORMAT;

    use super::*;
    use crate::config::SceneConfig;
    use crate::resources::{DeviceResources, ResourceState};

    /// Backend on any available adapter; `None` on machines without one.
    fn headless() -> Option<WgpuBackend> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter =
            pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
                .ok()?;
        let (device, queue) =
            pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default())).ok()?;
        Some(WgpuBackend::from_device(
            device,
            queue,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            DEPTH_FORMAT,
        ))
    }

    // ── creation errors ───────────────────────────────────────────────────

    #[test]
    fn shader_errors_are_returned() {
        let Some(backend) = headless() else { return };
        let result = backend.scoped("programs", |b| b.build_programs("fn vs_main( {"));
        match result {
            Err(SceneError::Backend(msg)) => assert!(msg.starts_with("programs")),
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("invalid WGSL accepted"),
        }
    }

    #[test]
    fn built_in_programs_validate() {
        let Some(mut backend) = headless() else { return };
        let programs = backend.create_programs().unwrap();
        assert!(backend.create_constant_buffer(&programs).is_ok());
    }

    #[test]
    fn empty_mesh_fails_the_generation() {
        let Some(mut backend) = headless() else { return };
        let empty = MeshData {
            vertices: Vec::new(),
            indices: Vec::new(),
        };
        let mut res = DeviceResources::with_mesh(&SceneConfig::default(), empty);
        let err = res.create_device_dependent_resources(&mut backend).unwrap_err();
        assert!(matches!(
            err,
            SceneError::ResourceCreation { resource: "geometry", generation: 1, .. }
        ));
        assert_eq!(res.state(), ResourceState::Unloaded);
    }

    // ── upload completion ─────────────────────────────────────────────────

    #[test]
    fn cube_upload_becomes_ready() {
        let Some(mut backend) = headless() else { return };
        let mut res = DeviceResources::new(&SceneConfig::default());
        res.create_device_dependent_resources(&mut backend).unwrap();

        let mut state = res.state();
        for _ in 0..1000 {
            state = res.poll_loading(&mut backend);
            if state == ResourceState::Ready {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        assert_eq!(state, ResourceState::Ready);
    }
}

//! wgpu implementation of [`GpuBackend`](crate::GpuBackend).

mod backend;

pub use backend::{WgpuBackend, WgpuConstantBuffer, WgpuGeometry, WgpuPrograms};

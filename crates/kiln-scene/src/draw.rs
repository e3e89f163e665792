use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Per-draw constant record: the combined model/view/projection matrix,
/// column-major, as read by the vertex shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ModelViewProjection {
    pub mvp: [[f32; 4]; 4],
}

impl ModelViewProjection {
    #[inline]
    pub fn from_mat4(m: Mat4) -> Self {
        Self {
            mvp: m.to_cols_array_2d(),
        }
    }

    #[inline]
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.mvp)
    }
}

/// Backend-agnostic command stream for one scene frame.
///
/// A frame is `BindShared` once, followed by an `UploadConstants` /
/// `DrawIndexed` pair per object in store order.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    /// Bind shared geometry, vertex layout and programs.
    BindShared,
    /// Write the per-draw constant buffer for the next draw.
    UploadConstants(ModelViewProjection),
    /// Indexed draw of the shared geometry.
    DrawIndexed { index_count: u32 },
}

/// Recorded draw stream for a frame.
///
/// Cleared and refilled every frame; keeps its allocation.
#[derive(Debug, Default)]
pub struct DrawList {
    items: Vec<DrawCmd>,
}

impl DrawList {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[inline]
    pub fn push(&mut self, cmd: DrawCmd) {
        self.items.push(cmd);
    }

    /// Commands in recording order.
    #[inline]
    pub fn items(&self) -> &[DrawCmd] {
        &self.items
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn draw_count(&self) -> usize {
        self.items
            .iter()
            .filter(|c| matches!(c, DrawCmd::DrawIndexed { .. }))
            .count()
    }

    pub fn upload_count(&self) -> usize {
        self.items
            .iter()
            .filter(|c| matches!(c, DrawCmd::UploadConstants(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_kind() {
        let mut list = DrawList::new();
        list.push(DrawCmd::BindShared);
        for _ in 0..3 {
            list.push(DrawCmd::UploadConstants(ModelViewProjection::from_mat4(Mat4::IDENTITY)));
            list.push(DrawCmd::DrawIndexed { index_count: 36 });
        }
        assert_eq!(list.items().len(), 7);
        assert_eq!(list.draw_count(), 3);
        assert_eq!(list.upload_count(), 3);

        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.draw_count(), 0);
    }

    #[test]
    fn constants_are_column_major() {
        let m = Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        let c = ModelViewProjection::from_mat4(m);
        assert_eq!(c.mvp[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(c.to_mat4(), m);
        assert_eq!(std::mem::size_of::<ModelViewProjection>(), 64);
    }
}

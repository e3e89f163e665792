use glam::Vec3;
use kiln_engine::paint::Color;
use serde::Deserialize;

use crate::tracking::DEGREES_PER_DRAG_UNIT;

/// Camera, projection and interaction parameters for a scene.
///
/// Deserializable so the studio can read it from a config file; every key is
/// optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Vertical field of view for landscape viewports. Portrait viewports use
    /// twice this value.
    pub fov_y_degrees: f32,
    pub near_plane: f32,
    pub far_plane: f32,

    pub eye: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],

    /// sRGB clear color, components in `[0, 1]`. Cornflower blue when unset.
    pub clear_color: Option<[f32; 3]>,

    pub degrees_per_drag_unit: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 70.0,
            near_plane: 0.01,
            far_plane: 100.0,
            eye: [0.0, 0.7, 1.5],
            target: [0.0, -0.1, 0.0],
            up: [0.0, 1.0, 0.0],
            clear_color: None,
            degrees_per_drag_unit: DEGREES_PER_DRAG_UNIT,
        }
    }
}

impl SceneConfig {
    #[inline]
    pub fn eye(&self) -> Vec3 {
        Vec3::from_array(self.eye)
    }

    #[inline]
    pub fn target(&self) -> Vec3 {
        Vec3::from_array(self.target)
    }

    #[inline]
    pub fn up(&self) -> Vec3 {
        Vec3::from_array(self.up)
    }

    /// Clear color converted to linear space.
    pub fn clear_color(&self) -> Color {
        self.clear_color
            .map_or_else(Color::cornflower_blue, Color::from_srgb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── clear color ───────────────────────────────────────────────────────

    #[test]
    fn default_clear_color_is_cornflower_blue() {
        assert_eq!(SceneConfig::default().clear_color(), Color::cornflower_blue());
    }

    #[test]
    fn explicit_clear_color_is_linearized() {
        let config = SceneConfig {
            clear_color: Some([0.0, 0.0, 0.0]),
            ..SceneConfig::default()
        };
        assert_eq!(config.clear_color(), Color::BLACK);
    }
}

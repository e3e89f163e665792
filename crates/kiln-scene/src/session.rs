//! Editor-side state that lives next to the store but not in it.

use std::f32::consts::TAU;
use std::ops::RangeInclusive;

use glam::Vec3;

use crate::error::Result;
use crate::store::TransformStore;
use crate::transform::Transform;

/// Wraps an angle into `[0, 2π)`. Field edits and drags share this range.
pub fn wrap_angle(radians: f32) -> f32 {
    let wrapped = radians.rem_euclid(TAU);
    // rem_euclid rounds tiny negative inputs up to exactly TAU.
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// One of the nine editable scalar fields of a [`Transform`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TransformField {
    PositionX,
    PositionY,
    PositionZ,
    RotationX,
    RotationY,
    RotationZ,
    ScaleX,
    ScaleY,
    ScaleZ,
}

impl TransformField {
    pub const ALL: [TransformField; 9] = [
        Self::PositionX,
        Self::PositionY,
        Self::PositionZ,
        Self::RotationX,
        Self::RotationY,
        Self::RotationZ,
        Self::ScaleX,
        Self::ScaleY,
        Self::ScaleZ,
    ];

    /// Range of the field. Position and scale clamp to it; rotations wrap
    /// into `[0, 2π)` and never store the end value.
    pub fn range(self) -> RangeInclusive<f32> {
        match self {
            Self::PositionX | Self::PositionY | Self::PositionZ => -5.0..=5.0,
            Self::RotationX | Self::RotationY | Self::RotationZ => 0.0..=TAU,
            Self::ScaleX | Self::ScaleY | Self::ScaleZ => 0.01..=10.0,
        }
    }

    pub fn get(self, t: &Transform) -> f32 {
        *self.component(t)
    }

    /// Writes `value` clamped (or for rotations, wrapped) to
    /// [`range`](Self::range); returns the stored value.
    pub fn set(self, t: &mut Transform, value: f32) -> f32 {
        let range = self.range();
        let v = if self.is_rotation() {
            wrap_angle(value)
        } else {
            value.clamp(*range.start(), *range.end())
        };
        *self.component_mut(t) = v;
        v
    }

    #[inline]
    pub fn is_rotation(self) -> bool {
        matches!(self, Self::RotationX | Self::RotationY | Self::RotationZ)
    }

    fn component(self, t: &Transform) -> &f32 {
        let (v, axis) = self.split(t);
        match axis {
            0 => &v.x,
            1 => &v.y,
            _ => &v.z,
        }
    }

    fn component_mut(self, t: &mut Transform) -> &mut f32 {
        let axis = self.axis();
        let v = match self {
            Self::PositionX | Self::PositionY | Self::PositionZ => &mut t.position,
            Self::RotationX | Self::RotationY | Self::RotationZ => &mut t.rotation,
            Self::ScaleX | Self::ScaleY | Self::ScaleZ => &mut t.scale,
        };
        match axis {
            0 => &mut v.x,
            1 => &mut v.y,
            _ => &mut v.z,
        }
    }

    fn split(self, t: &Transform) -> (&Vec3, usize) {
        let v = match self {
            Self::PositionX | Self::PositionY | Self::PositionZ => &t.position,
            Self::RotationX | Self::RotationY | Self::RotationZ => &t.rotation,
            Self::ScaleX | Self::ScaleY | Self::ScaleZ => &t.scale,
        };
        (v, self.axis())
    }

    fn axis(self) -> usize {
        match self {
            Self::PositionX | Self::RotationX | Self::ScaleX => 0,
            Self::PositionY | Self::RotationY | Self::ScaleY => 1,
            Self::PositionZ | Self::RotationZ | Self::ScaleZ => 2,
        }
    }
}

/// Selection and editor toggles.
///
/// The selection is a positional index into a [`TransformStore`]; every
/// operation here that removes from the store re-clamps it. Callers that
/// remove through the store directly must call [`revalidate`](Self::revalidate).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorSession {
    pub selection: Option<usize>,
    pub locked_fps: bool,
    pub show_stats: bool,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the starter object and selects it.
    pub fn seed_default_scene(&mut self, store: &mut TransformStore) {
        let seed = Transform::new(
            Vec3::new(0.0, 0.0, -2.0),
            Vec3::new(0.8, 2.3, 0.0),
            Vec3::ONE,
        );
        self.add_object(store, seed);
    }

    /// Appends `transform` and selects it.
    pub fn add_object(&mut self, store: &mut TransformStore, transform: Transform) -> usize {
        let index = store.add(transform);
        self.selection = Some(index);
        index
    }

    /// Removes the selected object. With nothing selected this does nothing.
    pub fn remove_selected(&mut self, store: &mut TransformStore) -> Result<Option<Transform>> {
        let Some(index) = self.selection else {
            return Ok(None);
        };
        let removed = store.remove_at(index)?;
        self.after_remove(index, store.count());
        Ok(Some(removed))
    }

    /// Re-clamps the selection after `removed` was erased from a store that
    /// now holds `count` elements.
    ///
    /// An index past the removed one shifts down with its object; removing the
    /// selected object keeps the same position, or the new last one.
    pub fn after_remove(&mut self, removed: usize, count: usize) {
        self.selection = match self.selection {
            _ if count == 0 => None,
            Some(sel) if sel > removed => Some(sel - 1),
            Some(sel) if sel == removed => Some(removed.min(count - 1)),
            other => other,
        };
    }

    /// Drops a selection that points past the end of `store`.
    pub fn revalidate(&mut self, store: &TransformStore) {
        if let Some(sel) = self.selection {
            if sel >= store.count() {
                self.selection = store.count().checked_sub(1);
            }
        }
    }

    pub fn select(&mut self, store: &TransformStore, index: usize) -> Result<()> {
        store.get(index)?;
        self.selection = Some(index);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Moves to the next object, wrapping to the first. Selects the first
    /// object when nothing is selected.
    pub fn select_next(&mut self, store: &TransformStore) {
        let count = store.count();
        self.selection = match (self.selection, count) {
            (_, 0) => None,
            (Some(sel), _) => Some((sel + 1) % count),
            (None, _) => Some(0),
        };
    }

    /// Moves to the previous object, wrapping to the last.
    pub fn select_previous(&mut self, store: &TransformStore) {
        let count = store.count();
        self.selection = match (self.selection, count) {
            (_, 0) => None,
            (Some(sel), _) => Some((sel.min(count - 1) + count - 1) % count),
            (None, _) => Some(count - 1),
        };
    }

    pub fn selected<'s>(&self, store: &'s TransformStore) -> Option<&'s Transform> {
        self.selection.and_then(|i| store.get(i).ok())
    }

    pub fn selected_mut<'s>(&self, store: &'s mut TransformStore) -> Option<&'s mut Transform> {
        self.selection.and_then(|i| store.get_mut(i).ok())
    }

    /// Adds `delta` to `field` of the selected object, clamped or wrapped to
    /// the field's range. Returns the stored value, or `None` without a selection.
    pub fn nudge(
        &self,
        store: &mut TransformStore,
        field: TransformField,
        delta: f32,
    ) -> Result<Option<f32>> {
        let Some(index) = self.selection else {
            return Ok(None);
        };
        let t = store.get_mut(index)?;
        let value = field.get(t) + delta;
        Ok(Some(field.set(t, value)))
    }

    pub fn toggle_locked_fps(&mut self) -> bool {
        self.locked_fps = !self.locked_fps;
        self.locked_fps
    }

    pub fn toggle_stats(&mut self) -> bool {
        self.show_stats = !self.show_stats;
        self.show_stats
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::error::SceneError;

    fn store_of(n: usize) -> TransformStore {
        (0..n)
            .map(|i| Transform::default().with_position(Vec3::new(i as f32, 0.0, 0.0)))
            .collect()
    }

    // ── add / remove ──────────────────────────────────────────────────────

    #[test]
    fn add_selects_new_object() {
        let mut store = store_of(2);
        let mut s = EditorSession::new();
        assert_eq!(s.add_object(&mut store, Transform::default()), 2);
        assert_eq!(s.selection, Some(2));
    }

    #[test]
    fn remove_last_selects_new_last() {
        let mut store = store_of(3);
        let mut s = EditorSession { selection: Some(2), ..Default::default() };
        s.remove_selected(&mut store).unwrap();
        assert_eq!(s.selection, Some(1));
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn remove_middle_keeps_position() {
        let mut store = store_of(3);
        let mut s = EditorSession { selection: Some(1), ..Default::default() };
        let removed = s.remove_selected(&mut store).unwrap().unwrap();
        assert_eq!(removed.position.x, 1.0);
        assert_eq!(s.selection, Some(1));
        assert_eq!(s.selected(&store).unwrap().position.x, 2.0);
    }

    #[test]
    fn remove_only_object_clears_selection() {
        let mut store = store_of(1);
        let mut s = EditorSession { selection: Some(0), ..Default::default() };
        s.remove_selected(&mut store).unwrap();
        assert_eq!(s.selection, None);
        assert_eq!(s.remove_selected(&mut store).unwrap(), None);
    }

    #[test]
    fn stale_selection_remove_fails_cleanly() {
        let mut store = store_of(2);
        let mut s = EditorSession { selection: Some(5), ..Default::default() };
        assert_eq!(
            s.remove_selected(&mut store),
            Err(SceneError::OutOfRange { index: 5, count: 2 })
        );
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn after_remove_shifts_later_selection() {
        let mut s = EditorSession { selection: Some(3), ..Default::default() };
        s.after_remove(1, 4);
        assert_eq!(s.selection, Some(2));

        s.after_remove(3, 3);
        assert_eq!(s.selection, Some(2));
    }

    #[test]
    fn revalidate_drops_out_of_range() {
        let mut store = store_of(3);
        let mut s = EditorSession { selection: Some(2), ..Default::default() };
        store.remove_at(2).unwrap();
        s.revalidate(&store);
        assert_eq!(s.selection, Some(1));

        store.clear();
        s.revalidate(&store);
        assert_eq!(s.selection, None);
    }

    // ── selection ─────────────────────────────────────────────────────────

    #[test]
    fn select_rejects_invalid_index() {
        let store = store_of(2);
        let mut s = EditorSession::new();
        assert!(s.select(&store, 1).is_ok());
        assert_eq!(s.select(&store, 2), Err(SceneError::OutOfRange { index: 2, count: 2 }));
        assert_eq!(s.selection, Some(1));
    }

    #[test]
    fn cycling_wraps() {
        let store = store_of(3);
        let mut s = EditorSession::new();
        s.select_next(&store);
        assert_eq!(s.selection, Some(0));
        s.select_previous(&store);
        assert_eq!(s.selection, Some(2));
        s.select_next(&store);
        assert_eq!(s.selection, Some(0));

        s.select_next(&TransformStore::new());
        assert_eq!(s.selection, None);
    }

    // ── field edits ───────────────────────────────────────────────────────

    #[test]
    fn nudge_clamps_to_field_range() {
        let mut store = store_of(1);
        let s = EditorSession { selection: Some(0), ..Default::default() };

        assert_eq!(s.nudge(&mut store, TransformField::PositionY, 9.0).unwrap(), Some(5.0));
        assert_eq!(s.nudge(&mut store, TransformField::ScaleX, -5.0).unwrap(), Some(0.01));

        let t = store.get(0).unwrap();
        assert_eq!(t.position.y, 5.0);
        assert_eq!(t.scale.x, 0.01);
    }

    #[test]
    fn rotation_edits_wrap_to_one_turn() {
        let mut store = store_of(1);
        let s = EditorSession { selection: Some(0), ..Default::default() };

        let r = s.nudge(&mut store, TransformField::RotationZ, 100.0).unwrap().unwrap();
        assert_relative_eq!(r, 100.0f32.rem_euclid(TAU), epsilon = 1e-4);
        let r = s.nudge(&mut store, TransformField::RotationX, -0.5).unwrap().unwrap();
        assert_relative_eq!(r, TAU - 0.5, epsilon = 1e-5);
        assert_eq!(wrap_angle(TAU), 0.0);
        assert_eq!(wrap_angle(-1e-9), 0.0);
    }

    #[test]
    fn dragged_angle_near_full_turn_survives_small_nudge() {
        let mut store = store_of(1);
        let s = EditorSession { selection: Some(0), ..Default::default() };
        store.get_mut(0).unwrap().rotation.y = TAU - 0.001;

        let r = s.nudge(&mut store, TransformField::RotationY, 0.0).unwrap().unwrap();
        assert_relative_eq!(r, TAU - 0.001, epsilon = 1e-6);
        let r = s.nudge(&mut store, TransformField::RotationY, 0.002).unwrap().unwrap();
        assert_relative_eq!(r, 0.001, epsilon = 1e-5);
    }

    #[test]
    fn nudge_without_selection_is_noop() {
        let mut store = store_of(1);
        let s = EditorSession::new();
        assert_eq!(s.nudge(&mut store, TransformField::PositionX, 1.0).unwrap(), None);
        assert_eq!(store.get(0).unwrap().position.x, 0.0);
    }

    #[test]
    fn fields_address_distinct_components() {
        let mut t = Transform::default();
        for (i, field) in TransformField::ALL.iter().enumerate() {
            field.set(&mut t, 0.02 * (i + 1) as f32);
        }
        for (i, field) in TransformField::ALL.iter().enumerate() {
            assert_relative_eq!(field.get(&t), 0.02 * (i + 1) as f32);
        }
    }

    // ── seed ──────────────────────────────────────────────────────────────

    #[test]
    fn seed_adds_selected_starter_object() {
        let mut store = TransformStore::new();
        let mut s = EditorSession::new();
        s.seed_default_scene(&mut store);
        assert_eq!(store.count(), 1);
        assert_eq!(s.selection, Some(0));
        let t = store.get(0).unwrap();
        assert_eq!(t.position, Vec3::new(0.0, 0.0, -2.0));
        assert_eq!(t.rotation, Vec3::new(0.8, 2.3, 0.0));
        assert_eq!(t.scale, Vec3::ONE);
    }
}

use crate::error::{Result, SceneError};
use crate::transform::Transform;

/// Ordered container of object transforms.
///
/// Insertion order is render order. Indices are positional: they are only
/// valid in `[0, count)`, and removing an element shifts every later element
/// down by one. The store knows nothing about selection; callers caching an
/// index must re-validate it after every removal.
///
/// Single-writer; no internal synchronization.
#[derive(Debug, Default, Clone)]
pub struct TransformStore {
    items: Vec<Transform>,
    /// Bumped by every call that can change the contents.
    revision: u64,
}

impl TransformStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `transform` and returns its index (the new last index).
    pub fn add(&mut self, transform: Transform) -> usize {
        self.items.push(transform);
        self.touch();
        let index = self.items.len() - 1;
        log::trace!("transform store: add #{index}");
        index
    }

    /// Removes the transform at `index`, shifting later elements left.
    pub fn remove_at(&mut self, index: usize) -> Result<Transform> {
        self.check(index)?;
        let removed = self.items.remove(index);
        self.touch();
        log::trace!("transform store: remove #{index} ({} left)", self.items.len());
        Ok(removed)
    }

    pub fn get(&self, index: usize) -> Result<&Transform> {
        self.check(index)?;
        Ok(&self.items[index])
    }

    /// Mutable access for in-place editing.
    pub fn get_mut(&mut self, index: usize) -> Result<&mut Transform> {
        self.check(index)?;
        self.touch();
        Ok(&mut self.items[index])
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Transforms in store (render) order.
    pub fn iter(&self) -> impl Iterator<Item = &Transform> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Transform> {
        self.touch();
        self.items.iter_mut()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Transform] {
        &self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.touch();
    }

    /// Changes whenever the store may have been modified, including through
    /// `get_mut` and `iter_mut`. Caches keyed on it stay valid until then.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    fn check(&self, index: usize) -> Result<()> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(SceneError::OutOfRange {
                index,
                count: self.items.len(),
            })
        }
    }
}

impl FromIterator<Transform> for TransformStore {
    fn from_iter<I: IntoIterator<Item = Transform>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
            revision: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn at_x(x: f32) -> Transform {
        Transform::default().with_position(Vec3::new(x, 0.0, 0.0))
    }

    fn store_of(n: usize) -> TransformStore {
        (0..n).map(|i| at_x(i as f32)).collect()
    }

    // ── add ───────────────────────────────────────────────────────────────

    #[test]
    fn add_returns_new_last_index() {
        let mut s = TransformStore::new();
        assert_eq!(s.add(at_x(0.0)), 0);
        assert_eq!(s.add(at_x(1.0)), 1);
        assert_eq!(s.add(at_x(2.0)), 2);
        assert_eq!(s.count(), 3);
    }

    // ── remove_at ─────────────────────────────────────────────────────────

    #[test]
    fn remove_shifts_later_elements_down() {
        let mut s = store_of(5);
        let removed = s.remove_at(2).unwrap();
        assert_eq!(removed.position.x, 2.0);
        assert_eq!(s.count(), 4);

        // Before the removed index: unchanged.
        assert_eq!(s.get(0).unwrap().position.x, 0.0);
        assert_eq!(s.get(1).unwrap().position.x, 1.0);
        // At and after: previous k + 1.
        assert_eq!(s.get(2).unwrap().position.x, 3.0);
        assert_eq!(s.get(3).unwrap().position.x, 4.0);
    }

    #[test]
    fn remove_out_of_range_leaves_store_intact() {
        let mut s = store_of(2);
        assert_eq!(
            s.remove_at(2),
            Err(SceneError::OutOfRange { index: 2, count: 2 })
        );
        assert_eq!(s.count(), 2);
    }

    #[test]
    fn remove_on_empty_store_fails() {
        let mut s = TransformStore::new();
        assert!(matches!(s.remove_at(0), Err(SceneError::OutOfRange { .. })));
    }

    #[test]
    fn stale_index_after_removal_fails() {
        let mut s = store_of(3);
        s.remove_at(2).unwrap();
        assert!(s.remove_at(2).is_err());
        assert_eq!(s.count(), 2);
    }

    // ── get ───────────────────────────────────────────────────────────────

    #[test]
    fn get_out_of_range_fails() {
        let s = store_of(1);
        assert!(s.get(0).is_ok());
        assert_eq!(s.get(1), Err(SceneError::OutOfRange { index: 1, count: 1 }));
        assert!(TransformStore::new().get(0).is_err());
        assert!(s.get(usize::MAX).is_err());
    }

    #[test]
    fn get_mut_edits_in_place() {
        let mut s = store_of(2);
        s.get_mut(1).unwrap().scale.y = 4.0;
        assert_eq!(s.get(1).unwrap().scale.y, 4.0);
        assert_eq!(s.get(0).unwrap().scale.y, 1.0);
    }

    // ── count ─────────────────────────────────────────────────────────────

    #[test]
    fn count_tracks_adds_minus_successful_removes() {
        let mut s = TransformStore::new();
        let mut adds = 0usize;
        let mut removes = 0usize;

        // Deterministic mixed sequence, including removals that must fail.
        for step in 0..200usize {
            if step % 3 == 2 {
                let index = (step * 7) % (s.count() + 2);
                if s.remove_at(index).is_ok() {
                    removes += 1;
                }
            } else {
                s.add(at_x(step as f32));
                adds += 1;
            }
            assert_eq!(s.count(), adds - removes);
        }
        assert!(removes > 0);
    }

    // ── revision ──────────────────────────────────────────────────────────

    #[test]
    fn revision_changes_on_every_mutation() {
        let mut s = store_of(2);
        let mut last = s.revision();
        let mut changed = |s: &TransformStore| {
            let moved = s.revision() != last;
            last = s.revision();
            moved
        };

        s.remove_at(0).unwrap();
        assert!(changed(&s));
        s.add(at_x(7.0));
        assert!(changed(&s));
        s.get_mut(1).unwrap().rotation.z = 1.0;
        assert!(changed(&s));
        s.iter_mut().for_each(|t| t.scale.x = 2.0);
        assert!(changed(&s));

        let _ = s.get(0);
        let _ = s.count();
        assert!(!changed(&s));

        assert!(s.remove_at(9).is_err());
        assert!(!changed(&s));
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let s = store_of(4);
        let xs: Vec<f32> = s.iter().map(|t| t.position.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0]);
    }
}

//! Render object registry.

use crate::frame::RenderData;

use super::{RenderObject, RenderObjectId};

/// Owns render objects, keyed by [`RenderObjectId`].
///
/// Iteration follows registration order.
#[derive(Debug, Default)]
pub struct RenderObjectManager {
    slots: Vec<Option<RenderObject>>,
    len: usize,
}

impl RenderObjectManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object and return its id.
    pub fn add(&mut self, object: RenderObject) -> RenderObjectId {
        let id = RenderObjectId(self.slots.len() as u32);
        tracing::debug!("Registered render object '{}' as {}", object.name, id);
        self.slots.push(Some(object));
        self.len += 1;
        id
    }

    /// Remove an object. Its id is never handed out again.
    pub fn remove(&mut self, id: RenderObjectId) -> Option<RenderObject> {
        let removed = self.slots.get_mut(id.0 as usize).and_then(Option::take);
        if let Some(object) = &removed {
            self.len -= 1;
            tracing::debug!("Removed render object '{}' ({})", object.name, id);
        }
        removed
    }

    /// Look up an object.
    pub fn get(&self, id: RenderObjectId) -> Option<&RenderObject> {
        self.slots.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Look up an object mutably.
    pub fn get_mut(&mut self, id: RenderObjectId) -> Option<&mut RenderObject> {
        self.slots.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    /// Whether `id` resolves to a live object.
    pub fn contains(&self, id: RenderObjectId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no object is registered.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Live objects in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (RenderObjectId, &RenderObject)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|o| (RenderObjectId(i as u32), o)))
    }

    /// Find the first live object with this name.
    pub fn find(&self, name: &str) -> Option<RenderObjectId> {
        self.iter().find(|(_, o)| o.name == name).map(|(id, _)| id)
    }

    /// Run every object's update hook.
    pub fn update(&mut self, data: &RenderData) {
        for object in self.slots.iter_mut().flatten() {
            object.run_update(data);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::{Mat4, Vec3};
    use prism_core::TriangleMesh;

    use super::*;

    fn object(name: &str) -> RenderObject {
        RenderObject::new(name, Arc::new(TriangleMesh::default()))
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut manager = RenderObjectManager::new();
        let a = manager.add(object("a"));
        let b = manager.add(object("b"));
        assert!(manager.remove(a).is_some());
        let c = manager.add(object("c"));
        assert_ne!(c, a);
        assert_ne!(c, b);
        assert!(manager.get(a).is_none());
        assert_eq!(manager.len(), 2);
        assert!(manager.remove(a).is_none());
    }

    #[test]
    fn test_iter_in_registration_order() {
        let mut manager = RenderObjectManager::new();
        for name in ["x", "y", "z"] {
            manager.add(object(name));
        }
        manager.remove(RenderObjectId(1));
        let names: Vec<_> = manager.iter().map(|(_, o)| o.name.as_str()).collect();
        assert_eq!(names, ["x", "z"]);
        assert_eq!(manager.find("z"), Some(RenderObjectId(2)));
    }

    #[test]
    fn test_update_hooks_run() {
        let mut manager = RenderObjectManager::new();
        let id = manager.add(object("spinner").with_update(|t: &mut Mat4, data: &RenderData| {
            *t = Mat4::from_translation(Vec3::X * data.dt) * *t;
        }));
        let data = RenderData {
            dt: 0.5,
            ..RenderData::default()
        };
        manager.update(&data);
        manager.update(&data);
        let moved = manager.get(id).unwrap().transform.w_axis.x;
        assert_eq!(moved, 1.0);
    }
}

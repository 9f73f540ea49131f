//! Render queues
//!
//! Every frame the visible objects are split into four classes by layer, and
//! each class is split again by picking granularity for the picking pass.

use std::ops::Index;

use crate::scene::{PickingGranularity, RenderLayer, RenderObjectId, RenderObjectManager};

/// Ordered list of object ids.
pub type RenderQueue = Vec<RenderObjectId>;

/// The four draw classes of a frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderQueues {
    /// Lit scene content.
    pub fancy: RenderQueue,
    /// Debug helpers.
    pub debug: RenderQueue,
    /// X-ray objects.
    pub xray: RenderQueue,
    /// UI handles.
    pub ui: RenderQueue,
}

impl RenderQueues {
    /// Classify every visible object by layer, in registration order.
    pub fn feed(objects: &RenderObjectManager) -> Self {
        let mut queues = Self::default();
        for (id, object) in objects.iter().filter(|(_, o)| o.visible) {
            queues.queue_mut(object.layer).push(id);
        }
        queues
    }

    /// Queue of a layer.
    pub fn queue(&self, layer: RenderLayer) -> &RenderQueue {
        match layer {
            RenderLayer::Fancy => &self.fancy,
            RenderLayer::Debug => &self.debug,
            RenderLayer::XRay => &self.xray,
            RenderLayer::Ui => &self.ui,
        }
    }

    fn queue_mut(&mut self, layer: RenderLayer) -> &mut RenderQueue {
        match layer {
            RenderLayer::Fancy => &mut self.fancy,
            RenderLayer::Debug => &mut self.debug,
            RenderLayer::XRay => &mut self.xray,
            RenderLayer::Ui => &mut self.ui,
        }
    }

    /// Total number of queued objects.
    pub fn len(&self) -> usize {
        RenderLayer::ALL.iter().map(|&l| self.queue(l).len()).sum()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Queues split by class and picking granularity: `[layer][granularity]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickingQueues {
    queues: [[RenderQueue; 4]; 4],
}

impl PickingQueues {
    /// Split each class by the granularity of its objects (default: object).
    ///
    /// Ids that no longer resolve are skipped.
    pub fn split(queues: &RenderQueues, objects: &RenderObjectManager) -> Self {
        let mut split = Self::default();
        for layer in RenderLayer::ALL {
            for &id in queues.queue(layer) {
                let Some(object) = objects.get(id) else {
                    continue;
                };
                split.queues[layer.index()][object.granularity().index()].push(id);
            }
        }
        split
    }

    /// Sub-queue of one class and granularity.
    pub fn queue(&self, layer: RenderLayer, granularity: PickingGranularity) -> &RenderQueue {
        &self.queues[layer.index()][granularity.index()]
    }

    /// True when no class has anything to pick.
    pub fn is_empty(&self) -> bool {
        self.queues.iter().flatten().all(Vec::is_empty)
    }
}

impl Index<(RenderLayer, PickingGranularity)> for PickingQueues {
    type Output = RenderQueue;

    fn index(&self, (layer, granularity): (RenderLayer, PickingGranularity)) -> &RenderQueue {
        self.queue(layer, granularity)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use prism_core::TriangleMesh;

    use super::*;
    use crate::scene::RenderObject;

    fn populated() -> RenderObjectManager {
        let mesh = Arc::new(TriangleMesh::default());
        let mut objects = RenderObjectManager::new();
        objects.add(RenderObject::new("a", mesh.clone()));
        objects.add(
            RenderObject::new("b", mesh.clone())
                .with_layer(RenderLayer::Ui)
                .with_picking(PickingGranularity::Edge),
        );
        objects.add(RenderObject::new("c", mesh.clone()).with_picking(PickingGranularity::Vertex));
        objects.add(RenderObject::new("d", mesh.clone()).with_layer(RenderLayer::XRay));
        objects.add(RenderObject::new("e", mesh.clone()).with_layer(RenderLayer::Debug));
        let mut hidden = RenderObject::new("hidden", mesh);
        hidden.visible = false;
        objects.add(hidden);
        objects
    }

    #[test]
    fn test_every_visible_object_in_exactly_one_class() {
        let objects = populated();
        let queues = RenderQueues::feed(&objects);
        assert_eq!(queues.len(), 5);

        let mut seen = HashSet::new();
        for layer in RenderLayer::ALL {
            for id in queues.queue(layer) {
                assert!(seen.insert(*id), "{id} queued twice");
                assert_eq!(objects.get(*id).unwrap().layer, layer);
            }
        }
        assert!(!seen.contains(&RenderObjectId(5)));
        assert_eq!(queues.fancy, [RenderObjectId(0), RenderObjectId(2)]);
    }

    #[test]
    fn test_picking_partition_is_exact() {
        let objects = populated();
        let queues = RenderQueues::feed(&objects);
        let picking = PickingQueues::split(&queues, &objects);

        for layer in RenderLayer::ALL {
            let mut union: Vec<_> = PickingGranularity::ALL
                .iter()
                .flat_map(|&g| picking[(layer, g)].iter().copied())
                .collect();
            union.sort();
            let mut class = queues.queue(layer).clone();
            class.sort();
            assert_eq!(union, class);
        }
        assert_eq!(
            picking[(RenderLayer::Fancy, PickingGranularity::Object)],
            [RenderObjectId(0)]
        );
        assert_eq!(
            picking[(RenderLayer::Fancy, PickingGranularity::Vertex)],
            [RenderObjectId(2)]
        );
        assert_eq!(
            picking[(RenderLayer::Ui, PickingGranularity::Edge)],
            [RenderObjectId(1)]
        );
    }

    #[test]
    fn test_partition_is_idempotent() {
        let objects = populated();
        let first = RenderQueues::feed(&objects);
        let second = RenderQueues::feed(&objects);
        assert_eq!(first, second);
        assert_eq!(
            PickingQueues::split(&first, &objects),
            PickingQueues::split(&second, &objects)
        );
    }

    #[test]
    fn test_stale_ids_are_skipped() {
        let mut objects = populated();
        let queues = RenderQueues::feed(&objects);
        objects.remove(RenderObjectId(0));
        let picking = PickingQueues::split(&queues, &objects);
        assert!(picking[(RenderLayer::Fancy, PickingGranularity::Object)].is_empty());
        assert!(!picking.is_empty());
    }
}

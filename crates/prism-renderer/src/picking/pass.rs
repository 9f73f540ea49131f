//! Picking pass: draws the picking buffer and answers a frame's queries.

use crate::device::{DrawItem, RenderDevice};
use crate::error::RenderError;
use crate::queue::PickingQueues;
use crate::scene::{PickingGranularity, RenderLayer, RenderObjectManager};

use super::{PickingQuery, PickingResult, resolve_query};

/// Draw every picking sub-queue into the device's picking target.
///
/// Classes go Fancy, Debug (only with `draw_debug`), XRay, Ui. The picking
/// depth is cleared before XRay and before Ui so those classes cover earlier
/// ones. Within a class each granularity uses its own encoding.
pub fn draw_picking_buffer<D: RenderDevice + ?Sized>(
    device: &mut D,
    queues: &PickingQueues,
    objects: &RenderObjectManager,
    draw_debug: bool,
) -> Result<(), RenderError> {
    device.clear_picking()?;
    for layer in RenderLayer::ALL {
        match layer {
            RenderLayer::Debug if !draw_debug => continue,
            RenderLayer::XRay | RenderLayer::Ui => device.clear_picking_depth()?,
            _ => {}
        }
        for granularity in PickingGranularity::ALL {
            let items = DrawItem::collect(&queues[(layer, granularity)], objects);
            if !items.is_empty() {
                device.draw_picking(granularity, &items)?;
            }
        }
    }
    Ok(())
}

/// Answer `queries`, one result each and in order.
///
/// An empty viewport answers every query with an empty result without drawing.
pub fn run_picking<D: RenderDevice + ?Sized>(
    device: &mut D,
    queues: &PickingQueues,
    objects: &RenderObjectManager,
    queries: &[PickingQuery],
    brush_radius: f32,
    draw_debug: bool,
) -> Result<Vec<PickingResult>, RenderError> {
    let (width, height) = device.size();
    if width == 0 || height == 0 {
        return Ok(queries
            .iter()
            .map(|q| PickingResult::none(q.mode))
            .collect());
    }

    draw_picking_buffer(device, queues, objects, draw_debug)?;
    let buffer = device.read_picking()?;
    tracing::debug!(
        "Resolving {} picking queries on a {}x{} buffer",
        queries.len(),
        buffer.width(),
        buffer.height()
    );
    Ok(queries
        .iter()
        .map(|q| resolve_query(&buffer, q, brush_radius))
        .collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::{Mat4, Vec2, Vec3};
    use prism_core::{MouseButton, TriangleMesh};

    use super::*;
    use crate::device::{SoftwareDevice, ViewParams};
    use crate::frame::RenderData;
    use crate::picking::PickingMode;
    use crate::queue::RenderQueues;
    use crate::scene::RenderObject;

    fn square(z: f32) -> Arc<TriangleMesh> {
        Arc::new(TriangleMesh::new(
            vec![
                Vec3::new(-1.0, -1.0, z),
                Vec3::new(1.0, -1.0, z),
                Vec3::new(1.0, 1.0, z),
                Vec3::new(-1.0, 1.0, z),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        ))
    }

    fn device() -> SoftwareDevice {
        let mut device = SoftwareDevice::new(20, 20);
        let data = RenderData::new(
            Mat4::IDENTITY,
            Mat4::orthographic_rh(-1.0, 1.0, -1.0, 1.0, -1.0, 1.0),
            0.0,
        );
        device.begin_frame(&ViewParams::new(&data, &[])).unwrap();
        device
    }

    fn pick(objects: &RenderObjectManager, draw_debug: bool) -> PickingResult {
        let queues = RenderQueues::feed(objects);
        let split = PickingQueues::split(&queues, objects);
        let query = PickingQuery::new(Vec2::new(10.0, 10.0), MouseButton::Left, PickingMode::Ro);
        let mut device = device();
        run_picking(&mut device, &split, objects, &[query], 0.0, draw_debug)
            .unwrap()
            .remove(0)
    }

    #[test]
    fn test_xray_wins_over_closer_fancy() {
        let mut objects = RenderObjectManager::new();
        objects.add(RenderObject::new("front", square(0.5)));
        let xray = objects.add(RenderObject::new("behind", square(-0.5)).with_layer(RenderLayer::XRay));
        assert_eq!(pick(&objects, true).ro_idx, xray.pick_index());
    }

    #[test]
    fn test_ui_wins_over_everything() {
        let mut objects = RenderObjectManager::new();
        objects.add(RenderObject::new("front", square(0.5)));
        objects.add(RenderObject::new("xray", square(0.4)).with_layer(RenderLayer::XRay));
        let ui = objects.add(RenderObject::new("handle", square(-0.9)).with_layer(RenderLayer::Ui));
        assert_eq!(pick(&objects, true).ro_idx, ui.pick_index());
    }

    #[test]
    fn test_debug_class_skipped_when_disabled() {
        let mut objects = RenderObjectManager::new();
        let fancy = objects.add(RenderObject::new("scene", square(-0.5)));
        let debug = objects.add(RenderObject::new("helper", square(0.5)).with_layer(RenderLayer::Debug));
        assert_eq!(pick(&objects, true).ro_idx, debug.pick_index());
        assert_eq!(pick(&objects, false).ro_idx, fancy.pick_index());
    }

    #[test]
    fn test_empty_viewport_answers_every_query() {
        let objects = RenderObjectManager::new();
        let mut device = SoftwareDevice::new(0, 0);
        let queries = vec![
            PickingQuery::new(Vec2::ZERO, MouseButton::Left, PickingMode::Ro);
            3
        ];
        let results = run_picking(
            &mut device,
            &PickingQueues::default(),
            &objects,
            &queries,
            5.0,
            true,
        )
        .unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| !r.is_hit()));
    }
}

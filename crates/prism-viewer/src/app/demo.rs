//! Scene shown at startup

use std::sync::Arc;

use glam::{Mat4, Vec3};
use prism_core::primitive::{
    generate_box_mesh, generate_cylinder_mesh, generate_sphere_mesh, generate_torus_mesh,
};
use prism_renderer::{PickingGranularity, RenderData, RenderLayer, RenderObject, Scene};

/// A row of primitives, one per picking granularity, plus debug and x-ray markers
pub fn demo_scene() -> Scene {
    let mut scene = Scene::new();

    scene.objects.add(
        RenderObject::new("box", Arc::new(generate_box_mesh([1.0, 1.0, 1.0])))
            .with_transform(Mat4::from_translation(Vec3::new(-3.0, 0.0, 0.0)))
            .with_color([0.8, 0.45, 0.3, 1.0]),
    );
    scene.objects.add(
        RenderObject::new("sphere", Arc::new(generate_sphere_mesh(0.6)))
            .with_transform(Mat4::from_translation(Vec3::new(-1.0, 0.0, 0.0)))
            .with_picking(PickingGranularity::Vertex)
            .with_color([0.35, 0.6, 0.85, 1.0]),
    );
    scene.objects.add(
        RenderObject::new("torus", Arc::new(generate_torus_mesh(0.5, 0.2)))
            .with_transform(Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)))
            .with_picking(PickingGranularity::Edge)
            .with_color([0.5, 0.8, 0.4, 1.0])
            .with_update(|transform: &mut Mat4, data: &RenderData| {
                *transform *= Mat4::from_rotation_y(data.dt * 0.5);
            }),
    );
    scene.objects.add(
        RenderObject::new("cylinder", Arc::new(generate_cylinder_mesh(0.4, 1.2)))
            .with_transform(Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0)))
            .with_picking(PickingGranularity::Triangle)
            .with_color([0.85, 0.75, 0.35, 1.0]),
    );

    scene.objects.add(
        RenderObject::new("ground", Arc::new(generate_box_mesh([8.0, 0.02, 3.0])))
            .with_transform(Mat4::from_translation(Vec3::new(0.0, -0.8, 0.0)))
            .with_layer(RenderLayer::Debug)
            .with_color([0.4, 0.4, 0.45, 1.0]),
    );
    scene.objects.add(
        RenderObject::new("probe", Arc::new(generate_sphere_mesh(0.15)))
            .with_transform(Mat4::from_translation(Vec3::new(-3.0, 0.0, -0.2)))
            .with_layer(RenderLayer::XRay)
            .with_color([1.0, 0.3, 0.8, 1.0]),
    );

    scene
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_scene_covers_every_layer() {
        let scene = demo_scene();
        for layer in [RenderLayer::Fancy, RenderLayer::Debug, RenderLayer::XRay] {
            assert!(scene.objects.iter().any(|(_, o)| o.layer == layer));
        }
        assert!(scene.bounding_box(&[RenderLayer::Fancy]).is_valid());
    }
}

//! Ray tests against gizmo handles
//!
//! Used for hover highlighting and for turning mouse motion into handle
//! motion. Constraint selection itself goes through GPU picking.

use glam::Vec3;
use prism_core::Ray;

/// Ray parameter of the closest hit on a finite cylinder, if any.
///
/// The ray and the axis are projected onto the plane perpendicular to the
/// axis, which leaves a 2D circle test `at² + bt + c = 0`. The hit is then
/// kept only if it lies between `start` and `end`.
pub fn ray_cylinder_intersection(ray: &Ray, start: Vec3, end: Vec3, radius: f32) -> Option<f32> {
    let axis = (end - start).normalize_or_zero();
    let length = (end - start).length();
    if axis == Vec3::ZERO {
        return None;
    }

    let d = ray.direction - axis * ray.direction.dot(axis);
    let offset = ray.origin - start;
    let o = offset - axis * offset.dot(axis);

    let a = d.dot(d);
    if a < 1e-12 {
        // Ray parallel to the axis
        return None;
    }
    let b = 2.0 * d.dot(o);
    let c = o.dot(o) - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    if t < 0.0 {
        return None;
    }

    let projection = (ray.at(t) - start).dot(axis);
    (0.0..=length).contains(&projection).then_some(t)
}

/// Ray parameter where the ray crosses a ring of `radius` around `center`,
/// within `thickness` of the ring's center line.
pub fn ray_ring_intersection(
    ray: &Ray,
    center: Vec3,
    normal: Vec3,
    radius: f32,
    thickness: f32,
) -> Option<f32> {
    let t = ray_plane_intersection(ray, center, normal)?;
    let distance_from_ring = (ray.at(t).distance(center) - radius).abs();
    (distance_from_ring <= thickness).then_some(t)
}

/// Ray parameter where the ray crosses a plane, `None` when parallel or behind.
pub fn ray_plane_intersection(ray: &Ray, point: Vec3, normal: Vec3) -> Option<f32> {
    let denom = ray.direction.dot(normal);
    if denom.abs() < 1e-6 {
        return None;
    }
    let t = (point - ray.origin).dot(normal) / denom;
    (t >= 0.0).then_some(t)
}

/// Parameter along `axis` (from `origin`) of the point of the axis line closest
/// to the ray. `None` when the ray runs parallel to the axis.
pub fn closest_point_on_axis(ray: &Ray, origin: Vec3, axis: Vec3) -> Option<f32> {
    let w = ray.origin - origin;
    let b = ray.direction.dot(axis);
    let a = ray.direction.dot(ray.direction);
    let c = axis.dot(axis);
    let denom = a * c - b * b;
    if denom.abs() < 1e-8 {
        return None;
    }
    let d = ray.direction.dot(w);
    let e = axis.dot(w);
    Some((a * e - b * d) / denom)
}

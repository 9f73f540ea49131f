//! CPU render device.
//!
//! Rasterizes triangles with perspective-correct barycentrics, a `Less` depth
//! test and no face culling, and encodes picking texels with the same rules as
//! the picking shader. Triangles with a vertex behind the eye are skipped.
//! Images are stored bottom row first.

use glam::{Mat3, Vec3, Vec4};

use super::{
    DrawItem, DrawStyle, FrameImage, OutputTarget, PostEffect, RenderDevice, TextureId, ViewParams,
};
use crate::error::RenderError;
use crate::light::DirectionalLight;
use crate::picking::{PickBuffer, PickTexel};
use crate::scene::PickingGranularity;

const FAR_DEPTH: f32 = 1.0;
const MIN_W: f32 = 1e-6;
const WIREFRAME_WIDTH: f32 = 0.03;

type Image = Vec<[f32; 4]>;

/// Headless render device.
pub struct SoftwareDevice {
    width: u32,
    height: u32,
    textures: Vec<(String, Image)>,
    depth: Vec<f32>,
    picking: PickBuffer,
    picking_depth: Vec<f32>,
    backbuffer: Image,
    external: Option<Image>,
    view: Option<ViewParams>,
    frames: u64,
}

impl SoftwareDevice {
    /// Device with a `width` x `height` viewport.
    pub fn new(width: u32, height: u32) -> Self {
        let pixels = (width * height) as usize;
        Self {
            width,
            height,
            textures: Vec::new(),
            depth: vec![FAR_DEPTH; pixels],
            picking: PickBuffer::new(width, height),
            picking_depth: vec![FAR_DEPTH; pixels],
            backbuffer: vec![[0.0; 4]; pixels],
            external: None,
            view: None,
            frames: 0,
        }
    }

    /// Bind a host image as the output target.
    pub fn bind_external_target(&mut self) {
        self.external = Some(vec![[0.0; 4]; self.pixel_count()]);
    }

    /// Go back to compositing into the backbuffer.
    pub fn unbind_external_target(&mut self) {
        self.external = None;
    }

    /// Contents of the bound host image.
    pub fn external_image(&self) -> Option<FrameImage> {
        self.external.as_ref().map(|img| self.to_frame_image(img))
    }

    /// Contents of the backbuffer.
    pub fn backbuffer_image(&self) -> FrameImage {
        self.to_frame_image(&self.backbuffer)
    }

    /// Number of completed frames.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    fn pixel_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    fn texture_index(&self, id: TextureId) -> Result<usize, RenderError> {
        let index = id.0 as usize;
        if index < self.textures.len() {
            Ok(index)
        } else {
            Err(RenderError::UnknownTexture(id))
        }
    }

    fn view(&self) -> Result<ViewParams, RenderError> {
        self.view
            .ok_or_else(|| RenderError::Device("draw outside of a frame".into()))
    }

    fn to_frame_image(&self, image: &Image) -> FrameImage {
        let mut rgba = Vec::with_capacity(image.len() * 4);
        for row in image.chunks_exact(self.width.max(1) as usize).rev() {
            for pixel in row {
                rgba.extend(pixel.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8));
            }
        }
        FrameImage {
            width: self.width,
            height: self.height,
            rgba,
        }
    }
}

/// Screen-space triangle ready for rasterization.
struct ScreenTriangle {
    xy: [(f32, f32); 3],
    z: [f32; 3],
    inv_w: [f32; 3],
}

impl ScreenTriangle {
    fn project(clip: [Vec4; 3], width: u32, height: u32) -> Option<Self> {
        if clip.iter().any(|c| c.w <= MIN_W) {
            return None;
        }
        let ndc = clip.map(|c| c.truncate() / c.w);
        Some(Self {
            xy: ndc.map(|n| {
                (
                    (n.x * 0.5 + 0.5) * width as f32,
                    (n.y * 0.5 + 0.5) * height as f32,
                )
            }),
            z: ndc.map(|n| n.z),
            inv_w: clip.map(|c| 1.0 / c.w),
        })
    }

    /// Calls `fragment(pixel, depth, bary)` for every covered pixel center.
    fn rasterize(&self, width: u32, height: u32, mut fragment: impl FnMut(usize, f32, [f32; 3])) {
        let [(x0, y0), (x1, y1), (x2, y2)] = self.xy;
        let area = (x1 - x0) * (y2 - y0) - (x2 - x0) * (y1 - y0);
        if area.abs() < f32::EPSILON {
            return;
        }

        let min_x = x0.min(x1).min(x2).floor().max(0.0) as u32;
        let max_x = (x0.max(x1).max(x2).ceil() as i64).clamp(0, width as i64) as u32;
        let min_y = y0.min(y1).min(y2).floor().max(0.0) as u32;
        let max_y = (y0.max(y1).max(y2).ceil() as i64).clamp(0, height as i64) as u32;

        for py in min_y..max_y {
            for px in min_x..max_x {
                let (x, y) = (px as f32 + 0.5, py as f32 + 0.5);
                let l0 = ((x1 - x) * (y2 - y) - (x2 - x) * (y1 - y)) / area;
                let l1 = ((x2 - x) * (y0 - y) - (x0 - x) * (y2 - y)) / area;
                let l2 = 1.0 - l0 - l1;
                if l0 < 0.0 || l1 < 0.0 || l2 < 0.0 {
                    continue;
                }

                let depth = l0 * self.z[0] + l1 * self.z[1] + l2 * self.z[2];
                if !(0.0..=1.0).contains(&depth) {
                    continue;
                }

                let p = [l0 * self.inv_w[0], l1 * self.inv_w[1], l2 * self.inv_w[2]];
                let sum = p[0] + p[1] + p[2];
                let bary = p.map(|v| v / sum);
                fragment((py * width + px) as usize, depth, bary);
            }
        }
    }
}

/// Visits every projected triangle of the items.
fn for_each_triangle(
    items: &[DrawItem],
    view: &ViewParams,
    width: u32,
    height: u32,
    mut visit: impl FnMut(&DrawItem, usize, &ScreenTriangle),
) {
    let view_proj = view.view_projection();
    for item in items {
        let mvp = view_proj * item.transform;
        for (t, tri) in item.mesh.triangles.iter().enumerate() {
            let clip = tri.map(|i| mvp * item.mesh.vertices[i as usize].extend(1.0));
            if let Some(screen) = ScreenTriangle::project(clip, width, height) {
                visit(item, t, &screen);
            }
        }
    }
}

fn shade(
    style: DrawStyle,
    item: &DrawItem,
    normal_matrix: &Mat3,
    light: &DirectionalLight,
    triangle: usize,
    bary: [f32; 3],
) -> Option<[f32; 4]> {
    let [r, g, b, a] = item.color;
    match style {
        DrawStyle::Flat => Some(item.color),
        DrawStyle::XRay(alpha) => Some([r, g, b, a * alpha]),
        DrawStyle::Wireframe => {
            (bary.iter().copied().fold(f32::MAX, f32::min) < WIREFRAME_WIDTH).then_some(item.color)
        }
        DrawStyle::Lit => {
            let mesh = &item.mesh;
            let tri = mesh.triangles[triangle];
            let local = if mesh.normals.len() == mesh.vertices.len() {
                tri.iter()
                    .zip(bary)
                    .map(|(&i, w)| mesh.normals[i as usize] * w)
                    .sum::<Vec3>()
            } else {
                prism_core::mesh::utils::triangle_normal(mesh, triangle)
            };
            let normal = (*normal_matrix * local).normalize_or_zero();
            let lit = Vec3::new(r, g, b) * light.shade(normal);
            Some([lit.x, lit.y, lit.z, a])
        }
    }
}

fn blend(dst: &mut [f32; 4], src: [f32; 4]) {
    let alpha = src[3];
    for c in 0..3 {
        dst[c] = src[c] * alpha + dst[c] * (1.0 - alpha);
    }
    dst[3] = alpha + dst[3] * (1.0 - alpha);
}

impl RenderDevice for SoftwareDevice {
    fn backend_name(&self) -> &str {
        "software"
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        self.width = width;
        self.height = height;
        let pixels = self.pixel_count();
        for (_, image) in &mut self.textures {
            *image = vec![[0.0; 4]; pixels];
        }
        self.depth = vec![FAR_DEPTH; pixels];
        self.picking = PickBuffer::new(width, height);
        self.picking_depth = vec![FAR_DEPTH; pixels];
        self.backbuffer = vec![[0.0; 4]; pixels];
        if self.external.is_some() {
            self.external = Some(vec![[0.0; 4]; pixels]);
        }
        Ok(())
    }

    fn create_texture(&mut self, label: &str) -> Result<TextureId, RenderError> {
        let id = TextureId(self.textures.len() as u32);
        self.textures
            .push((label.to_string(), vec![[0.0; 4]; self.pixel_count()]));
        Ok(id)
    }

    fn bound_target(&self) -> OutputTarget {
        if self.external.is_some() {
            OutputTarget::External
        } else {
            OutputTarget::Backbuffer
        }
    }

    fn begin_frame(&mut self, view: &ViewParams) -> Result<(), RenderError> {
        self.view = Some(*view);
        Ok(())
    }

    fn clear(&mut self, target: TextureId, color: [f32; 4]) -> Result<(), RenderError> {
        let index = self.texture_index(target)?;
        self.textures[index].1.fill(color);
        self.depth.fill(FAR_DEPTH);
        Ok(())
    }

    fn clear_depth(&mut self) -> Result<(), RenderError> {
        self.depth.fill(FAR_DEPTH);
        Ok(())
    }

    fn draw(
        &mut self,
        target: TextureId,
        style: DrawStyle,
        items: &[DrawItem],
    ) -> Result<(), RenderError> {
        let index = self.texture_index(target)?;
        let view = self.view()?;
        let (width, height) = (self.width, self.height);
        let image = &mut self.textures[index].1;
        let depth = &mut self.depth;

        for_each_triangle(items, &view, width, height, |item, t, screen| {
            let normal_matrix = Mat3::from_mat4(item.transform).inverse().transpose();
            screen.rasterize(width, height, |pixel, z, bary| {
                if z >= depth[pixel] {
                    return;
                }
                let Some(color) = shade(style, item, &normal_matrix, &view.light, t, bary) else {
                    return;
                };
                depth[pixel] = z;
                match style {
                    DrawStyle::XRay(_) => blend(&mut image[pixel], color),
                    _ => image[pixel] = color,
                }
            });
        });
        Ok(())
    }

    fn clear_picking(&mut self) -> Result<(), RenderError> {
        self.picking.clear();
        self.picking_depth.fill(FAR_DEPTH);
        Ok(())
    }

    fn clear_picking_depth(&mut self) -> Result<(), RenderError> {
        self.picking_depth.fill(FAR_DEPTH);
        Ok(())
    }

    fn draw_picking(
        &mut self,
        granularity: PickingGranularity,
        items: &[DrawItem],
    ) -> Result<(), RenderError> {
        let view = self.view()?;
        let (width, height) = (self.width, self.height);
        let picking = &mut self.picking;
        let depth = &mut self.picking_depth;

        for_each_triangle(items, &view, width, height, |item, t, screen| {
            let corners = item.mesh.triangles[t];
            screen.rasterize(width, height, |pixel, z, bary| {
                if z >= depth[pixel] {
                    return;
                }
                depth[pixel] = z;
                let texel = PickTexel::encode(
                    granularity,
                    item.id.pick_index(),
                    t as u32,
                    corners,
                    bary,
                );
                picking.set(pixel as u32 % width, pixel as u32 / width, texel);
            });
        });
        Ok(())
    }

    fn read_picking(&mut self) -> Result<PickBuffer, RenderError> {
        Ok(self.picking.clone())
    }

    fn blit(&mut self, src: TextureId, dst: TextureId, effect: PostEffect) -> Result<(), RenderError> {
        let src = self.texture_index(src)?;
        let dst = self.texture_index(dst)?;
        let source = self.textures[src].1.clone();
        let target = &mut self.textures[dst].1;
        for (out, input) in target.iter_mut().zip(source) {
            *out = match effect {
                PostEffect::Copy => input,
                PostEffect::Tonemap { exposure, gamma } => {
                    let map = |c: f32| (1.0 - (-c * exposure).exp()).powf(1.0 / gamma);
                    [map(input[0]), map(input[1]), map(input[2]), input[3]]
                }
            };
        }
        Ok(())
    }

    fn composite(&mut self, src: TextureId, target: OutputTarget) -> Result<(), RenderError> {
        let src = self.texture_index(src)?;
        let source = &self.textures[src].1;
        let output = match target {
            OutputTarget::Backbuffer => &mut self.backbuffer,
            OutputTarget::External => self
                .external
                .as_mut()
                .ok_or_else(|| RenderError::Device("no external target bound".into()))?,
        };
        output.clone_from(source);
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        self.view = None;
        self.frames += 1;
        Ok(())
    }

    fn read_texture(&mut self, texture: TextureId) -> Result<FrameImage, RenderError> {
        let index = self.texture_index(texture)?;
        Ok(self.to_frame_image(&self.textures[index].1))
    }

    fn reload_shaders(&mut self) -> Result<(), RenderError> {
        tracing::debug!("software device has no shaders to reload");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Mat4;
    use prism_core::TriangleMesh;

    use super::*;
    use crate::frame::RenderData;
    use crate::scene::RenderObjectId;

    fn quad() -> Arc<TriangleMesh> {
        Arc::new(TriangleMesh::new(
            vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(-1.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        ))
    }

    fn ortho_view() -> ViewParams {
        let data = RenderData::new(
            Mat4::IDENTITY,
            Mat4::orthographic_rh(-1.0, 1.0, -1.0, 1.0, -1.0, 1.0),
            0.0,
        );
        ViewParams::new(&data, &[])
    }

    fn item(id: u32, mesh: Arc<TriangleMesh>, transform: Mat4, color: [f32; 4]) -> DrawItem {
        DrawItem {
            id: RenderObjectId(id),
            mesh,
            transform,
            color,
        }
    }

    #[test]
    fn test_flat_draw_covers_viewport() {
        let mut device = SoftwareDevice::new(10, 10);
        let target = device.create_texture("color").unwrap();
        device.begin_frame(&ortho_view()).unwrap();
        device.clear(target, [0.0, 0.0, 0.0, 1.0]).unwrap();
        device
            .draw(target, DrawStyle::Flat, &[item(0, quad(), Mat4::IDENTITY, [1.0, 0.0, 0.0, 1.0])])
            .unwrap();
        let image = device.read_texture(target).unwrap();
        assert_eq!(image.pixel(0, 0), [255, 0, 0, 255]);
        assert_eq!(image.pixel(9, 9), [255, 0, 0, 255]);
    }

    #[test]
    fn test_depth_keeps_nearest() {
        let mut device = SoftwareDevice::new(8, 8);
        let target = device.create_texture("color").unwrap();
        device.begin_frame(&ortho_view()).unwrap();
        device.clear(target, [0.0; 4]).unwrap();
        // +z is closer to the viewer in an identity view
        let near = item(0, quad(), Mat4::from_translation(Vec3::Z * 0.5), [0.0, 1.0, 0.0, 1.0]);
        let far = item(1, quad(), Mat4::from_translation(Vec3::Z * -0.5), [0.0, 0.0, 1.0, 1.0]);
        device.draw(target, DrawStyle::Flat, &[near, far]).unwrap();
        let image = device.read_texture(target).unwrap();
        assert_eq!(image.pixel(4, 4), [0, 255, 0, 255]);
    }

    #[test]
    fn test_picking_encodes_features() {
        let mut device = SoftwareDevice::new(100, 100);
        device.begin_frame(&ortho_view()).unwrap();
        device.clear_picking().unwrap();
        device
            .draw_picking(
                PickingGranularity::Edge,
                &[item(3, quad(), Mat4::IDENTITY, [1.0; 4])],
            )
            .unwrap();
        let buffer = device.read_picking().unwrap();
        let texel = buffer.texel(90, 50);
        assert_eq!(texel.ro, 3);
        assert_eq!(texel.vertex, 2);
        assert_eq!(texel.element, 0);
        assert_eq!(texel.edge, 0);

        let texel = buffer.texel(10, 90);
        assert_eq!(texel.element, 1);
        assert_eq!(texel.vertex, 3);
    }

    #[test]
    fn test_triangle_behind_eye_is_skipped() {
        let mut device = SoftwareDevice::new(16, 16);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, -2.0), Vec3::new(0.0, 0.0, -10.0), Vec3::Y);
        let data = RenderData::new(view, Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0), 0.0);
        device.begin_frame(&ViewParams::new(&data, &[])).unwrap();
        device.clear_picking().unwrap();
        device
            .draw_picking(PickingGranularity::Object, &[item(0, quad(), Mat4::IDENTITY, [1.0; 4])])
            .unwrap();
        let buffer = device.read_picking().unwrap();
        assert!(buffer.texel(8, 8).is_background());
    }

    #[test]
    fn test_tonemap_blit() {
        let mut device = SoftwareDevice::new(2, 2);
        let src = device.create_texture("src").unwrap();
        let dst = device.create_texture("dst").unwrap();
        device.begin_frame(&ortho_view()).unwrap();
        device.clear(src, [0.0, 0.5, 4.0, 1.0]).unwrap();
        device
            .blit(src, dst, PostEffect::Tonemap { exposure: 1.0, gamma: 1.0 })
            .unwrap();
        let px = device.read_texture(dst).unwrap().pixel(0, 0);
        assert_eq!(px[0], 0);
        assert_eq!(px[1], ((1.0 - (-0.5f32).exp()) * 255.0).round() as u8);
        assert!(px[2] >= 250);
    }

    #[test]
    fn test_composite_to_external() {
        let mut device = SoftwareDevice::new(2, 2);
        let src = device.create_texture("src").unwrap();
        assert_eq!(device.bound_target(), OutputTarget::Backbuffer);
        assert!(device.composite(src, OutputTarget::External).is_err());

        device.bind_external_target();
        assert_eq!(device.bound_target(), OutputTarget::External);
        device.begin_frame(&ortho_view()).unwrap();
        device.clear(src, [1.0, 1.0, 1.0, 1.0]).unwrap();
        device.composite(src, OutputTarget::External).unwrap();
        assert_eq!(device.external_image().unwrap().pixel(1, 1), [255; 4]);
    }

    #[test]
    fn test_resize_keeps_texture_ids() {
        let mut device = SoftwareDevice::new(4, 4);
        let id = device.create_texture("color").unwrap();
        device.resize(0, 0).unwrap();
        assert_eq!(device.read_texture(id).unwrap().rgba.len(), 0);
        device.resize(3, 2).unwrap();
        assert_eq!(device.read_texture(id).unwrap().rgba.len(), 3 * 2 * 4);
        assert_eq!(device.read_picking().unwrap().width(), 3);
    }
}

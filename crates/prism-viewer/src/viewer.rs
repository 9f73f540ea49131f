//! Viewer adapter
//!
//! [`Viewer`] turns toolkit-independent input events into camera motion,
//! picking requests and gizmo drags, drives frames through the current
//! renderer's [`RenderGate`] and dispatches the picking results that come
//! back.
//!
//! Every renderer access goes through the gate. While the host holds the
//! compositor window open (between [`Viewer::on_about_to_compose`] and
//! [`Viewer::on_frame_swapped`], or across a resize) the viewer keeps the
//! [`ComposeGuard`] and routes its own renderer calls through it.

use std::path::Path;
use std::sync::Arc;

use glam::{Vec2, Vec3};
use image::ImageFormat;
use prism_core::MouseButton;
use prism_core::mesh::utils::cast_ray;
use prism_renderer::{
    ComposeGuard, PickingMode, PickingQuery, PickingResult, RenderDevice, RenderGate, RenderLayer,
    RenderObject, RenderObjectId, Renderer, Scene,
};
use tracing::{debug, error, info, warn};

use crate::camera::TrackballCamera;
use crate::error::{Result, ViewerError};
use crate::events::{Key, Modifiers, ViewerEvent};
use crate::gizmo::{GizmoManager, GizmoMode};
use crate::keymap::{KeyMapping, ViewerAction};
use crate::picking_manager::PickingManager;

/// One object hit by [`Viewer::raycast`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub object: RenderObjectId,
    /// Hit triangle index in the object's mesh
    pub triangle: usize,
    /// Corner of the hit triangle closest to the hit point
    pub vertex: Option<u32>,
    /// World-space hit point
    pub point: Vec3,
    /// Distance from the ray origin
    pub distance: f32,
}

/// Interactive viewer over one or more renderers sharing a scene
pub struct Viewer<D: RenderDevice> {
    renderers: Vec<RenderGate<D>>,
    current: usize,
    compose: Option<ComposeGuard<D>>,
    /// The held guard was taken by `on_about_to_resize`, not by the compositor
    resize_lock: bool,
    scene: Scene,
    camera: TrackballCamera,
    keys: KeyMapping,
    picking: PickingManager,
    gizmos: GizmoManager,
    headlight: bool,
    raycast_held: bool,
    rotate_held: bool,
    mouse: Vec2,
    size: (u32, u32),
    last_raycast: Vec<RaycastHit>,
}

impl<D: RenderDevice> Viewer<D> {
    /// Viewer showing `scene` through `renderer`; the viewport size is the
    /// renderer's.
    pub fn new(renderer: Renderer<D>, mut scene: Scene) -> Self {
        let config = renderer.config().clone();
        let size = renderer.size();
        let gizmos = GizmoManager::new(&mut scene.objects, &config.gizmo);
        info!(
            "Viewer created with renderer '{}' ({}x{})",
            renderer.name(),
            size.0,
            size.1
        );

        Self {
            renderers: vec![RenderGate::new(renderer)],
            current: 0,
            compose: None,
            resize_lock: false,
            scene,
            camera: TrackballCamera::new(config.camera.clone(), size.0, size.1),
            keys: KeyMapping::default(),
            picking: PickingManager::new(&config.picking),
            gizmos,
            headlight: config.lighting.headlight,
            raycast_held: false,
            rotate_held: false,
            mouse: Vec2::ZERO,
            size,
            last_raycast: Vec::new(),
        }
    }

    /// Replace the key bindings
    pub fn with_key_mapping(mut self, keys: KeyMapping) -> Self {
        self.keys = keys;
        self
    }

    pub fn key_mapping(&self) -> &KeyMapping {
        &self.keys
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn camera(&self) -> &TrackballCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut TrackballCamera {
        &mut self.camera
    }

    pub fn picking_manager(&self) -> &PickingManager {
        &self.picking
    }

    pub fn gizmo_manager(&self) -> &GizmoManager {
        &self.gizmos
    }

    pub fn set_gizmo_mode(&mut self, mode: GizmoMode) {
        self.gizmos.set_mode(&mut self.scene.objects, mode);
    }

    /// Gate of the current renderer
    pub fn renderer(&self) -> &RenderGate<D> {
        &self.renderers[self.current]
    }

    /// Viewport size in pixels
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Run `f` on the current renderer, through the compose guard when one is held
    fn with_renderer<R>(&mut self, f: impl FnOnce(&mut Renderer<D>) -> R) -> R {
        match self.compose.as_mut() {
            Some(guard) => f(&mut **guard),
            None => self.renderers[self.current].with(f),
        }
    }

    // ========== Events ==========

    /// Dispatch one input event
    pub fn handle_event(&mut self, event: ViewerEvent) {
        match event {
            ViewerEvent::MousePress {
                position,
                button,
                modifiers,
            } => self.mouse_press_event(position, button, modifiers),
            ViewerEvent::MouseRelease {
                position,
                button,
                modifiers,
            } => self.mouse_release_event(position, button, modifiers),
            ViewerEvent::MouseMove {
                position,
                modifiers,
            } => self.mouse_move_event(position, modifiers),
            ViewerEvent::Wheel { delta, modifiers } => self.wheel_event(delta, modifiers),
            ViewerEvent::KeyPress { key, modifiers } => self.key_press_event(key, modifiers),
            ViewerEvent::KeyRelease { key, modifiers } => self.key_release_event(key, modifiers),
            ViewerEvent::Resize { width, height } => {
                self.on_about_to_resize();
                if let Err(e) = self.on_resized(width, height) {
                    warn!("Resize to {}x{} failed: {}", width, height, e);
                }
            }
        }
    }

    pub fn mouse_press_event(&mut self, position: Vec2, button: MouseButton, _modifiers: Modifiers) {
        self.set_mouse(position);

        if button == self.keys.select_button {
            if self.raycast_held {
                self.raycast(position);
            } else {
                let mode = self.picking.query_mode();
                self.request_pick(position, button, mode);
            }
        } else if button == self.keys.rotate_button {
            self.rotate_held = true;
            self.camera.begin_rotate(position);
            if self.gizmos.target().is_some() {
                // Answered next frame; a gizmo handle hit takes over the drag
                self.request_pick(position, button, PickingMode::Ro);
            }
        } else if button == self.keys.pan_button {
            self.camera.begin_pan(position);
        }
    }

    pub fn mouse_release_event(
        &mut self,
        position: Vec2,
        button: MouseButton,
        _modifiers: Modifiers,
    ) {
        self.set_mouse(position);
        if button == self.keys.rotate_button {
            self.rotate_held = false;
            self.gizmos.end_drag(&mut self.scene.objects);
        }
        self.camera.end_drag();
    }

    pub fn mouse_move_event(&mut self, position: Vec2, modifiers: Modifiers) {
        self.set_mouse(position);
        let ray = self.camera.ray(position);
        if self.gizmos.is_dragging() {
            self.gizmos.drag(&mut self.scene.objects, &ray, modifiers.ctrl);
        } else if !self.camera.drag_to(position) {
            self.gizmos.hover(&mut self.scene.objects, &ray);
        }
    }

    /// Zoom, or resize the brush with shift held
    pub fn wheel_event(&mut self, delta: f32, modifiers: Modifiers) {
        if modifiers.shift {
            let radius = self.picking.resize_brush(delta);
            self.with_renderer(|r| r.set_brush_radius(radius));
        } else {
            self.camera.zoom(delta);
        }
    }

    pub fn key_press_event(&mut self, key: Key, _modifiers: Modifiers) {
        let Some(action) = self.keys.action(key) else {
            return;
        };
        match action {
            ViewerAction::ToggleBrush => {
                self.picking.toggle_brush();
            }
            ViewerAction::PickVertex => self.picking.press_feature(PickingMode::Vertex),
            ViewerAction::PickEdge => self.picking.press_feature(PickingMode::Edge),
            ViewerAction::PickTriangle => self.picking.press_feature(PickingMode::Triangle),
            ViewerAction::Raycast => self.raycast_held = true,
            ViewerAction::FitScene => self.fit_camera_to_scene(),
            ViewerAction::ResetCamera => self.reset_camera(),
            ViewerAction::ToggleWireframe => self.with_renderer(|r| r.toggle_wireframe()),
            ViewerAction::ToggleDebugDraw => self.with_renderer(|r| r.toggle_draw_debug()),
            ViewerAction::ReloadShaders => {
                // Failure is already logged
                let _ = self.reload_shaders();
            }
            ViewerAction::ClearSelection => {
                self.picking.clear_selection();
                self.gizmos.attach(&mut self.scene.objects, None);
            }
        }
    }

    pub fn key_release_event(&mut self, key: Key, _modifiers: Modifiers) {
        match self.keys.action(key) {
            Some(ViewerAction::PickVertex) => self.picking.release_feature(PickingMode::Vertex),
            Some(ViewerAction::PickEdge) => self.picking.release_feature(PickingMode::Edge),
            Some(ViewerAction::PickTriangle) => {
                self.picking.release_feature(PickingMode::Triangle)
            }
            Some(ViewerAction::Raycast) => self.raycast_held = false,
            _ => {}
        }
    }

    fn set_mouse(&mut self, position: Vec2) {
        self.mouse = position;
        self.with_renderer(|r| r.set_mouse_position(position));
    }

    fn request_pick(&mut self, position: Vec2, button: MouseButton, mode: PickingMode) {
        let query = PickingQuery::new(self.to_picking(position), button, mode);
        debug!("Picking request {:?} at {:?}", mode, query.screen);
        self.with_renderer(|r| r.add_picking_request(query));
    }

    /// Top-left pixel position to picking coordinates (bottom-left origin)
    fn to_picking(&self, position: Vec2) -> Vec2 {
        Vec2::new(position.x, self.size.1 as f32 - position.y)
    }

    fn from_picking(&self, screen: Vec2) -> Vec2 {
        Vec2::new(screen.x, self.size.1 as f32 - screen.y)
    }

    // ========== Frames ==========

    /// Render one frame and dispatch the picking results it produced.
    ///
    /// Results are dispatched even when the frame fails, since the renderer
    /// answers every query regardless.
    pub fn start_rendering(&mut self, dt: f32) -> Result<()> {
        if self.headlight {
            self.camera.update_headlight(&mut self.scene.lights);
        }
        self.gizmos.update(&mut self.scene.objects, self.camera.camera());

        let data = self.camera.render_data(dt);
        let scene = &mut self.scene;
        let rendered = match self.compose.as_mut() {
            Some(guard) => guard.render(scene, &data),
            None => self.renderers[self.current].render(scene, &data),
        };
        if let Err(e) = &rendered {
            warn!("Frame failed: {}", e);
        }

        self.process_picking();
        rendered.map_err(ViewerError::from)
    }

    /// Dispatch last frame's picking results; returns how many were handled
    pub fn process_picking(&mut self) -> usize {
        let (queries, results) = self.with_renderer(|r| {
            (r.picking_queries().to_vec(), r.picking_results().to_vec())
        });
        debug_assert_eq!(queries.len(), results.len());
        if queries.len() != results.len() {
            error!(
                "Picking produced {} results for {} queries",
                results.len(),
                queries.len()
            );
        }

        let count = queries.len().min(results.len());
        for (query, result) in queries.iter().zip(&results) {
            if query.button == self.keys.rotate_button {
                self.handle_gizmo_pick(query, result);
            } else if query.button == self.keys.select_button {
                self.handle_selection(result);
            }
        }
        count
    }

    fn handle_gizmo_pick(&mut self, query: &PickingQuery, result: &PickingResult) {
        if !self.rotate_held || !self.gizmos.handle_picking(&mut self.scene.objects, result) {
            return;
        }
        self.camera.end_drag();
        let ray = self.camera.ray(self.from_picking(query.screen));
        if self.gizmos.begin_drag(&self.scene.objects, &ray) {
            debug!("Gizmo drag started on object {}", result.ro_idx);
        }
    }

    fn handle_selection(&mut self, result: &PickingResult) {
        match result.object() {
            Some(id) if self.gizmos.is_gizmo_object(id) => {}
            Some(id) => {
                if result.mode == PickingMode::Ro {
                    self.gizmos.attach(&mut self.scene.objects, Some(id));
                }
                self.picking.set_selection(result.clone());
            }
            None if result.mode == PickingMode::Ro => {
                self.picking.clear_selection();
                self.gizmos.attach(&mut self.scene.objects, None);
            }
            None => {}
        }
    }

    /// Take the renderer lock for the compositor window
    pub fn on_about_to_compose(&mut self) {
        if self.compose.is_none() {
            self.compose = Some(self.renderers[self.current].begin_compose());
        }
        self.resize_lock = false;
    }

    /// Release the lock taken by [`Viewer::on_about_to_compose`]
    pub fn on_frame_swapped(&mut self) {
        self.compose = None;
        self.resize_lock = false;
    }

    /// Take the renderer lock before the host reallocates its surface.
    /// Inside a compositor window the compositor's lock is reused.
    pub fn on_about_to_resize(&mut self) {
        if self.compose.is_none() {
            self.compose = Some(self.renderers[self.current].begin_compose());
            self.resize_lock = true;
        }
    }

    /// Resize the renderer and camera, then release the lock taken by
    /// [`Viewer::on_about_to_resize`]. A compositor lock stays held until
    /// [`Viewer::on_frame_swapped`].
    pub fn on_resized(&mut self, width: u32, height: u32) -> Result<()> {
        self.size = (width, height);
        self.camera.resize(width, height);
        let resized = self.with_renderer(|r| r.resize(width, height));
        if self.resize_lock {
            self.compose = None;
            self.resize_lock = false;
        }
        resized?;
        Ok(())
    }

    // ========== Renderers ==========

    /// Reload the shaders of the current renderer, keeping the old ones on failure
    pub fn reload_shaders(&mut self) -> Result<()> {
        match self.with_renderer(|r| r.reload_shaders()) {
            Ok(()) => {
                info!("Shaders reloaded");
                Ok(())
            }
            Err(e) => {
                warn!("Shader reload failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Show one of the current renderer's textures
    pub fn display_texture(&mut self, name: &str) -> Result<()> {
        self.with_renderer(|r| r.display_texture(name))?;
        Ok(())
    }

    /// Textures the current renderer can display
    pub fn available_textures(&mut self) -> Vec<String> {
        self.with_renderer(|r| r.available_textures())
    }

    /// Register another renderer, sized to the viewport; returns its index
    pub fn add_renderer(&mut self, mut renderer: Renderer<D>) -> Result<usize> {
        renderer.resize(self.size.0, self.size.1)?;
        info!("Renderer '{}' added", renderer.name());
        self.renderers.push(RenderGate::new(renderer));
        Ok(self.renderers.len() - 1)
    }

    /// Switch to renderer `index`. Both renderers stay locked for the whole
    /// switch; inside a compositor window the lock moves to the new renderer.
    pub fn change_renderer(&mut self, index: usize) -> Result<()> {
        if index >= self.renderers.len() {
            return Err(ViewerError::UnknownRenderer(index.to_string()));
        }
        if index == self.current {
            return Ok(());
        }

        let held = self.compose.take();
        let composing = held.is_some();
        let outgoing = match held {
            Some(guard) => guard,
            None => self.renderers[self.current].begin_compose(),
        };
        let mut incoming = self.renderers[index].begin_compose();

        if let Err(e) = incoming.resize(self.size.0, self.size.1) {
            if composing {
                self.compose = Some(outgoing);
            }
            return Err(e.into());
        }
        incoming.set_brush_radius(outgoing.brush_radius());
        incoming.set_mouse_position(self.mouse);
        info!(
            "Renderer changed from '{}' to '{}'",
            outgoing.name(),
            incoming.name()
        );
        self.current = index;
        drop(outgoing);
        if composing {
            self.compose = Some(incoming);
        }
        Ok(())
    }

    /// Names of every registered renderer, in index order
    pub fn renderer_names(&self) -> Vec<String> {
        self.renderers
            .iter()
            .enumerate()
            .map(|(i, gate)| match (&self.compose, i == self.current) {
                (Some(guard), true) => guard.name().to_string(),
                _ => gate.name(),
            })
            .collect()
    }

    pub fn current_renderer_index(&self) -> usize {
        self.current
    }

    /// Save the displayed texture as PNG or BMP, chosen by extension.
    /// Other extensions are reported and nothing is written.
    pub fn grab_frame(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let format = match extension.as_deref() {
            Some("png") => ImageFormat::Png,
            Some("bmp") => ImageFormat::Bmp,
            _ => {
                warn!(
                    "Cannot save frame to {}: only png and bmp are supported",
                    path.display()
                );
                return Ok(());
            }
        };

        let frame = self.with_renderer(|r| r.grab_frame())?;
        let image = image::RgbaImage::from_raw(frame.width, frame.height, frame.rgba)
            .ok_or_else(|| ViewerError::Image("frame size does not match its pixels".into()))?;
        image
            .save_with_format(path, format)
            .map_err(|e| ViewerError::Image(e.to_string()))?;
        info!("Frame saved to {}", path.display());
        Ok(())
    }

    // ========== Camera ==========

    /// Frame every visible object of the main queue
    pub fn fit_camera_to_scene(&mut self) {
        let bbox = self.scene.bounding_box(&[RenderLayer::Fancy]);
        if bbox.is_valid() {
            self.camera.fit_scene(&bbox);
        } else {
            debug!("Nothing to fit the camera to");
        }
    }

    pub fn reset_camera(&mut self) {
        self.camera.reset();
    }

    pub fn save_camera(&self, path: impl AsRef<Path>) -> Result<()> {
        self.camera.save(path)
    }

    pub fn load_camera(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.camera.load(path)
    }

    // ========== Scene ==========

    /// Load a mesh file into the main queue and frame the scene
    pub fn handle_file_loading(&mut self, path: impl AsRef<Path>) -> Result<RenderObjectId> {
        let path = path.as_ref();
        let mut mesh = prism_core::load_mesh(path)?;
        mesh.ensure_normals();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("mesh")
            .to_string();

        let id = self
            .scene
            .objects
            .add(RenderObject::new(name, Arc::new(mesh)));
        info!("Added {} as object {}", path.display(), id);
        self.fit_camera_to_scene();
        Ok(id)
    }

    /// Cast a camera ray through a viewport pixel against every visible object.
    /// Hits are sorted by distance and kept until the next raycast.
    pub fn raycast(&mut self, position: Vec2) -> &[RaycastHit] {
        let ray = self.camera.ray(position);
        let mut hits: Vec<RaycastHit> = self
            .scene
            .objects
            .iter()
            .filter(|(id, object)| object.visible && !self.gizmos.is_gizmo_object(*id))
            .filter_map(|(id, object)| {
                let local = ray.transform(&object.transform.inverse());
                let cast = cast_ray(&object.mesh, &local);
                let triangle = cast.hit_triangle?;
                let point = object.transform.transform_point3(local.at(cast.t));
                Some(RaycastHit {
                    object: id,
                    triangle,
                    vertex: cast.nearest_vertex,
                    point,
                    distance: ray.origin.distance(point),
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        info!("Raycast at {:?} hit {} object(s)", position, hits.len());
        self.last_raycast = hits;
        &self.last_raycast
    }

    /// Hits of the last raycast
    pub fn last_raycast(&self) -> &[RaycastHit] {
        &self.last_raycast
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use prism_core::primitive::generate_box_mesh;
    use prism_renderer::{ForwardStrategy, RendererConfig, SoftwareDevice};

    const SIZE: u32 = 64;

    fn renderer(name: &str) -> Renderer<SoftwareDevice> {
        Renderer::new(
            name,
            SoftwareDevice::new(SIZE, SIZE),
            Box::new(ForwardStrategy::new()),
            RendererConfig::default(),
        )
        .unwrap()
    }

    /// Unit cube at the origin, seen from the default camera
    fn viewer() -> (Viewer<SoftwareDevice>, RenderObjectId) {
        let mut scene = Scene::new();
        let cube = scene.objects.add(RenderObject::new(
            "cube",
            Arc::new(generate_box_mesh([1.0, 1.0, 1.0])),
        ));
        (Viewer::new(renderer("Main"), scene), cube)
    }

    fn click(viewer: &mut Viewer<SoftwareDevice>, x: f32, y: f32, button: MouseButton) {
        let position = Vec2::new(x, y);
        viewer.handle_event(ViewerEvent::MousePress {
            position,
            button,
            modifiers: Modifiers::NONE,
        });
        viewer.handle_event(ViewerEvent::MouseRelease {
            position,
            button,
            modifiers: Modifiers::NONE,
        });
    }

    fn key(viewer: &mut Viewer<SoftwareDevice>, c: char, pressed: bool) {
        let key = Key::char(c);
        let modifiers = Modifiers::NONE;
        viewer.handle_event(if pressed {
            ViewerEvent::KeyPress { key, modifiers }
        } else {
            ViewerEvent::KeyRelease { key, modifiers }
        });
    }

    #[test]
    fn test_click_selects_and_attaches_gizmo() {
        let (mut viewer, cube) = viewer();
        click(&mut viewer, 32.0, 32.0, MouseButton::Right);
        viewer.start_rendering(0.016).unwrap();

        assert_eq!(viewer.picking_manager().selected_object(), Some(cube));
        assert_eq!(viewer.gizmo_manager().target(), Some(cube));

        click(&mut viewer, 2.0, 2.0, MouseButton::Right);
        viewer.start_rendering(0.016).unwrap();
        assert_eq!(viewer.picking_manager().selected_object(), None);
        assert_eq!(viewer.gizmo_manager().target(), None);
    }

    #[test]
    fn test_feature_keys_set_query_mode() {
        let (mut viewer, cube) = viewer();
        key(&mut viewer, 'v', true);
        click(&mut viewer, 32.0, 32.0, MouseButton::Right);
        viewer.start_rendering(0.016).unwrap();

        let queries = viewer.renderer().with(|r| r.picking_queries().to_vec());
        assert_eq!(queries[0].mode, PickingMode::Vertex);
        let selection = viewer.picking_manager().selection().unwrap();
        assert_eq!(selection.object(), Some(cube));
        assert_eq!(selection.vertex_idx.len(), 1);

        key(&mut viewer, 'c', true);
        click(&mut viewer, 32.0, 32.0, MouseButton::Right);
        assert_eq!(viewer.process_picking(), 1);
        viewer.start_rendering(0.016).unwrap();
        let queries = viewer.renderer().with(|r| r.picking_queries().to_vec());
        assert_eq!(queries[0].mode, PickingMode::CVertex);

        key(&mut viewer, 'v', false);
        assert_eq!(viewer.picking_manager().query_mode(), PickingMode::Ro);
    }

    #[test]
    fn test_left_click_off_handles_keeps_camera_drag() {
        let (mut viewer, _) = viewer();
        click(&mut viewer, 32.0, 32.0, MouseButton::Right);
        viewer.start_rendering(0.016).unwrap();

        viewer.handle_event(ViewerEvent::MousePress {
            position: Vec2::new(4.0, 4.0),
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
        });
        viewer.start_rendering(0.016).unwrap();
        assert!(!viewer.gizmo_manager().is_dragging());
        assert!(viewer.camera().is_dragging());

        let before = viewer.camera().camera().position;
        viewer.handle_event(ViewerEvent::MouseMove {
            position: Vec2::new(20.0, 4.0),
            modifiers: Modifiers::NONE,
        });
        assert_ne!(viewer.camera().camera().position, before);
    }

    #[test]
    fn test_custom_key_mapping() {
        let (viewer, _) = viewer();
        let mut keys = KeyMapping::default();
        keys.toggle_wireframe = Key::char('q');
        let mut viewer = viewer.with_key_mapping(keys);
        assert_eq!(viewer.key_mapping().toggle_wireframe, Key::Char('Q'));

        key(&mut viewer, 'W', true);
        assert!(!viewer.renderer().with(|r| r.config().debug.wireframe));
        key(&mut viewer, 'Q', true);
        assert!(viewer.renderer().with(|r| r.config().debug.wireframe));
    }

    #[test]
    fn test_shift_wheel_resizes_brush() {
        let (mut viewer, _) = viewer();
        viewer.handle_event(ViewerEvent::Wheel {
            delta: 1.0,
            modifiers: Modifiers::SHIFT,
        });
        assert_eq!(viewer.renderer().with(|r| r.brush_radius()), 15.0);

        for _ in 0..5 {
            viewer.wheel_event(-1.0, Modifiers::SHIFT);
        }
        assert_eq!(viewer.renderer().with(|r| r.brush_radius()), 5.0);

        let distance = viewer.camera().camera().distance();
        viewer.wheel_event(1.0, Modifiers::NONE);
        assert!(viewer.camera().camera().distance() < distance);
    }

    #[test]
    fn test_raycast_with_key_held() {
        let (mut viewer, cube) = viewer();
        key(&mut viewer, 'r', true);
        click(&mut viewer, 32.0, 32.0, MouseButton::Right);

        let hits = viewer.last_raycast();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].object, cube);
        // Ray starts on the near plane, 0.1 in front of the eye
        assert_relative_eq!(hits[0].distance, 4.4, epsilon = 1e-3);
        assert_eq!(viewer.renderer().with(|r| r.pending_queries()), 0);

        key(&mut viewer, 'r', false);
        click(&mut viewer, 32.0, 32.0, MouseButton::Right);
        assert_eq!(viewer.renderer().with(|r| r.pending_queries()), 1);
    }

    #[test]
    fn test_compose_window_holds_lock() {
        let (mut viewer, _) = viewer();
        viewer.on_about_to_compose();
        assert!(viewer.renderer().is_locked());

        // Renderer calls from the viewer go through the held guard
        viewer.start_rendering(0.016).unwrap();
        assert_eq!(viewer.available_textures(), vec!["Fancy", "Final"]);

        viewer.on_frame_swapped();
        assert!(!viewer.renderer().is_locked());
    }

    #[test]
    fn test_resize_inside_compose_window_keeps_lock() {
        let (mut viewer, _) = viewer();
        viewer.on_about_to_compose();
        viewer.handle_event(ViewerEvent::Resize {
            width: 40,
            height: 40,
        });
        assert!(viewer.renderer().is_locked());
        assert_eq!(viewer.size(), (40, 40));
        viewer.start_rendering(0.016).unwrap();

        viewer.on_frame_swapped();
        assert!(!viewer.renderer().is_locked());
        assert_eq!(viewer.renderer().with(|r| r.size()), (40, 40));
    }

    #[test]
    fn test_resize_through_empty_viewport() {
        let (mut viewer, _) = viewer();
        viewer.handle_event(ViewerEvent::Resize {
            width: 0,
            height: 0,
        });
        assert!(!viewer.renderer().is_locked());
        assert!(viewer.renderer().with(|r| r.is_viewport_empty()));

        click(&mut viewer, 0.0, 0.0, MouseButton::Right);
        viewer.start_rendering(0.016).unwrap();
        let results = viewer.renderer().with(|r| r.picking_results().to_vec());
        assert_eq!(results.len(), 1);
        assert!(!results[0].is_hit());

        viewer.handle_event(ViewerEvent::Resize {
            width: 32,
            height: 24,
        });
        assert_eq!(viewer.renderer().with(|r| r.size()), (32, 24));
        assert_relative_eq!(viewer.camera().camera().aspect, 32.0 / 24.0, epsilon = 1e-6);
    }

    #[test]
    fn test_change_renderer() {
        let (mut viewer, _) = viewer();
        viewer.on_resized(48, 48).unwrap();
        let index = viewer.add_renderer(renderer("Second")).unwrap();
        assert_eq!(index, 1);
        assert_eq!(viewer.renderer_names(), vec!["Main", "Second"]);

        viewer.wheel_event(1.0, Modifiers::SHIFT);
        viewer.change_renderer(1).unwrap();
        assert_eq!(viewer.current_renderer_index(), 1);
        assert_eq!(viewer.renderer().name(), "Second");
        assert_eq!(viewer.renderer().with(|r| r.size()), (48, 48));
        assert_eq!(viewer.renderer().with(|r| r.brush_radius()), 15.0);
        assert!(!viewer.renderers[0].is_locked());
        assert!(!viewer.renderers[1].is_locked());

        assert!(matches!(
            viewer.change_renderer(7),
            Err(ViewerError::UnknownRenderer(_))
        ));
        viewer.start_rendering(0.016).unwrap();
    }

    #[test]
    fn test_change_renderer_inside_compose_window() {
        let (mut viewer, _) = viewer();
        viewer.add_renderer(renderer("Second")).unwrap();
        viewer.on_about_to_compose();

        viewer.change_renderer(1).unwrap();
        assert_eq!(viewer.current_renderer_index(), 1);
        assert!(viewer.renderers[1].is_locked());
        assert!(!viewer.renderers[0].is_locked());
        assert_eq!(viewer.renderer_names(), vec!["Main", "Second"]);
        viewer.start_rendering(0.016).unwrap();

        viewer.on_frame_swapped();
        assert!(!viewer.renderers[1].is_locked());
    }

    #[test]
    fn test_display_texture_and_reload() {
        let (mut viewer, _) = viewer();
        viewer.display_texture("Fancy").unwrap();
        assert!(viewer.display_texture("Nope").is_err());
        viewer.reload_shaders().unwrap();
    }

    #[test]
    fn test_grab_frame() {
        let (mut viewer, _) = viewer();
        viewer.start_rendering(0.016).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let png = dir.path().join("frame.png");
        viewer.grab_frame(&png).unwrap();
        let image = image::open(&png).unwrap();
        assert_eq!((image.width(), image.height()), (SIZE, SIZE));

        let bmp = dir.path().join("frame.BMP");
        viewer.grab_frame(&bmp).unwrap();
        assert!(bmp.exists());

        let jpg = dir.path().join("frame.jpg");
        viewer.grab_frame(&jpg).unwrap();
        assert!(!jpg.exists());
    }

    #[test]
    fn test_file_loading_fits_camera() {
        let (mut viewer, _) = viewer();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.obj");
        std::fs::write(
            &path,
            "v 10 0 0\nv 12 0 0\nv 10 2 0\nf 1 2 3\n",
        )
        .unwrap();

        let id = viewer.handle_file_loading(&path).unwrap();
        let object = viewer.scene().objects.get(id).unwrap();
        assert_eq!(object.name, "tri");
        assert_eq!(object.layer, RenderLayer::Fancy);
        assert!(viewer.camera().camera().target.x > 5.0);

        assert!(viewer.handle_file_loading(dir.path().join("x.dae")).is_err());
    }

    #[test]
    fn test_camera_save_load_and_reset() {
        let (mut viewer, _) = viewer();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("camera.ron");

        viewer.camera_mut().orbit(0.4, 0.2);
        let pose = viewer.camera().camera().position;
        viewer.save_camera(&path).unwrap();

        viewer.reset_camera();
        assert_relative_eq!(viewer.camera().camera().position.z, 5.0, epsilon = 1e-5);

        viewer.load_camera(&path).unwrap();
        assert!(viewer.camera().camera().position.distance(pose) < 1e-3);
    }

    #[test]
    fn test_headlight_follows_camera() {
        let (mut viewer, _) = viewer();
        viewer.camera_mut().orbit(0.8, 0.0);
        viewer.start_rendering(0.016).unwrap();
        assert_eq!(
            viewer.scene().lights[0].direction,
            viewer.camera().camera().forward()
        );
    }
}

//! Frame orchestrator
//!
//! [`Renderer`] drives one [`RenderStrategy`] on one [`RenderDevice`] through
//! the stages of [`FrameStage`], answers picking queries against the poses of
//! the frame being drawn, and composites the displayed texture to whatever
//! target the host bound.
//!
//! The strategy draws into its own working textures. Only a frame that gets
//! through every stage is copied into the presented texture, which is what
//! [`Renderer::grab_frame`] reads, so a failed frame leaves the last good one
//! in place.
//!
//! All access from other threads goes through [`RenderGate`].

mod gate;

pub use gate::{ComposeGuard, RenderGate};

use std::time::Instant;

use glam::Vec2;

use crate::config::RendererConfig;
use crate::device::{FrameImage, PostEffect, RenderDevice, TextureId, ViewParams};
use crate::error::RenderError;
use crate::frame::{FrameStage, RenderData};
use crate::picking::pass::run_picking;
use crate::picking::{PickingQuery, PickingResult};
use crate::queue::{PickingQueues, RenderQueues};
use crate::scene::Scene;
use crate::strategy::{FrameContext, RenderStrategy};
use crate::textures::TextureRegistry;
use crate::timer::TimerData;

/// Frame orchestrator over a device and a rendering strategy.
pub struct Renderer<D: RenderDevice> {
    name: String,
    device: D,
    strategy: Box<dyn RenderStrategy>,
    config: RendererConfig,
    textures: TextureRegistry,
    displayed: TextureId,
    presented: TextureId,
    queues: RenderQueues,

    // Picking
    pending_queries: Vec<PickingQuery>,
    queries: Vec<PickingQuery>,
    results: Vec<PickingResult>,
    mouse_position: Vec2,

    timer: TimerData,
    viewport_empty: bool,
    frames: u64,
}

impl<D: RenderDevice> Renderer<D> {
    /// Create a renderer and let `strategy` allocate its textures on `device`.
    pub fn new(
        name: impl Into<String>,
        mut device: D,
        mut strategy: Box<dyn RenderStrategy>,
        config: RendererConfig,
    ) -> Result<Self, RenderError> {
        let name = name.into();
        let mut textures = TextureRegistry::new();
        strategy.initialize(&mut device, &mut textures)?;

        let displayed = strategy
            .output()
            .or_else(|| textures.get(&textures.names().into_iter().next()?))
            .ok_or_else(|| RenderError::Strategy {
                strategy: strategy.name().to_string(),
                message: "no output texture after initialize".into(),
            })?;
        let presented = device.create_texture("Presented")?;

        let (width, height) = device.size();
        tracing::info!(
            "Renderer '{}' created: {} strategy on {} ({}x{})",
            name,
            strategy.name(),
            device.backend_name(),
            width,
            height
        );

        Ok(Self {
            name,
            device,
            strategy,
            config,
            textures,
            displayed,
            presented,
            queues: RenderQueues::default(),
            pending_queries: Vec::new(),
            queries: Vec::new(),
            results: Vec::new(),
            mouse_position: Vec2::ZERO,
            timer: TimerData::default(),
            viewport_empty: width == 0 || height == 0,
            frames: 0,
        })
    }

    /// Render one frame of `scene` and answer the queries submitted before it.
    ///
    /// On failure the stage error is returned, later stages are skipped, the
    /// presented frame is left untouched and every drained query still gets a
    /// result.
    pub fn render(&mut self, scene: &mut Scene, data: &RenderData) -> Result<(), RenderError> {
        self.timer = TimerData::starting_at(Instant::now());
        self.queries = std::mem::take(&mut self.pending_queries);
        self.results.clear();

        let outcome = self.run_stages(scene, data);
        if let Err(e) = &outcome {
            tracing::warn!("Renderer '{}' dropped a frame: {}", self.name, e);
        }

        if outcome.is_err() || self.viewport_empty {
            let answered = self.results.len().min(self.queries.len());
            self.results.truncate(answered);
            self.results.extend(
                self.queries[answered..]
                    .iter()
                    .map(|q| PickingResult::none(q.mode)),
            );
        }

        self.timer.render_end = Instant::now();
        self.frames += 1;
        outcome
    }

    fn run_stages(&mut self, scene: &mut Scene, data: &RenderData) -> Result<(), RenderError> {
        let target = self.stage(FrameStage::SaveExternalTarget, |r| {
            Ok(r.device.bound_target())
        })?;

        self.stage(FrameStage::UpdateObjects, |r| {
            r.strategy.update_step(data);
            scene.objects.update(data);
            Ok(())
        })?;
        let now = Instant::now();
        self.timer.update_end = now;
        self.timer.feed_render_queues_end = now;
        self.timer.main_render_end = now;
        self.timer.post_process_end = now;

        if self.viewport_empty {
            tracing::trace!("Viewport is empty, skipping frame");
            return Ok(());
        }

        self.stage(FrameStage::FeedQueues, |r| {
            r.queues = RenderQueues::feed(&scene.objects);
            r.device.begin_frame(&ViewParams::new(data, &scene.lights))
        })?;
        self.timer.feed_render_queues_end = Instant::now();

        if !self.queries.is_empty() {
            self.stage(FrameStage::Picking, |r| {
                let picking = PickingQueues::split(&r.queues, &scene.objects);
                let results = run_picking(
                    &mut r.device,
                    &picking,
                    &scene.objects,
                    &r.queries,
                    r.config.picking.brush_radius,
                    r.config.debug.draw_debug,
                )?;
                debug_assert_eq!(results.len(), r.queries.len());
                if results.len() != r.queries.len() {
                    tracing::error!(
                        "Picking pass answered {} of {} queries",
                        results.len(),
                        r.queries.len()
                    );
                }
                r.results = results;
                Ok(())
            })?;
        }

        self.stage(FrameStage::MainRender, |r| {
            r.strategy.render(&mut FrameContext {
                device: &mut r.device,
                queues: &r.queues,
                objects: &scene.objects,
                textures: &r.textures,
                config: &r.config,
            })
        })?;
        self.timer.main_render_end = Instant::now();

        self.stage(FrameStage::PostProcess, |r| {
            let mut ctx = FrameContext {
                device: &mut r.device,
                queues: &r.queues,
                objects: &scene.objects,
                textures: &r.textures,
                config: &r.config,
            };
            r.strategy.post_process(&mut ctx)?;
            if ctx.config.debug.draw_debug {
                r.strategy.debug(&mut ctx)?;
            }
            r.strategy.ui(&mut ctx)
        })?;
        self.timer.post_process_end = Instant::now();

        self.stage(FrameStage::Composite, |r| {
            r.device.composite(r.displayed, target)?;
            r.device.blit(r.displayed, r.presented, PostEffect::Copy)?;
            r.device.end_frame()
        })
    }

    fn stage<T>(
        &mut self,
        stage: FrameStage,
        f: impl FnOnce(&mut Self) -> Result<T, RenderError>,
    ) -> Result<T, RenderError> {
        let _span = tracing::trace_span!("frame_stage", stage = %stage).entered();
        f(self).map_err(|e| e.in_stage(stage))
    }

    /// Resize every screen-sized texture. A zero dimension marks the viewport
    /// empty until a non-zero size arrives.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        self.viewport_empty = width == 0 || height == 0;
        if self.viewport_empty {
            tracing::debug!("Renderer '{}' viewport is empty", self.name);
            return Ok(());
        }
        if self.device.size() == (width, height) {
            return Ok(());
        }
        self.device.resize(width, height)?;
        self.strategy.resize(width, height)?;
        tracing::debug!("Renderer '{}' resized to {}x{}", self.name, width, height);
        Ok(())
    }

    /// Queue a query for the next frame.
    pub fn add_picking_request(&mut self, query: PickingQuery) {
        self.pending_queries.push(query);
    }

    /// Results of the last frame, one per entry of [`Self::picking_queries`].
    pub fn picking_results(&self) -> &[PickingResult] {
        &self.results
    }

    /// Queries answered by the last frame.
    pub fn picking_queries(&self) -> &[PickingQuery] {
        &self.queries
    }

    /// Queries waiting for the next frame.
    pub fn pending_queries(&self) -> usize {
        self.pending_queries.len()
    }

    /// Composite the texture registered under `name` from now on.
    pub fn display_texture(&mut self, name: &str) -> Result<(), RenderError> {
        let id = self
            .textures
            .get(name)
            .ok_or_else(|| RenderError::TextureNotFound(name.to_string()))?;
        self.displayed = id;
        tracing::info!("Renderer '{}' now displays '{}'", self.name, name);
        Ok(())
    }

    /// Name of the composited texture.
    pub fn displayed_texture(&self) -> Option<&str> {
        self.textures.name_of(self.displayed)
    }

    /// Names of every registered texture.
    pub fn available_textures(&self) -> Vec<String> {
        self.textures.names()
    }

    /// Reload the device shaders; the previous ones stay on failure.
    pub fn reload_shaders(&mut self) -> Result<(), RenderError> {
        self.device.reload_shaders()?;
        tracing::info!("Renderer '{}' reloaded shaders", self.name);
        Ok(())
    }

    /// Read back the last frame that rendered completely.
    pub fn grab_frame(&mut self) -> Result<FrameImage, RenderError> {
        self.device.read_texture(self.presented)
    }

    /// Checkpoints of the last frame.
    pub fn timer_data(&self) -> TimerData {
        self.timer
    }

    /// Flip wireframe drawing of the main pass.
    pub fn toggle_wireframe(&mut self) {
        self.set_wireframe(!self.config.debug.wireframe);
    }

    /// Set wireframe drawing of the main pass.
    pub fn set_wireframe(&mut self, enabled: bool) {
        self.config.debug.wireframe = enabled;
    }

    /// Tonemap the main pass, or copy it unchanged.
    pub fn enable_post_process(&mut self, enabled: bool) {
        self.config.post_process.enabled = enabled;
    }

    /// Flip drawing and picking of the debug queue.
    pub fn toggle_draw_debug(&mut self) {
        self.enable_debug_draw(!self.config.debug.draw_debug);
    }

    /// Set drawing and picking of the debug queue.
    pub fn enable_debug_draw(&mut self, enabled: bool) {
        self.config.debug.draw_debug = enabled;
    }

    /// Record the cursor, given in pixels from the top-left corner.
    pub fn set_mouse_position(&mut self, position: Vec2) {
        let (_, height) = self.device.size();
        self.mouse_position = Vec2::new(position.x, height as f32 - position.y);
    }

    /// Cursor in picking coordinates (bottom-left origin).
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Brush radius in pixels for circle picking. Non-finite values are
    /// ignored.
    pub fn set_brush_radius(&mut self, radius: f32) {
        if !radius.is_finite() {
            tracing::warn!("Renderer '{}' ignored brush radius {}", self.name, radius);
            return;
        }
        self.config.picking.brush_radius = radius.max(0.0);
    }

    /// Current brush radius.
    pub fn brush_radius(&self) -> f32 {
        self.config.picking.brush_radius
    }

    /// Renderer name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Strategy name.
    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    /// Current settings.
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Replace every setting at once.
    pub fn set_config(&mut self, config: RendererConfig) {
        self.config = config;
    }

    /// Device, e.g. for the host to bind its output target.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Mutable device access.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Viewport size in pixels.
    pub fn size(&self) -> (u32, u32) {
        self.device.size()
    }

    /// True after a resize to a zero dimension.
    pub fn is_viewport_empty(&self) -> bool {
        self.viewport_empty
    }

    /// Frames rendered so far, failed ones included.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use glam::{Mat4, Vec3};
    use prism_core::primitive::generate_box_mesh;
    use prism_core::{MouseButton, TriangleMesh};

    use super::*;
    use crate::camera::Camera;
    use crate::device::SoftwareDevice;
    use crate::picking::PickingMode;
    use crate::scene::{PickingGranularity, RenderLayer, RenderObject, RenderObjectId};
    use crate::strategy::ForwardStrategy;

    fn renderer(width: u32, height: u32) -> Renderer<SoftwareDevice> {
        Renderer::new(
            "main",
            SoftwareDevice::new(width, height),
            Box::new(ForwardStrategy::new()),
            RendererConfig::default(),
        )
        .unwrap()
    }

    fn camera_data(width: u32, height: u32) -> RenderData {
        Camera::new(width as f32 / height.max(1) as f32).render_data(0.016)
    }

    fn two_boxes() -> (Scene, RenderObjectId, RenderObjectId) {
        let mut scene = Scene::new();
        let a = scene
            .objects
            .add(RenderObject::new("a", Arc::new(generate_box_mesh([1.0; 3]))));
        let b = scene.objects.add(
            RenderObject::new("b", Arc::new(generate_box_mesh([0.5; 3])))
                .with_transform(Mat4::from_translation(Vec3::new(1.5, 0.0, 0.0))),
        );
        (scene, a, b)
    }

    fn ro_query(x: f32, y: f32) -> PickingQuery {
        PickingQuery::new(Vec2::new(x, y), MouseButton::Left, PickingMode::Ro)
    }

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

    fn ortho_data() -> RenderData {
        RenderData::new(
            Mat4::IDENTITY,
            Mat4::orthographic_rh(-1.0, 1.0, -1.0, 1.0, -1.0, 1.0),
            0.0,
        )
    }

    #[test]
    fn test_ro_picking_scenario() {
        let mut renderer = renderer(64, 64);
        let (mut scene, a, b) = two_boxes();
        renderer.add_picking_request(ro_query(32.0, 32.0));
        renderer.add_picking_request(ro_query(56.0, 32.0));
        renderer.add_picking_request(ro_query(2.0, 2.0));
        renderer.render(&mut scene, &camera_data(64, 64)).unwrap();

        let results = renderer.picking_results();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].object(), Some(a));
        assert_eq!(results[0].element_idx, vec![-1]);
        assert_eq!(results[0].weights, vec![1.0]);
        assert_eq!(results[1].object(), Some(b));
        assert_eq!(results[2].ro_idx, -1);
        assert!(results[2].is_empty());
        assert_eq!(renderer.pending_queries(), 0);
    }

    #[test]
    fn test_results_match_queries_every_frame() {
        let mut renderer = renderer(32, 32);
        let (mut scene, _, _) = two_boxes();
        let data = camera_data(32, 32);
        for count in [0, 1, 4, 2] {
            for i in 0..count {
                renderer.add_picking_request(ro_query(i as f32 * 7.0, 16.0));
            }
            renderer.render(&mut scene, &data).unwrap();
            assert_eq!(renderer.picking_queries().len(), count);
            assert_eq!(renderer.picking_results().len(), count);
        }
    }

    #[test]
    fn test_two_queries_same_pixel() {
        let mut renderer = renderer(64, 64);
        let (mut scene, a, _) = two_boxes();
        scene.objects.get_mut(a).unwrap().picking = Some(PickingGranularity::Vertex);
        renderer.add_picking_request(ro_query(30.0, 34.0));
        renderer.add_picking_request(PickingQuery::new(
            Vec2::new(30.0, 34.0),
            MouseButton::Left,
            PickingMode::Vertex,
        ));
        renderer.render(&mut scene, &camera_data(64, 64)).unwrap();

        let results = renderer.picking_results();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].mode, PickingMode::Ro);
        assert_eq!(results[1].mode, PickingMode::Vertex);
        assert_eq!(results[0].object(), Some(a));
        assert_eq!(results[1].object(), Some(a));
        assert_eq!(results[0].element_idx, vec![-1]);
        assert_eq!(results[1].vertex_idx.len(), 1);
        assert!(results[1].vertex_idx[0] >= 0);
        assert_eq!(results[1].weights, vec![1.0]);
    }

    #[test]
    fn test_resize_to_empty_and_back() {
        let mut renderer = renderer(800, 600);
        let (mut scene, a, _) = two_boxes();
        let data = camera_data(800, 600);

        renderer.resize(0, 0).unwrap();
        assert!(renderer.is_viewport_empty());
        renderer.add_picking_request(ro_query(400.0, 300.0));
        renderer.render(&mut scene, &data).unwrap();
        assert_eq!(renderer.picking_results().len(), 1);
        assert!(!renderer.picking_results()[0].is_hit());

        renderer.resize(800, 600).unwrap();
        assert!(!renderer.is_viewport_empty());
        renderer.add_picking_request(ro_query(400.0, 300.0));
        renderer.render(&mut scene, &data).unwrap();
        assert_eq!(renderer.picking_results()[0].object(), Some(a));
        assert_eq!(renderer.grab_frame().unwrap().width, 800);
    }

    #[test]
    fn test_feature_picking_on_quad() {
        let mut renderer = renderer(100, 100);
        let mut scene = Scene::new();
        let id = scene
            .objects
            .add(RenderObject::new("quad", quad()).with_picking(PickingGranularity::Edge));
        renderer.add_picking_request(PickingQuery::new(
            Vec2::new(90.0, 50.0),
            MouseButton::Left,
            PickingMode::Edge,
        ));
        renderer.add_picking_request(PickingQuery::new(
            Vec2::new(10.0, 90.0),
            MouseButton::Left,
            PickingMode::Edge,
        ));
        renderer.render(&mut scene, &ortho_data()).unwrap();

        let results = renderer.picking_results();
        assert_eq!(results[0].object(), Some(id));
        assert_eq!(results[0].vertex_idx, vec![2]);
        assert_eq!(results[0].element_idx, vec![0]);
        assert_eq!(results[0].edge_idx, vec![0]);
        assert_eq!(results[1].vertex_idx, vec![3]);
        assert_eq!(results[1].element_idx, vec![1]);
    }

    #[test]
    fn test_circle_picking_weights() {
        let mut renderer = renderer(100, 100);
        renderer.set_brush_radius(20.0);
        let mut scene = Scene::new();
        scene
            .objects
            .add(RenderObject::new("quad", quad()).with_picking(PickingGranularity::Triangle));
        renderer.add_picking_request(PickingQuery::new(
            Vec2::new(50.0, 50.0),
            MouseButton::Left,
            PickingMode::CTriangle,
        ));
        renderer.render(&mut scene, &ortho_data()).unwrap();

        let result = &renderer.picking_results()[0];
        assert!(result.is_hit());
        assert!(result.len() > 1);
        assert!(result.weights.iter().all(|w| *w > 0.0 && *w <= 1.0));
        assert!(result.weights.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_update_hook_moves_object_before_picking() {
        let mut renderer = renderer(64, 64);
        let mut scene = Scene::new();
        let id = scene.objects.add(
            RenderObject::new("mover", Arc::new(generate_box_mesh([0.5; 3]))).with_update(
                |transform: &mut Mat4, _: &RenderData| {
                    *transform = Mat4::from_translation(Vec3::new(1.5, 0.0, 0.0));
                },
            ),
        );
        renderer.add_picking_request(ro_query(32.0, 32.0));
        renderer.add_picking_request(ro_query(56.0, 32.0));
        renderer.render(&mut scene, &camera_data(64, 64)).unwrap();
        assert!(!renderer.picking_results()[0].is_hit());
        assert_eq!(renderer.picking_results()[1].object(), Some(id));
    }

    #[test]
    fn test_hidden_and_debug_objects() {
        let mut renderer = renderer(64, 64);
        let (mut scene, a, b) = two_boxes();
        scene.objects.get_mut(a).unwrap().visible = false;
        scene.objects.get_mut(b).unwrap().layer = RenderLayer::Debug;
        let data = camera_data(64, 64);

        renderer.add_picking_request(ro_query(32.0, 32.0));
        renderer.add_picking_request(ro_query(56.0, 32.0));
        renderer.render(&mut scene, &data).unwrap();
        assert!(!renderer.picking_results()[0].is_hit());
        assert_eq!(renderer.picking_results()[1].object(), Some(b));

        renderer.toggle_draw_debug();
        renderer.add_picking_request(ro_query(56.0, 32.0));
        renderer.render(&mut scene, &data).unwrap();
        assert!(!renderer.picking_results()[0].is_hit());
    }

    /// Forward rendering that errors in `stage` while `armed` is set.
    struct FailingStrategy {
        inner: ForwardStrategy,
        stage: FrameStage,
        armed: Arc<AtomicBool>,
    }

    impl FailingStrategy {
        fn boxed(stage: FrameStage, armed: &Arc<AtomicBool>) -> Box<Self> {
            Box::new(Self {
                inner: ForwardStrategy::new(),
                stage,
                armed: armed.clone(),
            })
        }

        fn check(&self, stage: FrameStage) -> Result<(), RenderError> {
            if self.stage == stage && self.armed.load(Ordering::SeqCst) {
                return Err(RenderError::Strategy {
                    strategy: "failing".into(),
                    message: stage.name().into(),
                });
            }
            Ok(())
        }
    }

    impl RenderStrategy for FailingStrategy {
        fn name(&self) -> &str {
            "failing"
        }

        fn initialize(
            &mut self,
            device: &mut dyn RenderDevice,
            textures: &mut TextureRegistry,
        ) -> Result<(), RenderError> {
            self.inner.initialize(device, textures)
        }

        fn render(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), RenderError> {
            self.check(FrameStage::MainRender)?;
            self.inner.render(ctx)
        }

        fn post_process(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), RenderError> {
            self.inner.post_process(ctx)
        }

        fn debug(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), RenderError> {
            self.inner.debug(ctx)
        }

        fn ui(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), RenderError> {
            self.check(FrameStage::PostProcess)?;
            self.inner.ui(ctx)
        }

        fn output(&self) -> Option<TextureId> {
            self.inner.output()
        }
    }

    fn failing_renderer(stage: FrameStage, armed: &Arc<AtomicBool>) -> Renderer<SoftwareDevice> {
        Renderer::new(
            "broken",
            SoftwareDevice::new(64, 64),
            FailingStrategy::boxed(stage, armed),
            RendererConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_failed_stage_still_answers_queries() {
        let armed = Arc::new(AtomicBool::new(true));
        let mut renderer = failing_renderer(FrameStage::MainRender, &armed);
        let (mut scene, a, _) = two_boxes();
        renderer.add_picking_request(ro_query(32.0, 32.0));
        renderer.add_picking_request(PickingQuery::new(
            Vec2::new(2.0, 2.0),
            MouseButton::Left,
            PickingMode::CVertex,
        ));

        let err = renderer
            .render(&mut scene, &camera_data(64, 64))
            .unwrap_err();
        assert_eq!(err.stage(), Some(FrameStage::MainRender));
        let results = renderer.picking_results();
        assert_eq!(results.len(), 2);
        // picking ran before the failing stage
        assert_eq!(results[0].object(), Some(a));
        assert_eq!(results[1].mode, PickingMode::CVertex);
        assert!(!results[1].is_hit());
        assert_eq!(renderer.device().frame_count(), 0);
    }

    #[test]
    fn test_failed_frame_keeps_presented_frame() {
        let armed = Arc::new(AtomicBool::new(false));
        let mut renderer = failing_renderer(FrameStage::PostProcess, &armed);
        renderer.device_mut().bind_external_target();
        let (mut scene, a, _) = two_boxes();
        let data = camera_data(64, 64);

        renderer.render(&mut scene, &data).unwrap();
        let before = renderer.grab_frame().unwrap();
        let external_before = renderer.device().external_image().unwrap();

        scene.objects.get_mut(a).unwrap().transform =
            Mat4::from_translation(Vec3::new(-1.5, 1.0, 0.0));
        armed.store(true, Ordering::SeqCst);
        let err = renderer.render(&mut scene, &data).unwrap_err();
        assert_eq!(err.stage(), Some(FrameStage::PostProcess));

        // the working texture holds the half-built frame, the presented one does not
        let working = renderer.textures.get("Final").unwrap();
        assert_ne!(renderer.device_mut().read_texture(working).unwrap(), before);
        assert_eq!(renderer.grab_frame().unwrap(), before);
        assert_eq!(renderer.device().external_image().unwrap(), external_before);

        armed.store(false, Ordering::SeqCst);
        renderer.render(&mut scene, &data).unwrap();
        assert_ne!(renderer.grab_frame().unwrap(), before);
    }

    #[test]
    fn test_empty_viewport_answers_with_query_modes() {
        let mut renderer = renderer(32, 32);
        let (mut scene, _, _) = two_boxes();
        renderer.resize(0, 32).unwrap();
        for mode in [PickingMode::Ro, PickingMode::CTriangle, PickingMode::Edge] {
            renderer.add_picking_request(PickingQuery::new(Vec2::splat(16.0), MouseButton::Left, mode));
        }
        renderer.render(&mut scene, &camera_data(32, 32)).unwrap();

        let modes: Vec<PickingMode> = renderer.picking_results().iter().map(|r| r.mode).collect();
        assert_eq!(modes, [PickingMode::Ro, PickingMode::CTriangle, PickingMode::Edge]);
        assert!(renderer.picking_results().iter().all(|r| !r.is_hit()));
    }

    #[test]
    fn test_brush_larger_than_viewport() {
        let mut renderer = renderer(16, 16);
        let (mut scene, a, _) = two_boxes();
        renderer.set_brush_radius(f32::INFINITY);
        assert_eq!(renderer.brush_radius(), 10.0);
        renderer.set_brush_radius(f32::NAN);
        assert_eq!(renderer.brush_radius(), 10.0);

        renderer.set_brush_radius(4000.0);
        renderer.add_picking_request(PickingQuery::new(
            Vec2::new(8.0, 8.0),
            MouseButton::Left,
            PickingMode::CVertex,
        ));
        renderer.render(&mut scene, &camera_data(16, 16)).unwrap();
        let result = &renderer.picking_results()[0];
        assert_eq!(result.object(), Some(a));
        assert!(result.weights.iter().all(|w| *w > 0.0 && *w <= 1.0));
    }

    #[test]
    fn test_display_texture_selection() {
        let mut renderer = renderer(8, 8);
        assert_eq!(renderer.displayed_texture(), Some("Final"));
        assert_eq!(renderer.available_textures(), ["Fancy", "Final"]);

        renderer.display_texture("Fancy").unwrap();
        assert_eq!(renderer.displayed_texture(), Some("Fancy"));

        let err = renderer.display_texture("Depth").unwrap_err();
        assert!(matches!(err, RenderError::TextureNotFound(_)));
        assert_eq!(renderer.displayed_texture(), Some("Fancy"));
    }

    #[test]
    fn test_composite_and_timer() {
        let mut renderer = renderer(16, 16);
        renderer.device_mut().bind_external_target();
        let (mut scene, _, _) = two_boxes();
        renderer.render(&mut scene, &camera_data(16, 16)).unwrap();

        assert!(renderer.timer_data().is_monotonic());
        let external = renderer.device().external_image().unwrap();
        assert_eq!(external, renderer.grab_frame().unwrap());
        assert_eq!(renderer.device().frame_count(), 1);
    }

    #[test]
    fn test_toggles() {
        let mut renderer = renderer(10, 10);
        renderer.toggle_wireframe();
        assert!(renderer.config().debug.wireframe);
        renderer.enable_post_process(false);
        assert!(!renderer.config().post_process.enabled);
        renderer.set_brush_radius(-3.0);
        assert_eq!(renderer.brush_radius(), 0.0);
        renderer.set_mouse_position(Vec2::new(2.0, 3.0));
        assert_eq!(renderer.mouse_position(), Vec2::new(2.0, 7.0));
    }
}

//! Main application module
//!
//! eframe calls `update` and then paints on the same thread, so the compositor
//! window is opened around the frame that writes the viewport texture and
//! closed before egui samples it.

mod demo;
mod panel;
mod viewport;

use std::path::Path;
use std::time::Instant;

use prism_renderer::{ForwardStrategy, Renderer, RendererConfig, WgpuDevice};

use crate::error::Result;
use crate::keymap::KeyMapping;
use crate::viewer::Viewer;
use panel::{PanelAction, side_panel};
use viewport::{RenderTarget, collect_events};

pub use demo::demo_scene;

/// Renderer settings read at startup when present
const CONFIG_FILE: &str = "prism.ron";
/// Key bindings read at startup when present
const KEYS_FILE: &str = "prism-keys.ron";
const INITIAL_SIZE: (u32, u32) = (800, 600);

/// Main application
pub struct PrismApp {
    viewer: Option<Viewer<WgpuDevice>>,
    target: Option<RenderTarget>,
    last_frame: Instant,
    status: String,
}

impl PrismApp {
    /// Create a new app
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let viewer = match cc.wgpu_render_state.as_ref() {
            Some(render_state) => match create_viewer(render_state) {
                Ok(viewer) => Some(viewer),
                Err(e) => {
                    tracing::error!("Failed to create the viewer: {}", e);
                    None
                }
            },
            None => {
                tracing::warn!("No wgpu render state, the viewport is disabled");
                None
            }
        };

        Self {
            viewer,
            target: None,
            last_frame: Instant::now(),
            status: String::new(),
        }
    }

    fn show_viewport(&mut self, ui: &mut egui::Ui, render_state: &egui_wgpu::RenderState) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };

        let available = ui.available_size();
        let (width, height) = (available.x as u32, available.y as u32);
        if width == 0 || height == 0 {
            return;
        }

        let recreated = {
            let mut egui_renderer = render_state.renderer.write();
            RenderTarget::ensure(
                &mut self.target,
                &render_state.device,
                &mut egui_renderer,
                wgpu::TextureFormat::Rgba8Unorm,
                width,
                height,
            )
        };
        let Some(target) = self.target.as_ref() else {
            return;
        };
        if recreated {
            viewer.on_about_to_resize();
            if let Err(e) = viewer.on_resized(target.width, target.height) {
                tracing::warn!("Viewport resize failed: {}", e);
            }
            target.bind(viewer);
        }

        let response = ui.add(
            egui::Image::new(egui::load::SizedTexture::new(
                target.egui_texture_id,
                [available.x, available.y],
            ))
            .sense(egui::Sense::click_and_drag()),
        );

        for event in collect_events(ui.ctx(), response.rect, response.hovered()) {
            viewer.handle_event(event);
        }

        let dt = self.last_frame.elapsed().as_secs_f32();
        self.last_frame = Instant::now();
        viewer.on_about_to_compose();
        let rendered = viewer.start_rendering(dt);
        viewer.on_frame_swapped();
        if let Err(e) = rendered {
            self.status = format!("Frame failed: {}", e);
        }
        ui.ctx().request_repaint();
    }

    fn apply(&mut self, action: PanelAction) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        let result = match action {
            PanelAction::ChangeRenderer(index) => viewer.change_renderer(index).map(|()| {
                if let Some(target) = &self.target {
                    target.bind(viewer);
                }
                format!("Renderer: {}", viewer.renderer().name())
            }),
            PanelAction::OpenMesh => match rfd::FileDialog::new()
                .add_filter("Meshes", &["obj", "stl"])
                .pick_file()
            {
                Some(path) => viewer
                    .handle_file_loading(&path)
                    .map(|id| format!("Loaded {} as object {}", path.display(), id)),
                None => return,
            },
            PanelAction::CaptureFrame => match rfd::FileDialog::new()
                .add_filter("Images", &["png", "bmp"])
                .set_file_name("frame.png")
                .save_file()
            {
                Some(path) => viewer
                    .grab_frame(&path)
                    .map(|()| format!("Captured {}", path.display())),
                None => return,
            },
            PanelAction::SaveCamera => match camera_dialog().save_file() {
                Some(path) => viewer
                    .save_camera(&path)
                    .map(|()| format!("Camera saved to {}", path.display())),
                None => return,
            },
            PanelAction::LoadCamera => match camera_dialog().pick_file() {
                Some(path) => viewer
                    .load_camera(&path)
                    .map(|()| format!("Camera loaded from {}", path.display())),
                None => return,
            },
        };

        self.status = match result {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("{:?} failed: {}", action, e);
                e.to_string()
            }
        };
    }
}

impl eframe::App for PrismApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        let mut action = None;
        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| match self.viewer.as_mut() {
                Some(viewer) => action = side_panel(ui, viewer, &self.status),
                None => {
                    ui.label("Viewer unavailable (wgpu backend required)");
                }
            });
        if let Some(action) = action {
            self.apply(action);
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| match frame.wgpu_render_state() {
                Some(render_state) => self.show_viewport(ui, render_state),
                None => {
                    ui.centered_and_justified(|ui| ui.label("3D Viewport\n(wgpu not available)"));
                }
            });
    }
}

/// Viewer over the demo scene with a tonemapped and a linear renderer
fn create_viewer(render_state: &egui_wgpu::RenderState) -> Result<Viewer<WgpuDevice>> {
    let config = load_config(Path::new(CONFIG_FILE));
    let (width, height) = INITIAL_SIZE;
    let device = || {
        WgpuDevice::new(
            render_state.device.clone(),
            render_state.queue.clone(),
            width,
            height,
        )
    };

    let forward = Renderer::new(
        "Forward",
        device(),
        Box::new(ForwardStrategy::new()),
        config.clone(),
    )?;
    let mut linear_config = config;
    linear_config.post_process.enabled = false;
    let linear = Renderer::new(
        "Forward (linear)",
        device(),
        Box::new(ForwardStrategy::new()),
        linear_config,
    )?;

    let mut viewer = Viewer::new(forward, demo_scene())
        .with_key_mapping(load_key_mapping(Path::new(KEYS_FILE)));
    viewer.add_renderer(linear)?;
    viewer.fit_camera_to_scene();
    Ok(viewer)
}

fn load_config(path: &Path) -> RendererConfig {
    if !path.exists() {
        return RendererConfig::default();
    }
    match RendererConfig::load(path) {
        Ok(config) => {
            tracing::info!("Loaded renderer settings from {}", path.display());
            config
        }
        Err(e) => {
            tracing::warn!("Ignoring {}: {}", path.display(), e);
            RendererConfig::default()
        }
    }
}

fn load_key_mapping(path: &Path) -> KeyMapping {
    if !path.exists() {
        return KeyMapping::default();
    }
    match KeyMapping::load(path) {
        Ok(keys) => {
            tracing::info!("Loaded key bindings from {}", path.display());
            keys
        }
        Err(e) => {
            tracing::warn!("Ignoring {}: {}", path.display(), e);
            KeyMapping::default()
        }
    }
}

fn camera_dialog() -> rfd::FileDialog {
    rfd::FileDialog::new()
        .add_filter("Camera", &["ron"])
        .set_file_name("camera.ron")
}

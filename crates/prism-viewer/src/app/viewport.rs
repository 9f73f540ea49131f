//! Viewport texture and input translation

use glam::Vec2;
use prism_core::MouseButton;
use prism_renderer::WgpuDevice;

use crate::events::{Key, Modifiers, ViewerEvent};
use crate::viewer::Viewer;

/// Wheel delta (in points) that counts as one notch
const POINTS_PER_NOTCH: f32 = 50.0;

/// Texture the renderer composites into, shown as an egui image
pub struct RenderTarget {
    texture: wgpu::Texture,
    pub egui_texture_id: egui::TextureId,
    pub width: u32,
    pub height: u32,
}

impl RenderTarget {
    /// Recreate the target if the viewport size changed.
    ///
    /// Returns true when a new texture was created; it still has to be bound
    /// with [`RenderTarget::bind`].
    pub fn ensure(
        target: &mut Option<RenderTarget>,
        device: &wgpu::Device,
        egui_renderer: &mut egui_wgpu::Renderer,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> bool {
        let width = width.max(1);
        let height = height.max(1);
        if target
            .as_ref()
            .is_some_and(|t| t.width == width && t.height == height)
        {
            return false;
        }

        if let Some(old) = target.take() {
            egui_renderer.free_texture(&old.egui_texture_id);
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Viewport Render Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let egui_texture_id =
            egui_renderer.register_native_texture(device, &view, wgpu::FilterMode::Linear);

        tracing::debug!("Viewport texture recreated at {}x{}", width, height);
        *target = Some(RenderTarget {
            texture,
            egui_texture_id,
            width,
            height,
        });
        true
    }

    /// Make the current renderer composite into this texture
    pub fn bind(&self, viewer: &Viewer<WgpuDevice>) {
        let view = self
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        viewer
            .renderer()
            .with(|r| r.device_mut().bind_external_target(view));
    }
}

/// Translate this frame's egui input over `rect` into viewer events
pub fn collect_events(ctx: &egui::Context, rect: egui::Rect, hovered: bool) -> Vec<ViewerEvent> {
    let keyboard = hovered && !ctx.wants_keyboard_input();
    ctx.input(|input| {
        let local = |pos: egui::Pos2| Vec2::new(pos.x - rect.min.x, pos.y - rect.min.y);
        let mut events = Vec::new();

        for event in &input.events {
            match event {
                egui::Event::PointerButton {
                    pos,
                    button,
                    pressed,
                    modifiers,
                } => {
                    let Some(button) = convert_button(*button) else {
                        continue;
                    };
                    // Releases are always forwarded so drags end outside the viewport
                    if *pressed && !rect.contains(*pos) {
                        continue;
                    }
                    let position = local(*pos);
                    let modifiers = convert_modifiers(modifiers);
                    events.push(if *pressed {
                        ViewerEvent::MousePress {
                            position,
                            button,
                            modifiers,
                        }
                    } else {
                        ViewerEvent::MouseRelease {
                            position,
                            button,
                            modifiers,
                        }
                    });
                }
                egui::Event::PointerMoved(pos) => events.push(ViewerEvent::MouseMove {
                    position: local(*pos),
                    modifiers: convert_modifiers(&input.modifiers),
                }),
                egui::Event::Key {
                    key,
                    pressed,
                    repeat: false,
                    modifiers,
                    ..
                } if keyboard => {
                    let Some(key) = convert_key(*key) else {
                        continue;
                    };
                    let modifiers = convert_modifiers(modifiers);
                    events.push(if *pressed {
                        ViewerEvent::KeyPress { key, modifiers }
                    } else {
                        ViewerEvent::KeyRelease { key, modifiers }
                    });
                }
                _ => {}
            }
        }

        let scroll = input.raw_scroll_delta.y;
        if hovered && scroll != 0.0 {
            events.push(ViewerEvent::Wheel {
                delta: scroll / POINTS_PER_NOTCH,
                modifiers: convert_modifiers(&input.modifiers),
            });
        }
        events
    })
}

fn convert_button(button: egui::PointerButton) -> Option<MouseButton> {
    match button {
        egui::PointerButton::Primary => Some(MouseButton::Left),
        egui::PointerButton::Secondary => Some(MouseButton::Right),
        egui::PointerButton::Middle => Some(MouseButton::Middle),
        _ => None,
    }
}

fn convert_modifiers(modifiers: &egui::Modifiers) -> Modifiers {
    Modifiers {
        shift: modifiers.shift,
        ctrl: modifiers.ctrl || modifiers.mac_cmd,
        alt: modifiers.alt,
    }
}

fn convert_key(key: egui::Key) -> Option<Key> {
    match key {
        egui::Key::Space => Some(Key::Space),
        egui::Key::Escape => Some(Key::Escape),
        egui::Key::Home => Some(Key::Home),
        egui::Key::Delete => Some(Key::Delete),
        other => {
            let mut chars = other.name().chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphanumeric() => Some(Key::char(c)),
                _ => None,
            }
        }
    }
}

//! Side panel: renderer, texture and debug controls

use prism_renderer::WgpuDevice;

use crate::gizmo::GizmoMode;
use crate::viewer::Viewer;

/// Actions the panel asks the app to perform after drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    ChangeRenderer(usize),
    OpenMesh,
    CaptureFrame,
    SaveCamera,
    LoadCamera,
}

/// Draw the controls; renderer toggles apply immediately
pub fn side_panel(
    ui: &mut egui::Ui,
    viewer: &mut Viewer<WgpuDevice>,
    status: &str,
) -> Option<PanelAction> {
    let mut action = None;

    ui.heading("Renderer");
    let names = viewer.renderer_names();
    let mut selected = viewer.current_renderer_index();
    egui::ComboBox::from_id_salt("renderer")
        .selected_text(names.get(selected).cloned().unwrap_or_default())
        .show_ui(ui, |ui| {
            for (i, name) in names.iter().enumerate() {
                ui.selectable_value(&mut selected, i, name);
            }
        });
    if selected != viewer.current_renderer_index() {
        action = Some(PanelAction::ChangeRenderer(selected));
    }

    let textures = viewer.available_textures();
    let displayed = viewer
        .renderer()
        .with(|r| r.displayed_texture().map(str::to_string))
        .unwrap_or_default();
    let mut chosen = displayed.clone();
    egui::ComboBox::from_id_salt("texture")
        .selected_text(&chosen)
        .show_ui(ui, |ui| {
            for name in &textures {
                ui.selectable_value(&mut chosen, name.clone(), name);
            }
        });
    if chosen != displayed
        && let Err(e) = viewer.display_texture(&chosen)
    {
        tracing::warn!("Cannot display texture '{}': {}", chosen, e);
    }

    ui.separator();
    let (mut wireframe, mut post_process, mut debug_draw) = viewer.renderer().with(|r| {
        let config = r.config();
        (
            config.debug.wireframe,
            config.post_process.enabled,
            config.debug.draw_debug,
        )
    });
    if ui.checkbox(&mut wireframe, "Wireframe").changed() {
        viewer.renderer().with(|r| r.set_wireframe(wireframe));
    }
    if ui.checkbox(&mut post_process, "Post-process").changed() {
        viewer.renderer().with(|r| r.enable_post_process(post_process));
    }
    if ui.checkbox(&mut debug_draw, "Debug draw").changed() {
        viewer.renderer().with(|r| r.enable_debug_draw(debug_draw));
    }
    if ui.button("Reload shaders").clicked() {
        // Failure is logged by the viewer
        let _ = viewer.reload_shaders();
    }

    ui.separator();
    ui.heading("Gizmo");
    let mut mode = viewer.gizmo_manager().mode();
    ui.horizontal(|ui| {
        ui.radio_value(&mut mode, GizmoMode::None, "Off");
        ui.radio_value(&mut mode, GizmoMode::Translate, "Move");
        ui.radio_value(&mut mode, GizmoMode::Rotate, "Rotate");
    });
    if mode != viewer.gizmo_manager().mode() {
        viewer.set_gizmo_mode(mode);
    }

    ui.separator();
    ui.heading("Camera");
    ui.horizontal(|ui| {
        if ui.button("Fit").clicked() {
            viewer.fit_camera_to_scene();
        }
        if ui.button("Reset").clicked() {
            viewer.reset_camera();
        }
        if ui.button("Save…").clicked() {
            action = Some(PanelAction::SaveCamera);
        }
        if ui.button("Load…").clicked() {
            action = Some(PanelAction::LoadCamera);
        }
    });

    ui.separator();
    ui.heading("Scene");
    if ui.button("Open mesh…").clicked() {
        action = Some(PanelAction::OpenMesh);
    }
    if ui.button("Capture frame…").clicked() {
        action = Some(PanelAction::CaptureFrame);
    }

    ui.separator();
    let picking = viewer.picking_manager();
    ui.label(format!(
        "Picking: {:?}{}",
        picking.query_mode(),
        if picking.is_brush() {
            format!(" (brush {:.0} px)", picking.brush_radius())
        } else {
            String::new()
        }
    ));
    match picking.selection() {
        Some(selection) => ui.label(format!(
            "Selected object {} ({} features)",
            selection.ro_idx,
            selection.len()
        )),
        None => ui.label("Nothing selected"),
    };
    if let Some(hit) = viewer.last_raycast().first() {
        ui.label(format!(
            "Raycast: object {} triangle {} at {:.2}",
            hit.object, hit.triangle, hit.distance
        ));
    }

    let timer = viewer.renderer().with(|r| r.timer_data());
    ui.label(format!(
        "Frame {:.2} ms (main {:.2} ms)",
        timer.total().as_secs_f64() * 1000.0,
        timer.main_render().as_secs_f64() * 1000.0
    ));
    if !status.is_empty() {
        ui.label(status);
    }

    action
}

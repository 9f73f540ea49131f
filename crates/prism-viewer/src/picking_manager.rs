//! Picking mode and selection state of the viewer

use prism_renderer::config::PickingConfig;
use prism_renderer::{PickingMode, PickingResult, RenderObjectId};

/// Builds query modes from the held keys and keeps the last selection
#[derive(Debug, Clone)]
pub struct PickingManager {
    feature: Option<PickingMode>,
    brush: bool,
    brush_radius: f32,
    min_brush_radius: f32,
    brush_step: f32,
    selection: Option<PickingResult>,
}

impl PickingManager {
    pub fn new(config: &PickingConfig) -> Self {
        Self {
            feature: None,
            brush: false,
            brush_radius: config.brush_radius.max(config.min_brush_radius),
            min_brush_radius: config.min_brush_radius,
            brush_step: config.brush_step,
            selection: None,
        }
    }

    /// Mode for the next selection query
    pub fn query_mode(&self) -> PickingMode {
        match self.feature {
            Some(mode) if self.brush => mode.to_circle(),
            Some(mode) => mode,
            None => PickingMode::Ro,
        }
    }

    /// Feature key pressed (`Vertex`, `Edge` or `Triangle`)
    pub fn press_feature(&mut self, mode: PickingMode) {
        self.feature = Some(mode);
    }

    /// Feature key released; a different held feature is kept
    pub fn release_feature(&mut self, mode: PickingMode) {
        if self.feature == Some(mode) {
            self.feature = None;
        }
    }

    /// Switch between single-pixel and brush picking
    pub fn toggle_brush(&mut self) -> bool {
        self.brush = !self.brush;
        tracing::debug!("Brush picking {}", if self.brush { "on" } else { "off" });
        self.brush
    }

    pub fn is_brush(&self) -> bool {
        self.brush
    }

    pub fn brush_radius(&self) -> f32 {
        self.brush_radius
    }

    /// Grow (positive notches) or shrink the brush by whole steps
    pub fn resize_brush(&mut self, notches: f32) -> f32 {
        if notches != 0.0 {
            let step = self.brush_step * notches.signum();
            self.brush_radius = (self.brush_radius + step).max(self.min_brush_radius);
        }
        self.brush_radius
    }

    /// Last selection, object or features
    pub fn selection(&self) -> Option<&PickingResult> {
        self.selection.as_ref()
    }

    /// Selected object
    pub fn selected_object(&self) -> Option<RenderObjectId> {
        self.selection.as_ref().and_then(PickingResult::object)
    }

    pub fn set_selection(&mut self, result: PickingResult) {
        tracing::debug!(
            "Selected object {} ({:?}, {} features)",
            result.ro_idx,
            result.mode,
            result.len()
        );
        self.selection = Some(result);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }
}

impl Default for PickingManager {
    fn default() -> Self {
        Self::new(&PickingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_mode_follows_keys_and_brush() {
        let mut picking = PickingManager::default();
        assert_eq!(picking.query_mode(), PickingMode::Ro);

        picking.press_feature(PickingMode::Edge);
        assert_eq!(picking.query_mode(), PickingMode::Edge);
        picking.toggle_brush();
        assert_eq!(picking.query_mode(), PickingMode::CEdge);

        picking.release_feature(PickingMode::Vertex);
        assert_eq!(picking.query_mode(), PickingMode::CEdge);
        picking.release_feature(PickingMode::Edge);
        assert_eq!(picking.query_mode(), PickingMode::Ro);
    }

    #[test]
    fn test_brush_resize_steps_and_minimum() {
        let mut picking = PickingManager::default();
        assert_eq!(picking.brush_radius(), 10.0);
        assert_eq!(picking.resize_brush(1.0), 15.0);
        assert_eq!(picking.resize_brush(-0.3), 10.0);
        assert_eq!(picking.resize_brush(-1.0), 5.0);
        assert_eq!(picking.resize_brush(-1.0), 5.0);
    }

    #[test]
    fn test_selection() {
        let mut picking = PickingManager::default();
        let mut hit = PickingResult::none(PickingMode::Ro);
        hit.ro_idx = 3;
        picking.set_selection(hit);
        assert_eq!(picking.selected_object(), Some(RenderObjectId(3)));
        picking.clear_selection();
        assert!(picking.selection().is_none());
    }
}

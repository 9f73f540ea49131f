//! Per-frame input and the fixed stage sequence of a frame

use std::fmt;

use glam::{Mat4, Vec3};

/// Immutable per-frame input built by the viewer from its camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderData {
    /// World to view transform.
    pub view: Mat4,
    /// View to clip transform.
    pub projection: Mat4,
    /// Seconds since the previous frame.
    pub dt: f32,
}

impl RenderData {
    /// Creates frame data.
    pub fn new(view: Mat4, projection: Mat4, dt: f32) -> Self {
        Self {
            view,
            projection,
            dt,
        }
    }

    /// Clip-space transform.
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Camera position in world space.
    pub fn eye(&self) -> Vec3 {
        self.view.inverse().w_axis.truncate()
    }
}

impl Default for RenderData {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY, 0.0)
    }
}

/// Stages of [`crate::Renderer::render`], in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameStage {
    /// Remember the output target bound by the host.
    SaveExternalTarget,
    /// Run strategy and per-object update hooks.
    UpdateObjects,
    /// Partition render objects into queues.
    FeedQueues,
    /// Draw the picking buffer and answer queries (only with pending queries).
    Picking,
    /// Strategy main pass.
    MainRender,
    /// Post-processing, then the debug and UI overlays.
    PostProcess,
    /// Blit the displayed texture to the saved target.
    Composite,
}

impl FrameStage {
    /// All stages in order.
    pub const ALL: [FrameStage; 7] = [
        FrameStage::SaveExternalTarget,
        FrameStage::UpdateObjects,
        FrameStage::FeedQueues,
        FrameStage::Picking,
        FrameStage::MainRender,
        FrameStage::PostProcess,
        FrameStage::Composite,
    ];

    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            FrameStage::SaveExternalTarget => "save-external-target",
            FrameStage::UpdateObjects => "update-objects",
            FrameStage::FeedQueues => "feed-queues",
            FrameStage::Picking => "picking",
            FrameStage::MainRender => "main-render",
            FrameStage::PostProcess => "post-process",
            FrameStage::Composite => "composite",
        }
    }
}

impl fmt::Display for FrameStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

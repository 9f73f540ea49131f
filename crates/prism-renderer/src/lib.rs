//! Prism Renderer
//!
//! Frame orchestration, render queues and GPU picking for the Prism engine.
//!
//! # Architecture
//!
//! - [`renderer::Renderer`] - Frame orchestrator, one per viewport
//! - [`renderer::RenderGate`] - Lock shared by every thread touching a renderer
//! - [`strategy::RenderStrategy`] - Pluggable rendering technique
//! - [`device::RenderDevice`] - GPU seam (`wgpu` or software)
//! - [`scene::Scene`] - Render objects and lights passed into each frame
//! - [`picking`] - Picking buffer encoding and query resolution
//!
//! # Module Structure
//!
//! ```text
//! prism-renderer/
//! ├── device/          # RenderDevice trait, WgpuDevice, SoftwareDevice
//! ├── picking/         # Queries, results, picking pass
//! ├── renderer/        # Renderer and RenderGate
//! ├── scene/           # RenderObject, RenderObjectManager, Scene
//! ├── strategy/        # RenderStrategy, ForwardStrategy
//! ├── queue.rs         # Render queue partitioning
//! ├── camera.rs        # Camera system
//! └── config.rs        # RON-backed settings
//! ```

pub mod camera;
pub mod config;
pub mod device;
pub mod error;
pub mod frame;
pub mod light;
pub mod picking;
pub mod queue;
pub mod renderer;
pub mod scene;
pub mod strategy;
pub mod textures;
pub mod timer;

pub use camera::{Camera, CameraState};
pub use config::{ConfigError, RendererConfig};
pub use device::{
    DrawStyle, FrameImage, OutputTarget, RenderDevice, SoftwareDevice, TextureId, WgpuDevice,
};
pub use error::RenderError;
pub use frame::{FrameStage, RenderData};
pub use light::DirectionalLight;
pub use picking::{PickingMode, PickingQuery, PickingResult};
pub use queue::{PickingQueues, RenderQueues};
pub use renderer::{ComposeGuard, RenderGate, Renderer};
pub use scene::{
    PickingGranularity, RenderLayer, RenderObject, RenderObjectId, RenderObjectManager, Scene,
};
pub use strategy::{ForwardStrategy, RenderStrategy};
pub use timer::TimerData;

//! Viewer error types

use prism_core::MeshError;
use prism_renderer::{ConfigError, RenderError};

/// Errors reported by the viewer
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Camera file error: {0}")]
    Camera(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Unknown renderer: {0}")]
    UnknownRenderer(String),
}

pub type Result<T> = std::result::Result<T, ViewerError>;

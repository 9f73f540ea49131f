//! Renderer error type

use crate::device::TextureId;
use crate::frame::FrameStage;

/// Errors raised by render devices, strategies and the frame orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The GPU (or software) device rejected an operation.
    #[error("device error: {0}")]
    Device(String),
    /// A shader failed to load or compile.
    #[error("shader `{name}` failed: {message}")]
    Shader {
        /// Shader file or module name.
        name: String,
        /// Compiler or loader message.
        message: String,
    },
    /// No registered texture has this name.
    #[error("no texture named `{0}`")]
    TextureNotFound(String),
    /// A texture id that the device never handed out.
    #[error("unknown texture {0:?}")]
    UnknownTexture(TextureId),
    /// A rendering strategy could not complete a step.
    #[error("strategy `{strategy}`: {message}")]
    Strategy {
        /// Strategy name.
        strategy: String,
        /// What went wrong.
        message: String,
    },
    /// A frame stage failed; later stages of that frame were skipped.
    #[error("{stage} stage failed: {source}")]
    Stage {
        /// Stage that failed.
        stage: FrameStage,
        /// Underlying error.
        #[source]
        source: Box<RenderError>,
    },
}

impl RenderError {
    /// Wraps `self` as the failure of `stage`.
    pub fn in_stage(self, stage: FrameStage) -> Self {
        RenderError::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// Returns the failed stage, if this error came out of a frame.
    pub fn stage(&self) -> Option<FrameStage> {
        match self {
            RenderError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

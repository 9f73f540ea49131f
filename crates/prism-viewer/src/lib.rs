//! Prism viewer
//!
//! Interactive front end for the Prism renderer: camera control, picking,
//! transform gizmos and an egui application hosting the viewport.

pub mod app;
pub mod camera;
pub mod error;
pub mod events;
pub mod gizmo;
pub mod keymap;
pub mod picking_manager;
pub mod viewer;

pub use app::PrismApp;
pub use camera::TrackballCamera;
pub use error::{Result, ViewerError};
pub use events::{Key, Modifiers, ViewerEvent};
pub use gizmo::{GizmoManager, GizmoMode};
pub use keymap::{KeyMapping, ViewerAction};
pub use picking_manager::PickingManager;
pub use viewer::{RaycastHit, Viewer};

//! Bounding-box interaction core for a gaussian-splat scene viewer.
//!
//! Loads object-detection results for a scene, keeps them as pickable boxes
//! over the splat, and plans camera framings for the selected box. Rendering,
//! camera control and the page around it are reached through small ports
//! ([`render::RenderSurface`], [`render::RayProjector`],
//! [`render::CameraRig`], [`ui::InfoPanel`]).

pub mod app;
pub mod assets;
pub mod config;
pub mod render;
pub mod scene;
pub mod ui;

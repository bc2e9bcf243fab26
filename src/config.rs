//! Viewer configuration: which scenes exist, where their detection results
//! live, and how each splat and its default camera are placed.

use crate::render::CameraPose;
use crate::scene::ParentTransform;
use glam::Vec3;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("default scene '{0}' is not listed in scenes")]
    UnknownDefaultScene(String),
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneBoundary {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SplatPlacement {
    pub position: [f32; 3],
    pub rotation_deg: [f32; 3],
}

impl SplatPlacement {
    pub fn transform(&self) -> ParentTransform {
        ParentTransform::from_position_rotation(self.position, self.rotation_deg)
    }
}

/// Capture metadata shown in the info panel.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneInfo {
    pub location: String,
    pub date_captured: String,
    pub file_size: String,
    pub num_images: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneProfile {
    pub id: String,
    pub title: String,
    pub asset: String,
    /// Scenes without detection results leave this empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_data_url: Option<String>,
    pub splat: SplatPlacement,
    pub camera_focus: [f32; 3],
    pub camera_position: [f32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<SceneBoundary>,
    #[serde(default)]
    pub info: SceneInfo,
}

impl SceneProfile {
    pub fn default_pose(&self) -> CameraPose {
        CameraPose::new(
            Vec3::from_array(self.camera_position),
            Vec3::from_array(self.camera_focus),
        )
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub default_scene: String,
    pub auto_load: bool,
    pub show_labels: bool,
    /// Directory or base URL that `box_data_url` entries are relative to.
    pub data_root: String,
    pub scenes: Vec<SceneProfile>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            default_scene: "apartment".to_string(),
            auto_load: true,
            show_labels: true,
            data_root: ".".to_string(),
            scenes: vec![
                SceneProfile {
                    id: "apartment".to_string(),
                    title: "Apartment".to_string(),
                    asset: "apartment".to_string(),
                    box_data_url: Some("assets/box_data/apartment_rad_det_boxes.json".to_string()),
                    splat: SplatPlacement {
                        position: [0.0, 1.0, 0.0],
                        rotation_deg: [90.0, -75.0, 180.0],
                    },
                    camera_focus: [0.0, 1.0, 0.0],
                    camera_position: [0.5, 1.0, 0.5],
                    boundary: Some(SceneBoundary {
                        min: [-0.7, 0.8, -0.7],
                        max: [0.7, 1.2, 0.7],
                    }),
                    info: SceneInfo {
                        location: "Cape Town".to_string(),
                        date_captured: "11 September, 2025".to_string(),
                        file_size: "17 MB".to_string(),
                        num_images: "754".to_string(),
                    },
                },
                SceneProfile {
                    id: "office".to_string(),
                    title: "Office".to_string(),
                    asset: "office".to_string(),
                    box_data_url: Some("assets/box_data/saffraan_rad_det_boxes.json".to_string()),
                    splat: SplatPlacement {
                        position: [0.4, -0.5, 0.0],
                        rotation_deg: [90.0, 0.0, 180.0],
                    },
                    camera_focus: [0.0, 0.0, 0.0],
                    camera_position: [-1.0, 0.0, 0.0],
                    boundary: Some(SceneBoundary {
                        min: [-0.9, -0.2, -0.9],
                        max: [1.3, 0.7, 0.8],
                    }),
                    info: SceneInfo {
                        location: "Garden Route".to_string(),
                        date_captured: "11 November, 2025".to_string(),
                        file_size: "15 MB".to_string(),
                        num_images: "695".to_string(),
                    },
                },
            ],
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: ViewerConfig =
            serde_json::from_str(&json).map_err(|source| ConfigError::Json {
                path: path.display().to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scene(&self.default_scene).is_none() {
            return Err(ConfigError::UnknownDefaultScene(self.default_scene.clone()));
        }
        Ok(())
    }

    pub fn scene(&self, id: &str) -> Option<&SceneProfile> {
        self.scenes.iter().find(|scene| scene.id == id)
    }

    pub fn box_data_url(&self, id: &str) -> Option<&str> {
        self.scene(id).and_then(|scene| scene.box_data_url.as_deref())
    }
}

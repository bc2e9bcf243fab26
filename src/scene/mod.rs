pub mod registry;
pub mod serialization;

pub use registry::{BoxEntity, BoxRegistry, CollisionVolume};

use glam::{Mat4, Vec3};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentError {
    #[error("duplicate bounding box id '{0}'")]
    DuplicateId(String),
    #[error("bounding box '{id}' has confidence {confidence} outside [0, 1]")]
    ConfidenceOutOfRange { id: String, confidence: f32 },
    #[error("focusPoint must carry exactly one of 'offset' or 'absolute'")]
    AmbiguousFocusPoint,
    #[error("view must carry exactly one of 'offset', 'spherical' or 'euler'")]
    AmbiguousView,
}

/// One detected object as exported by the detector.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub id: String,
    pub label: String,
    pub position: [f32; 3],
    pub size: [f32; 3],
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "default_color")]
    pub color: [f32; 3],
    #[serde(default)]
    pub confidence: f32,
    /// An object naming no shape (`{}`) reads as absent.
    #[serde(
        default,
        deserialize_with = "focus_point_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub focus_point: Option<FocusPoint>,
    #[serde(
        default,
        deserialize_with = "view_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub view: Option<ViewConfig>,
}

fn focus_point_or_none<'de, D>(deserializer: D) -> Result<Option<FocusPoint>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    match Option::<FocusPointRepr>::deserialize(deserializer)? {
        Some(FocusPointRepr::Object {
            offset: None,
            absolute: None,
            ..
        })
        | None => Ok(None),
        Some(repr) => FocusPoint::try_from(repr)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn view_or_none<'de, D>(deserializer: D) -> Result<Option<ViewConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    match Option::<ViewRepr>::deserialize(deserializer)? {
        Some(repr) if !repr.is_empty() => ViewConfig::try_from(repr)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

fn default_color() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

/// Where the camera looks when framing a box.
///
/// JSON accepts `[x, y, z]` (local offset), `{"offset": [..], "local": bool}`
/// and `{"absolute": [..]}`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "FocusPointRepr", into = "FocusPointRepr")]
pub enum FocusPoint {
    /// Added to the box center. `local` offsets are rotated and scaled by the
    /// parent transform; non-local offsets go through the full transform.
    Offset { offset: [f32; 3], local: bool },
    /// World coordinates, used as-is.
    Absolute([f32; 3]),
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
enum FocusPointRepr {
    Shorthand([f32; 3]),
    Object {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset: Option<[f32; 3]>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        local: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        absolute: Option<[f32; 3]>,
    },
}

impl TryFrom<FocusPointRepr> for FocusPoint {
    type Error = DocumentError;

    fn try_from(repr: FocusPointRepr) -> Result<Self, Self::Error> {
        match repr {
            FocusPointRepr::Shorthand(offset) => Ok(FocusPoint::Offset {
                offset,
                local: true,
            }),
            FocusPointRepr::Object {
                offset: Some(offset),
                local,
                absolute: None,
            } => Ok(FocusPoint::Offset {
                offset,
                local: local.unwrap_or(true),
            }),
            FocusPointRepr::Object {
                offset: None,
                absolute: Some(absolute),
                ..
            } => Ok(FocusPoint::Absolute(absolute)),
            FocusPointRepr::Object { .. } => Err(DocumentError::AmbiguousFocusPoint),
        }
    }
}

impl From<FocusPoint> for FocusPointRepr {
    fn from(point: FocusPoint) -> Self {
        match point {
            FocusPoint::Offset { offset, local } => FocusPointRepr::Object {
                offset: Some(offset),
                local: Some(local),
                absolute: None,
            },
            FocusPoint::Absolute(absolute) => FocusPointRepr::Object {
                offset: None,
                local: None,
                absolute: Some(absolute),
            },
        }
    }
}

/// Per-object camera placement relative to the focus point.
///
/// JSON is an object with exactly one of `offset`, `spherical` or `euler`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "ViewRepr", into = "ViewRepr")]
pub enum ViewConfig {
    Offset([f32; 3]),
    Spherical(SphericalView),
    Euler(EulerView),
}

#[derive(serde::Serialize, serde::Deserialize)]
struct ViewRepr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    offset: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    spherical: Option<SphericalView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    euler: Option<EulerView>,
}

impl ViewRepr {
    fn is_empty(&self) -> bool {
        self.offset.is_none() && self.spherical.is_none() && self.euler.is_none()
    }
}

impl TryFrom<ViewRepr> for ViewConfig {
    type Error = DocumentError;

    fn try_from(repr: ViewRepr) -> Result<Self, Self::Error> {
        match repr {
            ViewRepr {
                offset: Some(offset),
                spherical: None,
                euler: None,
            } => Ok(ViewConfig::Offset(offset)),
            ViewRepr {
                offset: None,
                spherical: Some(view),
                euler: None,
            } => Ok(ViewConfig::Spherical(view)),
            ViewRepr {
                offset: None,
                spherical: None,
                euler: Some(view),
            } => Ok(ViewConfig::Euler(view)),
            _ => Err(DocumentError::AmbiguousView),
        }
    }
}

impl From<ViewConfig> for ViewRepr {
    fn from(view: ViewConfig) -> Self {
        let mut repr = ViewRepr {
            offset: None,
            spherical: None,
            euler: None,
        };
        match view {
            ViewConfig::Offset(offset) => repr.offset = Some(offset),
            ViewConfig::Spherical(view) => repr.spherical = Some(view),
            ViewConfig::Euler(view) => repr.euler = Some(view),
        }
        repr
    }
}

/// Angles in degrees; yaw around +Y, pitch up from the XZ plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SphericalView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaw: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EulerView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaw: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

/// On-disk detection results for one scene.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    pub bounding_boxes: Vec<BoundingBox>,
}

impl SceneDocument {
    pub fn new(bounding_boxes: Vec<BoundingBox>) -> Self {
        Self { bounding_boxes }
    }

    pub fn validate(&self) -> Result<(), DocumentError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for bbox in &self.bounding_boxes {
            if !seen.insert(bbox.id.as_str()) {
                return Err(DocumentError::DuplicateId(bbox.id.clone()));
            }
            if !(0.0..=1.0).contains(&bbox.confidence) {
                return Err(DocumentError::ConfidenceOutOfRange {
                    id: bbox.id.clone(),
                    confidence: bbox.confidence,
                });
            }
        }
        Ok(())
    }

    /// Sorted, deduplicated labels.
    pub fn unique_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .bounding_boxes
            .iter()
            .map(|bbox| bbox.label.clone())
            .collect();
        labels.sort();
        labels.dedup();
        labels
    }
}

/// World transform of the splat node the boxes are authored against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParentTransform {
    matrix: Mat4,
    rotation_deg: [f32; 3],
}

impl Default for ParentTransform {
    fn default() -> Self {
        Self::new([0.0; 3], [0.0; 3], [1.0; 3])
    }
}

impl ParentTransform {
    pub fn new(position: [f32; 3], rotation_deg: [f32; 3], scale: [f32; 3]) -> Self {
        let matrix = Mat4::from_cols_array(&compose_transform_matrix(position, rotation_deg, scale));
        Self {
            matrix,
            rotation_deg,
        }
    }

    pub fn from_position_rotation(position: [f32; 3], rotation_deg: [f32; 3]) -> Self {
        Self::new(position, rotation_deg, [1.0, 1.0, 1.0])
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.matrix.transform_point3(point)
    }

    /// Rotation and scale only, no translation.
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.matrix.transform_vector3(vector)
    }

    pub fn euler_deg(&self) -> Vec3 {
        Vec3::from_array(self.rotation_deg)
    }

    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }
}

pub fn compose_transform_matrix(
    position: [f32; 3],
    rotation_deg: [f32; 3],
    scale: [f32; 3],
) -> [f32; 16] {
    let (rx, ry, rz) = (
        rotation_deg[0].to_radians(),
        rotation_deg[1].to_radians(),
        rotation_deg[2].to_radians(),
    );
    let (sx, cx) = rx.sin_cos();
    let (sy, cy) = ry.sin_cos();
    let (sz, cz) = rz.sin_cos();

    // Rotation order: Z (roll) * Y (yaw) * X (pitch)
    let r00 = cz * cy;
    let r01 = cz * sy * sx - sz * cx;
    let r02 = cz * sy * cx + sz * sx;
    let r10 = sz * cy;
    let r11 = sz * sy * sx + cz * cx;
    let r12 = sz * sy * cx - cz * sx;
    let r20 = -sy;
    let r21 = cy * sx;
    let r22 = cy * cx;

    let (sx, sy, sz) = (scale[0], scale[1], scale[2]);
    [
        r00 * sx,
        r10 * sx,
        r20 * sx,
        0.0,
        r01 * sy,
        r11 * sy,
        r21 * sy,
        0.0,
        r02 * sz,
        r12 * sz,
        r22 * sz,
        0.0,
        position[0],
        position[1],
        position[2],
        1.0,
    ]
}

#[cfg(test)]
pub(crate) fn test_box(id: &str, position: [f32; 3], size: [f32; 3]) -> BoundingBox {
    BoundingBox {
        id: id.to_string(),
        label: format!("{id}-label"),
        position,
        size,
        rotation: [0.0; 3],
        color: [1.0, 0.0, 0.0],
        confidence: 0.9,
        focus_point: None,
        view: None,
    }
}

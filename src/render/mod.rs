pub mod camera;
pub mod pick;

pub use camera::{plan_framing, CameraPose, CameraRig, PerspectiveCamera, RayProjector};
pub use pick::{intersect, PickHit, Ray};

use glam::Vec3;

/// Number of nested wireframe shells drawn per box to fake line thickness.
pub const WIREFRAME_SHELLS: usize = 5;
/// Scale step between consecutive shells.
pub const WIREFRAME_SHELL_STEP: f32 = 0.002;
pub const WIREFRAME_EMISSIVE_INTENSITY: f32 = 2.5;

/// Handle issued by a [`RenderSurface`] for one spawned box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// One emissive, depth-test-free wireframe box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WireframeShell {
    pub extents: Vec3,
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
}

/// Everything the host needs to draw one bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxVisual {
    pub name: String,
    pub center: Vec3,
    pub rotation_deg: Vec3,
    pub extents: Vec3,
    pub shells: Vec<WireframeShell>,
    /// Invisible solid box used only for hit testing.
    pub collision_extents: Vec3,
    pub label: Option<BoxLabel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxLabel {
    pub text: String,
    pub confidence: f32,
}

impl BoxVisual {
    pub fn new(
        id: &str,
        center: Vec3,
        rotation_deg: Vec3,
        extents: Vec3,
        color: [f32; 3],
    ) -> Self {
        let shells = (0..WIREFRAME_SHELLS)
            .map(|i| WireframeShell {
                extents: extents * (1.0 + i as f32 * WIREFRAME_SHELL_STEP),
                emissive: color,
                emissive_intensity: WIREFRAME_EMISSIVE_INTENSITY,
            })
            .collect();
        Self {
            name: format!("bbox-{id}"),
            center,
            rotation_deg,
            extents,
            shells,
            collision_extents: extents,
            label: None,
        }
    }

    pub fn with_label(mut self, text: &str, confidence: f32) -> Self {
        self.label = Some(BoxLabel {
            text: text.to_string(),
            confidence,
        });
        self
    }
}

/// Host-side drawing of bounding boxes. Implemented by the engine binding.
pub trait RenderSurface {
    fn spawn_box(&mut self, visual: &BoxVisual) -> SurfaceId;
    fn set_box_enabled(&mut self, id: SurfaceId, enabled: bool);
    fn set_collision_enabled(&mut self, id: SurfaceId, enabled: bool);
    fn destroy_box(&mut self, id: SurfaceId);
}

/// Surface that draws nothing; keeps the core usable without an engine.
#[derive(Debug, Default)]
pub struct NullSurface {
    next_id: u64,
    live: usize,
}

impl NullSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_boxes(&self) -> usize {
        self.live
    }
}

impl RenderSurface for NullSurface {
    fn spawn_box(&mut self, visual: &BoxVisual) -> SurfaceId {
        self.next_id += 1;
        self.live += 1;
        log::debug!(
            "spawn {} at {:?} extents {:?}",
            visual.name,
            visual.center,
            visual.extents
        );
        SurfaceId(self.next_id)
    }

    fn set_box_enabled(&mut self, _id: SurfaceId, _enabled: bool) {}

    fn set_collision_enabled(&mut self, _id: SurfaceId, _enabled: bool) {}

    fn destroy_box(&mut self, _id: SurfaceId) {
        self.live = self.live.saturating_sub(1);
    }
}

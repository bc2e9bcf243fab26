use crate::render::{BoxVisual, RenderSurface, SurfaceId};
use crate::scene::{BoundingBox, ParentTransform};
use glam::Vec3;

/// Invisible solid used for hit testing. Disabled on the focused box so it
/// stops swallowing clicks and hovers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionVolume {
    pub enabled: bool,
    pub center: Vec3,
    pub half_extents: Vec3,
}

/// A loaded box and its runtime state.
#[derive(Debug, Clone)]
pub struct BoxEntity {
    data: BoundingBox,
    center: Vec3,
    rotation_deg: Vec3,
    extents: Vec3,
    enabled: bool,
    collision: CollisionVolume,
    surface_id: SurfaceId,
}

impl BoxEntity {
    pub fn id(&self) -> &str {
        &self.data.id
    }

    pub fn data(&self) -> &BoundingBox {
        &self.data
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn rotation_deg(&self) -> Vec3 {
        self.rotation_deg
    }

    pub fn extents(&self) -> Vec3 {
        self.extents
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn collision(&self) -> &CollisionVolume {
        &self.collision
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    /// Hidden boxes and disabled collision volumes are skipped.
    pub fn is_pickable(&self) -> bool {
        self.enabled && self.collision.enabled
    }
}

/// Detector sizes are authored Z-up; the splat is rotated to Y-up, so the
/// rendered extents swap Y and Z.
fn render_extents(size: [f32; 3]) -> Vec3 {
    Vec3::new(size[0], size[2], size[1])
}

/// Owns the bounding boxes of the current scene.
#[derive(Debug, Default)]
pub struct BoxRegistry {
    entities: Vec<BoxEntity>,
    active: Option<String>,
    show_labels: bool,
}

impl BoxRegistry {
    pub fn new(show_labels: bool) -> Self {
        Self {
            entities: Vec::new(),
            active: None,
            show_labels,
        }
    }

    pub fn entities(&self) -> &[BoxEntity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&BoxEntity> {
        self.entities.iter().find(|entity| entity.id() == id)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Replaces every loaded box with `boxes`.
    pub fn load(
        &mut self,
        boxes: Vec<BoundingBox>,
        parent: Option<&ParentTransform>,
        surface: &mut dyn RenderSurface,
    ) {
        self.clear(surface);
        self.entities.reserve(boxes.len());
        for data in boxes {
            let entity = self.spawn(data, parent, surface);
            self.entities.push(entity);
        }
        log::info!("Created {} bounding boxes", self.entities.len());
    }

    fn spawn(
        &self,
        data: BoundingBox,
        parent: Option<&ParentTransform>,
        surface: &mut dyn RenderSurface,
    ) -> BoxEntity {
        let local = Vec3::from_array(data.position);
        let rotation = Vec3::from_array(data.rotation);
        let (center, rotation_deg) = match parent {
            Some(parent) => (parent.transform_point(local), parent.euler_deg() + rotation),
            None => (local, rotation),
        };
        let extents = render_extents(data.size);

        let mut visual = BoxVisual::new(&data.id, center, rotation_deg, extents, data.color);
        if self.show_labels {
            visual = visual.with_label(&data.label, data.confidence);
        }
        let surface_id = surface.spawn_box(&visual);

        BoxEntity {
            center,
            rotation_deg,
            extents,
            enabled: true,
            collision: CollisionVolume {
                enabled: true,
                center,
                half_extents: extents * 0.5,
            },
            surface_id,
            data,
        }
    }

    /// Focus mode: with `Some(id)` only that box stays visible and its
    /// collision volume is disabled. `None` restores every box.
    pub fn set_active(&mut self, id: Option<&str>, surface: &mut dyn RenderSurface) {
        self.active = id.map(str::to_string);
        for entity in &mut self.entities {
            let is_active = id.is_some_and(|active| entity.id() == active);
            let show = id.is_none() || is_active;
            entity.enabled = show;
            surface.set_box_enabled(entity.surface_id, show);

            if is_active {
                entity.collision.enabled = false;
                surface.set_collision_enabled(entity.surface_id, false);
            } else if show {
                entity.collision.enabled = true;
                surface.set_collision_enabled(entity.surface_id, true);
            }
        }
    }

    pub fn show_all(&mut self, surface: &mut dyn RenderSurface) {
        self.set_active(None, surface);
    }

    /// Hides every box; collision flags and the active id are untouched.
    pub fn hide_all(&mut self, surface: &mut dyn RenderSurface) {
        for entity in &mut self.entities {
            entity.enabled = false;
            surface.set_box_enabled(entity.surface_id, false);
        }
    }

    pub fn clear(&mut self, surface: &mut dyn RenderSurface) {
        for entity in self.entities.drain(..) {
            surface.destroy_box(entity.surface_id);
        }
        self.active = None;
    }
}

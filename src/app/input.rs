use crate::render::{PickHit, Ray, RayProjector};
use crate::scene::{BoxEntity, BoxRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down(PointerButton),
    Move,
}

/// Pointer event in canvas pixels. `over_ui` is set by the page when the
/// pointer is over a button, panel or modal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: f32,
    pub y: f32,
    pub over_ui: bool,
}

impl PointerEvent {
    pub fn down(x: f32, y: f32) -> Self {
        Self {
            kind: PointerKind::Down(PointerButton::Left),
            x,
            y,
            over_ui: false,
        }
    }

    pub fn moved(x: f32, y: f32) -> Self {
        Self {
            kind: PointerKind::Move,
            x,
            y,
            over_ui: false,
        }
    }

    pub fn over_ui(mut self) -> Self {
        self.over_ui = true;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    Hovering,
    Selected(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    Select(PickHit),
    Cursor(Cursor),
}

/// Turns pointer events into box selections and hover cursor changes.
#[derive(Debug, Default)]
pub struct InteractionDispatcher {
    selected: Option<String>,
    cursor: Cursor,
}

impl InteractionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InteractionState {
        match (&self.selected, self.cursor) {
            (Some(id), _) => InteractionState::Selected(id.clone()),
            (None, Cursor::Pointer) => InteractionState::Hovering,
            (None, Cursor::Default) => InteractionState::Idle,
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Leaves focus mode.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn handle(
        &mut self,
        event: &PointerEvent,
        camera: Option<&dyn RayProjector>,
        registry: &BoxRegistry,
    ) -> Option<Interaction> {
        match event.kind {
            PointerKind::Down(PointerButton::Left) => {
                if event.over_ui || registry.is_empty() {
                    return None;
                }
                let ray = screen_ray(camera, event)?;
                let hit = pick_nearest(&ray, registry.entities())?;
                log::debug!("Picked box {} at {:.3}", hit.box_id, hit.distance);
                self.selected = Some(hit.box_id.clone());
                Some(Interaction::Select(hit))
            }
            PointerKind::Down(_) => None,
            PointerKind::Move => {
                if registry.is_empty() {
                    return None;
                }
                let ray = screen_ray(camera, event)?;
                let cursor = if pick_any(&ray, registry.entities()) {
                    Cursor::Pointer
                } else {
                    Cursor::Default
                };
                if cursor == self.cursor {
                    return None;
                }
                self.cursor = cursor;
                Some(Interaction::Cursor(cursor))
            }
        }
    }
}

fn screen_ray(camera: Option<&dyn RayProjector>, event: &PointerEvent) -> Option<Ray> {
    let Some(camera) = camera else {
        log::debug!("No camera available for picking");
        return None;
    };
    let ray = camera.screen_ray(event.x, event.y);
    if ray.is_none() {
        log::warn!("Screen to world projection failed at ({}, {})", event.x, event.y);
    }
    ray
}

/// Closest pickable box. Ties keep the earlier entity.
pub fn pick_nearest(ray: &Ray, entities: &[BoxEntity]) -> Option<PickHit> {
    let mut closest: Option<PickHit> = None;
    for entity in entities.iter().filter(|entity| entity.is_pickable()) {
        let collision = entity.collision();
        let Some(distance) = ray.intersect_box(collision.center, collision.half_extents) else {
            continue;
        };
        if closest.as_ref().map_or(true, |best| distance < best.distance) {
            closest = Some(PickHit {
                box_id: entity.id().to_string(),
                distance,
            });
        }
    }
    closest
}

fn pick_any(ray: &Ray, entities: &[BoxEntity]) -> bool {
    entities.iter().filter(|entity| entity.is_pickable()).any(|entity| {
        let collision = entity.collision();
        ray.intersect_box(collision.center, collision.half_extents)
            .is_some()
    })
}

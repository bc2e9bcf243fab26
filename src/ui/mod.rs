//! Page-level state around the inspector: info panel, annotation details,
//! the bounding-box visibility toggle, scene switching and the loading
//! overlay.

use crate::app::ScenePort;
use crate::config::{SceneProfile, ViewerConfig};
use crate::render::{CameraPose, CameraRig};
use glam::{Quat, Vec3, Vec4};

const CAMERA_MOVE_THRESHOLD: f32 = 0.01;
const FALLBACK_SCENE: &str = "apartment";
const FALLBACK_FOCUS: [f32; 3] = [0.0, 1.0, 0.0];
const FALLBACK_POSITION: [f32; 3] = [0.5, 1.0, 0.5];
const PROGRESS_STEP: f32 = 0.02;
const PROGRESS_CEILING: f32 = 0.95;
const NO_OBJECTS: &str = "No objects detected";

/// Display side of the info panel.
pub trait InfoPanel {
    fn set_open(&mut self, open: bool);
    fn show_details(&mut self, title: &str, description_html: &str);
    fn hide_details(&mut self);
    fn set_scene(&mut self, profile: &SceneProfile);
    fn set_objects(&mut self, labels: &[String]);
    fn set_loading(&mut self, overlay: &LoadingOverlay);
}

/// Panel that drops every update.
#[derive(Debug, Default)]
pub struct NullPanel;

impl InfoPanel for NullPanel {
    fn set_open(&mut self, _open: bool) {}
    fn show_details(&mut self, _title: &str, _description_html: &str) {}
    fn hide_details(&mut self) {}
    fn set_scene(&mut self, _profile: &SceneProfile) {}
    fn set_objects(&mut self, _labels: &[String]) {}
    fn set_loading(&mut self, _overlay: &LoadingOverlay) {}
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadingOverlay {
    progress: f32,
    visible: bool,
}

impl LoadingOverlay {
    pub fn show(&mut self) {
        self.visible = true;
        self.progress = 0.0;
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.progress = 1.0;
    }

    pub fn set_progress(&mut self, progress: f32) {
        self.progress = progress.clamp(0.0, 1.0);
    }

    /// Simulated progress while the real load has no progress events;
    /// never reaches the end on its own.
    pub fn advance(&mut self) {
        let next = self.progress + PROGRESS_STEP;
        if next < PROGRESS_CEILING {
            self.progress = next;
        }
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn percentage(&self) -> u32 {
        (self.progress * 100.0).round() as u32
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Annotation currently shown in the panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub title: String,
    pub description_html: String,
}

/// Trimmed label with its first letter upper-cased.
pub fn display_title(label: &str) -> String {
    let trimmed = label.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Selected Object".to_string(),
    }
}

#[derive(Debug)]
pub struct PanelOrchestrator {
    panel_open: bool,
    details: Option<Annotation>,
    boxes_visible: bool,
    current_scene: Option<String>,
    objects: Vec<String>,
    loading: LoadingOverlay,
    last_camera: Option<(Vec3, Quat)>,
    box_clicked: bool,
}

impl Default for PanelOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelOrchestrator {
    pub fn new() -> Self {
        Self {
            panel_open: false,
            details: None,
            boxes_visible: true,
            current_scene: None,
            objects: Vec::new(),
            loading: LoadingOverlay::default(),
            last_camera: None,
            box_clicked: false,
        }
    }

    pub fn is_panel_open(&self) -> bool {
        self.panel_open
    }

    pub fn details(&self) -> Option<&Annotation> {
        self.details.as_ref()
    }

    pub fn boxes_visible(&self) -> bool {
        self.boxes_visible
    }

    pub fn current_scene(&self) -> Option<&str> {
        self.current_scene.as_deref()
    }

    pub fn objects(&self) -> &[String] {
        &self.objects
    }

    pub fn loading(&self) -> &LoadingOverlay {
        &self.loading
    }

    pub fn toggle_panel(&mut self, panel: &mut dyn InfoPanel) {
        self.panel_open = !self.panel_open;
        panel.set_open(self.panel_open);
    }

    pub fn close_panel(&mut self, port: &mut dyn ScenePort, panel: &mut dyn InfoPanel) {
        self.panel_open = false;
        panel.set_open(false);
        self.hide_annotation(port, panel);
    }

    /// Marks that the current click landed on a box, so the page-level click
    /// that follows does not close the panel it just opened.
    pub fn note_box_click(&mut self) {
        self.box_clicked = true;
    }

    /// Click anywhere outside the panel.
    pub fn click_outside(&mut self, port: &mut dyn ScenePort, panel: &mut dyn InfoPanel) {
        if std::mem::take(&mut self.box_clicked) {
            return;
        }
        if self.panel_open {
            self.close_panel(port, panel);
        }
    }

    pub fn show_annotation(&mut self, label: &str, description_html: &str, panel: &mut dyn InfoPanel) {
        let annotation = Annotation {
            title: display_title(label),
            description_html: description_html.to_string(),
        };
        panel.show_details(&annotation.title, &annotation.description_html);
        panel.set_open(true);
        self.details = Some(annotation);
        self.panel_open = true;
    }

    /// Drops the annotation and leaves focus mode, unless the user has
    /// switched the boxes off.
    pub fn hide_annotation(&mut self, port: &mut dyn ScenePort, panel: &mut dyn InfoPanel) {
        self.details = None;
        panel.hide_details();
        if self.boxes_visible {
            port.show_all_boxes();
        }
    }

    /// Flips the user's box visibility choice. Returns the new state.
    pub fn toggle_boxes(&mut self, port: &mut dyn ScenePort) -> bool {
        self.boxes_visible = !self.boxes_visible;
        if self.boxes_visible {
            port.show_all_boxes();
        } else {
            port.hide_all_boxes();
        }
        self.boxes_visible
    }

    /// Switches to `scene_id`: panel content, box visibility, box data and
    /// camera. Unknown ids are ignored.
    pub fn switch_scene(
        &mut self,
        scene_id: &str,
        config: &ViewerConfig,
        port: &mut dyn ScenePort,
        rig: Option<&mut dyn CameraRig>,
        panel: &mut dyn InfoPanel,
    ) -> bool {
        let Some(profile) = config.scene(scene_id) else {
            log::warn!("Unknown scene: {}", scene_id);
            return false;
        };
        log::info!("Switching to scene {}", scene_id);

        panel.set_scene(profile);
        self.objects.clear();
        panel.set_objects(&self.objects);
        self.hide_annotation(port, panel);

        self.boxes_visible = true;
        port.show_all_boxes();

        self.current_scene = Some(scene_id.to_string());
        self.last_camera = None;
        self.loading.show();
        panel.set_loading(&self.loading);
        port.load_scene_for_id(scene_id);

        self.reset_camera(config, rig);
        true
    }

    /// Reset button: hides the annotation and returns the camera to the
    /// scene's default view.
    pub fn reset_view(
        &mut self,
        config: &ViewerConfig,
        port: &mut dyn ScenePort,
        rig: Option<&mut dyn CameraRig>,
        panel: &mut dyn InfoPanel,
    ) -> Option<CameraPose> {
        self.hide_annotation(port, panel);
        self.reset_camera(config, rig)
    }

    /// Default pose of the current scene, falling back to the apartment view.
    pub fn reset_camera(
        &self,
        config: &ViewerConfig,
        rig: Option<&mut dyn CameraRig>,
    ) -> Option<CameraPose> {
        let Some(rig) = rig else {
            log::warn!("Camera controls not found; cannot reset camera");
            return None;
        };
        let profile = self
            .current_scene
            .as_deref()
            .and_then(|id| config.scene(id))
            .or_else(|| config.scene(FALLBACK_SCENE));
        let pose = match profile {
            Some(profile) => {
                if let Some(boundary) = &profile.boundary {
                    rig.set_boundary(boundary);
                }
                profile.default_pose()
            }
            None => CameraPose::new(
                Vec3::from_array(FALLBACK_POSITION),
                Vec3::from_array(FALLBACK_FOCUS),
            ),
        };
        rig.reset(&pose);
        Some(pose)
    }

    /// Periodic camera check. Hides the annotation once the camera moved
    /// since the previous observation. Returns whether it moved.
    pub fn observe_camera(
        &mut self,
        position: Vec3,
        rotation: Quat,
        port: &mut dyn ScenePort,
        panel: &mut dyn InfoPanel,
    ) -> bool {
        let Some((last_position, last_rotation)) = self.last_camera.replace((position, rotation))
        else {
            return false;
        };
        let position_delta = position.distance(last_position);
        // Summed per-component quaternion difference.
        let rotation_delta = (Vec4::from(rotation) - Vec4::from(last_rotation))
            .abs()
            .element_sum();
        let moved = position_delta > CAMERA_MOVE_THRESHOLD || rotation_delta > CAMERA_MOVE_THRESHOLD;
        if moved {
            self.hide_annotation(port, panel);
        }
        moved
    }

    /// Loaded box data: refresh the object list and drop the overlay.
    pub fn scene_loaded(&mut self, labels: &[String], panel: &mut dyn InfoPanel) {
        self.objects = labels.iter().map(|label| display_title(label)).collect();
        if self.objects.is_empty() {
            self.objects.push(NO_OBJECTS.to_string());
        }
        panel.set_objects(&self.objects);
        self.hide_loading(panel);
    }

    pub fn scene_load_failed(&mut self, panel: &mut dyn InfoPanel) {
        self.objects = vec![NO_OBJECTS.to_string()];
        panel.set_objects(&self.objects);
        self.hide_loading(panel);
    }

    /// Ticks the simulated loading bar.
    pub fn tick_loading(&mut self, panel: &mut dyn InfoPanel) {
        if self.loading.is_visible() {
            self.loading.advance();
            panel.set_loading(&self.loading);
        }
    }

    pub fn hide_loading(&mut self, panel: &mut dyn InfoPanel) {
        self.loading.hide();
        panel.set_loading(&self.loading);
    }
}

pub mod input;
pub mod inspector;
mod timing;

use crate::assets::SceneSource;
use crate::config::ViewerConfig;
use crate::render::{CameraPose, PerspectiveCamera, RenderSurface};
use crate::ui::{InfoPanel, PanelOrchestrator};
use input::{Cursor, PointerEvent};
use std::sync::Arc;
use timing::Interval;

pub use inspector::{BoxInspector, InspectorEvent};

const CAMERA_CHECK_PERIOD: f32 = 0.1;
const LOADING_TICK_PERIOD: f32 = 0.1;
const LOADING_FAILSAFE: f32 = 15.0;

/// Lifecycle hooks the host calls on its components.
pub trait Component {
    fn initialize(&mut self);
    fn update(&mut self, dt: f32);
    fn teardown(&mut self);
}

/// Entry points the page uses to drive the boxes of the current scene.
pub trait ScenePort {
    fn load_scene_for_id(&mut self, scene_id: &str);
    fn clear_boxes(&mut self);
    fn show_all_boxes(&mut self);
    fn hide_all_boxes(&mut self);
}

/// Wires the inspector, the page state and the camera together.
pub struct Viewer {
    inspector: BoxInspector,
    ui: PanelOrchestrator,
    panel: Box<dyn InfoPanel>,
    camera: PerspectiveCamera,
    cursor: Cursor,
    camera_check: Interval,
    loading_tick: Interval,
    loading_failsafe: Interval,
}

impl Viewer {
    pub fn new(
        config: ViewerConfig,
        source: Arc<dyn SceneSource>,
        surface: Box<dyn RenderSurface>,
        panel: Box<dyn InfoPanel>,
        viewport: (u32, u32),
    ) -> Self {
        Self {
            inspector: BoxInspector::new(config, source, surface),
            ui: PanelOrchestrator::new(),
            panel,
            camera: PerspectiveCamera::new(viewport),
            cursor: Cursor::Default,
            camera_check: Interval::new(CAMERA_CHECK_PERIOD),
            loading_tick: Interval::new(LOADING_TICK_PERIOD),
            loading_failsafe: Interval::new(LOADING_FAILSAFE),
        }
    }

    pub fn inspector(&self) -> &BoxInspector {
        &self.inspector
    }

    pub fn ui(&self) -> &PanelOrchestrator {
        &self.ui
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut PerspectiveCamera {
        &mut self.camera
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize(width, height);
    }

    pub fn switch_scene(&mut self, scene_id: &str) -> bool {
        let config = self.inspector.config().clone();
        let switched = self.ui.switch_scene(
            scene_id,
            &config,
            &mut self.inspector,
            Some(&mut self.camera),
            self.panel.as_mut(),
        );
        if switched {
            self.loading_failsafe.reset();
        }
        switched
    }

    pub fn handle_pointer(&mut self, event: &PointerEvent) -> Option<InspectorEvent> {
        let event = self.inspector.handle_pointer(event, Some(&self.camera))?;
        self.route(&event);
        Some(event)
    }

    /// Page click that did not land inside the panel.
    pub fn click_outside(&mut self) {
        self.ui.click_outside(&mut self.inspector, self.panel.as_mut());
    }

    pub fn toggle_panel(&mut self) {
        self.ui.toggle_panel(self.panel.as_mut());
    }

    pub fn close_panel(&mut self) {
        self.ui.close_panel(&mut self.inspector, self.panel.as_mut());
    }

    pub fn toggle_boxes(&mut self) -> bool {
        self.ui.toggle_boxes(&mut self.inspector)
    }

    pub fn reset_view(&mut self) -> Option<CameraPose> {
        let config = self.inspector.config().clone();
        self.ui.reset_view(
            &config,
            &mut self.inspector,
            Some(&mut self.camera),
            self.panel.as_mut(),
        )
    }

    /// "Move to Object": fly to the selected box, then close the panel.
    pub fn move_to_object(&mut self) -> Option<CameraPose> {
        let pose = self.inspector.move_camera_to_current(Some(&mut self.camera))?;
        if self.ui.is_panel_open() {
            self.ui.close_panel(&mut self.inspector, self.panel.as_mut());
        }
        Some(pose)
    }

    fn route(&mut self, event: &InspectorEvent) {
        match event {
            InspectorEvent::Selected {
                title,
                description_html,
                ..
            } => {
                self.ui.note_box_click();
                self.ui
                    .show_annotation(title, description_html, self.panel.as_mut());
            }
            InspectorEvent::CursorChanged(cursor) => self.cursor = *cursor,
            InspectorEvent::Loaded { labels, .. } => {
                self.ui.scene_loaded(labels, self.panel.as_mut());
            }
            InspectorEvent::LoadFailed { .. } => {
                self.ui.scene_load_failed(self.panel.as_mut());
            }
        }
    }
}

impl Component for Viewer {
    fn initialize(&mut self) {
        if self.inspector.config().auto_load {
            let scene = self.inspector.config().default_scene.clone();
            self.switch_scene(&scene);
        }
    }

    fn update(&mut self, dt: f32) {
        self.inspector.update(dt);
        for event in self.inspector.take_events() {
            self.route(&event);
        }

        if self.ui.loading().is_visible() {
            if self.loading_tick.tick(dt) {
                self.ui.tick_loading(self.panel.as_mut());
            }
            if self.loading_failsafe.tick(dt) {
                log::warn!("Scene still loading after {}s; hiding overlay", LOADING_FAILSAFE);
                self.ui.hide_loading(self.panel.as_mut());
            }
        }

        if self.camera_check.tick(dt) {
            self.ui.observe_camera(
                self.camera.position,
                self.camera.rotation(),
                &mut self.inspector,
                self.panel.as_mut(),
            );
        }
    }

    fn teardown(&mut self) {
        self.inspector.teardown();
    }
}

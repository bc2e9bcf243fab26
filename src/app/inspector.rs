use crate::app::input::{Cursor, Interaction, InteractionDispatcher, PointerEvent};
use crate::app::{Component, ScenePort};
use crate::assets::{LoadOutcome, SceneLoader, SceneSource};
use crate::config::ViewerConfig;
use crate::render::{plan_framing, CameraPose, CameraRig, RayProjector, RenderSurface};
use crate::scene::{BoundingBox, BoxRegistry, ParentTransform};
use std::sync::Arc;
use std::time::Duration;

/// What the page should react to after driving the inspector.
#[derive(Debug, Clone, PartialEq)]
pub enum InspectorEvent {
    /// A box was picked; show its details. `framing` is where
    /// "Move to Object" will put the camera.
    Selected {
        box_id: String,
        title: String,
        description_html: String,
        framing: CameraPose,
    },
    CursorChanged(Cursor),
    Loaded {
        url: String,
        count: usize,
        labels: Vec<String>,
    },
    LoadFailed {
        url: String,
    },
}

/// Bounding-box layer over a splat scene: loading, focus mode, picking and
/// fly-to.
pub struct BoxInspector {
    config: ViewerConfig,
    registry: BoxRegistry,
    loader: SceneLoader,
    dispatcher: InteractionDispatcher,
    surface: Box<dyn RenderSurface>,
    parent: Option<ParentTransform>,
    /// Placement of the scene being fetched; becomes `parent` only if the
    /// fetch succeeds.
    pending_parent: Option<ParentTransform>,
    current_box: Option<BoundingBox>,
    pending_events: Vec<InspectorEvent>,
}

impl BoxInspector {
    pub fn new(
        config: ViewerConfig,
        source: Arc<dyn SceneSource>,
        surface: Box<dyn RenderSurface>,
    ) -> Self {
        let registry = BoxRegistry::new(config.show_labels);
        Self {
            config,
            registry,
            loader: SceneLoader::new(source),
            dispatcher: InteractionDispatcher::new(),
            surface,
            parent: None,
            pending_parent: None,
            current_box: None,
            pending_events: Vec::new(),
        }
    }

    pub fn registry(&self) -> &BoxRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn cursor(&self) -> Cursor {
        self.dispatcher.cursor()
    }

    pub fn current_box(&self) -> Option<&BoundingBox> {
        self.current_box.as_ref()
    }

    pub fn parent_transform(&self) -> Option<&ParentTransform> {
        self.parent.as_ref()
    }

    /// Splat node transform; boxes loaded afterwards are placed under it.
    pub fn set_parent_transform(&mut self, parent: Option<ParentTransform>) {
        self.parent = parent;
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_pending()
    }

    /// Starts loading `url`; the registry changes once [`Component::update`]
    /// picks up the result.
    pub fn load_url(&mut self, url: &str) {
        self.request(url, None);
    }

    fn request(&mut self, url: &str, parent: Option<ParentTransform>) {
        log::info!("Loading bounding boxes from {}", url);
        self.loader.request(url);
        self.pending_parent = parent;
    }

    fn cancel_load(&mut self) {
        self.loader.cancel();
        self.pending_parent = None;
    }

    /// Blocks until the current load lands or `timeout` passes.
    pub fn wait_for_load(&mut self, timeout: Duration) -> Option<InspectorEvent> {
        let outcome = self.loader.wait(timeout)?;
        Some(self.apply_outcome(outcome))
    }

    /// Drains events produced outside of direct calls (finished loads).
    pub fn take_events(&mut self) -> Vec<InspectorEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn apply_outcome(&mut self, outcome: LoadOutcome) -> InspectorEvent {
        let parent = self.pending_parent.take();
        match outcome.result {
            Ok(document) => {
                if parent.is_some() {
                    self.parent = parent;
                }
                let labels = document.unique_labels();
                let count = document.bounding_boxes.len();
                self.current_box = None;
                self.dispatcher.clear_selection();
                self.registry.load(
                    document.bounding_boxes,
                    self.parent.as_ref(),
                    self.surface.as_mut(),
                );
                InspectorEvent::Loaded {
                    url: outcome.url,
                    count,
                    labels,
                }
            }
            Err(err) => {
                log::error!("Error loading bounding boxes: {}", err);
                InspectorEvent::LoadFailed { url: outcome.url }
            }
        }
    }

    pub fn handle_pointer(
        &mut self,
        event: &PointerEvent,
        camera: Option<&dyn RayProjector>,
    ) -> Option<InspectorEvent> {
        match self.dispatcher.handle(event, camera, &self.registry)? {
            Interaction::Select(hit) => self.select(&hit.box_id),
            Interaction::Cursor(cursor) => Some(InspectorEvent::CursorChanged(cursor)),
        }
    }

    /// Focus mode on `box_id` and describe it for the info panel.
    pub fn select(&mut self, box_id: &str) -> Option<InspectorEvent> {
        let data = self.registry.get(box_id)?.data().clone();
        self.registry
            .set_active(Some(box_id), self.surface.as_mut());
        let event = InspectorEvent::Selected {
            box_id: data.id.clone(),
            title: data.label.clone(),
            description_html: describe_box(&data),
            framing: plan_framing(&data, self.parent.as_ref()),
        };
        self.current_box = Some(data);
        Some(event)
    }

    /// Pose that frames the selected box, if any.
    pub fn current_framing(&self) -> Option<CameraPose> {
        self.current_box
            .as_ref()
            .map(|data| plan_framing(data, self.parent.as_ref()))
    }

    pub fn framing_for(&self, box_id: &str) -> Option<CameraPose> {
        self.registry
            .get(box_id)
            .map(|entity| plan_framing(entity.data(), self.parent.as_ref()))
    }

    /// Flies the rig to the selected box. Returns the applied pose; the
    /// caller closes the info panel.
    pub fn move_camera_to_current(&self, rig: Option<&mut dyn CameraRig>) -> Option<CameraPose> {
        let Some(rig) = rig else {
            log::warn!("BoxInspector: camera controls not found");
            return None;
        };
        let Some(pose) = self.current_framing() else {
            log::warn!("BoxInspector: no box selected");
            return None;
        };
        rig.reset(&pose);
        Some(pose)
    }
}

impl ScenePort for BoxInspector {
    fn load_scene_for_id(&mut self, scene_id: &str) {
        let Some(profile) = self.config.scene(scene_id) else {
            log::warn!("No bounding boxes defined for scene: {}", scene_id);
            self.cancel_load();
            self.clear_boxes();
            return;
        };
        let parent = profile.splat.transform();
        match profile.box_data_url.clone() {
            Some(url) => self.request(&url, Some(parent)),
            None => {
                log::warn!("No bounding boxes defined for scene: {}", scene_id);
                self.cancel_load();
                self.parent = Some(parent);
                self.clear_boxes();
            }
        }
    }

    fn clear_boxes(&mut self) {
        self.current_box = None;
        self.dispatcher.clear_selection();
        self.registry.clear(self.surface.as_mut());
    }

    fn show_all_boxes(&mut self) {
        self.dispatcher.clear_selection();
        self.registry.show_all(self.surface.as_mut());
    }

    fn hide_all_boxes(&mut self) {
        self.registry.hide_all(self.surface.as_mut());
    }
}

impl Component for BoxInspector {
    fn initialize(&mut self) {
        if self.config.auto_load {
            let scene = self.config.default_scene.clone();
            self.load_scene_for_id(&scene);
        }
    }

    fn update(&mut self, _dt: f32) {
        if let Some(outcome) = self.loader.poll() {
            let event = self.apply_outcome(outcome);
            self.pending_events.push(event);
        }
    }

    fn teardown(&mut self) {
        self.cancel_load();
        self.clear_boxes();
    }
}

fn describe_box(data: &BoundingBox) -> String {
    format!(
        "<p><strong>Confidence:</strong> {:.1}%</p>\n\
         <p><strong>Position:</strong> ({:.2}, {:.2}, {:.2})</p>\n\
         <p><strong>Size:</strong> {:.2} x {:.2} x {:.2} m</p>\n\
         <button id=\"go-to-object-btn\">Move to Object</button>",
        data.confidence * 100.0,
        data.position[0],
        data.position[1],
        data.position[2],
        data.size[0],
        data.size[1],
        data.size[2],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::tests::{MemorySource, DOC_A, DOC_B};
    use crate::config::{SceneProfile, SplatPlacement};
    use crate::render::{NullSurface, PerspectiveCamera, Ray};
    use glam::Vec3;

    const WAIT: Duration = Duration::from_secs(5);

    fn test_config() -> ViewerConfig {
        let placement = SplatPlacement {
            position: [0.0; 3],
            rotation_deg: [0.0; 3],
        };
        let profile = |id: &str, url: Option<&str>| SceneProfile {
            id: id.to_string(),
            title: id.to_string(),
            asset: id.to_string(),
            box_data_url: url.map(str::to_string),
            splat: placement,
            camera_focus: [0.0; 3],
            camera_position: [0.0, 0.0, 5.0],
            boundary: None,
            info: Default::default(),
        };
        ViewerConfig {
            default_scene: "a".to_string(),
            auto_load: true,
            show_labels: false,
            data_root: ".".to_string(),
            scenes: vec![
                profile("a", Some("a.json")),
                profile("b", Some("b.json")),
                profile("empty", None),
                SceneProfile {
                    splat: SplatPlacement {
                        position: [10.0, 0.0, 0.0],
                        rotation_deg: [0.0; 3],
                    },
                    ..profile("offline", Some("missing.json"))
                },
            ],
        }
    }

    fn inspector() -> BoxInspector {
        let source = Arc::new(MemorySource::with(&[("a.json", DOC_A), ("b.json", DOC_B)]));
        BoxInspector::new(test_config(), source, Box::new(NullSurface::new()))
    }

    struct FixedRay(Ray);

    impl RayProjector for FixedRay {
        fn screen_ray(&self, _x: f32, _y: f32) -> Option<Ray> {
            Some(self.0)
        }
    }

    #[test]
    fn initialize_loads_default_scene() {
        let mut inspector = inspector();
        inspector.initialize();
        assert!(inspector.is_loading());
        let event = inspector.wait_for_load(WAIT).unwrap();
        assert_eq!(
            event,
            InspectorEvent::Loaded {
                url: "a.json".to_string(),
                count: 2,
                labels: vec!["lamp".to_string(), "sofa".to_string()],
            }
        );
        assert_eq!(inspector.registry().len(), 2);
    }

    #[test]
    fn switching_scenes_replaces_boxes() {
        let mut inspector = inspector();
        inspector.load_scene_for_id("a");
        inspector.wait_for_load(WAIT).unwrap();
        inspector.load_scene_for_id("b");
        inspector.wait_for_load(WAIT).unwrap();
        assert_eq!(inspector.registry().len(), 1);
        assert!(inspector.registry().get("b1").is_some());
        assert!(inspector.registry().get("a1").is_none());
    }

    #[test]
    fn failed_load_keeps_previous_boxes() {
        let mut inspector = inspector();
        inspector.load_scene_for_id("a");
        inspector.wait_for_load(WAIT).unwrap();

        inspector.load_url("missing.json");
        let event = inspector.wait_for_load(WAIT).unwrap();
        assert_eq!(
            event,
            InspectorEvent::LoadFailed {
                url: "missing.json".to_string()
            }
        );
        assert_eq!(inspector.registry().len(), 2);
    }

    #[test]
    fn failed_scene_switch_keeps_previous_placement() {
        let mut inspector = inspector();
        inspector.load_scene_for_id("a");
        inspector.wait_for_load(WAIT).unwrap();
        let before = inspector.framing_for("a1").unwrap();
        let parent = inspector.parent_transform().copied();

        inspector.load_scene_for_id("offline");
        let event = inspector.wait_for_load(WAIT).unwrap();
        assert!(matches!(event, InspectorEvent::LoadFailed { .. }));
        assert_eq!(inspector.framing_for("a1").unwrap(), before);
        assert_eq!(inspector.parent_transform().copied(), parent);
        assert_eq!(before.look_at, Vec3::ZERO);
    }

    #[test]
    fn successful_scene_switch_adopts_new_placement() {
        let source = Arc::new(MemorySource::with(&[("a.json", DOC_A), ("moved.json", DOC_B)]));
        let mut config = test_config();
        config.scenes[1].box_data_url = Some("moved.json".to_string());
        config.scenes[1].splat.position = [10.0, 0.0, 0.0];
        let mut inspector = BoxInspector::new(config, source, Box::new(NullSurface::new()));
        inspector.load_scene_for_id("a");
        inspector.wait_for_load(WAIT).unwrap();

        inspector.load_scene_for_id("b");
        assert_eq!(inspector.parent_transform().unwrap().transform_point(Vec3::ZERO), Vec3::ZERO);
        inspector.wait_for_load(WAIT).unwrap();
        assert_eq!(
            inspector.framing_for("b1").unwrap().look_at,
            Vec3::new(10.0, 0.0, -3.0)
        );
    }

    #[test]
    fn unknown_or_empty_scene_clears_boxes() {
        let mut inspector = inspector();
        inspector.load_scene_for_id("a");
        inspector.wait_for_load(WAIT).unwrap();
        inspector.load_scene_for_id("garage");
        assert!(inspector.registry().is_empty());

        inspector.load_scene_for_id("a");
        inspector.wait_for_load(WAIT).unwrap();
        inspector.load_scene_for_id("empty");
        assert!(inspector.registry().is_empty());
        assert!(!inspector.is_loading());
    }

    #[test]
    fn update_delivers_finished_loads_as_events() {
        let mut inspector = inspector();
        inspector.load_scene_for_id("b");
        let mut events = Vec::new();
        for _ in 0..500 {
            inspector.update(0.016);
            events = inspector.take_events();
            if !events.is_empty() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(matches!(events.as_slice(), [InspectorEvent::Loaded { count: 1, .. }]));
    }

    #[test]
    fn selecting_a_box_enters_focus_mode_and_describes_it() {
        let mut inspector = inspector();
        inspector.load_scene_for_id("a");
        inspector.wait_for_load(WAIT).unwrap();

        let camera = FixedRay(Ray::new(Vec3::new(-10.0, 0.0, 0.0), Vec3::X));
        let event = inspector
            .handle_pointer(&PointerEvent::down(0.0, 0.0), Some(&camera))
            .unwrap();
        match event {
            InspectorEvent::Selected {
                box_id,
                title,
                description_html,
                framing,
            } => {
                assert_eq!(box_id, "a1");
                assert_eq!(framing.eye, Vec3::new(1.5, 1.5, 1.5));
                assert_eq!(title, "sofa");
                assert!(description_html.contains("Confidence:</strong> 90.0%"));
                assert!(description_html.contains("(0.00, 0.00, 0.00)"));
                assert!(description_html.contains("1.00 x 1.00 x 1.00 m"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(inspector.registry().active_id(), Some("a1"));
        assert!(!inspector.registry().get("a2").unwrap().is_enabled());

        inspector.show_all_boxes();
        assert!(inspector.registry().entities().iter().all(|e| e.is_pickable()));
    }

    #[test]
    fn move_camera_uses_planned_framing() {
        let mut inspector = inspector();
        inspector.load_scene_for_id("a");
        inspector.wait_for_load(WAIT).unwrap();
        inspector.select("a2").unwrap();

        let mut camera = PerspectiveCamera::new((800, 600));
        let pose = inspector.move_camera_to_current(Some(&mut camera)).unwrap();
        assert_eq!(pose.look_at, Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(pose.eye, Vec3::new(4.5, 1.5, 1.5));
        assert_eq!(camera.position, pose.eye);

        assert!(inspector.move_camera_to_current(None).is_none());
    }

    #[test]
    fn teardown_removes_everything() {
        let mut inspector = inspector();
        inspector.load_scene_for_id("a");
        inspector.wait_for_load(WAIT).unwrap();
        inspector.teardown();
        assert!(inspector.registry().is_empty());
        assert!(inspector.current_box().is_none());
    }
}

use crate::config::SceneBoundary;
use crate::render::pick::Ray;
use crate::scene::{BoundingBox, FocusPoint, ParentTransform, ViewConfig};
use glam::{Mat3, Mat4, Quat, Vec3};

const DEFAULT_YAW_DEG: f32 = 45.0;
const DEFAULT_PITCH_DEG: f32 = 20.0;
const PITCH_LIMIT_DEG: f32 = 85.0;
const DEFAULT_OFFSET_FACTOR: f32 = 1.5;
const DISTANCE_FACTOR: f32 = 3.0;
const MIN_DISTANCE: f32 = 1.0;

/// Where the camera sits and what it looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub eye: Vec3,
    pub look_at: Vec3,
}

impl CameraPose {
    pub fn new(eye: Vec3, look_at: Vec3) -> Self {
        Self { eye, look_at }
    }

    /// Orbit distance, used as the controller's starting zoom.
    pub fn distance(&self) -> f32 {
        self.eye.distance(self.look_at)
    }
}

/// Camera controller driven by fly-to and scene resets.
pub trait CameraRig {
    fn reset(&mut self, pose: &CameraPose);

    /// Limits for the host's orbit controls. Rigs without user navigation
    /// ignore it.
    fn set_boundary(&mut self, _boundary: &SceneBoundary) {}
}

/// Screen to world projection through the active camera.
pub trait RayProjector {
    /// `x`, `y` in canvas pixels, top-left origin.
    fn screen_ray(&self, x: f32, y: f32) -> Option<Ray>;
}

// ========================================================================
// Framing
// ========================================================================

/// Camera pose that frames `bbox`, honoring its `focusPoint` and `view`.
pub fn plan_framing(bbox: &BoundingBox, parent: Option<&ParentTransform>) -> CameraPose {
    let focus = focus_point(bbox, parent);
    let offset = view_offset(bbox, parent);
    CameraPose::new(focus + offset, focus)
}

fn focus_point(bbox: &BoundingBox, parent: Option<&ParentTransform>) -> Vec3 {
    let position = Vec3::from_array(bbox.position);
    let center = parent.map_or(position, |p| p.transform_point(position));

    match bbox.focus_point {
        None => center,
        Some(FocusPoint::Absolute(point)) => Vec3::from_array(point),
        Some(FocusPoint::Offset { offset, local }) => {
            let offset = Vec3::from_array(offset);
            let shift = match parent {
                Some(p) if local => p.transform_vector(offset),
                Some(p) => p.transform_point(offset),
                None => offset,
            };
            center + shift
        }
    }
}

fn view_offset(bbox: &BoundingBox, parent: Option<&ParentTransform>) -> Vec3 {
    let size = Vec3::from_array(bbox.size);
    let base_distance = (size.max_element() * DISTANCE_FACTOR).max(MIN_DISTANCE);

    match bbox.view {
        None => size * DEFAULT_OFFSET_FACTOR,
        Some(ViewConfig::Offset(offset)) => {
            let offset = Vec3::from_array(offset);
            parent.map_or(offset, |p| p.transform_point(offset))
        }
        Some(ViewConfig::Spherical(view)) => orbit_direction(
            view.yaw.unwrap_or(DEFAULT_YAW_DEG),
            view.pitch.unwrap_or(DEFAULT_PITCH_DEG),
        ) * view.distance.unwrap_or(base_distance),
        // Camera sits behind the look direction.
        Some(ViewConfig::Euler(view)) => -orbit_direction(
            view.yaw.unwrap_or(DEFAULT_YAW_DEG),
            view.pitch.unwrap_or(DEFAULT_PITCH_DEG),
        ) * view.distance.unwrap_or(base_distance),
    }
}

/// Unit vector for yaw around +Y (0 = +Z) and pitch above the XZ plane.
fn orbit_direction(yaw_deg: f32, pitch_deg: f32) -> Vec3 {
    let yaw = yaw_deg.to_radians();
    let pitch = pitch_deg.clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG).to_radians();
    Vec3::new(
        pitch.cos() * yaw.sin(),
        pitch.sin(),
        pitch.cos() * yaw.cos(),
    )
}

// ========================================================================
// PerspectiveCamera
// ========================================================================

/// Free camera with a yaw/pitch orientation, used for picking and as the
/// default rig when the host has none of its own.
#[derive(Debug, Clone, Copy)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov_y_deg: f32,
    pub near_clip: f32,
    pub far_clip: f32,
    pub viewport: (u32, u32),
    pub focus: Vec3,
}

impl PerspectiveCamera {
    pub fn new(viewport: (u32, u32)) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            yaw: -std::f32::consts::FRAC_PI_2,
            pitch: 0.0,
            fov_y_deg: 75.0,
            near_clip: 0.01,
            far_clip: 1000.0,
            viewport,
            focus: Vec3::ZERO,
        }
    }

    pub fn look_at(&mut self, eye: Vec3, target: Vec3) {
        let (yaw, pitch) = forward_to_yaw_pitch(target - eye);
        self.position = eye;
        self.yaw = yaw;
        self.pitch = pitch;
        self.focus = target;
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        camera_basis(self.yaw, self.pitch)
    }

    pub fn forward(&self) -> Vec3 {
        self.basis().0
    }

    /// Orientation with the camera looking down its local -Z.
    pub fn rotation(&self) -> Quat {
        let (forward, right, up) = self.basis();
        Quat::from_mat3(&Mat3::from_cols(right, up, -forward))
    }

    fn view_projection(&self) -> Option<Mat4> {
        let (width, height) = self.viewport;
        if width == 0 || height == 0 {
            return None;
        }
        let (forward, _right, up) = self.basis();
        let view = Mat4::look_to_rh(self.position, forward, up);
        let aspect = width as f32 / height as f32;
        let projection = Mat4::perspective_rh(
            self.fov_y_deg.to_radians(),
            aspect,
            self.near_clip,
            self.far_clip,
        );
        Some(projection * view)
    }
}

impl RayProjector for PerspectiveCamera {
    fn screen_ray(&self, x: f32, y: f32) -> Option<Ray> {
        let view_projection = self.view_projection()?;
        let (width, height) = self.viewport;
        let ndc_x = 2.0 * x / width as f32 - 1.0;
        let ndc_y = 1.0 - 2.0 * y / height as f32;
        // perspective_rh maps the far plane to depth 1.
        let far_point = view_projection
            .inverse()
            .project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        if !far_point.is_finite() {
            return None;
        }
        let ray = Ray::towards(self.position, far_point);
        ray.is_finite().then_some(ray)
    }
}

impl CameraRig for PerspectiveCamera {
    fn reset(&mut self, pose: &CameraPose) {
        self.look_at(pose.eye, pose.look_at);
    }
}

fn forward_to_yaw_pitch(forward: Vec3) -> (f32, f32) {
    let direction = forward / forward.length().max(1e-6);
    let yaw = direction.z.atan2(direction.x);
    let pitch = direction.y.clamp(-1.0, 1.0).asin();
    (yaw, pitch)
}

fn camera_basis(yaw: f32, pitch: f32) -> (Vec3, Vec3, Vec3) {
    let cos_pitch = pitch.cos();
    let forward = Vec3::new(yaw.cos() * cos_pitch, pitch.sin(), yaw.sin() * cos_pitch);
    let right = Vec3::new(-yaw.sin(), 0.0, yaw.cos());
    let up = right.cross(forward).normalize_or_zero();
    (forward, right, up)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{test_box, EulerView, SphericalView};
    use approx::assert_abs_diff_eq;

    fn assert_vec_eq(actual: Vec3, expected: [f32; 3]) {
        assert_abs_diff_eq!(actual.x, expected[0], epsilon = 1e-5);
        assert_abs_diff_eq!(actual.y, expected[1], epsilon = 1e-5);
        assert_abs_diff_eq!(actual.z, expected[2], epsilon = 1e-5);
    }

    #[test]
    fn default_offset_is_scaled_size() {
        let bbox = test_box("a", [1.0, 2.0, 3.0], [0.2, 0.4, 0.6]);
        let pose = plan_framing(&bbox, None);
        assert_vec_eq(pose.look_at, [1.0, 2.0, 3.0]);
        assert_vec_eq(pose.eye, [1.3, 2.6, 3.9]);
    }

    #[test]
    fn spherical_zero_angles_places_camera_on_z() {
        let mut bbox = test_box("a", [0.5, 0.0, -1.0], [1.0, 1.0, 1.0]);
        bbox.view = Some(ViewConfig::Spherical(SphericalView {
            distance: Some(4.0),
            yaw: Some(0.0),
            pitch: Some(0.0),
        }));
        let pose = plan_framing(&bbox, None);
        assert_vec_eq(pose.eye, [0.5, 0.0, 3.0]);
    }

    #[test]
    fn spherical_yaw_ninety_example() {
        let mut bbox = test_box("b1", [0.0, 1.0, 0.0], [1.0, 1.0, 1.0]);
        bbox.view = Some(ViewConfig::Spherical(SphericalView {
            distance: Some(2.0),
            yaw: Some(90.0),
            pitch: Some(0.0),
        }));
        let pose = plan_framing(&bbox, None);
        assert_vec_eq(pose.eye, [2.0, 1.0, 0.0]);
        assert_vec_eq(pose.look_at, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn spherical_defaults_and_pitch_clamp() {
        let mut bbox = test_box("a", [0.0; 3], [0.1, 0.1, 0.1]);
        bbox.view = Some(ViewConfig::Spherical(SphericalView::default()));
        let pose = plan_framing(&bbox, None);
        // max(size) * 3 is below the floor, so distance is 1.
        assert_abs_diff_eq!(pose.distance(), 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(pose.eye.y, 20f32.to_radians().sin(), epsilon = 1e-5);

        bbox.view = Some(ViewConfig::Spherical(SphericalView {
            distance: Some(2.0),
            yaw: Some(0.0),
            pitch: Some(120.0),
        }));
        let pose = plan_framing(&bbox, None);
        assert_abs_diff_eq!(pose.eye.y, 2.0 * 85f32.to_radians().sin(), epsilon = 1e-5);
    }

    #[test]
    fn euler_places_camera_behind_look_direction() {
        let mut bbox = test_box("a", [0.0; 3], [2.0, 1.0, 1.0]);
        bbox.view = Some(ViewConfig::Euler(EulerView {
            yaw: Some(0.0),
            pitch: Some(0.0),
            roll: Some(30.0),
            distance: None,
        }));
        let pose = plan_framing(&bbox, None);
        // Distance defaults to max(size) * 3.
        assert_vec_eq(pose.eye, [0.0, 0.0, -6.0]);
    }

    #[test]
    fn focus_point_shapes() {
        let parent = ParentTransform::from_position_rotation([0.0, 1.0, 0.0], [0.0, 90.0, 0.0]);
        let mut bbox = test_box("a", [0.0; 3], [1.0; 3]);

        bbox.focus_point = Some(FocusPoint::Offset {
            offset: [1.0, 0.0, 0.0],
            local: true,
        });
        let pose = plan_framing(&bbox, Some(&parent));
        assert_vec_eq(pose.look_at, [0.0, 1.0, -1.0]);

        bbox.focus_point = Some(FocusPoint::Offset {
            offset: [1.0, 0.0, 0.0],
            local: false,
        });
        let pose = plan_framing(&bbox, Some(&parent));
        assert_vec_eq(pose.look_at, [0.0, 2.0, -1.0]);

        bbox.focus_point = Some(FocusPoint::Absolute([5.0, 5.0, 5.0]));
        let pose = plan_framing(&bbox, Some(&parent));
        assert_vec_eq(pose.look_at, [5.0, 5.0, 5.0]);
    }

    #[test]
    fn view_offset_goes_through_parent_transform() {
        let parent = ParentTransform::from_position_rotation([0.0, 1.0, 0.0], [0.0; 3]);
        let mut bbox = test_box("a", [0.0; 3], [1.0; 3]);
        bbox.view = Some(ViewConfig::Offset([0.0, 0.0, 2.0]));
        let pose = plan_framing(&bbox, Some(&parent));
        assert_vec_eq(pose.look_at, [0.0, 1.0, 0.0]);
        assert_vec_eq(pose.eye, [0.0, 2.0, 2.0]);
    }

    #[test]
    fn center_ray_follows_forward() {
        let mut camera = PerspectiveCamera::new((800, 600));
        camera.look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        let ray = camera.screen_ray(400.0, 300.0).unwrap();
        assert_vec_eq(ray.origin, [0.0, 0.0, 5.0]);
        assert_abs_diff_eq!(ray.direction.x, 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(ray.direction.y, 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(ray.direction.z, -1.0, epsilon = 1e-3);

        let left = camera.screen_ray(0.0, 300.0).unwrap();
        assert!(left.direction.x < 0.0);
        let top = camera.screen_ray(400.0, 0.0).unwrap();
        assert!(top.direction.y > 0.0);
    }

    #[test]
    fn empty_viewport_has_no_ray() {
        let camera = PerspectiveCamera::new((0, 0));
        assert!(camera.screen_ray(1.0, 1.0).is_none());
    }

    #[test]
    fn rig_reset_aims_at_pose() {
        let mut camera = PerspectiveCamera::new((640, 480));
        let pose = CameraPose::new(Vec3::new(0.5, 1.0, 0.5), Vec3::new(0.0, 1.0, 0.0));
        camera.reset(&pose);
        assert_eq!(camera.position, pose.eye);
        assert_eq!(camera.focus, pose.look_at);
        let expected = (pose.look_at - pose.eye).normalize();
        assert_vec_eq(camera.forward(), expected.to_array());
        assert_vec_eq(camera.rotation() * Vec3::NEG_Z, expected.to_array());
    }

    #[test]
    fn boundary_leaves_reset_pose_alone() {
        // Office default eye sits outside its own boundary.
        let mut camera = PerspectiveCamera::new((640, 480));
        let pose = CameraPose::new(Vec3::new(-1.0, 0.0, 0.0), Vec3::ZERO);
        camera.set_boundary(&SceneBoundary {
            min: [-0.9, -0.2, -0.9],
            max: [1.3, 0.7, 0.8],
        });
        camera.reset(&pose);
        assert_eq!(camera.position, pose.eye);
        assert_eq!(camera.focus, pose.look_at);
    }
}

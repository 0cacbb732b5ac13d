//! Camera model and projection helpers for headless rendering

use nalgebra::{Matrix4, Perspective3, Point3, Vector3};
use viscrate_gpu::CameraMatrices;

/// Horizontal field of view of the framing camera, in degrees
pub const HORIZONTAL_FOV_DEGREES: f32 = 60.0;
pub const NEAR_PLANE: f32 = 1.0;
pub const FAR_PLANE: f32 = 500.0;

/// Vertical field of view (radians) that yields `fov_x` (radians) horizontally
pub fn vertical_fov(fov_x: f32, aspect_ratio: f32) -> f32 {
    2.0 * ((fov_x * 0.5).tan() / aspect_ratio).atan()
}

/// A perspective camera
///
/// `fov` is the vertical field of view in radians.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Create a new camera
    pub fn new(
        position: Point3<f32>,
        target: Point3<f32>,
        up: Vector3<f32>,
        fov: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            target,
            up,
            fov,
            aspect_ratio,
            near,
            far,
        }
    }

    /// Camera with the framing projection for a `width` x `height` output
    pub fn for_viewport(width: u32, height: u32) -> Self {
        let mut camera = Self::default();
        camera.set_projection_horizontal(HORIZONTAL_FOV_DEGREES, width as f32 / height.max(1) as f32, NEAR_PLANE, FAR_PLANE);
        camera
    }

    /// Set the projection from a horizontal field of view in degrees
    pub fn set_projection_horizontal(&mut self, fov_x_degrees: f32, aspect_ratio: f32, near: f32, far: f32) {
        self.fov = vertical_fov(fov_x_degrees.to_radians(), aspect_ratio);
        self.aspect_ratio = aspect_ratio;
        self.near = near;
        self.far = far;
    }

    /// Point the camera at `center` from `eye`
    pub fn look_at(&mut self, center: Point3<f32>, eye: Point3<f32>, up: Vector3<f32>) {
        self.target = center;
        self.position = eye;
        self.up = up;
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Get the projection matrix (OpenGL depth convention)
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let perspective = Perspective3::new(self.aspect_ratio, self.fov, self.near, self.far);
        perspective.into_inner()
    }

    /// Matrices handed to the rendering engine
    pub fn matrices(&self) -> CameraMatrices {
        CameraMatrices {
            view: self.view_matrix(),
            projection: self.projection_matrix(),
            eye: self.position,
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(
            Point3::new(0.0, 0.0, 5.0),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::y(),
            std::f32::consts::FRAC_PI_4,
            16.0 / 9.0,
            NEAR_PLANE,
            FAR_PLANE,
        )
    }
}

//! Camera types, orbit controller and uniforms for view/projection.
//!
//! The camera orbits a fixed target. Mouse drag steers goal yaw/pitch and
//! the scroll wheel steers the goal radius; [`OrbitController::update`]
//! moves the current angles toward those goals with exponential damping,
//! one step per frame. The damping step is the only camera work the render
//! loop performs, so the controller never blocks or allocates.

use std::time::Duration;

use cgmath::{InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3, perspective};
use wgpu::util::DeviceExt;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Keep the orbit off the poles so the view-up vector stays valid.
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;
const MIN_RADIUS: f32 = 0.5;
const MAX_RADIUS: f32 = 50.0;

/// cgmath produces clip-space Z in [-1, 1] (OpenGL convention); wgpu wants
/// [0, 1].
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// View state: where the camera sits and what it looks at.
#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P, target: P) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, Vector3::unit_y())
    }
}

/// Perspective projection parameters. Only the aspect ratio changes after
/// startup, and only through [`Projection::resize`].
#[derive(Clone, Debug)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Orbit-style camera controller with damped motion.
#[derive(Clone, Debug)]
pub struct OrbitController {
    yaw: f32,
    pitch: f32,
    radius: f32,
    goal_yaw: f32,
    goal_pitch: f32,
    goal_radius: f32,
    /// Damping rate per second; higher snaps faster.
    smoothing: f32,
    rotate_speed: f32,
    zoom_speed: f32,
    dragging: bool,
}

impl OrbitController {
    /// Build a controller whose orbit passes through `eye` while looking at
    /// `target`.
    pub fn looking_from(eye: Point3<f32>, target: Point3<f32>) -> Self {
        let offset = eye - target;
        let radius = offset.magnitude().max(MIN_RADIUS);
        let yaw = offset.x.atan2(offset.z);
        let pitch = (offset.y / radius).clamp(-1.0, 1.0).asin();
        Self {
            yaw,
            pitch,
            radius,
            goal_yaw: yaw,
            goal_pitch: pitch,
            goal_radius: radius,
            smoothing: 10.0,
            rotate_speed: 0.005,
            zoom_speed: 0.25,
            dragging: false,
        }
    }

    /// Raw mouse deltas steer the goal angles while the left button is held.
    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        if !self.dragging {
            return;
        }
        self.goal_yaw -= dx as f32 * self.rotate_speed;
        self.goal_pitch =
            (self.goal_pitch + dy as f32 * self.rotate_speed).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn handle_scroll(&mut self, delta: f32) {
        self.goal_radius = (self.goal_radius - delta * self.zoom_speed).clamp(MIN_RADIUS, MAX_RADIUS);
    }

    /// Track the button and wheel state this controller reacts to.
    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = *state == ElementState::Pressed;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 * 0.01,
                };
                self.handle_scroll(amount);
            }
            _ => {}
        }
    }

    /// One damping step: move the current orbit toward the goal orbit and
    /// reposition the camera accordingly.
    pub fn update(&mut self, camera: &mut Camera, dt: Duration) {
        let t = 1.0 - (-self.smoothing * dt.as_secs_f32()).exp();
        self.yaw += (self.goal_yaw - self.yaw) * t;
        self.pitch += (self.goal_pitch - self.pitch) * t;
        self.radius += (self.goal_radius - self.radius) * t;

        let offset = Vector3::new(
            self.radius * self.pitch.cos() * self.yaw.sin(),
            self.radius * self.pitch.sin(),
            self.radius * self.pitch.cos() * self.yaw.cos(),
        );
        camera.position = camera.target + offset;
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
}

/// The camera data as bound in shaders: combined view-projection plus the
/// bare view matrix, which the matcap shader needs to move normals into
/// view space.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
            view: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        let view = camera.view_matrix();
        self.view_proj = (projection.matrix() * view).into();
        self.view = view.into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything camera-related the context owns: CPU state plus the GPU
/// uniform buffer and its bind group.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(
        device: &wgpu::Device,
        camera: Camera,
        controller: OrbitController,
        projection: &Projection,
    ) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("camera_bind_group_layout"),
            });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            controller,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_updates_aspect_ratio_exactly() {
        let mut projection = Projection::new(800, 600, cgmath::Deg(75.0), 0.1, 100.0);
        projection.resize(1920, 1080);
        assert_eq!(projection.aspect, 1920.0 / 1080.0);
    }

    #[test]
    fn controller_starts_at_rest_on_its_eye() {
        let eye = Point3::new(1.0, 1.0, 2.0);
        let target = Point3::new(0.0, 0.0, 0.0);
        let mut controller = OrbitController::looking_from(eye, target);
        let mut camera = Camera::new(eye, target);
        controller.update(&mut camera, Duration::from_millis(16));
        // No pending input: the camera must not drift off its start position.
        assert!((camera.position - eye).magnitude() < 1e-4);
    }

    #[test]
    fn damping_converges_on_dragged_goal() {
        let eye = Point3::new(0.0, 0.0, 2.0);
        let target = Point3::new(0.0, 0.0, 0.0);
        let mut controller = OrbitController::looking_from(eye, target);
        let mut camera = Camera::new(eye, target);

        controller.dragging = true;
        controller.handle_mouse(100.0, 0.0);
        let goal = controller.goal_yaw;
        for _ in 0..600 {
            controller.update(&mut camera, Duration::from_millis(16));
        }
        assert!((controller.yaw() - goal).abs() < 1e-4);
    }

    #[test]
    fn pitch_is_clamped_below_the_pole() {
        let mut controller = OrbitController::looking_from(
            Point3::new(0.0, 0.0, 2.0),
            Point3::new(0.0, 0.0, 0.0),
        );
        controller.dragging = true;
        controller.handle_mouse(0.0, 1_000_000.0);
        assert!(controller.goal_pitch <= PITCH_LIMIT);
    }

    #[test]
    fn ignores_mouse_motion_unless_dragging() {
        let mut controller = OrbitController::looking_from(
            Point3::new(0.0, 0.0, 2.0),
            Point3::new(0.0, 0.0, 0.0),
        );
        let goal = controller.goal_yaw;
        controller.handle_mouse(50.0, 0.0);
        assert_eq!(controller.goal_yaw, goal);
    }

    #[test]
    fn scroll_zoom_respects_radius_bounds() {
        let mut controller = OrbitController::looking_from(
            Point3::new(0.0, 0.0, 2.0),
            Point3::new(0.0, 0.0, 0.0),
        );
        controller.handle_scroll(1_000.0);
        assert!(controller.goal_radius >= MIN_RADIUS);
        controller.handle_scroll(-10_000.0);
        assert!(controller.goal_radius <= MAX_RADIUS);
    }
}

//! Central GPU and window context.
//!
//! [`Context`] owns everything with process lifetime: window, surface,
//! device, queue, camera resources and the matcap pipeline. It is built once
//! at startup and passed by reference into the populator, the frame driver
//! and the resize handler, so there is no hidden global state.

use std::sync::Arc;

use winit::window::Window;

use crate::{
    camera::{Camera, CameraResources, OrbitController, Projection},
    data_structures::texture::Texture,
    pipelines::matcap,
};

/// Highest device pixel ratio the renderer will honor. Denser displays are
/// clamped to bound fill-rate cost.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Camera start position, matching the framing of the demo scene.
const CAMERA_EYE: (f32, f32, f32) = (1.0, 1.0, 2.0);
const CAMERA_FOVY_DEG: f32 = 75.0;
const CAMERA_ZNEAR: f32 = 0.1;
const CAMERA_ZFAR: f32 = 100.0;

/// Output surface dimensions plus the host-reported pixel density.
///
/// The surface is sized in physical pixels but never at more than
/// [`MAX_PIXEL_RATIO`] physical pixels per logical pixel.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub scale_factor: f64,
}

impl Viewport {
    /// `width`/`height` are physical pixels as reported by winit (already
    /// multiplied by the full scale factor).
    pub fn new(width: u32, height: u32, scale_factor: f64) -> Self {
        Self {
            width,
            height,
            scale_factor,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Render-surface dimensions with the pixel density clamped to
    /// [`MAX_PIXEL_RATIO`].
    pub fn surface_size(&self) -> (u32, u32) {
        let clamp = (MAX_PIXEL_RATIO / self.scale_factor).min(1.0);
        let width = (self.width as f64 * clamp).round() as u32;
        let height = (self.height as f64 * clamp).round() as u32;
        (width.max(1), height.max(1))
    }
}

#[derive(Debug)]
pub struct Context {
    pub window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub viewport: Viewport,
    pub camera: CameraResources,
    pub projection: Projection,
    pub depth_texture: Texture,
    pub material_layout: wgpu::BindGroupLayout,
    pub pipeline: wgpu::RenderPipeline,
    pub clear_colour: wgpu::Color,
}

impl Context {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let viewport = Viewport::new(size.width, size.height, window.scale_factor());

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The matcap shader assumes an sRGB surface; non-sRGB formats would
        // render everything darker.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let (surface_width, surface_height) = viewport.surface_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: surface_width,
            height: surface_height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let camera = Camera::new(CAMERA_EYE, (0.0, 0.0, 0.0));
        let controller = OrbitController::looking_from(camera.position, camera.target);
        let projection = Projection::new(
            config.width,
            config.height,
            cgmath::Deg(CAMERA_FOVY_DEG),
            CAMERA_ZNEAR,
            CAMERA_ZFAR,
        );
        let camera = CameraResources::new(&device, camera, controller, &projection);

        let depth_texture = Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth_texture",
        );

        let material_layout = matcap::matcap_layout(&device);
        let pipeline = matcap::mk_matcap_pipeline(
            &device,
            &config,
            &material_layout,
            &camera.bind_group_layout,
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            viewport,
            camera,
            projection,
            depth_texture,
            material_layout,
            pipeline,
            clear_colour: wgpu::Color::BLACK,
        })
    }

    /// Viewport resize handler: recompute the camera aspect ratio and
    /// reconfigure the surface at the clamped pixel density.
    pub fn resize(&mut self, width: u32, height: u32, scale_factor: f64) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = Viewport::new(width, height, scale_factor);
        let (surface_width, surface_height) = self.viewport.surface_size();
        self.config.width = surface_width;
        self.config.height = surface_height;
        self.projection.resize(surface_width, surface_height);
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = Texture::create_depth_texture(
            &self.device,
            [self.config.width, self.config.height],
            "depth_texture",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_ratio_is_width_over_height() {
        let viewport = Viewport::new(1280, 720, 1.0);
        assert_eq!(viewport.aspect(), 1280.0 / 720.0);
    }

    #[test]
    fn density_one_keeps_surface_at_physical_size() {
        let viewport = Viewport::new(800, 600, 1.0);
        assert_eq!(viewport.surface_size(), (800, 600));
    }

    #[test]
    fn density_three_clamps_to_two() {
        // 3000x1500 physical at scale 3 is 1000x500 logical; at the clamped
        // scale of 2 the surface ends up 2000x1000.
        let viewport = Viewport::new(3000, 1500, 3.0);
        assert_eq!(viewport.surface_size(), (2000, 1000));
    }

    #[test]
    fn density_two_is_untouched() {
        let viewport = Viewport::new(1600, 1200, 2.0);
        assert_eq!(viewport.surface_size(), (1600, 1200));
    }

    #[test]
    fn surface_size_never_collapses_to_zero() {
        let viewport = Viewport::new(1, 1, 4.0);
        let (width, height) = viewport.surface_size();
        assert!(width >= 1 && height >= 1);
    }

    #[test]
    fn clamping_preserves_aspect_ratio() {
        let viewport = Viewport::new(3000, 1500, 3.0);
        let (width, height) = viewport.surface_size();
        assert!((width as f32 / height as f32 - viewport.aspect()).abs() < 1e-3);
    }
}

//! Application event loop and flow control.
//!
//! The winit event loop carries the whole demo:
//!
//! 1. `resumed` creates the window and GPU context, then spawns the two
//!    asset loads on the tokio runtime. Their results come back as user
//!    events through the event-loop proxy, so all mutation stays on the
//!    event-loop thread.
//! 2. [`AssetJoin`] collects the two results in whichever order they land
//!    and yields them exactly once, triggering scene population.
//! 3. `RedrawRequested` is the frame driver: advance the tween timeline,
//!    step the orbit-camera damping, render once, request the next redraw.
//!    Each tick performs exactly one update and one render, or nothing at
//!    all while the surface is not yet configured. It runs from startup, so
//!    the first frames render an empty scene until population happens.
//!
//! There is no shutdown path beyond closing the window, and a load that
//! never completes leaves the demo rendering the empty scene forever.

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    context::Context,
    populate::{self, LoadedAssets},
    render::SceneRenderer,
    resources,
    scene::SceneGraph,
    tween::Timeline,
};

const WINDOW_TITLE: &str = "turn up";
const MATCAP_FILE: &str = "textures/matcap.png";
const FONT_FILE: &str = "fonts/demo.ttf";

/// Completion signals delivered from the loader tasks to the event loop.
#[derive(Debug)]
pub enum AppEvent {
    MatcapLoaded(RgbaImage),
    FontLoaded(Vec<u8>),
}

/// Order-independent join of the two asset loads.
///
/// `ready` yields the pair at most once, no matter how often completions
/// are offered afterwards; the populator must only ever run once.
#[derive(Default)]
pub struct AssetJoin {
    matcap: Option<RgbaImage>,
    font: Option<Vec<u8>>,
    consumed: bool,
}

impl AssetJoin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer_matcap(&mut self, matcap: RgbaImage) -> Option<LoadedAssets> {
        if self.matcap.is_none() {
            self.matcap = Some(matcap);
        }
        self.ready()
    }

    pub fn offer_font(&mut self, font: Vec<u8>) -> Option<LoadedAssets> {
        if self.font.is_none() {
            self.font = Some(font);
        }
        self.ready()
    }

    fn ready(&mut self) -> Option<LoadedAssets> {
        if self.consumed || self.matcap.is_none() || self.font.is_none() {
            return None;
        }
        self.consumed = true;
        Some(LoadedAssets {
            matcap: self.matcap.take()?,
            font: self.font.take()?,
        })
    }
}

/// Everything that exists once the window and GPU are up.
struct AppState {
    ctx: Context,
    scene: SceneGraph,
    timeline: Timeline,
    renderer: SceneRenderer,
    is_surface_configured: bool,
}

/// The two halves of one frame, split behind a trait so the sequencing in
/// [`drive_frame`] can be exercised without a GPU.
trait FrameSteps {
    fn update(&mut self, dt: Duration);
    fn render(&mut self);
}

/// One frame tick: exactly one update followed by exactly one render, or
/// nothing at all while the surface is not ready. However often it is
/// called, updates and renders stay in strict 1:1 alternation.
fn drive_frame<S: FrameSteps>(steps: &mut S, surface_ready: bool, dt: Duration) {
    if !surface_ready {
        return;
    }
    steps.update(dt);
    steps.render();
}

impl AppState {
    fn frame(&mut self, dt: Duration) {
        let ready = self.is_surface_configured;
        drive_frame(self, ready, dt);
    }
}

impl FrameSteps for AppState {
    /// Advance animations, step the camera damping, refresh the uniform.
    fn update(&mut self, dt: Duration) {
        self.timeline.advance(dt.as_secs_f32(), &mut self.scene);

        let camera = &mut self.ctx.camera;
        camera.controller.update(&mut camera.camera, dt);
        camera
            .uniform
            .update_view_proj(&camera.camera, &self.ctx.projection);
        self.ctx.queue.write_buffer(
            &camera.buffer,
            0,
            bytemuck::cast_slice(&[camera.uniform]),
        );
    }

    fn render(&mut self) {
        match self.renderer.render(&self.ctx, &self.scene) {
            Ok(()) => {}
            // Reconfigure the surface if it's lost or outdated.
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = self.ctx.window.inner_size();
                let scale_factor = self.ctx.window.scale_factor();
                self.ctx.resize(size.width, size.height, scale_factor);
            }
            Err(e) => {
                log::error!("unable to render: {e}");
            }
        }
    }
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<AppEvent>,
    state: Option<AppState>,
    join: AssetJoin,
    last_time: Instant,
}

impl App {
    fn new(event_loop: &EventLoop<AppEvent>) -> anyhow::Result<Self> {
        Ok(Self {
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy: event_loop.create_proxy(),
            state: None,
            join: AssetJoin::new(),
            last_time: Instant::now(),
        })
    }

    /// Kick off one asset load; the result (if any) comes back as an event.
    /// Failures are logged and dropped: the scene stays empty, the render
    /// loop keeps going.
    fn spawn_load<T, F>(&self, what: &'static str, load: F, wrap: fn(T) -> AppEvent)
    where
        T: Send + 'static,
        F: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let proxy = self.proxy.clone();
        self.async_runtime.spawn(async move {
            match load.await {
                Ok(value) => {
                    if proxy.send_event(wrap(value)).is_err() {
                        log::warn!("{what} loaded after the event loop closed");
                    }
                }
                Err(e) => {
                    log::warn!("{what} failed to load, the scene will stay empty: {e:#}");
                }
            }
        });
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window_attributes = Window::default_attributes().with_title(WINDOW_TITLE);
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => panic!("failed to create the window: {e}"),
        };

        let ctx = match self.async_runtime.block_on(Context::new(window)) {
            Ok(ctx) => ctx,
            Err(e) => panic!("app initialization failed, cannot create the main context: {e}"),
        };

        self.spawn_load(
            "matcap texture",
            resources::load_matcap(MATCAP_FILE),
            AppEvent::MatcapLoaded,
        );
        self.spawn_load("font", resources::load_font(FONT_FILE), AppEvent::FontLoaded);

        ctx.window.request_redraw();
        self.state = Some(AppState {
            ctx,
            scene: SceneGraph::new(),
            timeline: Timeline::new(),
            renderer: SceneRenderer::new(),
            is_surface_configured: false,
        });
        self.last_time = Instant::now();
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        let Some(state) = &mut self.state else {
            return;
        };
        let assets = match event {
            AppEvent::MatcapLoaded(matcap) => self.join.offer_matcap(matcap),
            AppEvent::FontLoaded(font) => self.join.offer_font(font),
        };
        if let Some(assets) = assets {
            let result = populate::populate(
                &mut state.scene,
                &mut state.timeline,
                &assets,
                &mut rand::thread_rng(),
            );
            if let Err(e) = result {
                log::warn!("scene population failed, rendering stays empty: {e:#}");
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            state.ctx.camera.controller.handle_mouse(dx, dy);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };

        state.ctx.camera.controller.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                let scale_factor = state.ctx.window.scale_factor();
                state.ctx.resize(size.width, size.height, scale_factor);
                state.is_surface_configured = size.width > 0 && size.height > 0;
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                let size = state.ctx.window.inner_size();
                state.ctx.resize(size.width, size.height, scale_factor);
            }
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                state.frame(dt);

                // Schedule the next frame; the loop never stops on its own.
                state.ctx.window.request_redraw();
            }
            _ => {}
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {e}");
    }

    let event_loop: EventLoop<AppEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcap() -> RgbaImage {
        RgbaImage::new(2, 2)
    }

    fn font() -> Vec<u8> {
        vec![0, 1, 2, 3]
    }

    #[test]
    fn join_yields_nothing_until_both_arrive() {
        let mut join = AssetJoin::new();
        assert!(join.offer_matcap(matcap()).is_none());
        assert!(join.offer_font(font()).is_some());
    }

    #[test]
    fn join_is_order_independent() {
        let mut join = AssetJoin::new();
        assert!(join.offer_font(font()).is_none());
        assert!(join.offer_matcap(matcap()).is_some());
    }

    #[test]
    fn join_yields_exactly_once_despite_repeat_signals() {
        let mut join = AssetJoin::new();
        assert!(join.offer_font(font()).is_none());
        assert!(join.offer_matcap(matcap()).is_some());
        // Hypothetical duplicate completions must not re-trigger population.
        assert!(join.offer_matcap(matcap()).is_none());
        assert!(join.offer_font(font()).is_none());
        assert!(join.offer_font(font()).is_none());
    }

    #[derive(Copy, Clone, Debug, PartialEq)]
    enum Step {
        Update,
        Render,
    }

    #[derive(Default)]
    struct StepLog {
        steps: Vec<Step>,
    }

    impl FrameSteps for StepLog {
        fn update(&mut self, _dt: Duration) {
            self.steps.push(Step::Update);
        }

        fn render(&mut self) {
            self.steps.push(Step::Render);
        }
    }

    #[test]
    fn every_tick_pairs_one_update_with_one_render() {
        let mut log = StepLog::default();
        for _ in 0..7 {
            drive_frame(&mut log, true, Duration::from_millis(16));
        }
        assert_eq!(log.steps.len(), 14);
        for pair in log.steps.chunks_exact(2) {
            assert_eq!(pair, [Step::Update, Step::Render]);
        }
    }

    #[test]
    fn nothing_advances_until_the_surface_is_configured() {
        let mut log = StepLog::default();
        for _ in 0..3 {
            drive_frame(&mut log, false, Duration::from_millis(16));
        }
        assert!(log.steps.is_empty());
        drive_frame(&mut log, true, Duration::from_millis(16));
        assert_eq!(log.steps, [Step::Update, Step::Render]);
    }
}

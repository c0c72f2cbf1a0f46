// Window, event loop and per-frame driving

use std::sync::Arc;

use glam::Vec2;
use winit::{
    dpi::LogicalSize,
    event::{DeviceEvent, Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    window::{CursorGrabMode, Window, WindowBuilder},
};

use crate::camera::Camera;
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::error::RenderError;
use crate::gfx::{GraphicsContext, WgpuContext};
use crate::input::InputRouter;
use crate::renderer::{FrameContext, Renderer};
use crate::scene::{SceneCatalog, PENGUIN_WORLD};

/// Everything a frame needs apart from the GPU context.
pub struct World {
    pub input: InputRouter,
    renderer: Renderer,
    catalog: SceneCatalog,
    camera: Camera,
    clock: Clock,
}

impl World {
    pub fn new(renderer: Renderer, catalog: SceneCatalog, camera: Camera, input: InputRouter) -> Self {
        Self {
            input,
            renderer,
            catalog,
            camera,
            clock: Clock::new(),
        }
    }

    /// Time the frame against the wall clock and step it.
    pub fn frame<G: GraphicsContext>(&mut self, ctx: &mut G, aspect_ratio: f32) -> Option<FrameContext> {
        let delta_time = self.clock.tick();
        self.step(ctx, delta_time, aspect_ratio)
    }

    /// Apply the input gathered since the last frame to the camera, then
    /// render from the updated camera. Nothing is drawn once a close has
    /// been requested.
    pub fn step<G: GraphicsContext>(
        &mut self,
        ctx: &mut G,
        delta_time: f32,
        aspect_ratio: f32,
    ) -> Option<FrameContext> {
        self.input.dispatch(&mut self.camera, delta_time);
        if self.input.close_requested() {
            return None;
        }

        Some(
            self.renderer
                .render_frame(ctx, &self.camera, &self.catalog, delta_time, aspect_ratio),
        )
    }
}

pub struct App {
    context: WgpuContext,
    world: World,
}

impl App {
    /// Open the window, bring up the GPU and load every scene resource.
    pub async fn new(event_loop: &EventLoop<()>, config: &AppConfig) -> Result<Self, RenderError> {
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(config.window.title.as_str())
                .with_inner_size(LogicalSize::new(config.window.width, config.window.height))
                .build(event_loop)?,
        );
        capture_cursor(&window);

        let initial_cursor = {
            let size = window.inner_size();
            Vec2::new(size.width as f32 / 2.0, size.height as f32 / 2.0)
        };

        let mut context = WgpuContext::new(window).await?;
        let catalog = SceneCatalog::build(&mut context, &config.assets, PENGUIN_WORLD)?;
        let renderer = Renderer::new(config.render.clone());
        renderer.configure(&mut context, &catalog);

        log::info!("Scene ready with {} objects", catalog.objects().len());

        let world = World::new(
            renderer,
            catalog,
            Camera::from_config(&config.camera),
            InputRouter::new(initial_cursor),
        );
        Ok(Self { context, world })
    }

    pub fn run(mut self, event_loop: EventLoop<()>) -> Result<(), RenderError> {
        event_loop.run(move |event, target| {
            target.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { window_id, event } if window_id == self.context.window().id() => {
                    self.handle_window_event(event, target);
                }
                Event::DeviceEvent {
                    event: DeviceEvent::MouseMotion { delta },
                    ..
                } => {
                    self.world.input.mouse_motion(delta.0 as f32, delta.1 as f32);
                }
                Event::AboutToWait => {
                    self.context.window().request_redraw();
                }
                _ => {}
            }
        })?;

        log::info!("Event loop finished");
        Ok(())
    }

    fn handle_window_event(&mut self, event: WindowEvent, target: &EventLoopWindowTarget<()>) {
        let input = &mut self.world.input;
        match event {
            WindowEvent::CloseRequested => input.request_close(),
            WindowEvent::Resized(physical_size) => self.context.resize(physical_size),
            WindowEvent::Focused(false) => input.release_keys(),
            WindowEvent::KeyboardInput { event, .. } => input.handle_keyboard_input(&event),
            WindowEvent::CursorMoved { position, .. } => {
                input.cursor_moved(position.x as f32, position.y as f32)
            }
            WindowEvent::MouseWheel { delta, .. } => input.scrolled(delta),
            WindowEvent::RedrawRequested => {
                let aspect_ratio = self.context.aspect_ratio();
                self.world.frame(&mut self.context, aspect_ratio);
            }
            _ => {}
        }

        if self.world.input.close_requested() {
            target.exit();
        }
    }
}

/// Lock the cursor to the window and hide it. Falls back to confining it
/// where locking is unsupported.
fn capture_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(error) = grabbed {
        log::warn!("Could not capture cursor: {error}");
    }
    window.set_cursor_visible(false);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AssetConfig, RenderConfig};
    use crate::gfx::recording::RecordingContext;
    use glam::{Mat4, Vec3};
    use winit::event::MouseScrollDelta;
    use winit::keyboard::KeyCode;

    const ASPECT: f32 = 1280.0 / 720.0;

    fn world() -> (RecordingContext, World) {
        let mut ctx = RecordingContext::new();
        let catalog = SceneCatalog::build(&mut ctx, &AssetConfig::default(), PENGUIN_WORLD).unwrap();
        ctx.calls.clear();
        let world = World::new(
            Renderer::new(RenderConfig::default()),
            catalog,
            Camera::default(),
            InputRouter::new(Vec2::new(640.0, 360.0)),
        );
        (ctx, world)
    }

    #[test]
    fn queued_pointer_input_reaches_the_same_frame() {
        let (mut ctx, mut world) = world();

        world.input.scrolled(MouseScrollDelta::LineDelta(0.0, 5.0));
        world.input.mouse_motion(0.0, 0.0);
        world.input.mouse_motion(100.0, 0.0);
        let frame = world.step(&mut ctx, 0.016, ASPECT).unwrap();

        let expected_projection = Mat4::perspective_rh_gl(40.0_f32.to_radians(), ASPECT, 0.1, 100.0);
        let expected_view = Camera::new(Vec3::new(0.0, 0.0, 3.0), -80.0, 0.0).view_matrix();

        assert!(frame.projection.abs_diff_eq(expected_projection, 1e-5));
        assert!(frame.view.abs_diff_eq(expected_view, 1e-5));

        // first object draw carries the updated matrices
        let projection = ctx.mat4_before_draw(1, "projection").unwrap();
        let view = ctx.mat4_before_draw(1, "view").unwrap();
        assert!(projection.abs_diff_eq(expected_projection, 1e-5));
        assert!(view.abs_diff_eq(expected_view, 1e-5));
    }

    #[test]
    fn held_keys_move_camera_before_rendering() {
        let (mut ctx, mut world) = world();

        world.input.set_key(KeyCode::KeyW, true);
        let frame = world.step(&mut ctx, 0.4, ASPECT).unwrap();

        assert!(frame.camera_position.abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-5));
        let expected_view = Camera::new(Vec3::new(0.0, 0.0, 2.0), -90.0, 0.0).view_matrix();
        assert!(ctx.mat4_before_draw(1, "view").unwrap().abs_diff_eq(expected_view, 1e-5));
    }

    #[test]
    fn close_request_skips_rendering() {
        let (mut ctx, mut world) = world();

        world.input.set_key(KeyCode::Escape, true);
        assert!(world.step(&mut ctx, 0.016, ASPECT).is_none());
        assert!(ctx.calls.is_empty());
    }

    #[test]
    fn wall_clock_frame_renders() {
        let (mut ctx, mut world) = world();
        let frame = world.frame(&mut ctx, ASPECT).unwrap();
        assert!(frame.delta_time >= 0.0);
        assert_eq!(ctx.draws().len(), 1 + PENGUIN_WORLD.len());
    }
}

// Frame pipeline for Penguin World

use glam::{Mat4, Vec3};

use crate::camera::Camera;
use crate::config::{ObjectView, RenderConfig};
use crate::gfx::{DepthFunc, GraphicsContext};
use crate::math::rotation_only;
use crate::scene::SceneCatalog;

/// Texture unit the skybox cubemap is bound to.
pub const SKYBOX_TEXTURE_UNIT: u32 = 0;

/// Per-frame values shared by every pass of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    pub delta_time: f32,
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
}

impl FrameContext {
    pub fn new(camera: &Camera, aspect_ratio: f32, delta_time: f32, settings: &RenderConfig) -> Self {
        Self {
            delta_time,
            view: camera.view_matrix(),
            projection: Mat4::perspective_rh_gl(
                camera.zoom().to_radians(),
                aspect_ratio,
                settings.near,
                settings.far,
            ),
            camera_position: camera.position,
        }
    }

    /// Camera view without translation, so the skybox stays centred on the eye.
    pub fn skybox_view(&self) -> Mat4 {
        rotation_only(self.view)
    }
}

/// Draws the scene catalog from the camera's point of view.
pub struct Renderer {
    settings: RenderConfig,
}

impl Renderer {
    pub fn new(settings: RenderConfig) -> Self {
        Self { settings }
    }

    /// One-time shader setup: point the cubemap samplers at their unit.
    pub fn configure<G: GraphicsContext>(&self, ctx: &mut G, catalog: &SceneCatalog) {
        ctx.use_shader(catalog.primary_shader);
        ctx.set_int("skybox", SKYBOX_TEXTURE_UNIT as i32);

        ctx.use_shader(catalog.skybox.shader);
        ctx.set_int("skybox", SKYBOX_TEXTURE_UNIT as i32);
    }

    /// Render and present one frame. Camera input for the frame must already
    /// have been applied.
    pub fn render_frame<G: GraphicsContext>(
        &self,
        ctx: &mut G,
        camera: &Camera,
        catalog: &SceneCatalog,
        delta_time: f32,
        aspect_ratio: f32,
    ) -> FrameContext {
        ctx.clear(self.settings.clear_color);

        let frame = FrameContext::new(camera, aspect_ratio, delta_time, &self.settings);

        self.primary_pass(ctx, catalog, &frame);
        self.skybox_pass(ctx, catalog, &frame);
        self.object_passes(ctx, catalog, &frame);

        ctx.present();
        log::trace!("Frame presented after {:.4}s", frame.delta_time);
        frame
    }

    // Nothing is drawn with the primary shader; its uniforms are kept current anyway.
    fn primary_pass<G: GraphicsContext>(&self, ctx: &mut G, catalog: &SceneCatalog, frame: &FrameContext) {
        ctx.use_shader(catalog.primary_shader);
        ctx.set_mat4("model", Mat4::IDENTITY);
        ctx.set_mat4("view", frame.view);
        ctx.set_mat4("projection", frame.projection);
        ctx.set_vec3("cameraPos", frame.camera_position);
    }

    /// The skybox sits at the far plane, so it needs `LessEqual` to pass
    /// against the cleared depth. `Less` is restored before returning.
    fn skybox_pass<G: GraphicsContext>(&self, ctx: &mut G, catalog: &SceneCatalog, frame: &FrameContext) {
        let skybox = &catalog.skybox;

        ctx.set_depth_func(DepthFunc::LessEqual);
        ctx.use_shader(skybox.shader);
        ctx.set_mat4("view", frame.skybox_view());
        ctx.set_mat4("projection", frame.projection);

        ctx.bind_cubemap(SKYBOX_TEXTURE_UNIT, skybox.cubemap);
        ctx.draw_arrays(skybox.mesh, skybox.vertex_count);
        ctx.set_depth_func(DepthFunc::Less);
    }

    fn object_passes<G: GraphicsContext>(&self, ctx: &mut G, catalog: &SceneCatalog, frame: &FrameContext) {
        let view = match self.settings.object_view {
            ObjectView::Camera => frame.view,
            ObjectView::Skybox => frame.skybox_view(),
        };

        for object in catalog.objects() {
            ctx.use_shader(object.shader);
            ctx.set_mat4("projection", frame.projection);
            ctx.set_mat4("view", view);
            ctx.set_mat4("model", object.transform.matrix());
            ctx.draw_model(object.model);
        }
    }
}

//! Scene container: the objects, the lights to sample, the camera and the
//! render settings, gathered in one place and rendered in one call.

use crate::error::RenderResult;
use crate::renderer::{render, ImageBuffer, RenderConfig};
use crate::{BvhNode, Camera, Color, Hittable, HittableList, HittableRef};

/// Everything needed to produce an image.
///
/// Objects can be added and removed freely; the BVH is rebuilt from the
/// current object list on every render.
#[derive(Clone)]
pub struct Scene {
    objects: HittableList,
    lights: HittableList,
    camera: Camera,
    config: RenderConfig,
}

impl Scene {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            objects: HittableList::new(),
            lights: HittableList::new(),
            camera: Camera::new(),
            config,
        }
    }

    /// Add a visible object.
    pub fn add_object(&mut self, object: HittableRef) {
        self.objects.add(object);
    }

    /// Remove the object at `index`. Out of range is a no-op returning false.
    pub fn remove_object(&mut self, index: usize) -> bool {
        let removed = self.objects.remove(index);
        if !removed {
            log::warn!(
                "remove_object: index {} out of range ({} objects)",
                index,
                self.objects.len()
            );
        }
        removed
    }

    pub fn objects(&self) -> &[HittableRef] {
        self.objects.objects()
    }

    /// Register a light as a direct-sampling target for diffuse bounces.
    ///
    /// This does not make it visible; add it with [`Scene::add_object`] too.
    pub fn add_light(&mut self, light: HittableRef) {
        self.lights.add(light);
    }

    /// Replace all direct-sampling targets.
    pub fn set_lights(&mut self, lights: HittableList) {
        self.lights = lights;
    }

    pub fn lights(&self) -> &[HittableRef] {
        self.lights.objects()
    }

    /// Set the camera. Its resolution is taken from the render config.
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn set_background(&mut self, color: Color) {
        self.config.background = color.to_array();
    }

    pub fn background(&self) -> Color {
        self.config.background()
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: RenderConfig) {
        self.config = config;
    }

    /// Render to a linear-color image.
    ///
    /// Configuration and BVH build errors are reported before any pixel is
    /// shaded.
    pub fn render_image(&self) -> RenderResult<ImageBuffer> {
        self.config.validate()?;

        let world = BvhNode::new(self.objects.objects().to_vec(), 0.0, 1.0)?;
        let lights = (!self.lights.is_empty()).then_some(&self.lights as &dyn Hittable);

        let mut camera = self
            .camera
            .clone()
            .with_resolution(self.config.width, self.config.height);
        camera.initialize();

        log::info!(
            "Scene: {} objects, {} lights",
            self.objects.len(),
            self.lights.len()
        );
        render(&camera, &world, lights, &self.config)
    }

    /// Render to a flat RGB8 buffer: row-major, top row first,
    /// `width * height * 3` bytes.
    pub fn render(&self) -> RenderResult<Vec<u8>> {
        Ok(self.render_image()?.to_rgb8())
    }
}

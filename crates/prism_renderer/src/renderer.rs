//! Frame driver: one executor task per pixel.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use crate::executor::ParallelExecutor;
use crate::scene::Scene;
use crate::settings::RenderSettings;
use crate::tonemap::{to_display, unpack_rgb};
use prism_core::Color;
use prism_math::Camera;

/// Row-major `0x00RRGGBB` pixels.
///
/// Each pixel is an atomic so tasks running on different workers can write
/// their own pixel through a shared reference.
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<AtomicU32>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: (0..width as usize * height as usize).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    pub fn store(&self, index: usize, rgb: u32) {
        self.pixels[index].store(rgb, Ordering::Relaxed);
    }

    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.pixels[(y * self.width + x) as usize].load(Ordering::Relaxed)
    }

    /// Copy out the packed pixels.
    pub fn to_vec(&self) -> Vec<u32> {
        self.pixels.iter().map(|p| p.load(Ordering::Relaxed)).collect()
    }

    /// Copy out as tightly packed 8-bit RGB.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|p| unpack_rgb(p.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Normalized device coordinates of a pixel center; y points up.
#[inline]
pub fn pixel_to_ndc(x: u32, y: u32, width: u32, height: u32) -> (f32, f32) {
    let ndc_x = (x as f32 + 0.5) / width as f32 * 2.0 - 1.0;
    let ndc_y = 1.0 - (y as f32 + 0.5) / height as f32 * 2.0;
    (ndc_x, ndc_y)
}

/// HDR radiance seen through pixel `(x, y)`.
pub fn render_pixel(
    scene: &Scene,
    camera: &Camera,
    settings: &RenderSettings,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Color {
    let (ndc_x, ndc_y) = pixel_to_ndc(x, y, width, height);
    let ray = camera.generate_ray(ndc_x, ndc_y);
    scene.trace(&ray, settings)
}

/// Renders whole frames of a scene into its frame buffer.
pub struct FrameRenderer {
    executor: ParallelExecutor,
    framebuffer: FrameBuffer,
    settings: RenderSettings,
}

impl FrameRenderer {
    pub fn new(executor: ParallelExecutor, width: u32, height: u32, settings: RenderSettings) -> Self {
        Self {
            executor,
            framebuffer: FrameBuffer::new(width, height),
            settings,
        }
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut RenderSettings {
        &mut self.settings
    }

    /// Reallocate the frame buffer. Contents are cleared.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width != self.framebuffer.width || height != self.framebuffer.height {
            log::debug!("FrameRenderer resized to {width}x{height}");
            self.framebuffer = FrameBuffer::new(width, height);
        }
    }

    /// Render one frame, blocking until every pixel is written.
    ///
    /// Brings the camera's cached matrices up to date first.
    pub fn render_frame(&mut self, scene: &Scene, camera: &mut Camera) {
        camera.update_matrices();
        let camera: &Camera = camera;

        let start = Instant::now();
        let width = self.framebuffer.width;
        let height = self.framebuffer.height;
        let exposure = camera.exposure();
        let settings = &self.settings;
        let framebuffer = &self.framebuffer;

        self.executor.execute(
            |_, index| {
                let x = index as u32 % width;
                let y = index as u32 / width;
                let radiance = render_pixel(scene, camera, settings, x, y, width, height);
                framebuffer.store(index, to_display(radiance, exposure, settings.gamma));
            },
            framebuffer.len(),
            settings.tasks_per_batch,
        );

        log::debug!("Frame {width}x{height} rendered in {:.2?}", start.elapsed());
    }
}

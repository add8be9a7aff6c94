//! Headless Prism driver.
//!
//! Usage: `prism_viewer [output.png] [width] [height] [frames] [settings.json] [lights.json]`
//!
//! Builds the demo scene, renders `frames` frames while orbiting the
//! camera, and writes the last frame as a PNG. A lights file replaces the
//! demo lighting.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use prism_core::{Color, DirectionalLight, LightRig, Material, Mesh, PointLight, SpotLight};
use prism_math::{Angles, Camera, Mat4, Quat, Vec3};
use prism_renderer::{default_thread_count, Cube, FrameRenderer, ParallelExecutor, Plane, RenderSettings, Scene, Sphere};

/// Command-line options, all positional and optional.
struct Args {
    output: PathBuf,
    width: u32,
    height: u32,
    frames: u32,
    settings: Option<PathBuf>,
    lights: Option<PathBuf>,
}

impl Args {
    fn parse() -> Result<Self> {
        let mut args = std::env::args().skip(1);
        let output = args.next().map_or_else(|| PathBuf::from("prism.png"), PathBuf::from);
        let width = parse_or(args.next(), 960, "width")?;
        let height = parse_or(args.next(), 540, "height")?;
        let frames = parse_or(args.next(), 1, "frames")?;
        let settings = args.next().map(PathBuf::from);
        let lights = args.next().map(PathBuf::from);

        if width == 0 || height == 0 {
            bail!("image size must be non-zero, got {width}x{height}");
        }
        Ok(Self {
            output,
            width,
            height,
            frames: frames.max(1),
            settings,
            lights,
        })
    }
}

fn parse_or(arg: Option<String>, default: u32, name: &str) -> Result<u32> {
    match arg {
        Some(value) => value.parse().with_context(|| format!("invalid {name}: {value:?}")),
        None => Ok(default),
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T> {
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn load_settings(path: Option<&PathBuf>) -> Result<RenderSettings> {
    path.map_or_else(|| Ok(RenderSettings::default()), load_json)
}

fn demo_lights() -> LightRig {
    LightRig {
        directional: vec![DirectionalLight::new(
            Vec3::new(-0.3, -1.0, 0.5),
            Color::new(1.0, 0.95, 0.85) * 20.0,
            0.005,
        )],
        point: vec![PointLight::new(Vec3::new(-4.0, 5.0, 1.0), Color::splat(200.0), 0.3)],
        spot: vec![SpotLight::new(
            Vec3::new(4.0, 6.0, 2.0),
            0.3,
            Vec3::new(-0.2, -1.0, 0.4),
            30.0_f32.to_radians(),
            Color::new(150.0, 120.0, 90.0),
        )],
    }
}

fn load_lights(path: Option<&PathBuf>) -> Result<LightRig> {
    let Some(path) = path else {
        return Ok(demo_lights());
    };
    let rig: LightRig = load_json(path)?;
    if rig.is_empty() {
        log::warn!("{} defines no lights", path.display());
    }
    Ok(rig)
}

/// Floor, a row of spheres from rough to mirror and a few cubes, lit by
/// `lights`.
fn demo_scene(lights: LightRig) -> Scene {
    let mut scene = Scene::new();

    scene.add_plane(Plane::new(Vec3::Y, Vec3::new(0.0, -1.0, 0.0)), Material::diffuse(Color::splat(0.6)));

    for i in 0..5 {
        let glossiness = i as f32 / 4.0;
        let x = (i as f32 - 2.0) * 2.5;
        scene.add_sphere(
            Sphere::new(Vec3::new(x, 0.0, 4.0), 1.0),
            Material::plastic(Color::new(0.8, 0.2, 0.2), glossiness),
        );
    }
    scene.add_sphere(
        Sphere::new(Vec3::new(0.0, 1.0, 9.0), 2.0),
        Material::metal(Color::new(1.0, 0.85, 0.55), 0.97),
    );

    scene.add_cube(
        Cube::new(Mat4::from_scale_rotation_translation(
            Vec3::splat(1.5),
            Quat::from_rotation_y(0.6),
            Vec3::new(-6.0, -0.25, 8.0),
        )),
        Material::plastic(Color::new(0.2, 0.5, 0.8), 0.5),
    );
    scene.add_cube(
        Cube::new(Mat4::from_scale_rotation_translation(
            Vec3::new(0.5, 3.0, 0.5),
            Quat::from_rotation_y(-0.3),
            Vec3::new(6.0, 0.5, 8.0),
        )),
        Material::metal(Color::splat(0.9), 0.95),
    );
    scene.add_cube(
        Cube::with_mesh(
            Arc::new(Mesh::uv_sphere(1.0, 32, 16)),
            Mat4::from_scale_rotation_translation(Vec3::new(1.5, 0.75, 1.5), Quat::IDENTITY, Vec3::new(3.0, -0.25, 12.0)),
        ),
        Material::plastic(Color::new(0.3, 0.8, 0.3), 0.3),
    );

    scene.add_light_rig(lights);

    scene
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse()?;
    let settings = load_settings(args.settings.as_ref())?;
    let lights = load_lights(args.lights.as_ref())?;
    log::info!(
        "Rendering {} frame(s) at {}x{} to {}",
        args.frames,
        args.width,
        args.height,
        args.output.display()
    );

    let scene = demo_scene(lights);
    let mut camera = Camera::new(Vec3::new(0.0, 2.0, -6.0), Vec3::new(0.0, -0.15, 1.0), Vec3::Y)
        .with_perspective(50.0_f32.to_radians(), args.width as f32 / args.height as f32, 0.1, 1000.0);

    let executor = ParallelExecutor::new(default_thread_count()).context("failed to start worker threads")?;
    let mut renderer = FrameRenderer::new(executor, args.width, args.height, settings);

    let start = Instant::now();
    for frame in 0..args.frames {
        if frame > 0 {
            camera.add_world_angles(Angles::new(0.0, 0.0, 2.0_f32.to_radians()));
        }
        let frame_start = Instant::now();
        renderer.render_frame(&scene, &mut camera);
        log::info!("Frame {} took {:.2?}", frame + 1, frame_start.elapsed());
    }
    log::info!("Rendered {} frame(s) in {:.2?}", args.frames, start.elapsed());

    let framebuffer = renderer.framebuffer();
    let image = image::RgbImage::from_raw(framebuffer.width(), framebuffer.height(), framebuffer.to_rgb8())
        .context("frame buffer size does not match image size")?;
    image
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    log::info!("Saved {}", args.output.display());
    Ok(())
}

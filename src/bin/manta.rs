//! Command-line render driver. Demo-scene construction and file output
//! glue; the scene description language, OBJ loader, and their own
//! demo binaries are out of this crate's scope (§1, §6) — this binary
//! exists only to exercise [`manta::render::RenderDriver`] end to end
//! against a small built-in scene.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::Parser;

use manta::camera::{Camera, CameraKind};
use manta::config::RenderConfig;
use manta::error::Result;
use manta::geometry::mesh::FaceAux;
use manta::geometry::Mesh;
use manta::io::{fpm, jpeg};
use manta::material::{Material, MaterialLibrary, MaterialId, ValueNode};
use manta::math::Vector3;
use manta::render::RenderDriver;
use manta::scene::{Light, Scene, SceneObject, SphereLight};
use manta::spectrum::{CoefficientSpectrum, RgbSpectrum};

#[derive(Parser, Debug)]
#[command(name = "manta", version, about = "Monte-Carlo path tracer")]
struct Args {
    /// Optional render configuration file (TOML), overlaid onto the
    /// built-in defaults (§6 "Render driver configuration").
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output image width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Output image height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Samples per pixel.
    #[arg(long)]
    spp: Option<u32>,

    /// Worker thread count.
    #[arg(long)]
    threads: Option<usize>,

    /// JPEG output path; the raw `.fpm` accumulator is always written
    /// next to it (or to `out.fpm` if this is also omitted).
    #[arg(long, default_value = "out.jpg")]
    output: PathBuf,

    /// JPEG quality, 1..=100.
    #[arg(long, default_value_t = 90)]
    quality: u8,
}

fn load_config(args: &Args) -> Result<RenderConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            toml::from_str(&text).unwrap_or_else(|e| {
                log::warn!("failed to parse {}: {e}; falling back to defaults", path.display());
                RenderConfig::default()
            })
        }
        None => RenderConfig::default(),
    };

    if let Some(w) = args.width {
        config.width = w;
    }
    if let Some(h) = args.height {
        config.height = h;
    }
    if let Some(spp) = args.spp {
        config.samples_per_pixel = spp;
    }
    if let Some(threads) = args.threads {
        config.threads = threads;
        config.multithreaded = threads > 1;
    }

    config.validate()?;
    Ok(config)
}

/// A unit ground quad under one red Lambertian wall and a spherical
/// area light, the same shape as the Cornell-box-style scenario in §8
/// scenario E6 — small enough to trace interactively, large enough to
/// exercise every stage of the pipeline.
fn demo_scene() -> Scene {
    let mut materials = MaterialLibrary::new();
    let red_wall: MaterialId = materials
        .insert(Material {
            name: "red_wall".to_string(),
            emission: RgbSpectrum::ZERO,
            bsdf: manta::bsdf::Bsdf::lambert(ValueNode::constant(RgbSpectrum::new(0.75, 0.1, 0.1))),
        })
        .expect("material names are distinct");

    let vertices = vec![
        Vector3::new(-4.0, 0.0, -4.0),
        Vector3::new(4.0, 0.0, -4.0),
        Vector3::new(4.0, 0.0, 4.0),
        Vector3::new(-4.0, 0.0, 4.0),
    ];
    let triangle_indices = vec![[0, 1, 2], [0, 2, 3]];
    let triangle_aux = vec![
        FaceAux { normal_indices: [0; 4], uv_indices: [0; 4], material: red_wall.0 },
        FaceAux { normal_indices: [0; 4], uv_indices: [0; 4], material: red_wall.0 },
    ];
    let mesh = Mesh::from_arrays(vertices, vec![], vec![], triangle_indices, triangle_aux)
        .expect("demo mesh is well formed");

    let mut scene = Scene::new(materials, RgbSpectrum::gray(0.05));
    scene.add_object(SceneObject::new(mesh, red_wall));
    scene.add_light(Light::Sphere(SphereLight {
        center: Vector3::new(0.0, 5.0, 0.0),
        radius: 0.5,
        radiance: RgbSpectrum::gray(40.0),
    }));
    scene
}

fn run() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    log::info!(
        "manta: {}x{} @ {} spp, {} threads",
        config.width,
        config.height,
        config.samples_per_pixel,
        config.threads
    );

    let scene = demo_scene();
    let camera = Camera::look_at(
        Vector3::new(0.0, 3.0, 8.0),
        Vector3::new(0.0, 1.0, 0.0),
        Vector3::new(0.0, 1.0, 0.0),
        40.0,
        config.width,
        config.height,
        CameraKind::Pinhole,
    );
    let textures = manta::material::TextureTable::new();

    let driver = RenderDriver::new(config, &scene, &camera, &textures);
    let image = driver.render();

    let fpm_path = args.output.with_extension("fpm");
    let raw = manta::maps::VectorMap2D::from_raw(
        image.width,
        image.height,
        image
            .rgb
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2], 1.0])
            .collect(),
    );
    fpm::write(BufWriter::new(File::create(&fpm_path)?), &raw)?;
    log::info!("wrote {}", fpm_path.display());

    jpeg::write(BufWriter::new(File::create(&args.output)?), &image, args.quality)?;
    log::info!("wrote {}", args.output.display());

    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("manta: {e}");
        std::process::exit(1);
    }
}

use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::{ info, error };

use sphere_tracer::Result;
use sphere_tracer::canvas::PpmFormat;
use sphere_tracer::config::RefractionPolicy;
use sphere_tracer::parallel;
use sphere_tracer::renderer::Renderer;
use sphere_tracer::scene::Scene;

/// Renders a scene of spheres to a PPM image.
///
/// Without `--scene`, the built-in reference scene is rendered. Flags
/// override values from the scene file, which override the defaults.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// JSON scene description to render.
    #[clap(short, long)]
    scene: Option<PathBuf>,

    /// Where to write the image.
    #[clap(short, long, default_value = "./untitled.ppm")]
    output: PathBuf,

    #[clap(long)]
    width: Option<usize>,

    #[clap(long)]
    height: Option<usize>,

    /// Vertical field of view, in degrees.
    #[clap(long)]
    fov: Option<f64>,

    /// Maximum reflection/refraction recursion depth.
    #[clap(long)]
    max_depth: Option<usize>,

    /// Render threads; 0 uses every core.
    #[clap(short = 'j', long)]
    threads: Option<usize>,

    /// Write a plain-text P3 image instead of binary P6.
    #[clap(long)]
    ascii: bool,

    /// Handling of total internal reflection: reflect-only or propagate.
    #[clap(long)]
    refraction: Option<RefractionPolicy>,
}

fn run(args: Args) -> Result<()> {
    let mut scene = match args.scene {
        Some(ref path) => Scene::from_file(path)?,
        None => Scene::reference(),
    };

    let config = &mut scene.config;
    if let Some(width) = args.width { config.width = width; }
    if let Some(height) = args.height { config.height = height; }
    if let Some(fov) = args.fov { config.fov = fov; }
    if let Some(max_depth) = args.max_depth { config.max_depth = max_depth; }
    if let Some(threads) = args.threads { config.threads = threads; }
    if let Some(policy) = args.refraction { config.refraction_policy = policy; }
    config.validate()?;

    let renderer = Renderer::new(scene.config.clone());
    let canvas = parallel::render(&renderer, &scene.spheres)?;

    let format = if args.ascii { PpmFormat::Ascii } else { PpmFormat::Binary };
    canvas.save(&args.output, format)?;
    info!("Saved render to {}.", args.output.display());

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        error!("{}", e);
        process::exit(1);
    }
}

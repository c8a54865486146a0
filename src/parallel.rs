use std::time::Instant;

use log::debug;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::canvas::Canvas;
use crate::error::Result;
use crate::renderer::{ Renderer, log_scene, log_finished };
use crate::sphere::Sphere;
use crate::tracer::Tracer;

/// Renders `scene` on a fixed pool of `threads` workers.
///
/// The canvas is split into rows and each worker writes only the rows it is
/// handed, so no pixel is shared between threads. A `threads` of `0` uses one
/// worker per core. The result is identical to `Renderer::render`.
pub fn parallel_render(renderer: &Renderer, scene: &[Sphere], threads: usize)
    -> Result<Canvas> {
    let config = renderer.config();
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("render-{}", i))
        .build()?;
    debug!("Built render pool with {} workers", pool.current_num_threads());

    let tracer = Tracer::new(scene, config);
    let mut image = Canvas::new(config.width, config.height);
    log_scene(scene, config, pool.current_num_threads());

    let start = Instant::now();
    let width = config.width;
    if width > 0 {
        pool.install(|| {
            image.pixels_mut()
                .par_chunks_mut(width)
                .enumerate()
                .for_each(|(y, row)| renderer.render_row(&tracer, y, row));
        });
    }

    log_finished(&tracer, start);
    Ok(image)
}

/// Renders with the thread count from the renderer's config.
///
/// A count of `1` stays on the calling thread without building a pool.
pub fn render(renderer: &Renderer, scene: &[Sphere]) -> Result<Canvas> {
    match renderer.config().threads {
        1 => Ok(renderer.render(scene)),
        n => parallel_render(renderer, scene, n),
    }
}

#[cfg(test)]
use crate::config::RenderConfig;
#[cfg(test)]
use crate::vector::{ Vector3, Color };

#[cfg(test)]
fn small_scene() -> Vec<Sphere> {
    vec![
        Sphere::new(Vector3::new(0.0, -10004.0, -20.0), 10000.0, Color::uniform(0.2)),
        Sphere::new(Vector3::new(0.0, 0.0, -20.0), 4.0, Color::new(1.0, 0.32, 0.36))
            .with_reflection(1.0)
            .with_transparency(0.5),
        Sphere::new(Vector3::new(5.0, -1.0, -15.0), 2.0, Color::new(0.9, 0.76, 0.46))
            .with_reflection(1.0),
        Sphere::new(Vector3::new(0.0, 20.0, -30.0), 3.0, Color::zero())
            .with_emission(Color::uniform(3.0)),
    ]
}

#[test]
fn parallel_matches_sequential() {
    let config = RenderConfig { width: 64, height: 48, ..Default::default() };
    let renderer = Renderer::new(config);
    let scene = small_scene();

    let sequential = renderer.render(&scene);
    let parallel = parallel_render(&renderer, &scene, 4).unwrap();

    assert_eq!(sequential.to_rgb_bytes(), parallel.to_rgb_bytes());
}

#[test]
fn render_dispatches_on_thread_count() {
    let scene = small_scene();

    let config = RenderConfig { width: 16, height: 12, threads: 1, ..Default::default() };
    let one = render(&Renderer::new(config), &scene).unwrap();

    let config = RenderConfig { width: 16, height: 12, threads: 0, ..Default::default() };
    let all = render(&Renderer::new(config), &scene).unwrap();

    assert_eq!(one, all);
}

#[test]
fn parallel_render_zero_width() {
    let config = RenderConfig { width: 0, height: 12, ..Default::default() };
    let image = parallel_render(&Renderer::new(config), &small_scene(), 2).unwrap();

    assert_eq!(image.width, 0);
    assert!(image.pixels().is_empty());
}

use std::time::Instant;

use log::{ info, warn };

use crate::canvas::Canvas;
use crate::config::RenderConfig;
use crate::ray::Ray;
use crate::sphere::Sphere;
use crate::tracer::Tracer;
use crate::vector::{ Vector3, Color };

/// A pinhole camera at the origin looking down -Z.
///
/// The vertical field of view comes from the config; the horizontal one
/// follows from the image's aspect ratio.
#[derive(Clone, Debug, PartialEq)]
pub struct Renderer {
    config: RenderConfig,

    inv_width: f64,
    inv_height: f64,
    aspect: f64,

    /// `tan(fov / 2)`, the half-height of the image plane at `z = -1`.
    angle: f64,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Renderer {
        let inv_width = 1.0 / config.width as f64;
        let inv_height = 1.0 / config.height as f64;
        let aspect = config.width as f64 / config.height as f64;
        let angle = (std::f64::consts::PI * 0.5 * config.fov / 180.0).tan();

        Renderer { config, inv_width, inv_height, aspect, angle }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Builds the primary ray through the center of pixel `(px, py)`.
    pub fn primary_ray(&self, px: usize, py: usize) -> Ray {
        let xx = (2.0 * ((px as f64 + 0.5) * self.inv_width) - 1.0)
            * self.angle * self.aspect;
        let yy = (1.0 - 2.0 * ((py as f64 + 0.5) * self.inv_height)) * self.angle;

        Ray::new(Vector3::zero(), Vector3::new(xx, yy, -1.0).normalized())
    }

    /// Traces every pixel of row `y` into `row`.
    pub(crate) fn render_row(&self, tracer: &Tracer, y: usize, row: &mut [Color]) {
        for (x, pixel) in row.iter_mut().enumerate() {
            *pixel = tracer.trace(&self.primary_ray(x, y), 0);
        }
    }

    /// Renders `scene` on the calling thread.
    pub fn render(&self, scene: &[Sphere]) -> Canvas {
        let tracer = Tracer::new(scene, &self.config);
        let mut image = Canvas::new(self.config.width, self.config.height);
        log_scene(scene, &self.config, 1);

        let start = Instant::now();
        let width = self.config.width;
        if width > 0 {
            for (y, row) in image.pixels_mut().chunks_mut(width).enumerate() {
                self.render_row(&tracer, y, row);
            }
        }

        log_finished(&tracer, start);
        image
    }
}

pub(crate) fn log_scene(scene: &[Sphere], config: &RenderConfig, threads: usize) {
    if !scene.iter().any(Sphere::is_light) {
        warn!("Scene has no light sphere; diffuse surfaces will render black");
    }

    info!("Rendering {} spheres at {}x{} (fov {}, max depth {}) using {} thread(s)...",
        scene.len(), config.width, config.height, config.fov, config.max_depth,
        threads);
}

pub(crate) fn log_finished(tracer: &Tracer, start: Instant) {
    info!("...done in {:.2?}, {} rays traced", start.elapsed(), tracer.rays_traced());
}

#[cfg(test)]
use crate::feq;

#[test]
fn ray_through_center() {
    let r = Renderer::new(RenderConfig { width: 201, height: 101, ..Default::default() })
        .primary_ray(100, 50);

    assert_eq!(r.origin, Vector3::zero());
    assert_eq!(r.direction, Vector3::new(0.0, 0.0, -1.0));
}

#[test]
fn ray_through_corners() {
    let renderer = Renderer::new(RenderConfig::default());
    let top_left = renderer.primary_ray(0, 0).direction;
    let bottom_right = renderer.primary_ray(639, 479).direction;

    assert!(top_left.x < 0.0 && top_left.y > 0.0 && top_left.z < 0.0);
    assert!(bottom_right.x > 0.0 && bottom_right.y < 0.0);
    assert!(feq(top_left.length(), 1.0));
    assert!(feq(top_left.x, -bottom_right.x));
}

#[test]
fn ray_matches_pinhole_formula() {
    let config = RenderConfig { width: 4, height: 2, fov: 90.0, ..Default::default() };
    let r = Renderer::new(config).primary_ray(3, 0);

    // tan(45) == 1, aspect == 2
    let e = Vector3::new(0.75 * 2.0, 0.5, -1.0).normalized();
    assert_eq!(r.direction, e);
}

#[test]
fn render_empty_scene_is_background() {
    let config = RenderConfig { width: 8, height: 6, ..Default::default() };
    let image = Renderer::new(config).render(&[]);

    assert_eq!(image.width, 8);
    assert_eq!(image.height, 6);
    assert!(image.pixels().iter().all(|p| *p == Vector3::uniform(2.0)));
}

#[test]
fn render_zero_sized_canvas() {
    let scene = [Sphere::new(Vector3::new(0.0, 0.0, -5.0), 1.0, Color::uniform(1.0))];

    let narrow = Renderer::new(RenderConfig { width: 0, ..Default::default() })
        .render(&scene);
    assert_eq!(narrow.width, 0);
    assert!(narrow.pixels().is_empty());

    let flat = Renderer::new(RenderConfig { height: 0, ..Default::default() })
        .render(&scene);
    assert!(flat.to_rgb_bytes().is_empty());
}

#[test]
fn render_sphere_in_view() {
    let config = RenderConfig { width: 11, height: 11, ..Default::default() };
    let scene = [
        Sphere::new(Vector3::new(0.0, 0.0, -10.0), 1.0, Color::uniform(0.5)),
        Sphere::new(Vector3::new(0.0, 0.0, 10.0), 1.0, Color::zero())
            .with_emission(Color::uniform(1.0)),
    ];
    let image = Renderer::new(config).render(&scene);

    // The light is behind the camera, facing the lit side of the sphere
    assert_eq!(image.read_pixel(5, 5).unwrap(), Color::uniform(0.5));
    assert_eq!(image.read_pixel(0, 0).unwrap(), Color::uniform(2.0));
}

use std::sync::atomic::{ AtomicUsize, Ordering };

use crate::config::{ RenderConfig, RefractionPolicy };
use crate::consts::FRESNEL_MIX;
use crate::ray::Ray;
use crate::sphere::Sphere;
use crate::vector::{ Vector3, Color };

/// The closest sphere crossed by a ray.
#[derive(Copy, Clone, Debug)]
pub struct Hit<'a> {
    /// The distance along the ray to the hit point.
    pub t: f64,

    /// The position of `sphere` in the scene.
    pub index: usize,

    pub sphere: &'a Sphere,
}

/// Linearly interpolates from `a` toward `b` by `t`.
pub fn mix(a: f64, b: f64, t: f64) -> f64 {
    b * t + a * (1.0 - t)
}

/// Recursive light transport over a list of spheres.
///
/// A `Tracer` borrows the scene and render parameters for the duration of a
/// render. It keeps a count of every ray it traces; the count is atomic so
/// one tracer can be shared between render threads.
#[derive(Debug)]
pub struct Tracer<'a> {
    scene: &'a [Sphere],
    config: &'a RenderConfig,
    rays: AtomicUsize,
}

impl<'a> Tracer<'a> {
    pub fn new(scene: &'a [Sphere], config: &'a RenderConfig) -> Tracer<'a> {
        Tracer { scene, config, rays: AtomicUsize::new(0) }
    }

    pub fn scene(&self) -> &'a [Sphere] {
        self.scene
    }

    pub fn config(&self) -> &'a RenderConfig {
        self.config
    }

    /// The number of calls to `trace` made so far, recursive ones included.
    pub fn rays_traced(&self) -> usize {
        self.rays.load(Ordering::Relaxed)
    }

    /// Finds the nearest sphere in front of the ray.
    ///
    /// When the ray starts inside a sphere the exit point is used instead of
    /// the entry point. Ties go to the sphere listed first.
    pub fn nearest_hit(&self, ray: &Ray) -> Option<Hit<'a>> {
        let mut nearest: Option<Hit<'a>> = None;

        for (index, sphere) in self.scene.iter().enumerate() {
            if let Some((t0, t1)) = sphere.intersect_ray(ray) {
                let t = if t0 < 0.0 { t1 } else { t0 };
                let closer = match nearest {
                    Some(ref hit) => t < hit.t,
                    None => t < f64::INFINITY,
                };

                if closer {
                    nearest = Some(Hit { t, index, sphere });
                }
            }
        }

        nearest
    }

    /// Determines whether light `light` is blocked as seen from `origin`.
    ///
    /// Every sphere but the light itself is tested, and any crossing counts,
    /// even one past the light.
    pub fn is_occluded(&self, origin: Vector3, direction: Vector3,
        light: usize) -> bool {
        self.scene.iter()
            .enumerate()
            .filter(|(j, _)| *j != light)
            .any(|(_, s)| s.intersect(origin, direction).is_some())
    }

    /// Computes the refracted direction through a transparent sphere.
    ///
    /// `normal` must face the incoming ray. Returns `None` on total internal
    /// reflection unless the policy is `Propagate`, in which case the
    /// direction is NaN.
    pub fn refract(&self, direction: Vector3, normal: Vector3, inside: bool)
        -> Option<Vector3> {
        let ior = self.config.ior;
        let eta = if inside { ior } else { 1.0 / ior };
        let cosi = -normal.dot(&direction);
        let k = 1.0 - eta * eta * (1.0 - cosi * cosi);

        if k < 0.0 && self.config.refraction_policy == RefractionPolicy::ReflectOnly {
            return None;
        }

        let mut refracted = direction * eta + normal * (eta * cosi - k.sqrt());
        refracted.normalize();
        Some(refracted)
    }

    /// Traces a ray, returning the color it carries back.
    ///
    /// `depth` is the recursion depth of this ray, `0` for primary rays.
    pub fn trace(&self, ray: &Ray, depth: usize) -> Color {
        self.rays.fetch_add(1, Ordering::Relaxed);

        let hit = match self.nearest_hit(ray) {
            Some(hit) => hit,
            None => return self.config.background,
        };

        let sphere = hit.sphere;
        let point = ray.position(hit.t);
        let mut normal = point - sphere.center;
        normal.normalize();

        // Flip the normal to face the ray when leaving the sphere
        let inside = if ray.direction.dot(&normal) > 0.0 {
            normal = -normal;
            true
        } else {
            false
        };

        let specular = sphere.reflection > 0.0 || sphere.transparency > 0.0;
        let color = if specular && depth < self.config.max_depth {
            self.shade_specular(ray, sphere, point, normal, inside, depth)
        } else {
            self.shade_diffuse(sphere, point, normal)
        };

        color + sphere.emission_color
    }

    fn shade_specular(&self, ray: &Ray, sphere: &Sphere, point: Vector3,
        normal: Vector3, inside: bool, depth: usize) -> Color {
        let bias = normal * self.config.bias;
        let facing_ratio = -ray.direction.dot(&normal);
        let fresnel = mix((1.0 - facing_ratio).powi(3), 1.0, FRESNEL_MIX);

        let reflect_dir = ray.direction.reflect(&normal).normalized();
        let reflection = self.trace(&Ray::new(point + bias, reflect_dir), depth + 1);

        let mut refraction = Color::zero();
        if sphere.transparency > 0.0 {
            if let Some(refract_dir) = self.refract(ray.direction, normal, inside) {
                refraction = self.trace(&Ray::new(point - bias, refract_dir), depth + 1);
            }
        }

        (reflection * fresnel + refraction * (1.0 - fresnel) * sphere.transparency)
            * sphere.surface_color
    }

    fn shade_diffuse(&self, sphere: &Sphere, point: Vector3, normal: Vector3)
        -> Color {
        let over_point = point + normal * self.config.bias;
        let mut color = Color::zero();

        for (i, light) in self.scene.iter().enumerate() {
            if !light.is_light() {
                continue;
            }

            let light_dir = (light.center - point).normalized();
            if self.is_occluded(over_point, light_dir, i) {
                continue;
            }

            color += sphere.surface_color
                * normal.dot(&light_dir).max(0.0)
                * light.emission_color;
        }

        color
    }
}

/// Traces a single ray from `origin` along `direction` through `scene`.
pub fn trace(origin: Vector3, direction: Vector3, scene: &[Sphere], depth: usize,
    config: &RenderConfig) -> Color {
    Tracer::new(scene, config).trace(&Ray::new(origin, direction), depth)
}

/* Tests */

#[cfg(test)]
use crate::feq;

#[cfg(test)]
fn light_above(y: f64) -> Sphere {
    Sphere::new(Vector3::new(0.0, y, 0.0), 1.0, Color::zero())
        .with_emission(Color::uniform(2.0))
}

#[test]
fn mix_endpoints() {
    assert_eq!(mix(0.3, 1.0, 0.0), 0.3);
    assert_eq!(mix(0.3, 1.0, 1.0), 1.0);
    assert!(feq(mix(0.0, 1.0, 0.01), 0.01));
}

#[test]
fn empty_scene_returns_background() {
    let config = RenderConfig::default();
    let tracer = Tracer::new(&[], &config);
    let r = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, -1.0));

    assert_eq!(tracer.trace(&r, 0), Vector3::uniform(2.0));
    assert_eq!(tracer.rays_traced(), 1);
}

#[test]
fn miss_returns_configured_background() {
    let config = RenderConfig { background: Color::new(0.1, 0.2, 0.3),
        ..Default::default() };
    let scene = [Sphere::new(Vector3::new(0.0, 0.0, 5.0), 1.0, Color::uniform(1.0))];
    let c = trace(Vector3::zero(), Vector3::new(0.0, 0.0, -1.0), &scene, 0, &config);

    assert_eq!(c, Color::new(0.1, 0.2, 0.3));
}

#[test]
fn nearest_hit_picks_closest() {
    let config = RenderConfig::default();
    let scene = [
        Sphere::new(Vector3::new(0.0, 0.0, -20.0), 1.0, Color::zero()),
        Sphere::new(Vector3::new(0.0, 0.0, -10.0), 1.0, Color::zero()),
    ];
    let tracer = Tracer::new(&scene, &config);
    let r = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, -1.0));

    let hit = tracer.nearest_hit(&r).expect("Both spheres are ahead of the ray.");
    assert_eq!(hit.index, 1);
    assert!(feq(hit.t, 9.0));
}

#[test]
fn nearest_hit_tie_goes_to_first() {
    let config = RenderConfig::default();
    let scene = [
        Sphere::new(Vector3::new(0.0, 0.0, -10.0), 1.0, Color::new(1.0, 0.0, 0.0)),
        Sphere::new(Vector3::new(0.0, 0.0, -10.0), 1.0, Color::new(0.0, 0.0, 1.0)),
    ];
    let tracer = Tracer::new(&scene, &config);
    let r = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, -1.0));

    assert_eq!(tracer.nearest_hit(&r).unwrap().index, 0);
}

#[test]
fn nearest_hit_from_inside_uses_exit() {
    let config = RenderConfig::default();
    let scene = [Sphere::new(Vector3::new(0.0, 0.0, -1.0), 2.0, Color::zero())];
    let tracer = Tracer::new(&scene, &config);
    let r = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, -1.0));

    assert!(feq(tracer.nearest_hit(&r).unwrap().t, 3.0));
}

#[test]
fn lambertian_top_of_sphere() {
    let config = RenderConfig::default();
    let scene = [
        Sphere::new(Vector3::zero(), 1.0, Color::new(0.5, 0.25, 0.1)),
        light_above(10.0),
    ];
    let c = trace(Vector3::new(0.0, 3.0, 0.0), Vector3::new(0.0, -1.0, 0.0),
        &scene, 0, &config);

    // cos(theta) is 1 at the top, so the color is surface * emission
    assert_eq!(c, Color::new(1.0, 0.5, 0.2));
}

#[test]
fn lambertian_oblique_light() {
    let config = RenderConfig::default();
    let scene = [
        Sphere::new(Vector3::zero(), 1.0, Color::uniform(0.5)),
        Sphere::new(Vector3::new(10.0, 1.0, 0.0), 1.0, Color::zero())
            .with_emission(Color::uniform(1.0)),
    ];
    let c = trace(Vector3::new(0.0, 3.0, 0.0), Vector3::new(0.0, -1.0, 0.0),
        &scene, 0, &config);

    // The light sits level with the hit point, perpendicular to the normal
    assert_eq!(c, Color::zero());
}

#[test]
fn lights_occlude_each_other() {
    let config = RenderConfig::default();
    let scene = [
        Sphere::new(Vector3::zero(), 1.0, Color::uniform(0.25)),
        light_above(10.0),
        light_above(20.0),
    ];
    let c = trace(Vector3::new(0.0, 3.0, 0.0), Vector3::new(0.0, -1.0, 0.0),
        &scene, 0, &config);

    // Each light blocks the shadow ray aimed at the other
    assert_eq!(c, Color::zero());
}

#[test]
fn lights_are_additive() {
    let config = RenderConfig::default();
    let scene = [
        Sphere::new(Vector3::zero(), 1.0, Color::uniform(0.25)),
        light_above(10.0),
        Sphere::new(Vector3::new(0.0, 10.0, 10.0), 1.0, Color::zero())
            .with_emission(Color::uniform(2.0)),
    ];
    let c = trace(Vector3::new(0.0, 3.0, 0.0), Vector3::new(0.0, -1.0, 0.0),
        &scene, 0, &config);
    let cos = 9.0 / f64::sqrt(181.0);

    assert_eq!(c, Color::uniform(0.5 + 0.5 * cos));
}

#[test]
fn occluder_blocks_light() {
    let config = RenderConfig::default();
    let scene = [
        Sphere::new(Vector3::zero(), 1.0, Color::uniform(0.5)),
        light_above(10.0),
        Sphere::new(Vector3::new(0.0, 5.0, 0.0), 1.0, Color::uniform(1.0)),
    ];
    let c = trace(Vector3::new(0.0, 3.0, 0.0), Vector3::new(0.0, -1.0, 0.0),
        &scene, 0, &config);

    assert_eq!(c, Color::zero());
}

#[test]
fn occluder_behind_light_still_blocks() {
    let config = RenderConfig::default();
    let scene = [
        Sphere::new(Vector3::zero(), 1.0, Color::uniform(0.5)),
        light_above(10.0),
        Sphere::new(Vector3::new(0.0, 30.0, 0.0), 1.0, Color::uniform(1.0)),
    ];
    let tracer = Tracer::new(&scene, &config);
    let over_point = Vector3::new(0.0, 1.0 + config.bias, 0.0);

    assert!(tracer.is_occluded(over_point, Vector3::new(0.0, 1.0, 0.0), 1));
    assert!(!tracer.is_occluded(over_point, Vector3::new(1.0, 0.0, 0.0), 1));
}

#[test]
fn emission_is_visible_directly() {
    let config = RenderConfig::default();
    let scene = [light_above(-5.0)];
    let c = trace(Vector3::zero(), Vector3::new(0.0, -1.0, 0.0), &scene, 0, &config);

    // A black light sees no other light, so only its emission remains
    assert_eq!(c, Color::uniform(2.0));
}

#[test]
fn reflection_of_background_head_on() {
    let config = RenderConfig::default();
    let scene = [
        Sphere::new(Vector3::new(0.0, 0.0, -5.0), 1.0, Color::uniform(0.5))
            .with_reflection(1.0),
    ];
    let tracer = Tracer::new(&scene, &config);
    let c = tracer.trace(&Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, -1.0)), 0);

    // Facing ratio of 1 leaves only the mix weight as Fresnel term
    assert_eq!(c, Color::uniform(2.0 * 0.01 * 0.5));
    assert_eq!(tracer.rays_traced(), 2);
}

#[test]
fn mirror_pair_stops_at_max_depth() {
    let config = RenderConfig::default();
    let scene = [
        Sphere::new(Vector3::new(0.0, 0.0, -10.0), 5.0, Color::uniform(1.0))
            .with_reflection(1.0),
        Sphere::new(Vector3::new(0.0, 0.0, 10.0), 5.0, Color::uniform(1.0))
            .with_reflection(1.0),
    ];
    let tracer = Tracer::new(&scene, &config);
    let c = tracer.trace(&Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, -1.0)), 0);

    assert_eq!(tracer.rays_traced(), config.max_depth + 1);
    assert_eq!(c, Color::zero());
}

#[test]
fn zero_max_depth_never_recurses() {
    let config = RenderConfig { max_depth: 0, ..Default::default() };
    let scene = [
        Sphere::new(Vector3::new(0.0, 0.0, -5.0), 1.0, Color::uniform(1.0))
            .with_reflection(1.0)
            .with_transparency(1.0),
    ];
    let tracer = Tracer::new(&scene, &config);
    tracer.trace(&Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, -1.0)), 0);

    assert_eq!(tracer.rays_traced(), 1);
}

#[test]
fn refract_straight_through() {
    let config = RenderConfig::default();
    let tracer = Tracer::new(&[], &config);
    let d = tracer.refract(Vector3::new(0.0, 0.0, -1.0), Vector3::new(0.0, 0.0, 1.0),
        false);

    assert_eq!(d, Some(Vector3::new(0.0, 0.0, -1.0)));
}

#[test]
fn refract_bends_toward_normal_on_entry() {
    let config = RenderConfig::default();
    let tracer = Tracer::new(&[], &config);
    let incoming = Vector3::new(1.0, 0.0, -1.0).normalized();
    let d = tracer.refract(incoming, Vector3::new(0.0, 0.0, 1.0), false).unwrap();

    assert!(feq(d.length(), 1.0));
    assert!(d.x > 0.0 && d.x < incoming.x);
}

#[test]
fn total_internal_reflection_policies() {
    let grazing = Vector3::new(0.95, 0.0, -0.312).normalized();
    let normal = Vector3::new(0.0, 0.0, 1.0);

    let config = RenderConfig::default();
    let tracer = Tracer::new(&[], &config);
    assert_eq!(tracer.refract(grazing, normal, true), None);

    let config = RenderConfig { refraction_policy: RefractionPolicy::Propagate,
        ..Default::default() };
    let tracer = Tracer::new(&[], &config);
    let d = tracer.refract(grazing, normal, true).unwrap();
    assert!(d.x.is_nan() && d.y.is_nan() && d.z.is_nan());
}

#[test]
fn nan_ray_sees_background() {
    let config = RenderConfig::default();
    let scene = [Sphere::new(Vector3::new(0.0, 0.0, -5.0), 1.0, Color::uniform(1.0))];
    let c = trace(Vector3::zero(), Vector3::uniform(f64::NAN), &scene, 1, &config);

    assert_eq!(c, config.background);
}

#[test]
fn grazing_exit_from_glass_sphere() {
    let scene = [
        Sphere::new(Vector3::new(0.0, 0.0, -5.0), 2.0, Color::uniform(1.0))
            .with_transparency(1.0),
    ];
    let origin = Vector3::new(0.0, 1.9, -5.0);
    let direction = Vector3::new(0.0, 0.0, -1.0);

    let config = RenderConfig::default();
    let reflect_only = trace(origin, direction, &scene, 0, &config);

    let config = RenderConfig { refraction_policy: RefractionPolicy::Propagate,
        ..Default::default() };
    let propagate = trace(origin, direction, &scene, 0, &config);

    assert!(reflect_only.x.is_finite());
    assert!(propagate.x.is_finite());
    assert!(propagate.x > reflect_only.x);
}

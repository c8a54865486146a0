use crate::ray::Ray;
use crate::vector::{ Vector3, Color };

/// A sphere and its material.
///
/// Spheres are built once while the scene is assembled and only read while
/// rendering. The radius is private so that the cached squared radius can
/// never disagree with it.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Sphere {
    /// The position of the sphere's center.
    pub center: Vector3,

    radius: f64,
    radius2: f64,

    /// The base color, filtering reflected and diffuse light.
    pub surface_color: Color,

    /// The light emitted by the sphere. Non-black only for lights.
    pub emission_color: Color,

    /// Reflectivity of the surface, conventionally in `[0, 1]`.
    pub reflection: f64,

    /// Transparency of the surface, conventionally in `[0, 1]`.
    pub transparency: f64,
}

impl Sphere {
    /// Creates an opaque, non-reflective, non-emissive sphere.
    pub fn new(center: Vector3, radius: f64, surface_color: Color) -> Sphere {
        Sphere {
            center,
            radius,
            radius2: radius * radius,
            surface_color,
            emission_color: Color::zero(),
            reflection: 0.0,
            transparency: 0.0,
        }
    }

    pub fn with_reflection(mut self, reflection: f64) -> Sphere {
        self.reflection = reflection;
        self
    }

    pub fn with_transparency(mut self, transparency: f64) -> Sphere {
        self.transparency = transparency;
        self
    }

    pub fn with_emission(mut self, emission_color: Color) -> Sphere {
        self.emission_color = emission_color;
        self
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn radius2(&self) -> f64 {
        self.radius2
    }

    /// Whether this sphere lights the scene.
    ///
    /// Only the red channel of the emission is inspected.
    pub fn is_light(&self) -> bool {
        self.emission_color.x > 0.0
    }

    /// Checks whether a ray crosses the sphere.
    ///
    /// `direction` must be unit length. Returns the entry and exit distances
    /// along the ray. The entry distance is negative when the origin lies
    /// inside the sphere.
    ///
    /// Spheres whose center projects behind the origin are never hit, even if
    /// the origin is inside them.
    pub fn intersect(&self, origin: Vector3, direction: Vector3)
        -> Option<(f64, f64)> {
        let to_center = self.center - origin;
        let proj = to_center.dot(&direction);
        if proj < 0.0 {
            return None;
        }

        // Squared distance from the center to the closest point on the ray
        let perp2 = to_center.dot(&to_center) - proj * proj;
        if perp2 > self.radius2 {
            return None;
        }

        let half_chord = (self.radius2 - perp2).sqrt();
        Some((proj - half_chord, proj + half_chord))
    }

    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f64, f64)> {
        self.intersect(ray.origin, ray.direction)
    }
}

/* Tests */

#[cfg(test)]
use crate::feq;

#[test]
fn radius_squared_is_cached() {
    let s = Sphere::new(Vector3::zero(), 3.0, Color::uniform(1.0));

    assert_eq!(s.radius(), 3.0);
    assert_eq!(s.radius2(), 9.0);
}

#[test]
fn builder_sets_material() {
    let s = Sphere::new(Vector3::zero(), 1.0, Color::uniform(0.5))
        .with_reflection(1.0)
        .with_transparency(0.5)
        .with_emission(Color::uniform(3.0));

    assert_eq!(s.reflection, 1.0);
    assert_eq!(s.transparency, 0.5);
    assert_eq!(s.emission_color, Color::uniform(3.0));
    assert!(s.is_light());
}

#[test]
fn only_red_emission_makes_light() {
    let s = Sphere::new(Vector3::zero(), 1.0, Color::zero())
        .with_emission(Color::new(0.0, 5.0, 5.0));

    assert!(!s.is_light());
}

#[test]
fn ray_toward_center() {
    let s = Sphere::new(Vector3::new(0.0, 0.0, -10.0), 2.0, Color::zero());
    let (t0, t1) = s.intersect(Vector3::zero(), Vector3::new(0.0, 0.0, -1.0))
        .expect("Ray aimed at the center should hit.");

    assert!(feq(t0, 8.0));
    assert!(feq(t1, 12.0));
}

#[test]
fn ray_tangent_to_sphere() {
    let s = Sphere::new(Vector3::new(0.0, 1.0, -5.0), 1.0, Color::zero());
    let (t0, t1) = s.intersect(Vector3::zero(), Vector3::new(0.0, 0.0, -1.0))
        .expect("Tangent ray should touch the sphere.");

    assert!(feq(t0, 5.0));
    assert!(feq(t1, 5.0));
}

#[test]
fn ray_misses_sphere() {
    let s = Sphere::new(Vector3::new(0.0, 2.0, -5.0), 1.0, Color::zero());

    assert!(s.intersect(Vector3::zero(), Vector3::new(0.0, 0.0, -1.0))
        .is_none());
}

#[test]
fn ray_pointing_away() {
    let s = Sphere::new(Vector3::new(0.0, 0.0, -10.0), 2.0, Color::zero());

    assert!(s.intersect(Vector3::zero(), Vector3::new(0.0, 0.0, 1.0))
        .is_none());
}

#[test]
fn ray_inside_sphere_center_ahead() {
    let s = Sphere::new(Vector3::zero(), 2.0, Color::zero());
    let r = Ray::new(Vector3::new(0.0, 0.0, 1.0), Vector3::new(0.0, 0.0, -1.0));
    let (t0, t1) = s.intersect_ray(&r).expect("Center is ahead of the ray.");

    assert!(feq(t0, -1.0));
    assert!(feq(t1, 3.0));
}

#[test]
fn ray_inside_sphere_center_behind() {
    let s = Sphere::new(Vector3::zero(), 2.0, Color::zero());
    let r = Ray::new(Vector3::new(0.0, 0.0, -1.0), Vector3::new(0.0, 0.0, -1.0));

    assert!(s.intersect_ray(&r).is_none());
}

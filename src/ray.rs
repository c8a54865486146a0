use crate::vector::Vector3;

/// A ray, cast from `origin` along `direction`.
///
/// Directions are expected to be unit length; nothing enforces this, but
/// `Sphere::intersect` relies on it.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Ray {
    pub origin: Vector3,
    pub direction: Vector3,
}

impl Ray {
    pub fn new(origin: Vector3, direction: Vector3) -> Ray {
        Ray { origin, direction }
    }

    pub fn position(&self, t: f64) -> Vector3 {
        self.origin + self.direction * t
    }
}

#[test]
fn ray_position() {
    let r = Ray::new(
                Vector3::new(2.0, 3.0, 4.0),
                Vector3::new(1.0, 0.0, 0.0)
            );

    assert_eq!(r.position(0.0), Vector3::new(2.0, 3.0, 4.0));
    assert_eq!(r.position(1.0), Vector3::new(3.0, 3.0, 4.0));
    assert_eq!(r.position(-1.0), Vector3::new(1.0, 3.0, 4.0));
    assert_eq!(r.position(2.5), Vector3::new(4.5, 3.0, 4.0));
}

use std::fmt;
use std::ops::{ Add, AddAssign, Sub, Neg, Mul, MulAssign };

use serde::{ Serialize, Deserialize };

use crate::feq;

/// A three-component vector.
///
/// Used for points, directions and colors alike. Arithmetic operators work
/// on copies; `normalize` is the only operation that mutates in place.
#[derive(Debug, Default, Copy, Clone)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Colors are vectors with `x`, `y` and `z` holding red, green and blue.
pub type Color = Vector3;

/// Partial equality on two vectors.
///
/// Components are compared within `FEQ_EPSILON` to absorb floating point
/// error.
impl PartialEq for Vector3 {
    fn eq(&self, other: &Vector3) -> bool {
        feq(self.x, other.x) &&
            feq(self.y, other.y) &&
            feq(self.z, other.z)
    }
}

/// Conversion from a vector of floats.
///
/// Takes the first three elements, in order. Missing elements default to
/// zero, so `[3.0]` becomes `(3, 0, 0)`.
impl From<&Vec<f64>> for Vector3 {
    fn from(v: &Vec<f64>) -> Vector3 {
        match v.len() {
            0 => Default::default(),
            1 => Vector3 { x: v[0], ..Default::default() },
            2 => Vector3 { x: v[0], y: v[1], ..Default::default() },
            _ => Vector3 { x: v[0], y: v[1], z: v[2] }
        }
    }
}

/// Vectors are stored as `[x, y, z]` arrays in scene files.
///
/// Short arrays are padded with zeros, see `From<&Vec<f64>>`.
impl Serialize for Vector3 {
    fn serialize<S: serde::Serializer>(&self, serializer: S)
        -> std::result::Result<S::Ok, S::Error> {
        [self.x, self.y, self.z].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Vector3 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D)
        -> std::result::Result<Vector3, D::Error> {
        let v: Vec<f64> = Deserialize::deserialize(deserializer)?;
        Ok((&v).into())
    }
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Vector3 {
        Vector3 { x, y, z }
    }

    pub fn zero() -> Vector3 {
        Vector3 { x: 0.0, y: 0.0, z: 0.0 }
    }

    /// Creates a vector with all three components equal to `v`.
    pub fn uniform(v: f64) -> Vector3 {
        Vector3 { x: v, y: v, z: v }
    }

    pub fn dot(&self, other: &Vector3) -> f64 {
        self.x * other.x
            + self.y * other.y
            + self.z * other.z
    }

    pub fn length2(&self) -> f64 {
        self.dot(self)
    }

    pub fn length(&self) -> f64 {
        self.length2().sqrt()
    }

    /// Scales this vector to unit length in place.
    ///
    /// A vector with a squared length of exactly zero is left untouched.
    /// Returns the vector so calls can be chained.
    pub fn normalize(&mut self) -> &mut Vector3 {
        let len2 = self.length2();
        if len2 > 0.0 {
            let inv = 1.0 / len2.sqrt();
            self.x *= inv;
            self.y *= inv;
            self.z *= inv;
        }

        self
    }

    /// Returns a normalized copy of this vector.
    pub fn normalized(mut self) -> Vector3 {
        self.normalize();
        self
    }

    /// Reflects a vector across a normal.
    pub fn reflect(&self, normal: &Vector3) -> Vector3 {
        *self - *normal * 2.0 * self.dot(normal)
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {} {}]", self.x, self.y, self.z)
    }
}

impl Add for Vector3 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z
        }
    }
}

impl AddAssign for Vector3 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
        self.z += other.z;
    }
}

impl Sub for Vector3 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z
        }
    }
}

impl Neg for Vector3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z
        }
    }
}

/// Implements scalar right-multiplication for a vector.
///
/// ```
/// use sphere_tracer::vector::Vector3;
///
/// let v = Vector3::new(1.0, 2.0, 3.0);
/// assert_eq!(v * 2.0, Vector3::new(2.0, 4.0, 6.0));
/// ```
impl Mul<f64> for Vector3 {
    type Output = Self;

    fn mul(self, other: f64) -> Self {
        Self {
            x: self.x * other,
            y: self.y * other,
            z: self.z * other
        }
    }
}

/// Component-wise multiplication.
///
/// This is how colors are filtered by surfaces and lights.
///
/// ```
/// use sphere_tracer::vector::Color;
///
/// let yellow = Color::new(1.0, 1.0, 0.0);
/// let purple = Color::new(1.0, 0.0, 1.0);
/// assert_eq!(yellow * purple, Color::new(1.0, 0.0, 0.0));
/// ```
impl Mul for Vector3 {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Self {
            x: self.x * other.x,
            y: self.y * other.y,
            z: self.z * other.z
        }
    }
}

impl MulAssign for Vector3 {
    fn mul_assign(&mut self, other: Self) {
        self.x *= other.x;
        self.y *= other.y;
        self.z *= other.z;
    }
}

/* Tests */

#[test]
fn construct_vectors() {
    assert_eq!(Vector3::zero(), Vector3::new(0.0, 0.0, 0.0));
    assert_eq!(Vector3::uniform(3.0), Vector3::new(3.0, 3.0, 3.0));
    assert_eq!(Vector3::default(), Vector3::zero());
}

#[test]
fn add_vectors() {
    let a = Vector3::new(3.0, -2.0, 5.0);
    let b = Vector3::new(-2.0, 3.0, 1.0);

    assert_eq!(a + b, Vector3::new(1.0, 1.0, 6.0));
}

#[test]
fn add_assign_vectors() {
    let mut a = Vector3::new(3.0, -2.0, 5.0);
    a += Vector3::new(1.0, 1.0, 1.0);

    assert_eq!(a, Vector3::new(4.0, -1.0, 6.0));
}

#[test]
fn sub_vectors() {
    let a = Vector3::new(3.0, 2.0, 1.0);
    let b = Vector3::new(5.0, 6.0, 7.0);

    assert_eq!(a - b, Vector3::new(-2.0, -4.0, -6.0));
}

#[test]
fn neg_vector() {
    let a = Vector3::new(1.0, -2.0, 3.0);

    assert_eq!(-a, Vector3::new(-1.0, 2.0, -3.0));
}

#[test]
fn mul_scalar() {
    let a = Vector3::new(1.0, -2.0, 3.0);

    assert_eq!(a * 3.5, Vector3::new(3.5, -7.0, 10.5));
}

#[test]
fn mul_componentwise() {
    let mut a = Vector3::new(0.2, 0.3, 0.4);
    let b = Vector3::new(2.0, 3.0, 0.5);

    assert_eq!(a * b, Vector3::new(0.4, 0.9, 0.2));

    a *= b;
    assert_eq!(a, Vector3::new(0.4, 0.9, 0.2));
}

#[test]
fn length_of_vector() {
    let v = Vector3::new(-1.0, -2.0, -3.0);

    assert_eq!(v.length(), f64::sqrt(14.0));
    assert!(feq(v.length2(), 14.0));
}

#[test]
fn dot_is_squared_length() {
    let vs = [
        Vector3::new(1.0, 2.0, 3.0),
        Vector3::new(-0.5, 7.25, 0.0),
        Vector3::new(1e3, -1e-3, 42.0),
    ];

    for v in vs.iter() {
        assert!((v.dot(v) - v.length().powi(2)).abs() < 1e-6);
    }
}

#[test]
fn dot_vectors() {
    let a = Vector3::new(1.0, 2.0, 3.0);
    let b = Vector3::new(2.0, 3.0, 4.0);

    assert_eq!(a.dot(&b), 20.0);
}

#[test]
fn normalize_clean() {
    let mut v = Vector3::new(4.0, 0.0, 0.0);
    v.normalize();

    assert_eq!(v, Vector3::new(1.0, 0.0, 0.0));
}

#[test]
fn normalize_dirty() {
    let v = Vector3::new(1.0, 2.0, 3.0).normalized();
    let e = Vector3::new(
        1.0 / f64::sqrt(14.0),
        2.0 / f64::sqrt(14.0),
        3.0 / f64::sqrt(14.0)
    );

    assert_eq!(v, e);
    assert!(feq(v.length(), 1.0));
}

#[test]
fn normalize_returns_self() {
    let mut v = Vector3::new(0.0, -3.0, 0.0);
    let len = v.normalize().length();

    assert!(feq(len, 1.0));
    assert_eq!(v, Vector3::new(0.0, -1.0, 0.0));
}

#[test]
fn normalize_zero_is_noop() {
    let mut v = Vector3::zero();
    v.normalize();

    assert_eq!(v.x, 0.0);
    assert_eq!(v.y, 0.0);
    assert_eq!(v.z, 0.0);
}

#[test]
fn reflect_45() {
    let v = Vector3::new(1.0, -1.0, 0.0);
    let n = Vector3::new(0.0, 1.0, 0.0);

    assert_eq!(v.reflect(&n), Vector3::new(1.0, 1.0, 0.0));
}

#[test]
fn vector_from_short_vec() {
    assert_eq!(Vector3::from(&Vec::<f64>::new()), Vector3::zero());
    assert_eq!(Vector3::from(&vec![3.0f64]), Vector3::new(3.0, 0.0, 0.0));
    assert_eq!(Vector3::from(&vec![1.0f64, 2.0, 3.0, 4.0]),
        Vector3::new(1.0, 2.0, 3.0));
}

#[test]
fn display_vector() {
    assert_eq!(Vector3::new(1.0, -2.5, 0.0).to_string(), "[1 -2.5 0]");
}

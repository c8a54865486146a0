use std::fmt;
use std::str::FromStr;

use serde::{ Serialize, Deserialize };

use crate::consts::{ CANVAS_WIDTH, CANVAS_HEIGHT, FIELD_OF_VIEW, MAX_RAY_DEPTH,
    RAY_BIAS, SPHERE_RI, BACKGROUND, NUM_THREADS };
use crate::error::{ Error, Result };
use crate::vector::{ Vector3, Color };

/// What to do when a refracted ray cannot exist.
///
/// Past the critical angle, Snell's law asks for the square root of a
/// negative number.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefractionPolicy {
    /// Drop the refracted contribution and keep only the reflection.
    ReflectOnly,

    /// Take the square root anyway and let the NaN flow into the color.
    /// Matches renders made without the guard.
    Propagate,
}

impl Default for RefractionPolicy {
    fn default() -> RefractionPolicy {
        RefractionPolicy::ReflectOnly
    }
}

impl FromStr for RefractionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<RefractionPolicy, String> {
        match s {
            "reflect-only" => Ok(RefractionPolicy::ReflectOnly),
            "propagate" => Ok(RefractionPolicy::Propagate),
            _ => Err(format!(
                "unknown refraction policy `{}` (expected reflect-only or propagate)", s
            )),
        }
    }
}

impl fmt::Display for RefractionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefractionPolicy::ReflectOnly => write!(f, "reflect-only"),
            RefractionPolicy::Propagate => write!(f, "propagate"),
        }
    }
}

/// Parameters for one render.
///
/// Every field has a default, so a scene file only needs to list the ones it
/// changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// The width of the image, in pixels.
    pub width: usize,

    /// The height of the image, in pixels.
    pub height: usize,

    /// The vertical field of view, in degrees.
    pub fov: f64,

    /// Reflection and refraction stop recursing at this depth.
    pub max_depth: usize,

    /// Offset of secondary ray origins along the surface normal.
    pub bias: f64,

    /// Refractive index of every transparent sphere.
    pub ior: f64,

    /// The color returned by rays that hit nothing.
    pub background: Color,

    pub refraction_policy: RefractionPolicy,

    /// Render threads. `1` renders on the calling thread, `0` uses one
    /// thread per core.
    pub threads: usize,
}

impl Default for RenderConfig {
    fn default() -> RenderConfig {
        RenderConfig {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
            fov: FIELD_OF_VIEW,
            max_depth: MAX_RAY_DEPTH,
            bias: RAY_BIAS,
            ior: SPHERE_RI,
            background: Vector3::uniform(BACKGROUND),
            refraction_policy: Default::default(),
            threads: NUM_THREADS,
        }
    }
}

impl RenderConfig {
    /// Rejects parameters the camera cannot work with.
    ///
    /// Material values and geometry are never checked.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "image must be at least 1x1, got {}x{}", self.width, self.height
            )));
        }

        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(Error::InvalidConfig(format!(
                "field of view must be between 0 and 180 degrees, got {}", self.fov
            )));
        }

        Ok(())
    }
}

#[test]
fn default_config() {
    let c = RenderConfig::default();

    assert_eq!(c.width, 640);
    assert_eq!(c.height, 480);
    assert_eq!(c.fov, 30.0);
    assert_eq!(c.max_depth, 5);
    assert_eq!(c.bias, 1e-4);
    assert_eq!(c.ior, 1.1);
    assert_eq!(c.background, Vector3::uniform(2.0));
    assert_eq!(c.refraction_policy, RefractionPolicy::ReflectOnly);
    assert!(c.validate().is_ok());
}

#[test]
fn partial_config_from_json() {
    let c: RenderConfig = serde_json::from_str(
        r#"{ "width": 32, "background": [0.0, 0.5], "refraction_policy": "propagate" }"#
    ).unwrap();

    assert_eq!(c.width, 32);
    assert_eq!(c.height, 480);
    assert_eq!(c.background, Vector3::new(0.0, 0.5, 0.0));
    assert_eq!(c.refraction_policy, RefractionPolicy::Propagate);
}

#[test]
fn reject_empty_image() {
    let c = RenderConfig { height: 0, ..Default::default() };

    assert!(matches!(c.validate(), Err(Error::InvalidConfig(_))));
}

#[test]
fn reject_bad_fov() {
    let c = RenderConfig { fov: 180.0, ..Default::default() };
    assert!(c.validate().is_err());

    let c = RenderConfig { fov: f64::NAN, ..Default::default() };
    assert!(c.validate().is_err());
}

#[test]
fn parse_refraction_policy() {
    assert_eq!("propagate".parse::<RefractionPolicy>(), Ok(RefractionPolicy::Propagate));
    assert_eq!("reflect-only".parse::<RefractionPolicy>(), Ok(RefractionPolicy::ReflectOnly));
    assert!("clamp".parse::<RefractionPolicy>().is_err());
    assert_eq!(RefractionPolicy::Propagate.to_string(), "propagate");
}

use std::fs;
use std::path::Path;

use log::debug;
use serde::{ Serialize, Deserialize };

use crate::config::RenderConfig;
use crate::error::{ Error, Result };
use crate::sphere::Sphere;
use crate::vector::{ Vector3, Color };

/// Everything needed for one render: the spheres and the parameters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    pub config: RenderConfig,
    pub spheres: Vec<Sphere>,
}

impl Scene {
    /// The classic scene: a huge ground sphere, four mirrored spheres (the
    /// center one also half transparent) and a single light above and
    /// behind them.
    pub fn reference() -> Scene {
        let spheres = vec![
            // Ground
            Sphere::new(Vector3::new(0.0, -10004.0, -20.0), 10000.0,
                Color::new(0.20, 0.20, 0.20)),

            Sphere::new(Vector3::new(0.0, 0.0, -20.0), 4.0,
                Color::new(1.00, 0.32, 0.36))
                .with_reflection(1.0)
                .with_transparency(0.5),
            Sphere::new(Vector3::new(5.0, -1.0, -15.0), 2.0,
                Color::new(0.90, 0.76, 0.46))
                .with_reflection(1.0),
            Sphere::new(Vector3::new(5.0, 0.0, -25.0), 3.0,
                Color::new(0.65, 0.77, 0.97))
                .with_reflection(1.0),
            Sphere::new(Vector3::new(-5.5, 0.0, -15.0), 3.0,
                Color::new(0.90, 0.90, 0.90))
                .with_reflection(1.0),

            // Light
            Sphere::new(Vector3::new(0.0, 20.0, -30.0), 3.0, Color::zero())
                .with_emission(Color::uniform(3.0)),
        ];

        Scene { config: Default::default(), spheres }
    }

    /// Parses a JSON scene description.
    pub fn from_json(json: &str) -> Result<Scene> {
        let scene_json: SceneJson = serde_json::from_str(json)?;
        Ok(scene_json.into())
    }

    /// Reads and parses a JSON scene description from `path`.
    pub fn from_file(path: &Path) -> Result<Scene> {
        let json = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let scene = Scene::from_json(&json)?;

        debug!("Loaded {} spheres from {}", scene.spheres.len(), path.display());
        Ok(scene)
    }

    pub fn to_json(&self) -> Result<String> {
        let scene_json = SceneJson {
            config: self.config.clone(),
            spheres: self.spheres.iter().map(|s| s.into()).collect(),
        };

        Ok(serde_json::to_string_pretty(&scene_json)?)
    }
}

impl From<SceneJson> for Scene {
    fn from(scene_json: SceneJson) -> Scene {
        Scene {
            config: scene_json.config,
            spheres: scene_json.spheres.into_iter().map(|x| x.into()).collect(),
        }
    }
}

/// The on-disk form of a scene.
///
/// Vectors are arrays of up to three numbers; missing components are zero.
#[derive(Serialize, Deserialize)]
pub struct SceneJson {
    #[serde(default)]
    config: RenderConfig,
    spheres: Vec<SphereJson>,
}

#[derive(Clone, Serialize, Deserialize)]
struct SphereJson {
    center: Vec<f64>,
    radius: f64,
    surface_color: Vec<f64>,

    #[serde(default)]
    reflection: f64,
    #[serde(default)]
    transparency: f64,
    #[serde(default)]
    emission_color: Vec<f64>,
}

impl From<SphereJson> for Sphere {
    fn from(sphere_json: SphereJson) -> Sphere {
        Sphere::new((&sphere_json.center).into(), sphere_json.radius,
            (&sphere_json.surface_color).into())
            .with_reflection(sphere_json.reflection)
            .with_transparency(sphere_json.transparency)
            .with_emission((&sphere_json.emission_color).into())
    }
}

impl From<&Sphere> for SphereJson {
    fn from(s: &Sphere) -> SphereJson {
        let arr = |v: Vector3| vec![v.x, v.y, v.z];
        SphereJson {
            center: arr(s.center),
            radius: s.radius(),
            surface_color: arr(s.surface_color),
            reflection: s.reflection,
            transparency: s.transparency,
            emission_color: arr(s.emission_color),
        }
    }
}

#[test]
fn reference_scene_layout() {
    let scene = Scene::reference();

    assert_eq!(scene.spheres.len(), 6);
    assert_eq!(scene.spheres.iter().filter(|s| s.is_light()).count(), 1);
    assert!(scene.spheres[5].is_light());
    assert_eq!(scene.spheres[0].radius(), 10000.0);
    assert_eq!(scene.spheres[1].transparency, 0.5);
    assert_eq!(scene.config, RenderConfig::default());
}

#[test]
fn parse_minimal_scene() {
    let scene = Scene::from_json(r#"{
        "spheres": [
            { "center": [0, 0, -5], "radius": 1, "surface_color": [1, 0.5] },
            { "center": [0, 10], "radius": 2, "surface_color": [],
              "emission_color": [3, 3, 3] }
        ]
    }"#).unwrap();

    assert_eq!(scene.config, RenderConfig::default());
    assert_eq!(scene.spheres.len(), 2);

    let s = &scene.spheres[0];
    assert_eq!(s.center, Vector3::new(0.0, 0.0, -5.0));
    assert_eq!(s.surface_color, Color::new(1.0, 0.5, 0.0));
    assert_eq!(s.reflection, 0.0);
    assert_eq!(s.emission_color, Color::zero());
    assert!(!s.is_light());

    let light = &scene.spheres[1];
    assert_eq!(light.center, Vector3::new(0.0, 10.0, 0.0));
    assert_eq!(light.radius2(), 4.0);
    assert!(light.is_light());
}

#[test]
fn parse_scene_with_config() {
    let scene = Scene::from_json(r#"{
        "config": { "width": 320, "height": 240, "max_depth": 2 },
        "spheres": []
    }"#).unwrap();

    assert_eq!(scene.config.width, 320);
    assert_eq!(scene.config.max_depth, 2);
    assert_eq!(scene.config.fov, 30.0);
    assert!(scene.spheres.is_empty());
}

#[test]
fn degenerate_spheres_are_accepted() {
    let scene = Scene::from_json(r#"{ "spheres": [
        { "center": [0, 0, 0], "radius": -1, "surface_color": [1, 1, 1] },
        { "center": [0, 0, 0], "radius": 0, "surface_color": [1, 1, 1] }
    ] }"#).unwrap();

    assert_eq!(scene.spheres[0].radius2(), 1.0);
    assert_eq!(scene.spheres[1].radius(), 0.0);
}

#[test]
fn reject_malformed_scene() {
    let err = Scene::from_json(r#"{ "spheres": [ { "radius": 1 } ] }"#);

    assert!(matches!(err, Err(Error::SceneParse(_))));
}

#[test]
fn scene_survives_json() {
    let scene = Scene::reference();
    let json = scene.to_json().unwrap();

    assert_eq!(Scene::from_json(&json).unwrap(), scene);
}

#[test]
fn missing_scene_file() {
    let err = Scene::from_file(Path::new("/nonexistent/scene.json"));

    assert!(matches!(err, Err(Error::Io { .. })));
}

#[test]
fn render_reference_scene() {
    use crate::renderer::Renderer;

    let mut scene = Scene::reference();
    scene.config.width = 64;
    scene.config.height = 48;

    let image = Renderer::new(scene.config.clone()).render(&scene.spheres);
    let bytes = image.to_rgb_bytes();
    let pixel = |x: usize, y: usize| {
        let i = (y * 64 + x) * 3;
        [bytes[i], bytes[i + 1], bytes[i + 2]]
    };

    // Sky in the corner, the red glass sphere in the middle
    assert_eq!(pixel(0, 0), [255, 255, 255]);

    let [r, g, b] = pixel(32, 24);
    assert!(r > g && r > b);

    let ground: u32 = pixel(32, 47).iter().map(|&c| c as u32).sum();
    assert!(ground < 3 * 255);
}

#[test]
fn reference_render_matches_samples() {
    use crate::parallel::parallel_render;
    use crate::renderer::Renderer;

    // Every 8th pixel of the 640x480 reference image, starting at (4, 4)
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenes/reference_samples.ppm");
    let samples = fs::read(&path).unwrap();
    let header = b"P6\n80 60\n255\n";
    assert!(samples.starts_with(header));
    let samples = &samples[header.len()..];
    assert_eq!(samples.len(), 80 * 60 * 3);

    let scene = Scene::reference();
    assert_eq!((scene.config.width, scene.config.height), (640, 480));
    assert_eq!(scene.config.fov, 30.0);

    let renderer = Renderer::new(scene.config.clone());
    let bytes = parallel_render(&renderer, &scene.spheres, 0).unwrap().to_rgb_bytes();
    assert_eq!(bytes.len(), 640 * 480 * 3);

    // Silhouette pixels may flip between neighbouring colors under rounding
    let mut off = 0;
    for j in 0..60 {
        for i in 0..80 {
            let (x, y) = (8 * i + 4, 8 * j + 4);
            for c in 0..3 {
                let got = bytes[(y * 640 + x) * 3 + c] as i32;
                let want = samples[(j * 80 + i) * 3 + c] as i32;
                if (got - want).abs() > 2 {
                    off += 1;
                }
            }
        }
    }

    assert!(off <= 40, "{} sampled channels differ by more than 2", off);
}

#[test]
fn bundled_scene_file_matches_reference() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenes/reference.json");
    let scene = Scene::from_file(&path).unwrap();

    assert_eq!(scene, Scene::reference());
}

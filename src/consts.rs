// Canvas defaults
pub const CANVAS_WIDTH: usize = 640;
pub const CANVAS_HEIGHT: usize = 480;

// Camera defaults, vertical field of view in degrees
pub const FIELD_OF_VIEW: f64 = 30.0;

// Worker threads used by the parallel renderer (1 renders sequentially)
pub const NUM_THREADS: usize = 1;

// Floating point comparisons
pub const FEQ_EPSILON: f64 = 0.0001;

// Maximum recursion depth for reflected and refracted rays
pub const MAX_RAY_DEPTH: usize = 5;

// Offset applied to secondary ray origins along the surface normal
pub const RAY_BIAS: f64 = 1e-4;

// Refractive index shared by every transparent sphere
pub const SPHERE_RI: f64 = 1.1;

// Uniform background, clamps to light grey on output
pub const BACKGROUND: f64 = 2.0;

// Weight blending the facing-ratio term toward full reflection
pub const FRESNEL_MIX: f64 = 0.01;

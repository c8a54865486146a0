pub mod consts;
pub mod error;

pub mod vector;
pub mod ray;
pub mod sphere;

pub mod config;
pub mod tracer;

pub mod canvas;
pub mod renderer;
pub mod parallel;

pub mod scene;

pub use error::{ Error, Result };

use consts::FEQ_EPSILON;

pub fn feq(left: f64, right: f64) -> bool {
    (left - right).abs() < FEQ_EPSILON
}

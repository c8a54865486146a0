use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the ray tracer.
///
/// Tracing itself never fails; everything here comes from the collaborators
/// around it (reading a scene, writing the image, building the worker pool).
#[derive(Debug, Error)]
pub enum Error {
    /// A scene or image file could not be read or written.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A scene description was not valid JSON for a scene.
    #[error("failed to parse scene description: {0}")]
    SceneParse(#[from] serde_json::Error),

    /// A render parameter cannot produce an image.
    #[error("invalid render configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to build render thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Error {
        Error::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[test]
fn io_error_names_path() {
    let e = Error::io("out.ppm",
        io::Error::new(io::ErrorKind::PermissionDenied, "denied"));

    assert_eq!(e.to_string(), "I/O error on out.ppm: denied");
}

use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading scene assets from disk.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("unable to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("model does not define any {0}")]
    Empty(&'static str),
    #[error("unable to decode image {path}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

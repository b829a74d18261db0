//! Error types for scene loading and image output
//!
//! Bad render parameters (zero-size images, out of range bit depths) are
//! programmer errors and panic at the call that received them. Only I/O and
//! data problems come back as `RenderError`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Failed to load texture {}: {source}", path.display())]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Invalid mesh '{name}': {reason}")]
    InvalidMesh { name: String, reason: String },

    #[error("Invalid scene: {0}")]
    InvalidScene(String),
}

pub type RenderResult<T> = Result<T, RenderError>;

//! Error types for the renderer.
//!
//! Ray queries and path integration never fail; only configuration and
//! image output can.

use thiserror::Error;

/// Errors that can occur while configuring a render or saving its output.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Failed to parse render config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid render config: {0}")]
    InvalidConfig(String),

    #[error("Cannot save an empty {width}x{height} image")]
    EmptyImage { width: u32, height: u32 },
}

pub type RenderResult<T> = Result<T, RenderError>;

//! Error types surfaced before rendering starts.
//!
//! Nothing on the per-sample hot path returns these; hits, scatters and PDF
//! queries report failure through `bool`/`Option` instead.

use thiserror::Error;

/// Errors raised while building the BVH.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BvhError {
    #[error("primitive {index} has no bounding box and cannot be placed in the BVH")]
    Unbounded { index: usize },
}

/// Errors raised while validating a render configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("max_depth must be non-negative, got {0}")]
    NegativeDepth(i32),

    #[error("samples_per_pixel must be at least 1")]
    NoSamples,

    #[error("image dimensions must be non-zero, got {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    #[error("camera is {camera_width}x{camera_height} but the config asks for {width}x{height}")]
    ResolutionMismatch {
        width: u32,
        height: u32,
        camera_width: u32,
        camera_height: u32,
    },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

/// Errors that can occur while loading an image texture.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("pixel buffer holds {actual} bytes, expected {expected} for {width}x{height} RGB")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Any failure that aborts a render before pixels are produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error(transparent)]
    Bvh(#[from] BvhError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type BvhResult<T> = Result<T, BvhError>;
pub type TextureResult<T> = Result<T, TextureError>;
pub type RenderResult<T> = Result<T, RenderError>;

//! Errors surfaced by the render scheduler.
//!
//! Intersection and shading never fail; only setting up a render can.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to build the worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("scene was not prepared before rendering (call Scene::prepare)")]
    SceneNotPrepared,

    #[error("render target has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("expected {expected} pixels, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("invalid render configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;

use crate::preprocessing::DecodeError;
use ndarray::{Array, Ix4};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("Model file not found: {0:?}")]
    NotFound(PathBuf),
    #[error("Failed to create inference session: {0}")]
    Runtime(#[from] ort::Error),
    #[error("Model graph declares no outputs")]
    NoOutputs,
}

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("Inference failed: {0}")]
    Runtime(String),
    #[error("Model returned an empty output tensor")]
    EmptyOutput,
    #[error("Model returned a NaN logit")]
    NanLogit,
}

/// A loaded binary classifier: one forward pass over a preprocessed batch of
/// one image, returning the raw logit.
pub trait ModelService: Send + Sync + 'static {
    fn forward(&self, input: &Array<f32, Ix4>) -> Result<f32, InferenceError>;
}

use crate::{
    model_service::{InferenceError, ModelService},
    preprocessing::transform_image,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Cat,
    Dog,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Cat => "cat",
            Label::Dog => "dog",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: Label,
    pub confidence: f32,
}

fn sigmoid(logit: f32) -> f32 {
    1. / (1. + (-logit).exp())
}

/// Maps a raw logit to a label. Probabilities strictly above one half are
/// dogs; an exact tie goes to cat.
pub fn classify(logit: f32) -> Prediction {
    let probability = sigmoid(logit);
    if probability > 0.5 {
        Prediction {
            label: Label::Dog,
            confidence: probability,
        }
    } else {
        Prediction {
            label: Label::Cat,
            confidence: 1. - probability,
        }
    }
}

/// Owns a loaded model and turns uploaded image bytes into a [`Prediction`].
///
/// The engine never mutates after construction, so one instance can be
/// shared across concurrent requests behind an `Arc`.
#[derive(Debug)]
pub struct InferenceEngine<M: ModelService> {
    model_service: M,
}

impl<M: ModelService> InferenceEngine<M> {
    pub fn new(model_service: M) -> Self {
        Self { model_service }
    }

    pub fn predict(&self, image_data: &[u8]) -> Result<Prediction, InferenceError> {
        let input = transform_image(image_data)?;
        let logit = self.model_service.forward(&input)?;
        tracing::debug!("Model returned logit {:.4}", logit);
        if logit.is_nan() {
            return Err(InferenceError::NanLogit);
        }

        Ok(classify(logit))
    }
}

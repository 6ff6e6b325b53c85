use crate::{
    config::ModelConfig,
    model_service::{InferenceError, ModelLoadError, ModelService},
};
use ndarray::{Array, Ix4};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct OrtModelService {
    sessions: Vec<Mutex<Session>>,
    counter: AtomicUsize,
    output_name: String,
}

impl OrtModelService {
    pub fn new(model_config: &ModelConfig) -> Result<Self, ModelLoadError> {
        let model_path = model_config.get_path();
        if !model_path.is_file() {
            return Err(ModelLoadError::NotFound(model_path));
        }

        let num_instances = model_config.num_instances.max(1);
        let sessions = (0..num_instances)
            .map(|_| {
                let session = Session::builder()?
                    .with_optimization_level(GraphOptimizationLevel::Level3)?
                    .commit_from_file(&model_path)?;
                Ok(Mutex::new(session))
            })
            .collect::<Result<Vec<_>, ort::Error>>()?;

        let output_name = sessions[0]
            .lock()
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or(ModelLoadError::NoOutputs)?;

        tracing::info!(
            "Created {} ONNX sessions from {:?}",
            num_instances,
            model_path
        );

        Ok(Self {
            sessions,
            counter: AtomicUsize::new(0),
            output_name,
        })
    }
}

impl ModelService for OrtModelService {
    fn forward(&self, input: &Array<f32, Ix4>) -> Result<f32, InferenceError> {
        let index = self.counter.fetch_add(1, Ordering::Relaxed) % self.sessions.len();
        let mut session = self.sessions[index].lock();

        tracing::debug!("Handling request with session {}", index);
        let tensor_ref = TensorRef::from_array_view(input.view())
            .map_err(|e| InferenceError::Runtime(format!("failed to build tensor: {}", e)))?;

        let outputs = session
            .run(ort::inputs![tensor_ref])
            .map_err(|e| InferenceError::Runtime(e.to_string()))?;

        let (_, data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::Runtime(format!("failed to extract tensor: {}", e)))?;

        data.first().copied().ok_or(InferenceError::EmptyOutput)
    }
}

use std::path::Path;
use std::sync::{Arc, Mutex};

use ndarray::Array4;
use tch::{CModule, Device, Tensor};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model is not loaded")]
    Unavailable,
    #[error("Inference error: {0}")]
    Inference(#[from] tch::TchError),
}

/// Handle to the loaded TorchScript detector. Cheap to clone; all clones
/// share one module and serialize their forward calls through the mutex,
/// since the scripted module is not assumed safe for concurrent invocation.
#[derive(Clone)]
pub struct ModelHandle {
    module: Option<Arc<Mutex<CModule>>>,
}

impl ModelHandle {
    /// Loads the artifact once at startup. A load failure leaves the handle
    /// in the unavailable state instead of aborting the process; every later
    /// call to `infer` reports it.
    pub fn load(path: &Path) -> Self {
        let device = Device::cuda_if_available();
        match CModule::load_on_device(path, device) {
            Ok(module) => {
                log::info!("Loaded detector model from {}", path.display());
                Self {
                    module: Some(Arc::new(Mutex::new(module))),
                }
            }
            Err(e) => {
                log::error!(
                    "Failed to load detector model from {}: {:?}",
                    path.display(),
                    e
                );
                Self { module: None }
            }
        }
    }

    #[cfg(test)]
    pub fn unavailable() -> Self {
        Self { module: None }
    }

    pub fn is_available(&self) -> bool {
        self.module.is_some()
    }

    /// Runs one forward pass and returns the scalar probability the model
    /// assigns to the REAL class.
    pub fn infer(&self, batch: &Array4<f32>) -> Result<f32, ModelError> {
        let module = self.module.as_ref().ok_or(ModelError::Unavailable)?;

        let (samples, height, width, channels) = batch.dim();
        let data: Vec<f32> = batch.iter().copied().collect();
        let input = Tensor::from_slice(&data).view([
            samples as i64,
            height as i64,
            width as i64,
            channels as i64,
        ]);

        let output = module.lock().unwrap().forward_ts(&[input])?;
        let probability = output.f_view([-1])?.f_double_value(&[0])?;
        Ok(probability as f32)
    }
}

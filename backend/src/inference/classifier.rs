use ndarray::Array4;
use shared::Label;

use super::model::{ModelError, ModelHandle};

/// Midpoint of the model's output range; scores below it read as FAKE.
pub const DECISION_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub label: Label,
    /// Probability mass assigned to `label`, as an unformatted fraction.
    pub confidence: f32,
}

/// Maps the model's raw probability to a discrete verdict. Owns the handle
/// it classifies with; inject it wherever a request needs one.
#[derive(Clone)]
pub struct Classifier {
    model: ModelHandle,
}

impl Classifier {
    pub fn new(model: ModelHandle) -> Self {
        Self { model }
    }

    pub fn classify(&self, batch: &Array4<f32>) -> Result<Classification, ModelError> {
        let p = self.model.infer(batch)?;
        Ok(Self::decide(p))
    }

    /// Confidence always describes the reported label, so it is `p` for
    /// REAL and `1 - p` for FAKE, never the raw score itself.
    fn decide(p: f32) -> Classification {
        if p < DECISION_THRESHOLD {
            Classification {
                label: Label::Fake,
                confidence: 1.0 - p,
            }
        } else {
            Classification {
                label: Label::Real,
                confidence: p,
            }
        }
    }
}

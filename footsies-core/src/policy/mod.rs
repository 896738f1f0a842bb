//! Policy-driven input: an opaque recurrent model behind [`InferenceBackend`],
//! turned into per-frame input bits by [`PolicyController`].

mod controller;
mod linear;
mod sampling;

pub use controller::{side_of, PolicyController, Side};
pub use linear::{JsonModelFactory, LinearRecurrentPolicy};
pub use sampling::{decode_action, sample, softmax};

use crate::error::{InferenceError, ModelLoadError};

/// Opaque recurrent state carried between inference calls.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecurrentState {
    pub hidden: Vec<f32>,
    pub cell: Vec<f32>,
}

impl RecurrentState {
    pub fn zeros(size: usize) -> Self {
        Self {
            hidden: vec![0.0; size],
            cell: vec![0.0; size],
        }
    }
}

/// Inputs for one call. Borrowed only for the duration of the call.
#[derive(Clone, Copy, Debug)]
pub struct InferenceRequest<'a> {
    pub observation: &'a [f32],
    pub state: &'a RecurrentState,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InferenceOutput {
    pub logits: Vec<f32>,
    pub state: RecurrentState,
}

pub trait InferenceBackend: Send {
    fn model_id(&self) -> &str;

    /// Length of the hidden and cell vectors this model expects.
    fn state_size(&self) -> usize;

    fn infer(&self, request: InferenceRequest<'_>) -> Result<InferenceOutput, InferenceError>;
}

/// Resolves a model identifier to a loaded backend.
pub trait BackendFactory: Send + Sync {
    fn load(&self, model_id: &str) -> Result<Box<dyn InferenceBackend>, ModelLoadError>;
}

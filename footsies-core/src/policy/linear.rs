use std::fs::{self, File};
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::encoder::OBSERVATION_LEN;
use crate::error::{InferenceError, ModelLoadError};

use super::{BackendFactory, InferenceBackend, InferenceOutput, InferenceRequest, RecurrentState};

/// Single-layer tanh recurrent policy stored as JSON.
///
/// `hidden' = tanh(W_in * obs + W_rec * hidden + b)`, the cell keeps a running
/// average of hidden activations, and `logits = W_out * hidden' + b_out`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearRecurrentPolicy {
    #[serde(default)]
    pub model_id: String,
    pub observation_size: usize,
    pub state_size: usize,
    pub input_weights: Vec<Vec<f32>>,
    pub recurrent_weights: Vec<Vec<f32>>,
    pub hidden_bias: Vec<f32>,
    pub output_weights: Vec<Vec<f32>>,
    pub output_bias: Vec<f32>,
}

/// Upper bound on a model file read from disk.
pub const MAX_MODEL_BYTES: u64 = 16 * 1024 * 1024;

fn matvec<'a>(matrix: &'a [Vec<f32>], vector: &'a [f32]) -> impl Iterator<Item = f32> + 'a {
    matrix
        .iter()
        .map(move |row| row.iter().zip(vector).map(|(w, x)| w * x).sum::<f32>())
}

impl LinearRecurrentPolicy {
    /// All-zero weights with `output_bias` as the fixed logits.
    pub fn constant(
        model_id: impl Into<String>,
        observation_size: usize,
        state_size: usize,
        output_bias: Vec<f32>,
    ) -> Self {
        let actions = output_bias.len();
        Self {
            model_id: model_id.into(),
            observation_size,
            state_size,
            input_weights: vec![vec![0.0; observation_size]; state_size],
            recurrent_weights: vec![vec![0.0; state_size]; state_size],
            hidden_bias: vec![0.0; state_size],
            output_weights: vec![vec![0.0; state_size]; actions],
            output_bias,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let io_error = |source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut text = String::new();
        File::open(path)
            .map_err(io_error)?
            .take(MAX_MODEL_BYTES + 1)
            .read_to_string(&mut text)
            .map_err(io_error)?;
        if text.len() as u64 > MAX_MODEL_BYTES {
            return Err(ModelLoadError::TooLarge {
                path: path.to_path_buf(),
                limit: MAX_MODEL_BYTES,
            });
        }
        let mut model: Self =
            serde_json::from_str(&text).map_err(|source| ModelLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if model.model_id.is_empty() {
            model.model_id = path.display().to_string();
        }
        model.validate()?;
        Ok(model)
    }

    pub fn action_count(&self) -> usize {
        self.output_bias.len()
    }

    pub fn validate(&self) -> Result<(), ModelLoadError> {
        let shape_error = |reason: String| ModelLoadError::Shape {
            model_id: self.model_id.clone(),
            reason,
        };

        if self.action_count() == 0 {
            return Err(shape_error("no output actions".into()));
        }
        if self.input_weights.len() != self.state_size
            || self
                .input_weights
                .iter()
                .any(|row| row.len() != self.observation_size)
        {
            return Err(shape_error(format!(
                "input_weights must be {}x{}",
                self.state_size, self.observation_size
            )));
        }
        if self.recurrent_weights.len() != self.state_size
            || self
                .recurrent_weights
                .iter()
                .any(|row| row.len() != self.state_size)
        {
            return Err(shape_error(format!(
                "recurrent_weights must be {0}x{0}",
                self.state_size
            )));
        }
        if self.hidden_bias.len() != self.state_size {
            return Err(shape_error(format!(
                "hidden_bias must have {} entries",
                self.state_size
            )));
        }
        if self.output_weights.len() != self.action_count()
            || self
                .output_weights
                .iter()
                .any(|row| row.len() != self.state_size)
        {
            return Err(shape_error(format!(
                "output_weights must be {}x{}",
                self.action_count(),
                self.state_size
            )));
        }
        Ok(())
    }
}

impl InferenceBackend for LinearRecurrentPolicy {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn state_size(&self) -> usize {
        self.state_size
    }

    fn infer(&self, request: InferenceRequest<'_>) -> Result<InferenceOutput, InferenceError> {
        if request.observation.len() != self.observation_size {
            return Err(InferenceError::ObservationShape {
                expected: self.observation_size,
                actual: request.observation.len(),
            });
        }
        let state = request.state;
        if state.hidden.len() != self.state_size || state.cell.len() != self.state_size {
            return Err(InferenceError::StateShape {
                expected: self.state_size,
                actual: state.hidden.len(),
            });
        }

        let hidden: Vec<f32> = matvec(&self.input_weights, request.observation)
            .zip(matvec(&self.recurrent_weights, &state.hidden))
            .zip(&self.hidden_bias)
            .map(|((x, h), b)| (x + h + b).tanh())
            .collect();
        let cell = state
            .cell
            .iter()
            .zip(&hidden)
            .map(|(c, h)| 0.5 * c + 0.5 * h)
            .collect();
        let logits: Vec<f32> = matvec(&self.output_weights, &hidden)
            .zip(&self.output_bias)
            .map(|(z, b)| z + b)
            .collect();
        if logits.is_empty() {
            return Err(InferenceError::EmptyLogits);
        }

        Ok(InferenceOutput {
            logits,
            state: RecurrentState { hidden, cell },
        })
    }
}

/// Loads [`LinearRecurrentPolicy`] files, resolving relative ids under `root`.
#[derive(Clone, Debug, Default)]
pub struct JsonModelFactory {
    root: Option<PathBuf>,
}

impl JsonModelFactory {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// With a root configured, ids must stay below it: no absolute paths and
    /// no `..` components.
    pub fn resolve(&self, model_id: &str) -> Result<PathBuf, ModelLoadError> {
        let path = Path::new(model_id);
        let Some(root) = &self.root else {
            return Ok(path.to_path_buf());
        };
        let confined = path
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if !confined {
            return Err(ModelLoadError::OutsideRoot {
                model_id: model_id.to_string(),
            });
        }
        Ok(root.join(path))
    }
}

impl BackendFactory for JsonModelFactory {
    fn load(&self, model_id: &str) -> Result<Box<dyn InferenceBackend>, ModelLoadError> {
        let model_id = model_id.trim();
        if model_id.is_empty() {
            return Err(ModelLoadError::EmptyModelId);
        }
        let mut model = LinearRecurrentPolicy::load(&self.resolve(model_id)?)?;
        model.model_id = model_id.to_string();
        if model.observation_size != OBSERVATION_LEN {
            return Err(ModelLoadError::Shape {
                model_id: model.model_id,
                reason: format!(
                    "observation_size {} does not match encoder length {OBSERVATION_LEN}",
                    model.observation_size
                ),
            });
        }
        Ok(Box::new(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_model(dir: &Path, name: &str, model: &LinearRecurrentPolicy) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).expect("create model file");
        file.write_all(serde_json::to_string(model).unwrap().as_bytes())
            .expect("write model file");
        path
    }

    #[test]
    fn constant_model_returns_bias_as_logits() {
        let model = LinearRecurrentPolicy::constant("c", 3, 2, vec![0.5, -1.0, 2.0]);
        model.validate().expect("valid shape");
        let state = RecurrentState::zeros(2);
        let output = model
            .infer(InferenceRequest {
                observation: &[1.0, 2.0, 3.0],
                state: &state,
            })
            .expect("inference");
        assert_eq!(output.logits, vec![0.5, -1.0, 2.0]);
        assert_eq!(output.state, RecurrentState::zeros(2));
    }

    #[test]
    fn hidden_state_carries_between_calls() {
        let mut model = LinearRecurrentPolicy::constant("r", 1, 1, vec![0.0, 0.0]);
        model.input_weights = vec![vec![1.0]];
        model.recurrent_weights = vec![vec![1.0]];
        model.output_weights = vec![vec![1.0], vec![-1.0]];

        let first = model
            .infer(InferenceRequest {
                observation: &[0.5],
                state: &RecurrentState::zeros(1),
            })
            .expect("first call");
        let second = model
            .infer(InferenceRequest {
                observation: &[0.5],
                state: &first.state,
            })
            .expect("second call");
        assert!(second.state.hidden[0] > first.state.hidden[0]);
        assert_eq!(second.logits[0], -second.logits[1]);
    }

    #[test]
    fn infer_rejects_wrong_shapes() {
        let model = LinearRecurrentPolicy::constant("s", 3, 2, vec![0.0]);
        assert!(matches!(
            model.infer(InferenceRequest {
                observation: &[1.0],
                state: &RecurrentState::zeros(2),
            }),
            Err(InferenceError::ObservationShape {
                expected: 3,
                actual: 1
            })
        ));
        assert!(matches!(
            model.infer(InferenceRequest {
                observation: &[1.0, 2.0, 3.0],
                state: &RecurrentState::zeros(5),
            }),
            Err(InferenceError::StateShape { .. })
        ));
    }

    #[test]
    fn factory_loads_relative_ids_under_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let model = LinearRecurrentPolicy::constant("", OBSERVATION_LEN, 4, vec![0.0; 7]);
        write_model(dir.path(), "policy.json", &model);

        let factory = JsonModelFactory::new(Some(dir.path().to_path_buf()));
        let backend = factory.load("policy.json").expect("load model");
        assert_eq!(backend.model_id(), "policy.json");
        assert_eq!(backend.state_size(), 4);
    }

    #[test]
    fn factory_reports_missing_and_malformed_models() {
        let dir = tempfile::tempdir().expect("tempdir");
        let factory = JsonModelFactory::new(Some(dir.path().to_path_buf()));

        assert!(matches!(
            factory.load("nope.json"),
            Err(ModelLoadError::Io { .. })
        ));
        assert!(matches!(factory.load("  "), Err(ModelLoadError::EmptyModelId)));

        fs::write(dir.path().join("bad.json"), b"{not json").expect("write");
        assert!(matches!(
            factory.load("bad.json"),
            Err(ModelLoadError::Parse { .. })
        ));

        let wrong = LinearRecurrentPolicy::constant("", 5, 2, vec![0.0; 7]);
        write_model(dir.path(), "wrong.json", &wrong);
        assert!(matches!(
            factory.load("wrong.json"),
            Err(ModelLoadError::Shape { .. })
        ));
    }

    #[test]
    fn factory_keeps_ids_inside_the_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("models");
        fs::create_dir_all(&root).expect("create root");
        let model = LinearRecurrentPolicy::constant("", OBSERVATION_LEN, 2, vec![0.0; 7]);
        write_model(dir.path(), "outside.json", &model);
        let absolute = write_model(&root, "inside.json", &model);

        let factory = JsonModelFactory::new(Some(root));
        assert!(matches!(
            factory.load("../outside.json"),
            Err(ModelLoadError::OutsideRoot { .. })
        ));
        assert!(matches!(
            factory.load(&absolute.display().to_string()),
            Err(ModelLoadError::OutsideRoot { .. })
        ));
        assert!(matches!(
            factory.load("/dev/zero"),
            Err(ModelLoadError::OutsideRoot { .. })
        ));
        assert!(factory.load("./inside.json").is_ok());
    }

    #[test]
    fn oversized_model_file_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("huge.json");
        let file = fs::File::create(&path).expect("create");
        file.set_len(MAX_MODEL_BYTES + 1).expect("extend");

        assert!(matches!(
            LinearRecurrentPolicy::load(&path),
            Err(ModelLoadError::TooLarge { .. })
        ));
    }

    #[test]
    fn validate_catches_ragged_weights() {
        let mut model = LinearRecurrentPolicy::constant("v", 2, 2, vec![0.0; 3]);
        model.recurrent_weights[1].pop();
        assert!(matches!(
            model.validate(),
            Err(ModelLoadError::Shape { .. })
        ));
    }
}

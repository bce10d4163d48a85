// Score models - binary exercise classifiers over the flattened keypoint vector
//
// Models are loaded once, before the frame loop starts, and then only read.
// LogisticModel is a single dense layer with a sigmoid output, stored as JSON:
//
//   { "weights": [w0, w1, ...], "bias": b }

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AdapterError;

/// Binary classifier producing a score in `[0, 1]`
pub trait ScoreModel: Send {
    /// Expected feature vector length
    fn input_len(&self) -> usize;

    /// Score one feature vector
    fn predict(&self, features: &[f32]) -> Result<f32, AdapterError>;
}

/// Dense logistic classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    weights: Vec<f32>,
    bias: f32,
}

impl LogisticModel {
    pub fn new(weights: Vec<f32>, bias: f32) -> Result<Self, AdapterError> {
        let model = Self { weights, bias };
        model.validate()?;
        Ok(model)
    }

    pub fn from_json(json: &str) -> Result<Self, AdapterError> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    /// Read and validate a model file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AdapterError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|err| AdapterError::ModelLoad {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        let model = Self::from_json(&json)?;
        log::info!(
            "[Model] Loaded logistic model from {:?} ({} inputs)",
            path,
            model.weights.len()
        );
        Ok(model)
    }

    fn validate(&self) -> Result<(), AdapterError> {
        if self.weights.is_empty() {
            return Err(AdapterError::InvalidModel {
                reason: "model has no weights".to_string(),
            });
        }
        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(AdapterError::InvalidModel {
                reason: "model contains non-finite parameters".to_string(),
            });
        }
        Ok(())
    }
}

impl ScoreModel for LogisticModel {
    fn input_len(&self) -> usize {
        self.weights.len()
    }

    fn predict(&self, features: &[f32]) -> Result<f32, AdapterError> {
        if features.len() != self.weights.len() {
            return Err(AdapterError::FeatureMismatch {
                expected: self.weights.len(),
                actual: features.len(),
            });
        }

        let logit: f32 = self
            .weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f32>()
            + self.bias;
        Ok(sigmoid(logit))
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_predict_uses_weights_and_bias() {
        let model = LogisticModel::new(vec![1.0, -1.0], 0.0).unwrap();
        assert!((model.predict(&[0.0, 0.0]).unwrap() - 0.5).abs() < 1e-6);
        assert!(model.predict(&[10.0, 0.0]).unwrap() > 0.99);
        assert!(model.predict(&[0.0, 10.0]).unwrap() < 0.01);
    }

    #[test]
    fn test_predict_rejects_wrong_length() {
        let model = LogisticModel::new(vec![1.0, 1.0, 1.0], 0.0).unwrap();
        assert_eq!(
            model.predict(&[1.0]),
            Err(AdapterError::FeatureMismatch {
                expected: 3,
                actual: 1
            })
        );
    }

    #[test]
    fn test_invalid_models_rejected() {
        assert!(matches!(
            LogisticModel::new(Vec::new(), 0.0),
            Err(AdapterError::InvalidModel { .. })
        ));
        assert!(matches!(
            LogisticModel::from_json(r#"{"weights": [], "bias": 0.5}"#),
            Err(AdapterError::InvalidModel { .. })
        ));
        assert!(matches!(
            LogisticModel::from_json("{"),
            Err(AdapterError::InvalidModel { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"weights": [0.5, 0.5], "bias": -1.0}}"#).unwrap();
        let model = LogisticModel::load(file.path()).unwrap();
        assert_eq!(model.input_len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = LogisticModel::load("/nonexistent/pushup/model.json").unwrap_err();
        assert!(matches!(err, AdapterError::ModelLoad { .. }));
    }
}

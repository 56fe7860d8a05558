use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use super::{AdductPredictor, ClassPredictor, ModelError, ModelInput, Prediction};
use crate::feature::IonMode;

/// Serialized form of a linear softmax model
///
/// ```json
/// {
///   "labels": ["PC", "PE"],
///   "features": ["mz_184", "precursor_mz", "ion_mode", "adduct=[M+H]+"],
///   "weights": [[4.0, 0.001, 0.5, 1.0], [-2.0, 0.001, 0.0, 1.0]],
///   "bias": [0.0, 0.0],
///   "calibrated": true
/// }
/// ```
///
/// Feature names: `mz_<n>` (fragment flag), `precursor_mz`, `ion_mode`
/// (1 positive / 0 negative), `adduct=<token>` (1 when the adduct matches).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftmaxArtifact {
    /// Output labels
    pub labels: Vec<String>,
    /// Input feature names
    pub features: Vec<String>,
    /// One weight row per label
    pub weights: Vec<Vec<f64>>,
    /// One bias per label
    pub bias: Vec<f64>,
    /// Whether the softmax output may be reported as a probability
    #[serde(default = "default_calibrated")]
    pub calibrated: bool,
}

fn default_calibrated() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq)]
enum InputFeature {
    Fragment(u32),
    PrecursorMz,
    IonMode,
    Adduct(String),
}

impl InputFeature {
    fn parse(name: &str) -> Result<Self, ModelError> {
        let name = name.trim();
        if let Some(key) = name.strip_prefix("mz_") {
            let nominal = key
                .parse::<f64>()
                .map_err(|_| ModelError::Artifact(format!("invalid fragment feature '{name}'")))?;
            return Ok(InputFeature::Fragment(nominal.round().max(0.0) as u32));
        }
        if let Some(token) = name.strip_prefix("adduct=") {
            return Ok(InputFeature::Adduct(token.to_string()));
        }
        match name {
            "precursor_mz" => Ok(InputFeature::PrecursorMz),
            "ion_mode" => Ok(InputFeature::IonMode),
            other => Err(ModelError::Artifact(format!("unknown model feature '{other}'"))),
        }
    }

    fn value(&self, input: &ModelInput<'_>) -> f64 {
        match self {
            InputFeature::Fragment(key) => input.fragments.value(*key),
            InputFeature::PrecursorMz => input.precursor_mz,
            InputFeature::IonMode => match input.ion_mode {
                IonMode::Positive => 1.0,
                IonMode::Negative => 0.0,
            },
            InputFeature::Adduct(token) => {
                if input.adduct.map(str::trim) == Some(token.as_str()) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// Linear softmax classifier, validated at load
#[derive(Debug, Clone)]
pub struct SoftmaxClassifier {
    artifact: SoftmaxArtifact,
    inputs: Vec<InputFeature>,
}

impl SoftmaxClassifier {
    /// Validate an artifact and compile its feature names
    pub fn new(artifact: SoftmaxArtifact) -> Result<Self, ModelError> {
        if artifact.labels.is_empty() {
            return Err(ModelError::Artifact("model has no labels".into()));
        }
        if artifact.weights.len() != artifact.labels.len()
            || artifact.bias.len() != artifact.labels.len()
        {
            return Err(ModelError::Artifact(format!(
                "expected {} weight rows and biases, got {} and {}",
                artifact.labels.len(),
                artifact.weights.len(),
                artifact.bias.len()
            )));
        }
        if let Some(row) = artifact
            .weights
            .iter()
            .position(|w| w.len() != artifact.features.len())
        {
            return Err(ModelError::Artifact(format!(
                "weight row {row} does not have {} entries",
                artifact.features.len()
            )));
        }
        if artifact
            .weights
            .iter()
            .flatten()
            .chain(&artifact.bias)
            .any(|w| !w.is_finite())
        {
            return Err(ModelError::Artifact("non-finite weight".into()));
        }
        let inputs = artifact
            .features
            .iter()
            .map(|f| InputFeature::parse(f))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { artifact, inputs })
    }

    /// Load from a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| ModelError::Artifact(format!("{}: {e}", path.display())))?;
        let artifact: SoftmaxArtifact = serde_json::from_reader(BufReader::new(file))?;
        let model = Self::new(artifact)?;
        info!(
            "Loaded softmax model {} ({} labels, {} features)",
            path.display(),
            model.artifact.labels.len(),
            model.inputs.len()
        );
        Ok(model)
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Self::new(serde_json::from_str(json)?)
    }

    /// Output labels
    pub fn labels(&self) -> &[String] {
        &self.artifact.labels
    }

    /// Highest-probability label
    pub fn predict(&self, input: &ModelInput<'_>) -> Result<Prediction, ModelError> {
        let x: Vec<f64> = self.inputs.iter().map(|f| f.value(input)).collect();
        let logits: Vec<f64> = self
            .artifact
            .weights
            .iter()
            .zip(&self.artifact.bias)
            .map(|(w, b)| w.iter().zip(&x).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect();

        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return Err(ModelError::Prediction("non-finite logits".into()));
        }
        let exp: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f64 = exp.iter().sum();

        // first maximum wins so ties resolve to label order
        let mut best = 0;
        for (i, l) in logits.iter().enumerate() {
            if *l > logits[best] {
                best = i;
            }
        }

        Ok(Prediction {
            label: self.artifact.labels[best].clone(),
            confidence: self.artifact.calibrated.then(|| exp[best] / total),
        })
    }
}

impl AdductPredictor for SoftmaxClassifier {
    fn predict_adduct(&self, input: &ModelInput<'_>) -> Result<Prediction, ModelError> {
        self.predict(input)
    }
}

impl ClassPredictor for SoftmaxClassifier {
    fn predict_class(&self, input: &ModelInput<'_>) -> Result<Prediction, ModelError> {
        self.predict(input)
    }
}

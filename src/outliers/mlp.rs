use std::fs;
use std::path::{Path, PathBuf};

use linfa::traits::{Fit, Transformer};
use linfa::DatasetBase;
use linfa_preprocessing::linear_scaling::LinearScaler;
use log::{debug, info};
use ndarray::{Array1, Array2, Axis};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::outliers::table::PointTable;
use crate::outliers::OutlierDetector;

/// Feature columns the classifier is trained on, in input order.
pub const MODEL_FEATURES: [&str; 6] = [
	"lat",
	"lon",
	"depth",
	"std_dev_depth_100m",
	"mean_depth_100m",
	"normalized_distance_100m",
];

/// A pretrained scoring function from feature rows to an outlier label.
pub trait OutlierClassifier {
	fn n_features(&self) -> usize;

	fn predict(&self, features: &Array2<f64>) -> Result<Vec<bool>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
	Relu,
	Tanh,
	Logistic,
	Identity,
}

impl Default for Activation {
	fn default() -> Self {
		Activation::Relu
	}
}

impl Activation {
	fn apply(self, values: &mut Array1<f64>) {
		match self {
			Activation::Relu => values.mapv_inplace(|v| v.max(0.0)),
			Activation::Tanh => values.mapv_inplace(f64::tanh),
			Activation::Logistic => values.mapv_inplace(logistic),
			Activation::Identity => {}
		}
	}
}

fn logistic(v: f64) -> f64 {
	1.0 / (1.0 + (-v).exp())
}

#[derive(Debug, Deserialize)]
struct LayerArtifact {
	/// One row per input unit.
	weights: Vec<Vec<f64>>,
	biases: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct ModelArtifact {
	#[serde(default)]
	activation: Activation,
	layers: Vec<LayerArtifact>,
}

#[derive(Debug, Clone)]
pub struct DenseLayer {
	weights: Array2<f64>,
	biases: Array1<f64>,
}

impl DenseLayer {
	pub fn new(weights: Array2<f64>, biases: Array1<f64>) -> Result<DenseLayer> {
		if weights.ncols() != biases.len() {
			return Err(Error::LengthMismatch {
				expected: weights.ncols(),
				found: biases.len(),
			});
		}
		Ok(DenseLayer { weights, biases })
	}

	fn forward(&self, input: &Array1<f64>) -> Array1<f64> {
		input.dot(&self.weights) + &self.biases
	}
}

/// Feed-forward classifier: hidden layers share one activation, the output
/// layer is logistic for a single unit and argmax otherwise.
#[derive(Debug, Clone)]
pub struct MlpModel {
	activation: Activation,
	layers: Vec<DenseLayer>,
}

impl MlpModel {
	pub fn new(activation: Activation, layers: Vec<DenseLayer>) -> Result<MlpModel> {
		if layers.is_empty() {
			return Err(Error::InvalidConfig("model has no layers".to_string()));
		}
		for pair in layers.windows(2) {
			if pair[0].weights.ncols() != pair[1].weights.nrows() {
				return Err(Error::LengthMismatch {
					expected: pair[0].weights.ncols(),
					found: pair[1].weights.nrows(),
				});
			}
		}
		Ok(MlpModel { activation, layers })
	}

	pub fn load(path: &Path) -> Result<MlpModel> {
		let missing = |reason: String| Error::ModelArtifactMissing {
			path: path.to_path_buf(),
			reason,
		};

		let text = fs::read_to_string(path).map_err(|e| missing(e.to_string()))?;
		let artifact: ModelArtifact = serde_json::from_str(&text).map_err(|e| missing(e.to_string()))?;

		let mut layers = Vec::with_capacity(artifact.layers.len());
		for layer in artifact.layers {
			let rows = layer.weights.len();
			let cols = layer.weights.first().map_or(0, Vec::len);
			let flat: Vec<f64> = layer.weights.into_iter().flatten().collect();
			let weights =
				Array2::from_shape_vec((rows, cols), flat).map_err(|e| missing(e.to_string()))?;
			layers.push(
				DenseLayer::new(weights, Array1::from(layer.biases)).map_err(|e| missing(e.to_string()))?,
			);
		}

		let model = MlpModel::new(artifact.activation, layers).map_err(|e| missing(e.to_string()))?;
		info!("Loaded {}-layer model from {}", model.layers.len(), path.display());
		Ok(model)
	}

	fn classify(&self, row: Array1<f64>) -> bool {
		let mut values = row;
		let last = self.layers.len() - 1;
		for (i, layer) in self.layers.iter().enumerate() {
			values = layer.forward(&values);
			if i < last {
				self.activation.apply(&mut values);
			}
		}

		if values.len() == 1 {
			logistic(values[0]) > 0.5
		} else {
			argmax(&values) != 0
		}
	}
}

fn argmax(values: &Array1<f64>) -> usize {
	values
		.iter()
		.enumerate()
		.fold((0, f64::NEG_INFINITY), |best, (i, v)| if *v > best.1 { (i, *v) } else { best })
		.0
}

impl OutlierClassifier for MlpModel {
	fn n_features(&self) -> usize {
		self.layers[0].weights.nrows()
	}

	fn predict(&self, features: &Array2<f64>) -> Result<Vec<bool>> {
		if features.ncols() != self.n_features() {
			return Err(Error::LengthMismatch {
				expected: self.n_features(),
				found: features.ncols(),
			});
		}
		Ok(features
			.axis_iter(Axis(0))
			.map(|row| self.classify(row.to_owned()))
			.collect())
	}
}

/// Standardises each column with its mean and population standard deviation.
/// Constant columns are centred only.
pub fn standardize(features: Array2<f64>) -> Result<Array2<f64>> {
	let dataset = DatasetBase::from(features);
	let scaler = LinearScaler::standard()
		.fit(&dataset)
		.map_err(|e| Error::Preprocessing(e.to_string()))?;

	Ok(scaler.transform(dataset.records))
}

pub struct ModelDetector {
	classifier: Box<dyn OutlierClassifier>,
}

impl ModelDetector {
	pub fn new(classifier: Box<dyn OutlierClassifier>) -> ModelDetector {
		ModelDetector { classifier }
	}

	pub fn from_artifact(path: &Path) -> Result<ModelDetector> {
		let model = MlpModel::load(path)?;
		if model.n_features() != MODEL_FEATURES.len() {
			return Err(Error::ModelArtifactMissing {
				path: PathBuf::from(path),
				reason: format!(
					"expects {} features, {} are provided",
					model.n_features(),
					MODEL_FEATURES.len()
				),
			});
		}
		Ok(ModelDetector::new(Box::new(model)))
	}

	/// Feature matrix with missing values zeroed, then standardised.
	pub fn features(table: &PointTable) -> Result<Array2<f64>> {
		let columns = MODEL_FEATURES
			.iter()
			.map(|name| table.column_with_missing(name))
			.collect::<Result<Vec<_>>>()?;
		let raw = Array2::from_shape_fn((table.len(), columns.len()), |(row, col)| {
			let value = columns[col][row];
			if value.is_nan() {
				0.0
			} else {
				value
			}
		});
		debug!("Standardising {} x {} feature matrix", raw.nrows(), raw.ncols());

		standardize(raw)
	}
}

impl OutlierDetector for ModelDetector {
	fn suffix(&self) -> &'static str {
		"ml"
	}

	fn column(&self) -> &'static str {
		"mlp_outlier"
	}

	fn detect(&self, table: &PointTable) -> Result<Vec<bool>> {
		if table.is_empty() {
			return Ok(Vec::new());
		}
		let features = ModelDetector::features(table)?;
		self.classifier.predict(&features)
	}
}

#[cfg(test)]
mod tests {
	use std::fs;
	use std::path::Path;

	use ndarray::{array, Array2};
	use tempfile::tempdir;

	use crate::error::Error;
	use crate::outliers::mlp::{
		standardize, Activation, DenseLayer, MlpModel, ModelDetector, OutlierClassifier,
	};
	use crate::outliers::table::PointTable;
	use crate::outliers::OutlierDetector;

	#[test]
	fn test_standardize_centres_constant_columns() -> Result<(), Box<dyn std::error::Error>> {
		let scaled = standardize(array![[1.0, 5.0], [3.0, 5.0], [5.0, 5.0]])?;
		// population std of the first column is sqrt(8 / 3)
		let step = 2.0 / (8.0f64 / 3.0).sqrt();
		let expected = array![[-step, 0.0], [0.0, 0.0], [step, 0.0]];

		for (value, wanted) in scaled.iter().zip(expected.iter()) {
			assert!((value - wanted).abs() < 1e-9, "{} != {}", value, wanted);
		}
		Ok(())
	}

	#[test]
	fn test_argmax_output_layer() -> Result<(), Box<dyn std::error::Error>> {
		let layer = DenseLayer::new(array![[1.0, -1.0]], array![0.0, 0.0])?;
		let model = MlpModel::new(Activation::Identity, vec![layer])?;

		assert_eq!(model.predict(&array![[2.0], [-2.0]])?, vec![false, true]);
		Ok(())
	}

	#[test]
	fn test_layer_shape_mismatch() -> Result<(), Box<dyn std::error::Error>> {
		let first = DenseLayer::new(Array2::zeros((3, 2)), array![0.0, 0.0])?;
		let second = DenseLayer::new(Array2::zeros((3, 1)), array![0.0])?;

		assert!(matches!(
			MlpModel::new(Activation::Relu, vec![first, second]),
			Err(Error::LengthMismatch { expected: 2, found: 3 })
		));
		Ok(())
	}

	#[test]
	fn test_missing_artifact() {
		let result = ModelDetector::from_artifact(Path::new("resources/no_such_model.json"));
		assert!(matches!(result, Err(Error::ModelArtifactMissing { .. })));
	}

	#[test]
	fn test_unparsable_artifact() -> Result<(), Box<dyn std::error::Error>> {
		let dir = tempdir()?;
		let path = dir.path().join("model.json");
		fs::write(&path, "{\"layers\": [{\"weights\": [[1.0, 2.0], [3.0]], \"biases\": [0.0]}]}")?;

		assert!(matches!(
			MlpModel::load(&path),
			Err(Error::ModelArtifactMissing { .. })
		));
		Ok(())
	}

	#[test]
	fn test_detects_deep_sounding() -> Result<(), Box<dyn std::error::Error>> {
		let dir = tempdir()?;
		let path = dir.path().join("survey.xyz");
		let mut text = String::from(
			"lat,lon,depth,std_dev_depth_100m,mean_depth_100m,normalized_distance_100m\n",
		);
		for i in 0..10 {
			let depth = if i == 6 { -200.0 } else { -100.0 };
			text.push_str(&format!("16.0,-47.0,{},,,0.5\n", depth));
		}
		fs::write(&path, text)?;

		let detector = ModelDetector::from_artifact(Path::new("resources/mlp_model.json"))?;
		let table = PointTable::read(&path)?;
		let flags = detector.detect(&table)?;

		let expected: Vec<bool> = (0..10).map(|i| i == 6).collect();
		assert_eq!(flags, expected);
		Ok(())
	}
}

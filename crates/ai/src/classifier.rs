use crate::{preprocess::ImageTensor, weights::WeightFetchError};

use std::{path::Path, sync::Arc};

use ort::{inputs, Session, SessionBuilder, ValueType};
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ClassifierError {
	#[error("failed to fetch classifier weights: {0}")]
	WeightFetch(#[from] WeightFetchError),
	#[error("classifier outputs {found} scores but the catalog has {expected} labels")]
	ShapeMismatch { expected: usize, found: usize },
	#[error("model executor failed: {0}")]
	ModelExecutorFailed(#[from] ort::Error),
	#[error("model file not found: {}", .0.display())]
	ModelFileNotFound(Box<Path>),
	#[error("model has no {0}")]
	MissingTensor(&'static str),
	#[error("model produced no scores")]
	EmptyOutput,
	#[error("classifier task failed: {0}")]
	Join(#[from] JoinError),
}

/// A loaded model, shared read-only between requests.
pub trait Classifier: Send + Sync {
	/// Output dimensionality, one score per label
	fn num_classes(&self) -> usize;

	/// Runs one forward pass over a single image batch and returns the index of the best score
	fn predict(&self, input: &ImageTensor) -> Result<usize, ClassifierError>;
}

/// Turns a fetched weight artifact into a ready to use [`Classifier`].
pub trait ModelBuilder: Send + Sync {
	fn build(
		&self,
		weights: &Path,
		num_labels: usize,
	) -> Result<Arc<dyn Classifier>, ClassifierError>;
}

/// Index of the highest score. Ties go to the lowest index and NaN never wins.
pub fn argmax(scores: impl IntoIterator<Item = f32>) -> Option<usize> {
	scores
		.into_iter()
		.enumerate()
		.filter(|(_, score)| !score.is_nan())
		.reduce(|best, current| if current.1 > best.1 { current } else { best })
		.map(|(index, _)| index)
}

pub struct OnnxClassifier {
	session: Session,
	input_name: String,
	output_name: String,
	num_classes: usize,
}

impl Classifier for OnnxClassifier {
	fn num_classes(&self) -> usize {
		self.num_classes
	}

	fn predict(&self, input: &ImageTensor) -> Result<usize, ClassifierError> {
		let outputs = self
			.session
			.run(inputs![self.input_name.as_str() => input.view()]?)?;

		let scores = outputs
			.get(self.output_name.as_str())
			.ok_or(ClassifierError::MissingTensor("output"))?
			.extract_tensor::<f32>()?;
		let logits = scores.view();

		// Single image batch, so the whole tensor is one row of scores
		if logits.len() != self.num_classes {
			return Err(ClassifierError::ShapeMismatch {
				expected: self.num_classes,
				found: logits.len(),
			});
		}

		argmax(logits.iter().copied()).ok_or(ClassifierError::EmptyOutput)
	}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OnnxModelBuilder;

impl ModelBuilder for OnnxModelBuilder {
	fn build(
		&self,
		weights: &Path,
		num_labels: usize,
	) -> Result<Arc<dyn Classifier>, ClassifierError> {
		if !weights.is_file() {
			return Err(ClassifierError::ModelFileNotFound(weights.into()));
		}

		info!("Building classifier session from {}", weights.display());
		let session = SessionBuilder::new()?
			.with_parallel_execution(true)?
			.with_memory_pattern(true)?
			.with_model_from_file(weights)?;

		let input_name = session
			.inputs
			.first()
			.map(|input| input.name.clone())
			.ok_or(ClassifierError::MissingTensor("input"))?;

		let output = session
			.outputs
			.first()
			.ok_or(ClassifierError::MissingTensor("output"))?;

		// Dynamic dimensions are reported as -1 and only checked once scores come out
		if let ValueType::Tensor { dimensions, .. } = &output.output_type {
			if let Some(&last) = dimensions.last() {
				if let Ok(found) = usize::try_from(last) {
					if found != num_labels {
						return Err(ClassifierError::ShapeMismatch {
							expected: num_labels,
							found,
						});
					}
				}
			}
		}

		let output_name = output.name.clone();
		debug!(%input_name, %output_name, "Classifier session ready");

		Ok(Arc::new(OnnxClassifier {
			session,
			input_name,
			output_name,
			num_classes: num_labels,
		}))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[test]
	fn argmax_picks_highest_score() {
		assert_eq!(argmax([0.1, 3.5, -2.0, 1.0]), Some(1));
		assert_eq!(argmax([-4.0, -1.0, -3.0]), Some(1));
		assert_eq!(argmax([7.0]), Some(0));
	}

	#[test]
	fn argmax_ties_resolve_to_lowest_index() {
		assert_eq!(argmax([1.0, 2.0, 2.0, 0.5]), Some(1));
		assert_eq!(argmax([0.0, 0.0, 0.0]), Some(0));
	}

	#[test]
	fn argmax_ignores_nan() {
		assert_eq!(argmax([f32::NAN, 0.2, 0.1]), Some(1));
		assert_eq!(argmax([0.2, f32::NAN, 0.9]), Some(2));
		assert_eq!(argmax([f32::NAN, f32::NAN]), None);
	}

	#[test]
	fn argmax_of_nothing_is_none() {
		assert_eq!(argmax(Vec::<f32>::new()), None);
	}

	#[test]
	fn missing_weights_file_is_reported_before_touching_the_runtime() {
		let dir = tempdir().unwrap();

		let res = OnnxModelBuilder.build(&dir.path().join("vit_best.onnx"), 8);

		assert!(matches!(res, Err(ClassifierError::ModelFileNotFound(_))));
	}
}

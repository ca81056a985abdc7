use crate::{
	classifier::{Classifier, ClassifierError, ModelBuilder},
	weights::{WeightFetcher, WeightSource},
};

use std::sync::{Arc, OnceLock};

use tokio::{sync::OnceCell, task::spawn_blocking};
use tracing::{error, info};

/// Owns the process wide classifier and builds it at most once.
///
/// Nothing happens on construction; the first [`ClassifierService::get_instance`] call fetches
/// the weights and builds the model, concurrent callers wait on that same attempt.
/// A failed fetch leaves the service empty so a later call tries again, while a shape
/// mismatch between weights and labels is permanent.
pub struct ClassifierService {
	source: WeightSource,
	fetcher: Arc<dyn WeightFetcher>,
	builder: Arc<dyn ModelBuilder>,
	num_labels: usize,
	instance: OnceCell<Arc<dyn Classifier>>,
	shape_mismatch: OnceLock<(usize, usize)>,
}

impl ClassifierService {
	pub fn new(
		source: WeightSource,
		fetcher: Arc<dyn WeightFetcher>,
		builder: Arc<dyn ModelBuilder>,
		num_labels: usize,
	) -> Self {
		Self {
			source,
			fetcher,
			builder,
			num_labels,
			instance: OnceCell::new(),
			shape_mismatch: OnceLock::new(),
		}
	}

	pub async fn get_instance(&self) -> Result<Arc<dyn Classifier>, ClassifierError> {
		self.instance
			.get_or_try_init(|| async {
				// Checked under the init permit, so callers queued behind a mismatch don't refetch
				if let Some(&(expected, found)) = self.shape_mismatch.get() {
					return Err(ClassifierError::ShapeMismatch { expected, found });
				}

				self.construct().await
			})
			.await
			.map(Arc::clone)
	}

	#[must_use]
	pub fn is_initialized(&self) -> bool {
		self.instance.initialized()
	}

	#[must_use]
	pub const fn num_labels(&self) -> usize {
		self.num_labels
	}

	#[must_use]
	pub const fn source(&self) -> &WeightSource {
		&self.source
	}

	async fn construct(&self) -> Result<Arc<dyn Classifier>, ClassifierError> {
		let weights = self.fetcher.fetch(&self.source).await?;

		let builder = Arc::clone(&self.builder);
		let num_labels = self.num_labels;
		let built = spawn_blocking(move || builder.build(&weights, num_labels))
			.await?
			.and_then(|classifier| match classifier.num_classes() {
				found if found == num_labels => Ok(classifier),
				found => Err(ClassifierError::ShapeMismatch {
					expected: num_labels,
					found,
				}),
			});

		match built {
			Ok(classifier) => {
				info!(
					"Classifier ready with {} classes from {}",
					num_labels, self.source.repo_id
				);
				Ok(classifier)
			}
			Err(ClassifierError::ShapeMismatch { expected, found }) => {
				error!("Classifier weights don't match the catalog: expected {expected} classes, found {found}");
				// Only ever set here, under the init permit
				let _ = self.shape_mismatch.set((expected, found));
				Err(ClassifierError::ShapeMismatch { expected, found })
			}
			Err(e) => Err(e),
		}
	}
}

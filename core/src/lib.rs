use foodie_ai::{
	prepare, ClassifierError, ClassifierService, HubFetcher, ModelBuilder, OnnxModelBuilder,
	WeightFetcher, WeightSource,
};
use foodie_catalog::{Catalog, CatalogRecord};
use foodie_config::AppConfig;
use foodie_images::InputImage;
use foodie_search::ImageSearch;

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};

mod error;
pub mod logging;
mod render;
mod request;

pub use error::Error;
pub use render::{Outcome, PlainTextPresenter, Presenter};
pub use request::{Request, RequestState};

/// What the classifier saw in a photo, with the matching food card when the catalog has one
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
	pub label: String,
	pub index: usize,
	pub record: Option<CatalogRecord>,
}

/// The configured catalog file, or the one shipped with us when none is set
pub fn load_catalog(config: &AppConfig) -> Result<Catalog, Error> {
	let catalog = match &config.catalog_path {
		Some(path) => Catalog::load(path)?,
		None => Catalog::bundled()?,
	};
	debug!(labels = catalog.len(), "Food catalog ready");

	Ok(catalog)
}

/// Everything a front end needs to answer requests, shared between all of them.
pub struct Node {
	catalog: Catalog,
	classifier: ClassifierService,
	search: Option<ImageSearch>,
}

impl Node {
	/// Loads the catalog and prepares the lazily built classifier described by `config`.
	///
	/// A catalog that can't be loaded stops everything, as there would be nothing to label
	/// predictions with. With `eager_load` the weights are fetched right away, a failed fetch
	/// is only logged since the first request will try again.
	pub async fn new(config: &AppConfig) -> Result<Arc<Self>, Error> {
		let catalog = load_catalog(config)?;

		foodie_ai::init()?;

		let fetcher = HubFetcher::new(config.models_dir()).map_err(ClassifierError::from)?;
		let source = WeightSource {
			endpoint: config.model.endpoint.clone(),
			repo_id: config.model.repo_id.clone(),
			filename: config.model.filename.clone(),
			revision: config.model.revision.clone(),
			token_env: config.model.token_env.clone(),
		};

		let search = if config.search.enabled {
			Some(ImageSearch::public(
				config.search.max_results,
				Duration::from_secs(config.search.timeout_secs),
			)?)
		} else {
			None
		};

		let node = Arc::new(Self::with_parts(
			catalog,
			source,
			Arc::new(fetcher),
			Arc::new(OnnxModelBuilder),
			search,
		));

		if config.model.eager_load {
			match node.warm_up().await {
				Ok(()) => {}
				Err(Error::Classifier(ClassifierError::WeightFetch(e))) => {
					warn!("Couldn't fetch classifier weights at startup, will retry on first request: {e}");
				}
				Err(e) => return Err(e),
			}
		}

		Ok(node)
	}

	/// Assembles a node from already built pieces, the classifier is sized after the catalog
	pub fn with_parts(
		catalog: Catalog,
		source: WeightSource,
		fetcher: Arc<dyn WeightFetcher>,
		builder: Arc<dyn ModelBuilder>,
		search: Option<ImageSearch>,
	) -> Self {
		let classifier = ClassifierService::new(source, fetcher, builder, catalog.len());

		Self {
			catalog,
			classifier,
			search,
		}
	}

	/// Fetches the weights and builds the classifier without classifying anything
	pub async fn warm_up(&self) -> Result<(), Error> {
		self.classifier.get_instance().await?;
		Ok(())
	}

	pub async fn classify(&self, image: InputImage) -> Result<PredictionResult, Error> {
		// No forward pass happens without a ready classifier
		let classifier = self.classifier.get_instance().await?;

		debug!(
			origin = image.origin(),
			dimensions = ?image.dimensions(),
			"Classifying image"
		);

		let index = spawn_blocking(move || classifier.predict(&prepare(image.image())))
			.await
			.map_err(ClassifierError::from)??;

		let label = self
			.catalog
			.label_at(index)
			.ok_or(Error::UnknownIndex(index))?
			.to_string();

		let record = self.catalog.lookup(&label).cloned();
		if record.is_none() {
			debug!(%label, "No food card for predicted label");
		}

		info!(%label, index, "Classified image");

		Ok(PredictionResult {
			label,
			index,
			record,
		})
	}

	#[must_use]
	pub fn catalog(&self) -> &Catalog {
		&self.catalog
	}

	#[must_use]
	pub const fn search(&self) -> Option<&ImageSearch> {
		self.search.as_ref()
	}

	#[must_use]
	pub fn is_classifier_ready(&self) -> bool {
		self.classifier.is_initialized()
	}
}

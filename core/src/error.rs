use foodie_ai::{ClassifierError, WeightFetchError};
use foodie_catalog::CatalogLoadError;
use foodie_search::SearchError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	Catalog(#[from] CatalogLoadError),
	#[error(transparent)]
	Classifier(#[from] ClassifierError),
	#[error(transparent)]
	Ai(#[from] foodie_ai::Error),
	#[error("failed to read image: {0}")]
	ImageDecode(#[from] foodie_images::Error),
	#[error(transparent)]
	Search(#[from] SearchError),
	#[error("classifier picked index {0} which has no label")]
	UnknownIndex(usize),
	#[error("request can't go from {from} to {to}")]
	InvalidTransition {
		from: &'static str,
		to: &'static str,
	},
}

impl Error {
	/// Text suitable for the person who sent the request
	#[must_use]
	pub fn user_message(&self) -> String {
		match self {
			Self::ImageDecode(e) => {
				format!("Couldn't read that image ({e}). Please try another photo.")
			}
			Self::Classifier(ClassifierError::WeightFetch(e)) => match e {
				WeightFetchError::Status { status, .. } => {
					format!("Failed to download the model from the hub (status {status}). Please try again later.")
				}
				_ => format!("Failed to download the model from the hub: {e}"),
			},
			Self::Classifier(ClassifierError::ShapeMismatch { expected, found }) => format!(
				"The model predicts {found} kinds of food but the catalog knows {expected}. \
				 Classification is unavailable until this is fixed."
			),
			Self::Search(SearchError::EmptyQuery) => "Type something to search for.".to_string(),
			Self::Search(e) => format!("Image search is unavailable right now: {e}"),
			e => format!("Something went wrong: {e}"),
		}
	}

	/// Classification can't happen at all right now, whatever the input
	#[must_use]
	pub const fn is_classifier_unavailable(&self) -> bool {
		matches!(
			self,
			Self::Classifier(
				ClassifierError::WeightFetch(_) | ClassifierError::ShapeMismatch { .. }
			)
		)
	}

	/// The request itself was at fault, a different image or query may work
	#[must_use]
	pub const fn is_input_error(&self) -> bool {
		matches!(
			self,
			Self::ImageDecode(_) | Self::Search(SearchError::EmptyQuery)
		)
	}
}

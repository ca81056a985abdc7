//! Static table mapping food labels to their information card.
//!
//! The order of the labels in the resource is the order the classifier's output layer was
//! trained with, so index `i` of a prediction is `labels()[i]`. Only the number of labels
//! can be checked against a model, a reordered resource goes unnoticed.

use foodie_utils::error::FileIOError;

use std::{fmt, fs, path::Path};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

const BUNDLED_CATALOG: &str = include_str!("../resources/food_info.json");

#[derive(Debug, Error)]
pub enum CatalogLoadError {
	#[error(transparent)]
	FileIO(#[from] FileIOError),
	#[error("catalog is malformed: {0}")]
	Malformed(#[from] serde_json::Error),
	#[error("catalog entry '{label}' has an empty '{field}' field")]
	EmptyField { label: String, field: &'static str },
	#[error("catalog has no entries")]
	Empty,
}

/// Calorie estimate, written either as free text or as a plain number of kcal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Calories {
	Kcal(f64),
	Text(String),
}

impl Calories {
	fn is_blank(&self) -> bool {
		match self {
			Self::Kcal(_) => false,
			Self::Text(text) => text.trim().is_empty(),
		}
	}
}

impl fmt::Display for Calories {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Kcal(kcal) => write!(f, "{kcal} kcal"),
			Self::Text(text) => f.write_str(text),
		}
	}
}

/// Information card for a single food label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
	#[serde(alias = "칼로리")]
	pub calories: Calories,
	#[serde(alias = "주요 영양소")]
	pub nutrients: String,
	#[serde(alias = "설명")]
	pub description: String,
	#[serde(alias = "추천 페어링")]
	pub pairings: Vec<String>,
	#[serde(alias = "추천 음악")]
	pub music: String,
	#[serde(alias = "추천 영화")]
	pub movie: String,
}

impl CatalogRecord {
	fn validate(&self, label: &str) -> Result<(), CatalogLoadError> {
		let empty_field = |field| CatalogLoadError::EmptyField {
			label: label.to_string(),
			field,
		};

		if self.calories.is_blank() {
			return Err(empty_field("calories"));
		}
		if self.nutrients.trim().is_empty() {
			return Err(empty_field("nutrients"));
		}
		if self.description.trim().is_empty() {
			return Err(empty_field("description"));
		}

		Ok(())
	}
}

#[derive(Debug, Clone)]
pub struct Catalog {
	records: IndexMap<String, CatalogRecord>,
	labels: Vec<String>,
}

impl Catalog {
	/// Reads the catalog resource at `path`. Any unreadable, malformed or incomplete entry
	/// fails the whole load.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogLoadError> {
		let path = path.as_ref();

		let json = fs::read_to_string(path)
			.map_err(|e| FileIOError::from((path, e, "Failed to read catalog")))?;

		let catalog = Self::from_json_str(&json)?;
		info!(
			"Loaded catalog with {} labels from {}",
			catalog.len(),
			path.display()
		);

		Ok(catalog)
	}

	/// The catalog compiled into the binary
	pub fn bundled() -> Result<Self, CatalogLoadError> {
		Self::from_json_str(BUNDLED_CATALOG)
	}

	pub fn from_json_str(json: &str) -> Result<Self, CatalogLoadError> {
		let records = serde_json::from_str::<IndexMap<String, CatalogRecord>>(json)?;

		if records.is_empty() {
			return Err(CatalogLoadError::Empty);
		}

		records
			.iter()
			.try_for_each(|(label, record)| record.validate(label))?;

		let labels = records.keys().cloned().collect::<Vec<_>>();
		debug!(?labels, "Catalog labels");

		Ok(Self { records, labels })
	}

	#[must_use]
	pub fn lookup(&self, label: &str) -> Option<&CatalogRecord> {
		self.records.get(label)
	}

	/// Labels in resource order, aligned with the classifier's output indices
	#[must_use]
	pub fn labels(&self) -> &[String] {
		&self.labels
	}

	#[must_use]
	pub fn label_at(&self, index: usize) -> Option<&str> {
		self.labels.get(index).map(String::as_str)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.labels.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.labels.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	const TWO_ENTRIES: &str = r#"{
		"sushi": {
			"calories": "40 kcal per piece",
			"nutrients": "protein",
			"description": "rice and fish",
			"pairings": ["green tea"],
			"music": "some song",
			"movie": "some film"
		},
		"ramen": {
			"calories": 500,
			"nutrients": "carbohydrates",
			"description": "noodles in broth",
			"pairings": [],
			"music": "another song",
			"movie": "Tampopo"
		}
	}"#;

	#[test]
	fn keeps_resource_order() {
		let catalog = Catalog::from_json_str(TWO_ENTRIES).unwrap();

		assert_eq!(catalog.labels(), ["sushi", "ramen"]);
		assert_eq!(catalog.label_at(1), Some("ramen"));
		assert_eq!(catalog.label_at(2), None);
		assert_eq!(catalog.len(), 2);
	}

	#[test]
	fn lookup_is_exact() {
		let catalog = Catalog::from_json_str(TWO_ENTRIES).unwrap();

		let ramen = catalog.lookup("ramen").unwrap();
		assert_eq!(ramen.calories, Calories::Kcal(500.0));
		assert_eq!(ramen.calories.to_string(), "500 kcal");
		assert!(ramen.pairings.is_empty());

		assert!(catalog.lookup("Ramen").is_none());
		assert!(catalog.lookup("pizza").is_none());
	}

	#[test]
	fn accepts_korean_keys() {
		let catalog = Catalog::from_json_str(
			r#"{
				"김치찌개": {
					"칼로리": "350kcal",
					"주요 영양소": "단백질, 비타민C",
					"설명": "묵은지로 끓인 찌개",
					"추천 페어링": ["계란말이", "김"],
					"추천 음악": "AKMU - Love Lee",
					"추천 영화": "기생충"
				}
			}"#,
		)
		.unwrap();

		let record = catalog.lookup("김치찌개").unwrap();
		assert_eq!(record.pairings, ["계란말이", "김"]);
		assert_eq!(record.movie, "기생충");
	}

	#[test]
	fn one_incomplete_entry_fails_the_whole_load() {
		let err = Catalog::from_json_str(
			r#"{
				"sushi": {
					"calories": "40 kcal",
					"nutrients": "protein",
					"description": "rice and fish",
					"pairings": [],
					"music": "song",
					"movie": "film"
				},
				"ramen": {
					"calories": "500 kcal",
					"nutrients": "carbohydrates",
					"pairings": [],
					"music": "song",
					"movie": "film"
				}
			}"#,
		)
		.unwrap_err();

		assert!(matches!(err, CatalogLoadError::Malformed(_)), "{err:?}");
	}

	#[test]
	fn empty_text_field_is_rejected() {
		let err = Catalog::from_json_str(
			r#"{
				"pizza": {
					"calories": "285 kcal",
					"nutrients": "   ",
					"description": "flatbread",
					"pairings": [],
					"music": "song",
					"movie": "film"
				}
			}"#,
		)
		.unwrap_err();

		assert!(matches!(
			err,
			CatalogLoadError::EmptyField { ref label, field: "nutrients" } if label == "pizza"
		));
	}

	#[test]
	fn not_json_and_empty_catalogs_are_rejected() {
		assert!(matches!(
			Catalog::from_json_str("pizza: yes"),
			Err(CatalogLoadError::Malformed(_))
		));
		assert!(matches!(
			Catalog::from_json_str("{}"),
			Err(CatalogLoadError::Empty)
		));
	}

	#[test]
	fn missing_file_is_a_load_error() {
		let dir = tempdir().unwrap();

		let err = Catalog::load(dir.path().join("food_info.json")).unwrap_err();

		assert!(matches!(err, CatalogLoadError::FileIO(ref e) if e.is_not_found()));
	}

	#[test]
	fn loads_from_disk() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("food_info.json");
		fs::write(&path, TWO_ENTRIES).unwrap();

		let catalog = Catalog::load(&path).unwrap();

		assert_eq!(catalog.labels(), ["sushi", "ramen"]);
	}

	#[test]
	fn bundled_catalog_is_complete() {
		let catalog = Catalog::bundled().unwrap();

		assert!(!catalog.is_empty());
		for label in catalog.labels() {
			let record = catalog.lookup(label).unwrap();
			assert!(!record.calories.to_string().trim().is_empty());
			assert!(!record.nutrients.trim().is_empty());
			assert!(!record.description.trim().is_empty());
		}
	}
}

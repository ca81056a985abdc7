#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	clippy::expect_used,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::as_conversions,
	clippy::dbg_macro
)]
#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod consts;
mod error;
mod formatter;
mod generic;

pub use consts::{GENERIC_EXTENSIONS, GENERIC_MAXIMUM_FILE_SIZE};
pub use error::{Error, Result};
pub use formatter::{decode_image, open_image};
pub use image::DynamicImage;
use std::{fs, io::Read, path::Path};

pub trait ImageHandler {
	fn maximum_size(&self) -> u64;

	fn get_data(&self, path: &Path) -> Result<Vec<u8>> {
		let mut file = fs::File::open(path)?;
		if file.metadata()?.len() > self.maximum_size() {
			Err(Error::TooLarge)
		} else {
			let mut data = vec![];
			file.read_to_end(&mut data)?;
			Ok(data)
		}
	}

	fn handle_bytes(&self, data: &[u8]) -> Result<DynamicImage>;

	fn handle_image(&self, path: &Path) -> Result<DynamicImage> {
		let data = self.get_data(path)?; // this also makes sure the file isn't above the maximum size
		self.handle_bytes(&data)
	}
}

/// A decoded, request scoped bitmap, always held as 8 bit RGB.
#[derive(Debug, Clone)]
pub struct InputImage {
	image: DynamicImage,
	origin: String,
}

impl InputImage {
	/// Wraps an already decoded image, normalizing it to RGB
	#[must_use]
	pub fn new(image: DynamicImage, origin: String) -> Self {
		let image = match image {
			rgb @ DynamicImage::ImageRgb8(_) => rgb,
			other => DynamicImage::ImageRgb8(other.to_rgb8()),
		};

		Self { image, origin }
	}

	#[must_use]
	pub const fn image(&self) -> &DynamicImage {
		&self.image
	}

	/// Where the image came from: a file path, an upload name or a URL
	#[must_use]
	pub fn origin(&self) -> &str {
		&self.origin
	}

	#[must_use]
	pub fn dimensions(&self) -> (u32, u32) {
		(self.image.width(), self.image.height())
	}

	#[must_use]
	pub fn into_inner(self) -> DynamicImage {
		self.image
	}
}

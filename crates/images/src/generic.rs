use crate::{
	consts::{GENERIC_MAXIMUM_FILE_SIZE, SUPPORTED_FORMATS},
	error::{Error, Result},
	ImageHandler,
};
use image::DynamicImage;
use tracing::trace;

pub struct GenericHandler {}

impl ImageHandler for GenericHandler {
	fn maximum_size(&self) -> u64 {
		GENERIC_MAXIMUM_FILE_SIZE
	}

	fn handle_bytes(&self, data: &[u8]) -> Result<DynamicImage> {
		if data.is_empty() {
			return Err(Error::Empty);
		}

		if u64::try_from(data.len())? > self.maximum_size() {
			return Err(Error::TooLarge);
		}

		let format = image::guess_format(data)?;
		trace!(?format, "Decoding image");

		if !SUPPORTED_FORMATS.contains(&format) {
			return Err(Error::Unsupported);
		}

		let image = image::load_from_memory_with_format(data, format)?;
		if image.width() == 0 || image.height() == 0 {
			return Err(Error::ZeroDimensions);
		}

		Ok(image)
	}
}

use crate::{
	consts,
	error::{Error, Result},
	generic::GenericHandler,
	ImageHandler, InputImage,
};
use std::path::Path;

/// Reads and decodes an image file, picking the handler from its extension
pub fn open_image(path: impl AsRef<Path>) -> Result<InputImage> {
	let path = path.as_ref();
	let ext = path
		.extension()
		.map_or_else(|| Err(Error::NoExtension), |e| Ok(e.to_ascii_lowercase()))?;

	let handler = match_to_handler(&ext.to_string_lossy())?;

	Ok(InputImage::new(
		handler.handle_image(path)?,
		path.display().to_string(),
	))
}

/// Decodes an in-memory image, e.g. an upload or a downloaded search result
pub fn decode_image(data: &[u8], origin: impl Into<String>) -> Result<InputImage> {
	Ok(InputImage::new(
		GenericHandler {}.handle_bytes(data)?,
		origin.into(),
	))
}

fn match_to_handler(ext: &str) -> Result<Box<dyn ImageHandler>> {
	if consts::GENERIC_EXTENSIONS.contains(&ext) {
		Ok(Box::new(GenericHandler {}))
	} else {
		Err(Error::Unsupported)
	}
}

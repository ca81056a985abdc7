use std::num::TryFromIntError;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong turning user input into a bitmap. None of these are fatal,
/// the user is expected to try another image.
#[derive(thiserror::Error, Debug)]
pub enum Error {
	#[error("error while loading the image (via the `image` crate): {0}")]
	Image(#[from] image::ImageError),
	#[error("there was an i/o error: {0}")]
	Io(#[from] std::io::Error),
	#[error("the image provided is unsupported")]
	Unsupported,
	#[error("the image provided is too large (over 24MiB)")]
	TooLarge,
	#[error("the image provided is empty")]
	Empty,
	#[error("the image has no pixels")]
	ZeroDimensions,
	#[error("invalid path provided (it had no file extension)")]
	NoExtension,
	#[error("error while parsing integers")]
	TryFromInt(#[from] TryFromIntError),
}

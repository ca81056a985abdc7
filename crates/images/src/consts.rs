use image::ImageFormat;

/// Extensions accepted for images read from disk or uploaded through a form
pub const GENERIC_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "webp", "gif", "bmp"];

/// Formats we are willing to decode, whatever the file claims to be
pub(crate) const SUPPORTED_FORMATS: [ImageFormat; 5] = [
	ImageFormat::Jpeg,
	ImageFormat::Png,
	ImageFormat::WebP,
	ImageFormat::Gif,
	ImageFormat::Bmp,
];

/// The maximum size of an input image, either read from disk or received in memory.
///
/// This value is in MiB.
pub const GENERIC_MAXIMUM_FILE_SIZE: u64 = MIB * 24;

/// The size of 1MiB in bytes
const MIB: u64 = 1_048_576;

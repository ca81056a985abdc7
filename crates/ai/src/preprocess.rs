use image::{imageops, imageops::FilterType, DynamicImage};
use ndarray::Array4;

/// Side of the square the classifier was trained on
pub const INPUT_SIZE: u32 = 224;

/// Single image batch in NCHW layout, `(1, 3, INPUT_SIZE, INPUT_SIZE)`
pub type ImageTensor = Array4<f32>;

/// Turns any image into the classifier's input: RGB, resized to `INPUT_SIZE` squared with
/// bilinear filtering, intensities scaled to `[0, 1]`.
///
/// No mean/std normalization is applied.
#[must_use]
pub fn prepare(image: &DynamicImage) -> ImageTensor {
	let rgb = image.to_rgb8();
	let resized = imageops::resize(&rgb, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

	let side = INPUT_SIZE as usize;
	let mut input = Array4::zeros((1, 3, side, side));
	for (x, y, pixel) in resized.enumerate_pixels() {
		let x = x as usize;
		let y = y as usize;
		let [r, g, b] = pixel.0;
		input[[0, 0, y, x]] = f32::from(r) / 255.;
		input[[0, 1, y, x]] = f32::from(g) / 255.;
		input[[0, 2, y, x]] = f32::from(b) / 255.;
	}

	input
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

	const EXPECTED_SHAPE: [usize; 4] = [1, 3, INPUT_SIZE as usize, INPUT_SIZE as usize];

	#[test]
	fn output_shape_is_fixed_for_any_input() {
		let inputs = [
			DynamicImage::ImageRgb8(RgbImage::new(1, 1)),
			DynamicImage::ImageRgb8(RgbImage::new(640, 480)),
			DynamicImage::ImageRgb8(RgbImage::new(17, 1000)),
			DynamicImage::ImageLuma8(GrayImage::new(300, 300)),
			DynamicImage::ImageRgba8(RgbaImage::new(224, 224)),
		];

		for image in &inputs {
			assert_eq!(prepare(image).shape(), EXPECTED_SHAPE);
		}
	}

	#[test]
	fn values_are_scaled_to_unit_range() {
		let image = DynamicImage::ImageRgb8(RgbImage::from_fn(50, 40, |x, y| {
			Rgb([(x * 5) as u8, (y * 6) as u8, 255])
		}));

		let tensor = prepare(&image);

		assert!(tensor.iter().all(|v| (0.0..=1.0).contains(v)));
	}

	#[test]
	fn channels_keep_rgb_order() {
		let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([255, 0, 51])));

		let tensor = prepare(&image);

		assert_eq!(tensor[[0, 0, 100, 100]], 1.0);
		assert_eq!(tensor[[0, 1, 100, 100]], 0.0);
		assert!((tensor[[0, 2, 100, 100]] - 0.2).abs() < 1e-6);
	}

	#[test]
	fn alpha_and_gray_become_rgb() {
		let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 3, Luma([102])));
		let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 3, Rgba([102, 102, 102, 0])));

		let from_gray = prepare(&gray);
		let from_rgba = prepare(&rgba);

		assert_eq!(from_gray, from_rgba);
		assert!((from_gray[[0, 1, 0, 0]] - 0.4).abs() < 1e-6);
	}

	#[test]
	fn is_deterministic() {
		let image = DynamicImage::ImageRgb8(RgbImage::from_fn(333, 251, |x, y| {
			Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
		}));

		assert_eq!(prepare(&image), prepare(&image));
	}

	/// The upstream model family is usually trained with ImageNet mean/std normalization,
	/// which is not applied here. This pins the current behaviour so a change is deliberate,
	/// as it affects accuracy.
	#[test]
	fn no_mean_std_normalization_is_applied() {
		let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(224, 224, Rgb([128, 128, 128])));

		let tensor = prepare(&image);

		let expected = 128. / 255.;
		assert!(tensor.iter().all(|v| (v - expected).abs() < 1e-6));
		assert!(tensor.iter().all(|v| *v >= 0.0));
	}
}

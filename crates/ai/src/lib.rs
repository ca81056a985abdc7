use thiserror::Error;

use ort::EnvironmentBuilder;
use tracing::debug;

mod classifier;
mod preprocess;
mod service;
mod weights;

pub use classifier::{argmax, Classifier, ClassifierError, ModelBuilder, OnnxClassifier, OnnxModelBuilder};
pub use preprocess::{prepare, ImageTensor, INPUT_SIZE};
pub use service::ClassifierService;
pub use weights::{HubFetcher, WeightFetchError, WeightFetcher, WeightSource};

// This path must be relative to the running binary
#[cfg(target_os = "windows")]
const BINDING_LOCATION: &str = ".";

#[cfg(target_os = "macos")]
const BINDING_LOCATION: &str = "../Frameworks/Foodie.framework/Libraries";

#[cfg(target_os = "ios")]
const BINDING_LOCATION: &str = "Frameworks";

#[cfg(target_os = "windows")]
const LIB_NAME: &str = "onnxruntime.dll";

#[cfg(any(target_os = "macos", target_os = "ios"))]
const LIB_NAME: &str = "libonnxruntime.dylib";

/// Sets up the global ONNX Runtime environment, must run before any model is built.
pub fn init() -> Result<(), Error> {
	#[cfg(any(target_os = "macos", target_os = "ios", target_os = "windows"))]
	{
		use std::path::Path;
		let path =
			foodie_utils::get_path_relative_to_exe(Path::new(BINDING_LOCATION).join(LIB_NAME));
		std::env::set_var("ORT_DYLIB_PATH", path);
	}

	EnvironmentBuilder::default()
		.with_name("foodie")
		.with_execution_providers({
			#[cfg(any(target_os = "macos", target_os = "ios"))]
			{
				use ort::{CoreMLExecutionProvider, XNNPACKExecutionProvider};

				[
					CoreMLExecutionProvider::default().build(),
					XNNPACKExecutionProvider::default().build(),
				]
			}

			#[cfg(target_os = "windows")]
			{
				use ort::DirectMLExecutionProvider;

				[DirectMLExecutionProvider::default().build()]
			}

			#[cfg(target_os = "linux")]
			{
				use ort::XNNPACKExecutionProvider;

				[XNNPACKExecutionProvider::default().build()]
			}
		})
		.commit()?;

	debug!("Initialized AI environment");

	Ok(())
}

#[derive(Error, Debug)]
pub enum Error {
	#[error("failed to initialize AI environment: {0}")]
	Init(#[from] ort::Error),
}

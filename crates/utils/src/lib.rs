use std::{
	env::{args_os, current_exe},
	path::{Path, PathBuf},
};

use tracing::error;

pub mod error;

/// Resolves `path` against the directory holding the running binary.
///
/// Falls back to the raw joined path if it can't be canonicalized, and to `path` itself
/// if the binary location is unknown.
pub fn get_path_relative_to_exe(path: impl AsRef<Path>) -> PathBuf {
	current_exe()
		.or_else(|e| {
			error!("Failed to get current exe path: {e:#?}");
			args_os()
				.next()
				.map(PathBuf::from)
				.ok_or(e)
		})
		.ok()
		.and_then(|exe_path| {
			let path = exe_path.parent()?.join(path.as_ref());

			match path.canonicalize() {
				Ok(path) => Some(path),
				Err(e) => {
					error!("Failed to canonicalize relative path to exe, return raw path and hope: {e:#?}");
					Some(path)
				}
			}
		})
		.unwrap_or_else(|| path.as_ref().to_path_buf())
}

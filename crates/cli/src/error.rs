use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("failed to read script {path}")]
	ScriptRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid script {path}: {source}")]
	ScriptParse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_script_errors_name_the_path() {
		let read = CliError::ScriptRead {
			path: PathBuf::from("missing.json"),
			source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
		};
		assert_eq!(read.to_string(), "failed to read script missing.json");
		assert!(std::error::Error::source(&read).is_some());

		let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
		let parse = CliError::ScriptParse {
			path: PathBuf::from("bad.json"),
			source,
		};
		assert!(parse.to_string().starts_with("invalid script bad.json: "));
	}
}

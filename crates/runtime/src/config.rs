//! Registry configuration.

use std::path::Path;

use sdkconn_protocol::SDK_REMOTE_ORIGIN;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Settings for a [`Registry`](crate::Registry).
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegistryConfig {
	/// Prefix joined with a channel id to form its host key.
	#[serde(default = "default_remote_origin")]
	pub remote_origin: String,
	/// Buffer size of the registry event broadcast.
	#[serde(default = "default_event_capacity")]
	pub event_capacity: usize,
}

fn default_remote_origin() -> String {
	SDK_REMOTE_ORIGIN.to_string()
}

fn default_event_capacity() -> usize {
	DEFAULT_EVENT_CAPACITY
}

impl Default for RegistryConfig {
	fn default() -> Self {
		Self {
			remote_origin: default_remote_origin(),
			event_capacity: DEFAULT_EVENT_CAPACITY,
		}
	}
}

impl RegistryConfig {
	/// Reads a JSON config file and validates it.
	pub fn load(path: &Path) -> Result<Self> {
		let raw = std::fs::read_to_string(path)?;
		let config: Self = serde_json::from_str(&raw)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		if self.remote_origin.is_empty() {
			return Err(Error::Config("remoteOrigin must not be empty".to_string()));
		}
		if self.event_capacity == 0 {
			return Err(Error::Config("eventCapacity must be at least 1".to_string()));
		}
		Ok(())
	}

	pub fn with_remote_origin(mut self, origin: impl Into<String>) -> Self {
		self.remote_origin = origin.into();
		self
	}
}

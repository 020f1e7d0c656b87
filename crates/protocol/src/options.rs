//! Arguments for registry operations.

use serde::{Deserialize, Serialize};

/// Options for removing a channel from the registry.
///
/// `emit_refresh` marks a remote-initiated close the UI should pick up;
/// `send_terminate` notifies the requester that the wallet closed the channel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveChannelOptions {
	pub channel_id: String,
	#[serde(default)]
	pub emit_refresh: bool,
	#[serde(default)]
	pub send_terminate: bool,
}

impl RemoveChannelOptions {
	/// Creates options with both flags off.
	pub fn new(channel_id: impl Into<String>) -> Self {
		Self {
			channel_id: channel_id.into(),
			..Default::default()
		}
	}

	pub fn with_emit_refresh(mut self, emit_refresh: bool) -> Self {
		self.emit_refresh = emit_refresh;
		self
	}

	pub fn with_send_terminate(mut self, send_terminate: bool) -> Self {
		self.send_terminate = send_terminate;
		self
	}
}

/// UI-facing loading flag for one channel. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingState {
	pub channel_id: String,
	pub loading: bool,
}

impl LoadingState {
	pub fn new(channel_id: impl Into<String>, loading: bool) -> Self {
		Self {
			channel_id: channel_id.into(),
			loading,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn remove_options_default_flags_off() {
		let opts: RemoveChannelOptions = serde_json::from_str(r#"{"channelId":"c1"}"#).unwrap();
		assert_eq!(opts, RemoveChannelOptions::new("c1"));
		assert!(!opts.emit_refresh);
		assert!(!opts.send_terminate);
	}

	#[test]
	fn remove_options_builders() {
		let opts = RemoveChannelOptions::new("c1")
			.with_emit_refresh(true)
			.with_send_terminate(false);
		assert_eq!(
			opts,
			RemoveChannelOptions {
				channel_id: "c1".into(),
				emit_refresh: true,
				send_terminate: false,
			}
		);
	}
}

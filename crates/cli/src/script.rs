//! Replay script format.
//!
//! ```json
//! {
//!   "disabledHosts": { "MMSDKREMOTE::stale": 2 },
//!   "steps": [
//!     { "op": "connect", "channelId": "abc" },
//!     { "op": "loading", "channelId": "abc", "loading": true },
//!     { "op": "remote", "channelId": "abc", "event": { "type": "clients_disconnected" } },
//!     { "op": "settle", "ms": 10 }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use sdkconn_protocol::RemoteEvent;
use serde::Deserialize;

use crate::error::{CliError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Script {
	/// Host keys disabled before the first step, with their counters.
	#[serde(default)]
	pub disabled_hosts: BTreeMap<String, u32>,
	#[serde(default)]
	pub steps: Vec<Step>,
}

impl Script {
	pub fn load(path: &Path) -> Result<Self> {
		let raw = std::fs::read_to_string(path).map_err(|source| CliError::ScriptRead {
			path: path.to_path_buf(),
			source,
		})?;
		serde_json::from_str(&raw).map_err(|source| CliError::ScriptParse {
			path: path.to_path_buf(),
			source,
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Step {
	/// Registers a channel backed by an in-memory relay.
	Connect { channel_id: String },
	/// Pushes an event through the channel's relay.
	Remote { channel_id: String, event: RemoteEvent },
	/// Raises a local loading event on the connection.
	Loading { channel_id: String, loading: bool },
	Request { channel_id: String, request_id: String },
	Complete { channel_id: String, request_id: String },
	Disapprove { channel_id: String },
	Enable { channel_id: String },
	Remove {
		channel_id: String,
		#[serde(default)]
		emit_refresh: bool,
		#[serde(default)]
		send_terminate: bool,
	},
	/// Sleeps, letting detached work finish.
	Settle {
		#[serde(default)]
		ms: u64,
	},
}

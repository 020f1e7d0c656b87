//! Host identity used by per-host disable tracking.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Default origin prefix for hosts reached through the remote relay.
pub const SDK_REMOTE_ORIGIN: &str = "MMSDKREMOTE::";

/// Key into the disabled-host map: `<origin prefix><channel id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostKey(String);

impl HostKey {
	/// Derives the key for `channel_id` under `origin`.
	pub fn for_channel(origin: &str, channel_id: &str) -> Self {
		Self(format!("{origin}{channel_id}"))
	}

	/// Derives the key under [`SDK_REMOTE_ORIGIN`].
	pub fn remote(channel_id: &str) -> Self {
		Self::for_channel(SDK_REMOTE_ORIGIN, channel_id)
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Borrow<str> for HostKey {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl From<String> for HostKey {
	fn from(value: String) -> Self {
		Self(value)
	}
}

impl fmt::Display for HostKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn host_key_prefixes_channel_id() {
		assert_eq!(HostKey::remote("testChannelId").as_str(), "MMSDKREMOTE::testChannelId");
		assert_eq!(HostKey::for_channel("custom:", "abc").to_string(), "custom:abc");
	}
}

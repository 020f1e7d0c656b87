//! Remote connection status as reported by the relay.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of the remote side of a channel.
///
/// Exactly one value is current per connection. The relay delivers
/// transitions as [`RemoteEvent::ConnectionStatus`](crate::RemoteEvent::ConnectionStatus).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
	/// Handshake in progress (initial state).
	#[default]
	Connecting,
	/// Connected to the relay, waiting for the other party.
	Waiting,
	/// Both parties are linked through the relay.
	Linked,
	/// The relay gave up waiting for the other party.
	Timeout,
	/// Transport dropped; the channel may come back.
	Disconnected,
	/// The remote party ended the channel for good.
	Terminated,
}

impl ConnectionStatus {
	/// Returns the lowercase wire name.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Connecting => "connecting",
			Self::Waiting => "waiting",
			Self::Linked => "linked",
			Self::Timeout => "timeout",
			Self::Disconnected => "disconnected",
			Self::Terminated => "terminated",
		}
	}

	/// Returns true for [`ConnectionStatus::Terminated`].
	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::Terminated)
	}
}

impl fmt::Display for ConnectionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn status_uses_lowercase_wire_names() {
		let json = serde_json::to_string(&ConnectionStatus::Terminated).unwrap();
		assert_eq!(json, "\"terminated\"");

		let parsed: ConnectionStatus = serde_json::from_str("\"linked\"").unwrap();
		assert_eq!(parsed, ConnectionStatus::Linked);
		assert_eq!(parsed.to_string(), "linked");
	}

	#[test]
	fn only_terminated_is_terminal() {
		assert!(ConnectionStatus::Terminated.is_terminal());
		assert!(!ConnectionStatus::Disconnected.is_terminal());
		assert!(!ConnectionStatus::Timeout.is_terminal());
		assert_eq!(ConnectionStatus::default(), ConnectionStatus::Connecting);
	}
}

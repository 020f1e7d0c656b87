//! Events flowing into and out of a supervised channel.
//!
//! Every event enum has a matching fieldless `*Kind` enum so subscribers
//! register by name instead of by registration order.

use serde::{Deserialize, Serialize};

use crate::status::ConnectionStatus;

/// Event delivered by the relay on a connection's remote surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RemoteEvent {
	/// The remote status changed.
	ConnectionStatus {
		/// New current status.
		status: ConnectionStatus,
	},
	/// A requester attached to the channel.
	ClientsConnected,
	/// Every requester left the channel. May be transient.
	ClientsDisconnected,
	/// The relay is waiting for a requester to attach.
	ClientsWaiting,
}

impl RemoteEvent {
	/// Shorthand for a status transition.
	pub fn status(status: ConnectionStatus) -> Self {
		Self::ConnectionStatus { status }
	}

	/// Returns the subscription kind this event is delivered to.
	pub fn kind(&self) -> RemoteEventKind {
		match self {
			Self::ConnectionStatus { .. } => RemoteEventKind::ConnectionStatus,
			Self::ClientsConnected => RemoteEventKind::ClientsConnected,
			Self::ClientsDisconnected => RemoteEventKind::ClientsDisconnected,
			Self::ClientsWaiting => RemoteEventKind::ClientsWaiting,
		}
	}
}

/// Subscription key for [`RemoteEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteEventKind {
	ConnectionStatus,
	ClientsConnected,
	ClientsDisconnected,
	ClientsWaiting,
}

/// Event raised by a connection's own logic on its local surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LocalEvent {
	/// The connection started or stopped doing work the UI should reflect.
	ConnectionLoading { loading: bool },
}

impl LocalEvent {
	pub fn kind(&self) -> LocalEventKind {
		match self {
			Self::ConnectionLoading { .. } => LocalEventKind::ConnectionLoading,
		}
	}
}

/// Subscription key for [`LocalEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalEventKind {
	ConnectionLoading,
}

/// Message the wallet side sends back through the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
	/// Tells the requester the wallet closed the channel.
	Terminate,
}

/// Notification broadcast by the registry for UI consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RegistryEvent {
	/// A channel was registered.
	ChannelAdded { channel_id: String },
	/// A channel was removed from the registry.
	ChannelRemoved {
		channel_id: String,
		/// Whether a terminate message was sent to the requester.
		terminated: bool,
	},
	/// The channel list changed because the remote side closed a channel.
	Refresh,
	/// A channel's loading flag changed.
	LoadingChanged { channel_id: String, loading: bool },
	/// The aggregate loading indicator turned on or off.
	LoadingIndicator { visible: bool },
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn remote_event_wire_shape() {
		let event: RemoteEvent =
			serde_json::from_str(r#"{"type":"connection_status","status":"terminated"}"#).unwrap();
		assert_eq!(event, RemoteEvent::status(ConnectionStatus::Terminated));
		assert_eq!(event.kind(), RemoteEventKind::ConnectionStatus);

		let event: RemoteEvent = serde_json::from_str(r#"{"type":"clients_disconnected"}"#).unwrap();
		assert_eq!(event.kind(), RemoteEventKind::ClientsDisconnected);
	}

	#[test]
	fn local_event_carries_loading_flag() {
		let event: LocalEvent =
			serde_json::from_str(r#"{"type":"connection_loading","loading":true}"#).unwrap();
		assert_eq!(event, LocalEvent::ConnectionLoading { loading: true });
		assert_eq!(event.kind(), LocalEventKind::ConnectionLoading);
	}

	#[test]
	fn registry_event_fields_are_camel_case() {
		let value = serde_json::to_value(RegistryEvent::ChannelRemoved {
			channel_id: "abc".into(),
			terminated: true,
		})
		.unwrap();
		assert_eq!(value["event"], "channel_removed");
		assert_eq!(value["channelId"], "abc");
		assert_eq!(value["terminated"], true);

		let value = serde_json::to_value(OutboundMessage::Terminate).unwrap();
		assert_eq!(value, serde_json::json!({"type": "terminate"}));
	}
}

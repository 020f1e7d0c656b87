//! Remote event surface of a connection.

use std::sync::Arc;

use parking_lot::Mutex;
use sdkconn_protocol::{ConnectionStatus, OutboundMessage, RemoteEvent, RemoteEventKind};

use crate::error::Result;
use crate::handlers::{EventSurface, Subscription};
use crate::transport::RelayTransport;

/// Handle to the relay side of one channel.
///
/// Tracks the current [`ConnectionStatus`] and fans remote events out to
/// subscribers. Outbound calls go straight to the [`RelayTransport`].
pub struct RemoteChannel {
	channel_id: Arc<str>,
	transport: Arc<dyn RelayTransport>,
	surface: EventSurface<RemoteEvent, RemoteEventKind>,
	status: Mutex<ConnectionStatus>,
}

impl RemoteChannel {
	pub(crate) fn new(channel_id: Arc<str>, transport: Arc<dyn RelayTransport>) -> Self {
		Self {
			channel_id,
			transport,
			surface: EventSurface::new(),
			status: Mutex::new(ConnectionStatus::default()),
		}
	}

	/// Registers `handler` for remote events of `kind`.
	pub fn on_remote<F>(&self, kind: RemoteEventKind, handler: F) -> Subscription
	where
		F: Fn(&RemoteEvent) + Send + Sync + 'static,
	{
		self.surface.subscribe(kind, handler)
	}

	/// Registers a handler for status transitions.
	pub fn on_connection_status<F>(&self, handler: F) -> Subscription
	where
		F: Fn(ConnectionStatus) + Send + Sync + 'static,
	{
		self.on_remote(RemoteEventKind::ConnectionStatus, move |event| {
			if let RemoteEvent::ConnectionStatus { status } = event {
				handler(*status);
			}
		})
	}

	pub fn on_clients_connected<F>(&self, handler: F) -> Subscription
	where
		F: Fn() + Send + Sync + 'static,
	{
		self.on_remote(RemoteEventKind::ClientsConnected, move |_| handler())
	}

	pub fn on_clients_disconnected<F>(&self, handler: F) -> Subscription
	where
		F: Fn() + Send + Sync + 'static,
	{
		self.on_remote(RemoteEventKind::ClientsDisconnected, move |_| handler())
	}

	pub fn on_clients_waiting<F>(&self, handler: F) -> Subscription
	where
		F: Fn() + Send + Sync + 'static,
	{
		self.on_remote(RemoteEventKind::ClientsWaiting, move |_| handler())
	}

	/// Current remote status.
	pub fn status(&self) -> ConnectionStatus {
		*self.status.lock()
	}

	/// Kinds of the installed remote handlers, in registration order.
	pub fn subscribed_kinds(&self) -> Vec<RemoteEventKind> {
		self.surface.kinds()
	}

	/// Applies `event` and delivers it to subscribers synchronously.
	///
	/// Status events update [`RemoteChannel::status`] before any handler runs.
	pub fn dispatch(&self, event: RemoteEvent) -> usize {
		if let RemoteEvent::ConnectionStatus { status } = &event {
			let previous = std::mem::replace(&mut *self.status.lock(), *status);
			tracing::debug!(
				target: "sdkconn.connection",
				channel_id = %self.channel_id,
				from = %previous,
				to = %status,
				"remote status changed"
			);
		}
		self.surface.emit(event.kind(), &event)
	}

	/// Sends a message to the requester.
	pub async fn send_message(&self, message: OutboundMessage) -> Result<()> {
		self.transport.send(message).await
	}

	/// Tells the requester the wallet closed the channel.
	pub async fn send_terminate(&self) -> Result<()> {
		self.send_message(OutboundMessage::Terminate).await
	}

	pub async fn disconnect(&self) -> Result<()> {
		self.transport.disconnect().await
	}

	pub(crate) fn clear_handlers(&self) {
		self.surface.clear();
	}

	pub(crate) fn handler_count(&self) -> usize {
		self.surface.len()
	}
}

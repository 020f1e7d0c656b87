//! Transport seam between a connection and the relay.
//!
//! The relay client itself lives outside this crate. A connection only needs
//! two things from it: a stream of [`RemoteEvent`]s and a [`RelayTransport`]
//! for sending messages back and hanging up. [`ChannelTransport`] is an
//! in-memory implementation backed by tokio channels, paired with a
//! [`RelayHandle`] that plays the relay's side.


use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sdkconn_protocol::{OutboundMessage, RemoteEvent};
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Boxed future returned across trait-object seams.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outbound half of a relay connection.
pub trait RelayTransport: Send + Sync {
	/// Sends a message to the requester through the relay.
	fn send(&self, message: OutboundMessage) -> BoxFuture<'_, Result<()>>;

	/// Hangs up. Calling it more than once is allowed.
	fn disconnect(&self) -> BoxFuture<'_, Result<()>>;
}

/// Everything a [`Connection`](crate::Connection) needs from the transport.
pub struct TransportParts {
	pub transport: Arc<dyn RelayTransport>,
	pub events: mpsc::UnboundedReceiver<RemoteEvent>,
}

#[derive(Default)]
struct Shared {
	disconnected: AtomicBool,
	fail_sends: AtomicBool,
}

/// In-memory [`RelayTransport`].
pub struct ChannelTransport {
	outbound_tx: mpsc::UnboundedSender<OutboundMessage>,
	shared: Arc<Shared>,
}

impl ChannelTransport {
	/// Creates transport parts for a connection plus the relay-side handle.
	pub fn pair() -> (TransportParts, RelayHandle) {
		let (events_tx, events_rx) = mpsc::unbounded_channel();
		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
		let shared = Arc::new(Shared::default());

		let transport = ChannelTransport {
			outbound_tx,
			shared: Arc::clone(&shared),
		};
		let parts = TransportParts {
			transport: Arc::new(transport),
			events: events_rx,
		};
		let handle = RelayHandle {
			events_tx,
			outbound_rx,
			shared,
		};
		(parts, handle)
	}
}

impl RelayTransport for ChannelTransport {
	fn send(&self, message: OutboundMessage) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			if self.shared.disconnected.load(Ordering::SeqCst) {
				return Err(Error::ChannelClosed);
			}
			if self.shared.fail_sends.load(Ordering::SeqCst) {
				return Err(Error::TransportError(format!("relay rejected {message:?}")));
			}
			self.outbound_tx.send(message).map_err(|_| Error::ChannelClosed)
		})
	}

	fn disconnect(&self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			if !self.shared.disconnected.swap(true, Ordering::SeqCst) {
				tracing::debug!(target: "sdkconn.transport", "in-memory transport disconnected");
			}
			Ok(())
		})
	}
}

/// Relay side of a [`ChannelTransport`].
pub struct RelayHandle {
	events_tx: mpsc::UnboundedSender<RemoteEvent>,
	outbound_rx: mpsc::UnboundedReceiver<OutboundMessage>,
	shared: Arc<Shared>,
}

impl RelayHandle {
	/// Pushes a remote event towards the connection.
	pub fn emit(&self, event: RemoteEvent) -> Result<()> {
		self.events_tx.send(event).map_err(|_| Error::ChannelClosed)
	}

	/// Waits for the next message the wallet sent back.
	pub async fn recv_outbound(&mut self) -> Option<OutboundMessage> {
		self.outbound_rx.recv().await
	}

	/// Returns the next outbound message if one is already queued.
	pub fn try_recv_outbound(&mut self) -> Option<OutboundMessage> {
		self.outbound_rx.try_recv().ok()
	}

	/// Returns true once the wallet side hung up.
	pub fn is_disconnected(&self) -> bool {
		self.shared.disconnected.load(Ordering::SeqCst)
	}

	/// Makes subsequent sends fail with [`Error::TransportError`].
	pub fn fail_sends(&self, fail: bool) {
		self.shared.fail_sends.store(fail, Ordering::SeqCst);
	}
}

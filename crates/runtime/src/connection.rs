//! A single supervised channel.
//!
//! A [`Connection`] pairs the relay handle ([`RemoteChannel`]) with a local
//! event surface for things the connection decides on its own, such as
//! loading-state changes driven by in-flight requests. It only emits; it
//! never calls back into the registry.

mod remote;
#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexSet;
use parking_lot::Mutex;
pub use remote::RemoteChannel;
use sdkconn_protocol::{LocalEvent, LocalEventKind, RemoteEvent};
use tokio::sync::{mpsc, watch};

use crate::handlers::{EventSurface, Subscription};
use crate::transport::TransportParts;

pub struct Connection {
	channel_id: Arc<str>,
	remote: RemoteChannel,
	local: EventSurface<LocalEvent, LocalEventKind>,
	pending_requests: PendingRequests,
	/// Subscriptions owned on behalf of the watcher.
	subscriptions: Mutex<Vec<Subscription>>,
	watched: AtomicBool,
	/// Remote event receiver (taken by run())
	events: Mutex<Option<mpsc::UnboundedReceiver<RemoteEvent>>>,
	shutdown_tx: watch::Sender<bool>,
}

impl Connection {
	pub fn new(channel_id: impl Into<Arc<str>>, parts: TransportParts) -> Self {
		let TransportParts { transport, events } = parts;
		let channel_id = channel_id.into();
		let (shutdown_tx, _) = watch::channel(false);

		Self {
			remote: RemoteChannel::new(Arc::clone(&channel_id), transport),
			channel_id,
			local: EventSurface::new(),
			pending_requests: PendingRequests::default(),
			subscriptions: Mutex::new(Vec::new()),
			watched: AtomicBool::new(false),
			events: Mutex::new(Some(events)),
			shutdown_tx,
		}
	}

	pub fn channel_id(&self) -> &str {
		&self.channel_id
	}

	pub(crate) fn channel_id_arc(&self) -> Arc<str> {
		Arc::clone(&self.channel_id)
	}

	pub fn remote(&self) -> &RemoteChannel {
		&self.remote
	}

	/// Registers `handler` for local events of `kind`.
	pub fn on<F>(&self, kind: LocalEventKind, handler: F) -> Subscription
	where
		F: Fn(&LocalEvent) + Send + Sync + 'static,
	{
		self.local.subscribe(kind, handler)
	}

	/// Registers a handler for loading-state changes.
	pub fn on_loading<F>(&self, handler: F) -> Subscription
	where
		F: Fn(bool) + Send + Sync + 'static,
	{
		self.on(LocalEventKind::ConnectionLoading, move |event| {
			let LocalEvent::ConnectionLoading { loading } = event;
			handler(*loading);
		})
	}

	/// Raises a loading event on the local surface.
	pub fn set_loading(&self, loading: bool) {
		tracing::trace!(target: "sdkconn.connection", channel_id = %self.channel_id, loading, "loading");
		let event = LocalEvent::ConnectionLoading { loading };
		self.local.emit(event.kind(), &event);
	}

	/// Records an in-flight request. The first pending request raises `loading: true`.
	pub fn track_request(&self, request_id: impl Into<String>) {
		if self.pending_requests.insert(request_id.into()) {
			self.set_loading(true);
		}
	}

	/// Completes an in-flight request. The last one raises `loading: false`.
	pub fn complete_request(&self, request_id: &str) {
		if self.pending_requests.complete(request_id) {
			self.set_loading(false);
		}
	}

	pub fn pending_requests(&self) -> usize {
		self.pending_requests.len()
	}

	/// Forgets every in-flight request without raising a loading event.
	///
	/// Returns how many were dropped. The next tracked request raises
	/// `loading: true` again.
	pub fn reset_requests(&self) -> usize {
		self.pending_requests.clear()
	}

	/// Shared handle to the pending set, for handlers that outlive a borrow.
	pub(crate) fn pending_handle(&self) -> PendingRequests {
		self.pending_requests.clone()
	}

	/// Keeps `subscription` alive until [`Connection::unsubscribe_all`].
	pub fn retain(&self, subscription: Subscription) {
		self.subscriptions.lock().push(subscription);
	}

	/// Marks the connection as watched. Returns false if it already was.
	pub(crate) fn begin_watch(&self) -> bool {
		!self.watched.swap(true, Ordering::SeqCst)
	}

	/// Drops every handler on both surfaces.
	pub fn unsubscribe_all(&self) {
		let retained: Vec<_> = std::mem::take(&mut *self.subscriptions.lock());
		drop(retained);
		self.remote.clear_handlers();
		self.local.clear();
	}

	pub fn handler_count(&self) -> usize {
		self.remote.handler_count() + self.local.len()
	}

	/// Stops the event pump started by [`Connection::run`].
	pub fn close(&self) {
		self.shutdown_tx.send_replace(true);
	}

	pub fn is_closed(&self) -> bool {
		*self.shutdown_tx.borrow()
	}

	/// Runs the remote event pump until the transport closes or [`Connection::close`].
	///
	/// Only the first call does anything; later calls return immediately.
	pub async fn run(self: &Arc<Self>) {
		let Some(mut events) = self.events.lock().take() else {
			tracing::warn!(target: "sdkconn.connection", channel_id = %self.channel_id, "event pump already started");
			return;
		};
		let mut shutdown_rx = self.shutdown_tx.subscribe();

		loop {
			if *shutdown_rx.borrow_and_update() {
				break;
			}
			tokio::select! {
				biased;
				changed = shutdown_rx.changed() => {
					if changed.is_err() {
						break;
					}
				}
				event = events.recv() => match event {
					Some(event) => {
						self.remote.dispatch(event);
					}
					None => {
						tracing::debug!(target: "sdkconn.connection", channel_id = %self.channel_id, "transport closed");
						break;
					}
				},
			}
		}

		tracing::debug!(target: "sdkconn.connection", channel_id = %self.channel_id, "event pump stopped");
	}
}

/// Request ids awaiting a wallet response, in arrival order.
#[derive(Clone, Default)]
pub(crate) struct PendingRequests(Arc<Mutex<IndexSet<String>>>);

impl PendingRequests {
	/// Returns true if this request made the set non-empty.
	fn insert(&self, request_id: String) -> bool {
		let mut pending = self.0.lock();
		pending.insert(request_id) && pending.len() == 1
	}

	/// Returns true if this request emptied the set.
	fn complete(&self, request_id: &str) -> bool {
		let mut pending = self.0.lock();
		pending.shift_remove(request_id) && pending.is_empty()
	}

	fn len(&self) -> usize {
		self.0.lock().len()
	}

	pub(crate) fn clear(&self) -> usize {
		let mut pending = self.0.lock();
		let dropped = pending.len();
		pending.clear();
		dropped
	}
}

impl std::fmt::Debug for Connection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Connection")
			.field("channel_id", &self.channel_id)
			.field("status", &self.remote.status())
			.field("pending_requests", &self.pending_requests())
			.finish()
	}
}

//! Event handler infrastructure shared by the remote and local surfaces.
//!
//! Handlers live in an [`IndexMap`] keyed by [`HandlerId`], which gives O(1)
//! removal and keeps registration order for delivery. Each handler carries the
//! event kind it was registered for as metadata, so one map serves every kind.

use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;

/// Unique identifier for event handlers.
pub type HandlerId = u64;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a new globally-unique handler ID.
pub fn next_handler_id() -> HandlerId {
	NEXT_HANDLER_ID.fetch_add(1, Ordering::SeqCst)
}

/// Synchronous handler invoked on the dispatch path.
pub type HandlerFn<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Event handler entry tagged with metadata `M` (the event kind).
pub struct HandlerEntry<E, M = ()> {
	pub id: HandlerId,
	pub meta: M,
	pub handler: HandlerFn<E>,
}

/// Handler storage: [`IndexMap`] for O(1) removal with stable insertion order.
pub type HandlerMap<E, M = ()> = Arc<Mutex<IndexMap<HandlerId, HandlerEntry<E, M>>>>;

/// Typed event surface: subscribe by kind, emit in registration order.
pub struct EventSurface<E, K> {
	handlers: HandlerMap<E, K>,
}

impl<E, K> Default for EventSurface<E, K> {
	fn default() -> Self {
		Self {
			handlers: Arc::new(Mutex::new(IndexMap::new())),
		}
	}
}

impl<E, K> EventSurface<E, K>
where
	E: Send + Sync + 'static,
	K: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static,
{
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `handler` for events of `kind`.
	pub fn subscribe<F>(&self, kind: K, handler: F) -> Subscription
	where
		F: Fn(&E) + Send + Sync + 'static,
	{
		let id = next_handler_id();
		self.handlers.lock().insert(
			id,
			HandlerEntry {
				id,
				meta: kind,
				handler: Arc::new(handler),
			},
		);
		Subscription::from_handler_map(id, &self.handlers)
	}

	/// Delivers `event` to every handler registered for `kind`.
	///
	/// Handlers are snapshotted first, so a handler may unsubscribe (or clear
	/// the surface) while dispatch is running. Returns the number invoked.
	pub fn emit(&self, kind: K, event: &E) -> usize {
		let handlers: Vec<_> = {
			let map = self.handlers.lock();
			map.values()
				.filter(|entry| entry.meta == kind)
				.map(|entry| (entry.id, Arc::clone(&entry.handler)))
				.collect()
		};

		for (id, handler) in &handlers {
			tracing::trace!(target: "sdkconn.handlers", handler_id = id, ?kind, "delivering event");
			handler(event);
		}
		handlers.len()
	}

	/// Kinds of the registered handlers, in registration order.
	pub fn kinds(&self) -> Vec<K> {
		self.handlers.lock().values().map(|entry| entry.meta).collect()
	}

	pub fn len(&self) -> usize {
		self.handlers.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.handlers.lock().is_empty()
	}

	/// Drops every handler. Outstanding [`Subscription`]s become no-ops.
	pub fn clear(&self) {
		self.handlers.lock().clear();
	}
}

/// RAII handle that unregisters an event handler on drop.
///
/// Holds a weak reference to the handler map, so dropping after the owning
/// surface is gone is safe (becomes a no-op).
pub struct Subscription {
	id: HandlerId,
	dropper: Option<Arc<dyn Fn(HandlerId) + Send + Sync>>,
}

impl Subscription {
	/// Creates a subscription with a custom dropper function.
	pub fn new(id: HandlerId, dropper: Arc<dyn Fn(HandlerId) + Send + Sync>) -> Self {
		Self {
			id,
			dropper: Some(dropper),
		}
	}

	/// Creates a subscription from a handler map using a weak reference.
	pub fn from_handler_map<E, M>(id: HandlerId, handlers: &HandlerMap<E, M>) -> Self
	where
		E: Send + Sync + 'static,
		M: Send + Sync + 'static,
	{
		let weak: Weak<Mutex<IndexMap<HandlerId, HandlerEntry<E, M>>>> = Arc::downgrade(handlers);
		let dropper = Arc::new(move |id: HandlerId| {
			if let Some(map) = weak.upgrade() {
				map.lock().shift_remove(&id);
			}
		});
		Self::new(id, dropper)
	}

	/// Explicitly unsubscribes. Equivalent to dropping.
	pub fn unsubscribe(mut self) {
		if let Some(dropper) = self.dropper.take() {
			(dropper)(self.id);
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(dropper) = self.dropper.take() {
			(dropper)(self.id);
		}
	}
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription")
			.field("id", &self.id)
			.field("active", &self.dropper.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicBool, AtomicUsize};

	use super::*;

	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	enum Kind {
		A,
		B,
	}

	#[test]
	fn test_handler_id_increments() {
		let id1 = next_handler_id();
		let id2 = next_handler_id();
		assert!(id2 > id1);
	}

	#[test]
	fn test_emit_filters_by_kind_in_order() {
		let surface: EventSurface<u32, Kind> = EventSurface::new();
		let seen = Arc::new(Mutex::new(Vec::new()));

		let s1 = Arc::clone(&seen);
		let _a1 = surface.subscribe(Kind::A, move |v| s1.lock().push(("first", *v)));
		let s2 = Arc::clone(&seen);
		let _b = surface.subscribe(Kind::B, move |v| s2.lock().push(("other", *v)));
		let s3 = Arc::clone(&seen);
		let _a2 = surface.subscribe(Kind::A, move |v| s3.lock().push(("second", *v)));

		assert_eq!(surface.emit(Kind::A, &7), 2);
		assert_eq!(*seen.lock(), vec![("first", 7), ("second", 7)]);
		assert_eq!(surface.kinds(), vec![Kind::A, Kind::B, Kind::A]);
	}

	#[test]
	fn test_handler_may_clear_surface_during_emit() {
		let surface: Arc<EventSurface<(), Kind>> = Arc::new(EventSurface::new());
		let calls = Arc::new(AtomicUsize::new(0));

		let inner = Arc::clone(&surface);
		let c1 = Arc::clone(&calls);
		let _s1 = surface.subscribe(Kind::A, move |_| {
			c1.fetch_add(1, Ordering::SeqCst);
			inner.clear();
		});
		let c2 = Arc::clone(&calls);
		let _s2 = surface.subscribe(Kind::A, move |_| {
			c2.fetch_add(1, Ordering::SeqCst);
		});

		surface.emit(Kind::A, &());
		assert_eq!(calls.load(Ordering::SeqCst), 2);
		assert!(surface.is_empty());

		surface.emit(Kind::A, &());
		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}

	#[test]
	fn test_subscription_unsubscribe() {
		let called = Arc::new(AtomicBool::new(false));
		let called_clone = Arc::clone(&called);

		let dropper = Arc::new(move |_id: HandlerId| {
			called_clone.store(true, Ordering::SeqCst);
		});

		let sub = Subscription::new(1, dropper);
		assert!(!called.load(Ordering::SeqCst));

		sub.unsubscribe();
		assert!(called.load(Ordering::SeqCst));
	}

	#[test]
	fn test_subscription_drop_removes_handler() {
		let surface: EventSurface<(), Kind> = EventSurface::new();
		{
			let _sub = surface.subscribe(Kind::B, |_| {});
			assert_eq!(surface.len(), 1);
		}
		assert_eq!(surface.len(), 0);
	}

	#[test]
	fn test_subscription_weak_reference() {
		let surface: EventSurface<(), Kind> = EventSurface::new();
		let sub = surface.subscribe(Kind::A, |_| {});

		drop(surface);

		// Dropping subscription should not panic (weak ref is dead)
		drop(sub);
	}
}

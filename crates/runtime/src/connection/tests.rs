use std::time::Duration;

use sdkconn_protocol::{ConnectionStatus, RemoteEventKind};

use super::*;
use crate::transport::{ChannelTransport, RelayHandle};

fn create_test_connection() -> (Arc<Connection>, RelayHandle) {
	let (parts, relay) = ChannelTransport::pair();
	(Arc::new(Connection::new("testChannelId", parts)), relay)
}

fn recorder<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, Arc<Mutex<Vec<T>>>) {
	let seen = Arc::new(Mutex::new(Vec::new()));
	(Arc::clone(&seen), seen)
}

#[test]
fn test_status_starts_connecting_and_follows_events() {
	let (connection, _relay) = create_test_connection();
	assert_eq!(connection.remote().status(), ConnectionStatus::Connecting);

	connection.remote().dispatch(RemoteEvent::status(ConnectionStatus::Linked));
	assert_eq!(connection.remote().status(), ConnectionStatus::Linked);

	connection.remote().dispatch(RemoteEvent::ClientsDisconnected);
	assert_eq!(connection.remote().status(), ConnectionStatus::Linked);
}

#[test]
fn test_status_is_updated_before_handlers_run() {
	let (connection, _relay) = create_test_connection();
	let (seen, handle) = recorder();

	let inner = Arc::clone(&connection);
	let sub = connection.remote().on_connection_status(move |status| {
		handle.lock().push((status, inner.remote().status()));
	});
	connection.retain(sub);

	connection.remote().dispatch(RemoteEvent::status(ConnectionStatus::Timeout));
	assert_eq!(
		*seen.lock(),
		vec![(ConnectionStatus::Timeout, ConnectionStatus::Timeout)]
	);

	// Break the Arc cycle held by the handler.
	connection.unsubscribe_all();
}

#[test]
fn test_typed_helpers_only_see_their_kind() {
	let (connection, _relay) = create_test_connection();
	let (seen, handle) = recorder();

	let h = Arc::clone(&handle);
	let _s1 = connection.remote().on_clients_disconnected(move || h.lock().push("disconnected"));
	let h = Arc::clone(&handle);
	let _s2 = connection.remote().on_clients_connected(move || h.lock().push("connected"));
	let _s3 = connection.remote().on_clients_waiting(move || handle.lock().push("waiting"));

	connection.remote().dispatch(RemoteEvent::ClientsWaiting);
	connection.remote().dispatch(RemoteEvent::ClientsConnected);
	connection.remote().dispatch(RemoteEvent::ClientsDisconnected);
	connection.remote().dispatch(RemoteEvent::status(ConnectionStatus::Waiting));

	assert_eq!(*seen.lock(), vec!["waiting", "connected", "disconnected"]);
	assert_eq!(
		connection.remote().subscribed_kinds(),
		vec![
			RemoteEventKind::ClientsDisconnected,
			RemoteEventKind::ClientsConnected,
			RemoteEventKind::ClientsWaiting,
		]
	);
}

#[test]
fn test_set_loading_reaches_local_subscribers() {
	let (connection, _relay) = create_test_connection();
	let (seen, handle) = recorder();

	let _sub = connection.on_loading(move |loading| handle.lock().push(loading));

	connection.set_loading(true);
	connection.set_loading(false);

	assert_eq!(*seen.lock(), vec![true, false]);
}

#[test]
fn test_request_tracking_raises_loading_on_edges() {
	let (connection, _relay) = create_test_connection();
	let (seen, handle) = recorder();
	let _sub = connection.on_loading(move |loading| handle.lock().push(loading));

	connection.track_request("1");
	connection.track_request("2");
	connection.track_request("2");
	assert_eq!(connection.pending_requests(), 2);

	connection.complete_request("1");
	connection.complete_request("unknown");
	assert_eq!(*seen.lock(), vec![true]);

	connection.complete_request("2");
	assert_eq!(*seen.lock(), vec![true, false]);
	assert_eq!(connection.pending_requests(), 0);

	connection.complete_request("2");
	assert_eq!(*seen.lock(), vec![true, false]);
}

#[test]
fn test_reset_requests_starts_a_fresh_edge() {
	let (connection, _relay) = create_test_connection();
	let (seen, handle) = recorder();
	let _sub = connection.on_loading(move |loading| handle.lock().push(loading));

	connection.track_request("1");
	connection.track_request("2");
	assert_eq!(connection.reset_requests(), 2);
	assert_eq!(connection.pending_requests(), 0);
	assert_eq!(*seen.lock(), vec![true]);

	connection.track_request("3");
	assert_eq!(*seen.lock(), vec![true, true]);
	assert_eq!(connection.reset_requests(), 1);
	assert_eq!(connection.reset_requests(), 0);
}

#[test]
fn test_unsubscribe_all_clears_both_surfaces() {
	let (connection, _relay) = create_test_connection();

	let s1 = connection.remote().on_clients_disconnected(|| {});
	let s2 = connection.on_loading(|_| {});
	let _loose = connection.remote().on_clients_waiting(|| {});
	connection.retain(s1);
	connection.retain(s2);
	assert_eq!(connection.handler_count(), 3);

	connection.unsubscribe_all();
	assert_eq!(connection.handler_count(), 0);
	assert_eq!(connection.remote().dispatch(RemoteEvent::ClientsDisconnected), 0);
}

#[test]
fn test_begin_watch_only_once() {
	let (connection, _relay) = create_test_connection();
	assert!(connection.begin_watch());
	assert!(!connection.begin_watch());
}

#[tokio::test]
async fn test_run_dispatches_relay_events() {
	let (connection, relay) = create_test_connection();
	let (seen, handle) = recorder();
	let _sub = connection.remote().on_connection_status(move |status| handle.lock().push(status));

	let pump = tokio::spawn({
		let connection = Arc::clone(&connection);
		async move { connection.run().await }
	});

	relay.emit(RemoteEvent::status(ConnectionStatus::Waiting)).unwrap();
	relay.emit(RemoteEvent::status(ConnectionStatus::Linked)).unwrap();
	drop(relay);

	tokio::time::timeout(Duration::from_secs(1), pump).await.unwrap().unwrap();
	assert_eq!(
		*seen.lock(),
		vec![ConnectionStatus::Waiting, ConnectionStatus::Linked]
	);
}

#[tokio::test]
async fn test_close_stops_pump() {
	let (connection, relay) = create_test_connection();

	let pump = tokio::spawn({
		let connection = Arc::clone(&connection);
		async move { connection.run().await }
	});

	connection.close();
	assert!(connection.is_closed());
	tokio::time::timeout(Duration::from_secs(1), pump).await.unwrap().unwrap();

	// Relay still alive; events after close are simply not pumped.
	let _ = relay.emit(RemoteEvent::ClientsWaiting);
}

#[tokio::test]
async fn test_second_run_returns_immediately() {
	let (connection, _relay) = create_test_connection();
	connection.close();
	connection.run().await;
	tokio::time::timeout(Duration::from_millis(100), connection.run())
		.await
		.unwrap();
}

//! Connection watcher: the lifecycle policy between a connection and its registry.
//!
//! [`watch_connection`] holds no state. It subscribes to a connection's remote
//! and local surfaces and turns each event into a call on a
//! [`ChannelSupervisor`]:
//!
//! | Event | Side effect |
//! |---|---|
//! | status `Terminated` | remove, `emit_refresh: true`, `send_terminate: false` |
//! | `ClientsDisconnected` | drop pending requests, loading off; if the host is disabled, also remove with `send_terminate: true` |
//! | local `ConnectionLoading` | forward the flag to the loading state |
//!
//! Supervisor calls are made on the dispatch path, but the futures they return
//! are spawned as detached tasks. Dispatch never waits on them and their
//! failures only reach the log.


use std::future::Future;
use std::sync::Arc;

use sdkconn_protocol::{ConnectionStatus, HostKey, LoadingState, RemoveChannelOptions};
use tracing::{debug, info, warn};

use crate::connection::{Connection, PendingRequests};
use crate::error::Result;
use crate::transport::BoxFuture;

/// Registry operations the watcher drives.
///
/// The call itself happens on the dispatch path; the returned future is run
/// detached. Implementations must make `remove_channel` idempotent: it can be
/// called several times, concurrently, for the same channel. Handlers keep
/// the supervisor alive, so it must not own the connection it watches.
pub trait ChannelSupervisor: Send + Sync + 'static {
	/// Tears a channel down. Removing an unknown channel is a no-op.
	fn remove_channel(&self, options: RemoveChannelOptions) -> BoxFuture<'static, ()>;

	/// Pushes a channel's loading flag to the UI.
	fn update_sdk_loading_state(&self, state: LoadingState) -> BoxFuture<'static, Result<()>>;

	/// Host identity for `channel_id`.
	fn host_key(&self, channel_id: &str) -> HostKey;

	/// Returns true if `host` crossed the unreliability threshold.
	fn is_host_disabled(&self, host: &HostKey) -> bool;
}

/// Installs the lifecycle handlers on `connection`.
///
/// Subscriptions are registered in a fixed order (status, clients
/// disconnected, then local loading) and retained by the connection until
/// [`Connection::unsubscribe_all`]. A second call for the same connection
/// installs nothing.
pub fn watch_connection(connection: &Connection, supervisor: Arc<dyn ChannelSupervisor>) {
	let channel_id = connection.channel_id_arc();
	if !connection.begin_watch() {
		debug!(target: "sdkconn.watcher", %channel_id, "connection already watched");
		return;
	}

	let status = connection.remote().on_connection_status({
		let supervisor = Arc::clone(&supervisor);
		let channel_id = Arc::clone(&channel_id);
		move |status| on_connection_status(&supervisor, &channel_id, status)
	});
	let disconnected = connection.remote().on_clients_disconnected({
		let supervisor = Arc::clone(&supervisor);
		let channel_id = Arc::clone(&channel_id);
		let pending = connection.pending_handle();
		move || on_clients_disconnected(&supervisor, &channel_id, &pending)
	});
	let loading = connection.on_loading({
		let channel_id = Arc::clone(&channel_id);
		move |loading| on_connection_loading(&supervisor, &channel_id, loading)
	});

	connection.retain(status);
	connection.retain(disconnected);
	connection.retain(loading);

	debug!(target: "sdkconn.watcher", %channel_id, "watching connection");
}

fn on_connection_status(supervisor: &Arc<dyn ChannelSupervisor>, channel_id: &str, status: ConnectionStatus) {
	if !status.is_terminal() {
		debug!(target: "sdkconn.watcher", channel_id, %status, "status change, no action");
		return;
	}

	info!(target: "sdkconn.watcher", channel_id, "remote terminated channel");
	let removal = supervisor.remove_channel(
		RemoveChannelOptions::new(channel_id)
			.with_emit_refresh(true)
			.with_send_terminate(false),
	);
	spawn_detached(channel_id, "remove_channel", removal);
}

fn on_clients_disconnected(supervisor: &Arc<dyn ChannelSupervisor>, channel_id: &str, pending: &PendingRequests) {
	// Checked now, not when the spawned work runs.
	let host = supervisor.host_key(channel_id);
	let disabled = supervisor.is_host_disabled(&host);
	// Nobody is left to answer; the next request starts a fresh loading edge.
	let dropped = pending.clear();
	debug!(target: "sdkconn.watcher", channel_id, %host, disabled, dropped, "clients disconnected");

	update_loading(supervisor, channel_id, false);

	if disabled {
		info!(target: "sdkconn.watcher", channel_id, %host, "host disabled, closing channel");
		let removal = supervisor.remove_channel(RemoveChannelOptions::new(channel_id).with_send_terminate(true));
		spawn_detached(channel_id, "remove_channel", removal);
	}
}

fn on_connection_loading(supervisor: &Arc<dyn ChannelSupervisor>, channel_id: &str, loading: bool) {
	update_loading(supervisor, channel_id, loading);
}

fn update_loading(supervisor: &Arc<dyn ChannelSupervisor>, channel_id: &str, loading: bool) {
	let update = supervisor.update_sdk_loading_state(LoadingState::new(channel_id, loading));
	let owned_id = channel_id.to_string();
	spawn_detached(channel_id, "update_sdk_loading_state", async move {
		if let Err(err) = update.await {
			warn!(
				target: "sdkconn.watcher",
				channel_id = %owned_id,
				loading,
				error = %err,
				"failed to update loading state"
			);
		}
	});
}

fn spawn_detached<F>(channel_id: &str, operation: &'static str, task: F)
where
	F: Future<Output = ()> + Send + 'static,
{
	match tokio::runtime::Handle::try_current() {
		Ok(handle) => {
			handle.spawn(task);
		}
		Err(_) => {
			warn!(target: "sdkconn.watcher", channel_id, operation, "no tokio runtime, side effect dropped");
		}
	}
}

//! Process-wide channel registry.
//!
//! The [`Registry`] owns every active [`Connection`], the disabled-host ledger,
//! and the set of channels currently loading. It is created once at startup
//! and passed around explicitly as `Arc<Registry>`.
//!
//! # Removal
//!
//! [`Registry::remove_channel`] is the single teardown path. The first caller
//! to take the connection out of the map performs the cleanup; every other
//! call, concurrent or later, finds nothing and returns. No lock is held
//! across an `.await`.

mod hosts;
mod presenter;

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures_util::future::join_all;
pub use hosts::HostLedger;
use indexmap::IndexSet;
use parking_lot::Mutex;
pub use presenter::{LoadingPresenter, LogPresenter};
use sdkconn_protocol::{HostKey, LoadingState, RegistryEvent, RemoveChannelOptions};
use tokio::sync::{Mutex as TokioMutex, broadcast};
use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::transport::{BoxFuture, TransportParts};
use crate::watcher::{ChannelSupervisor, watch_connection};

pub struct Registry {
	config: RegistryConfig,
	connections: DashMap<Arc<str>, Arc<Connection>>,
	disabled_hosts: HostLedger,
	/// Channels currently loading, in the order they started.
	loading: Mutex<IndexSet<String>>,
	/// Last visibility the presenter accepted. Serializes presenter calls.
	indicator: TokioMutex<bool>,
	presenter: Arc<dyn LoadingPresenter>,
	events_tx: broadcast::Sender<RegistryEvent>,
}

impl Registry {
	/// Creates a registry that logs loading-indicator changes.
	pub fn new(config: RegistryConfig) -> Arc<Self> {
		Self::with_presenter(config, Arc::new(LogPresenter))
	}

	pub fn with_presenter(config: RegistryConfig, presenter: Arc<dyn LoadingPresenter>) -> Arc<Self> {
		let (events_tx, _) = broadcast::channel(config.event_capacity.max(1));
		Arc::new(Self {
			config,
			connections: DashMap::new(),
			disabled_hosts: HostLedger::new(),
			loading: Mutex::new(IndexSet::new()),
			indicator: TokioMutex::new(false),
			presenter,
			events_tx,
		})
	}

	pub fn config(&self) -> &RegistryConfig {
		&self.config
	}

	/// Registers a new channel, installs the watcher, and starts its event pump.
	///
	/// # Errors
	///
	/// [`Error::ChannelExists`] if the id is taken, [`Error::HostDisabled`] if
	/// the channel's host needs an explicit re-enable first.
	pub fn connect(self: &Arc<Self>, channel_id: &str, parts: TransportParts) -> Result<Arc<Connection>> {
		let host = self.host_key(channel_id);
		if self.disabled_hosts.contains(&host) {
			return Err(Error::HostDisabled {
				channel_id: channel_id.to_string(),
				host: host.to_string(),
			});
		}

		let connection = Arc::new(Connection::new(channel_id, parts));
		match self.connections.entry(connection.channel_id_arc()) {
			Entry::Occupied(_) => return Err(Error::ChannelExists(channel_id.to_string())),
			Entry::Vacant(slot) => {
				slot.insert(Arc::clone(&connection));
			}
		}

		watch_connection(&connection, self.supervisor());

		match tokio::runtime::Handle::try_current() {
			Ok(handle) => {
				let pump = Arc::clone(&connection);
				handle.spawn(async move { pump.run().await });
			}
			Err(_) => {
				warn!(target: "sdkconn.registry", channel_id, "no tokio runtime, event pump not started");
			}
		}

		info!(target: "sdkconn.registry", channel_id, "channel connected");
		self.emit(RegistryEvent::ChannelAdded {
			channel_id: channel_id.to_string(),
		});
		Ok(connection)
	}

	pub fn connection(&self, channel_id: &str) -> Option<Arc<Connection>> {
		self.connections.get(channel_id).map(|entry| Arc::clone(entry.value()))
	}

	/// Registered channel ids, sorted.
	pub fn channel_ids(&self) -> Vec<String> {
		let mut ids: Vec<String> = self.connections.iter().map(|entry| entry.key().to_string()).collect();
		ids.sort();
		ids
	}

	pub fn len(&self) -> usize {
		self.connections.len()
	}

	pub fn is_empty(&self) -> bool {
		self.connections.is_empty()
	}

	/// Removes a channel. Idempotent: unknown ids are a no-op.
	///
	/// Unsubscribes the connection's handlers, stops its pump, drops its
	/// loading entry, optionally sends a terminate message, disconnects the
	/// remote, and optionally broadcasts [`RegistryEvent::Refresh`]. The
	/// host's disabled entry, if any, is left in place.
	pub async fn remove_channel(&self, options: RemoveChannelOptions) {
		let RemoveChannelOptions {
			channel_id,
			emit_refresh,
			send_terminate,
		} = options;

		let Some((_, connection)) = self.connections.remove(channel_id.as_str()) else {
			debug!(target: "sdkconn.registry", %channel_id, "channel already removed");
			return;
		};

		connection.unsubscribe_all();
		connection.close();

		let was_loading = self.loading.lock().shift_remove(&channel_id);
		if was_loading {
			self.emit(RegistryEvent::LoadingChanged {
				channel_id: channel_id.clone(),
				loading: false,
			});
			self.reconcile_indicator().await;
		}

		let mut terminated = false;
		if send_terminate {
			match connection.remote().send_terminate().await {
				Ok(()) => terminated = true,
				Err(err) => {
					warn!(target: "sdkconn.registry", %channel_id, error = %err, "failed to send terminate");
				}
			}
		}
		if let Err(err) = connection.remote().disconnect().await {
			warn!(target: "sdkconn.registry", %channel_id, error = %err, "failed to disconnect remote");
		}

		info!(
			target: "sdkconn.registry",
			%channel_id,
			emit_refresh,
			send_terminate,
			"channel removed"
		);
		self.emit(RegistryEvent::ChannelRemoved {
			channel_id,
			terminated,
		});
		if emit_refresh {
			self.emit(RegistryEvent::Refresh);
		}
	}

	/// Removes every channel, telling each requester the wallet closed it.
	pub async fn remove_all(&self) {
		let removals = self
			.channel_ids()
			.into_iter()
			.map(|id| self.remove_channel(RemoveChannelOptions::new(id).with_send_terminate(true)));
		join_all(removals).await;
	}

	/// Records a channel's loading flag and updates the aggregate indicator.
	///
	/// Never fails: presenter errors are logged and the indicator is retried
	/// on the next update. `loading: true` for a channel that is not
	/// registered is ignored, so an update that lands after teardown cannot
	/// bring a removed channel back into the loading set.
	pub async fn update_sdk_loading_state(&self, state: LoadingState) -> Result<()> {
		let LoadingState { channel_id, loading } = state;

		let changed = {
			// Checked under the loading lock: remove_channel drops the
			// connection before it clears the loading entry.
			let mut set = self.loading.lock();
			if loading {
				if !self.connections.contains_key(channel_id.as_str()) {
					debug!(target: "sdkconn.registry", %channel_id, "loading update for removed channel ignored");
					return Ok(());
				}
				set.insert(channel_id.clone())
			} else {
				set.shift_remove(&channel_id)
			}
		};

		if changed {
			debug!(target: "sdkconn.registry", %channel_id, loading, "loading state changed");
			self.emit(RegistryEvent::LoadingChanged { channel_id, loading });
		}
		self.reconcile_indicator().await;
		Ok(())
	}

	pub fn is_loading(&self, channel_id: &str) -> bool {
		self.loading.lock().contains(channel_id)
	}

	/// Channels currently loading, in the order they started.
	pub fn loading_sessions(&self) -> Vec<String> {
		self.loading.lock().iter().cloned().collect()
	}

	/// Brings the presenter in line with the loading set.
	async fn reconcile_indicator(&self) {
		let mut shown = self.indicator.lock().await;
		let wanted = !self.loading.lock().is_empty();
		if *shown == wanted {
			return;
		}

		match self.presenter.set_visible(wanted).await {
			Ok(()) => {
				*shown = wanted;
				self.emit(RegistryEvent::LoadingIndicator { visible: wanted });
			}
			Err(err) => {
				warn!(target: "sdkconn.registry", visible = wanted, error = %err, "loading presenter failed");
			}
		}
	}

	pub fn disabled_hosts(&self) -> &HostLedger {
		&self.disabled_hosts
	}

	/// Host key for `channel_id` under the configured origin.
	pub fn host_key(&self, channel_id: &str) -> HostKey {
		HostKey::for_channel(&self.config.remote_origin, channel_id)
	}

	/// Disables the channel's host so it is not silently reconnected.
	///
	/// Returns false if the host was already disabled.
	pub fn disapprove_channel(&self, channel_id: &str) -> bool {
		let host = self.host_key(channel_id);
		info!(target: "sdkconn.registry", channel_id, %host, "host disabled");
		self.disabled_hosts.disable(host)
	}

	/// Explicitly re-enables the channel's host.
	pub fn enable_host(&self, channel_id: &str) -> bool {
		let enabled = self.disabled_hosts.enable(&self.host_key(channel_id));
		if enabled {
			info!(target: "sdkconn.registry", channel_id, "host re-enabled");
		}
		enabled
	}

	pub fn enable_disabled_hosts(&self) {
		self.disabled_hosts.clear();
	}

	/// Weak supervisor view used to watch this registry's connections.
	pub fn supervisor(self: &Arc<Self>) -> Arc<dyn ChannelSupervisor> {
		Arc::new(RegistrySupervisor {
			registry: Arc::downgrade(self),
			remote_origin: self.config.remote_origin.clone(),
		})
	}

	/// Subscribes to registry notifications.
	pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
		self.events_tx.subscribe()
	}

	fn emit(&self, event: RegistryEvent) {
		// No receivers is fine.
		let _ = self.events_tx.send(event);
	}
}

/// Supervisor handed to the watcher: a weak view of the registry.
///
/// The registry owns each connection and each connection owns its handlers,
/// so the handlers must not keep the registry alive. Once the registry is
/// gone every call is a no-op.
struct RegistrySupervisor {
	registry: Weak<Registry>,
	remote_origin: String,
}

impl ChannelSupervisor for RegistrySupervisor {
	fn remove_channel(&self, options: RemoveChannelOptions) -> BoxFuture<'static, ()> {
		let registry = self.registry.upgrade();
		Box::pin(async move {
			match registry {
				Some(registry) => registry.remove_channel(options).await,
				None => debug!(target: "sdkconn.registry", channel_id = %options.channel_id, "registry dropped, removal skipped"),
			}
		})
	}

	fn update_sdk_loading_state(&self, state: LoadingState) -> BoxFuture<'static, Result<()>> {
		let registry = self.registry.upgrade();
		Box::pin(async move {
			match registry {
				Some(registry) => registry.update_sdk_loading_state(state).await,
				None => Ok(()),
			}
		})
	}

	fn host_key(&self, channel_id: &str) -> HostKey {
		HostKey::for_channel(&self.remote_origin, channel_id)
	}

	fn is_host_disabled(&self, host: &HostKey) -> bool {
		self.registry
			.upgrade()
			.is_some_and(|registry| registry.disabled_hosts.contains(host))
	}
}

impl std::fmt::Debug for Registry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Registry")
			.field("channels", &self.channel_ids())
			.field("disabled_hosts", &self.disabled_hosts.len())
			.field("loading", &self.loading_sessions())
			.finish()
	}
}

//! Drives a [`Registry`] through a [`Script`] and traces what it does.
//!
//! Each channel gets an in-memory relay. After every step the replay lets
//! detached work run, then writes one JSON line per registry event and per
//! message the wallet sent back through a relay. Steps the registry rejects
//! are traced as `rejected` and the replay carries on.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use sdkconn_protocol::{HostKey, OutboundMessage, RegistryEvent, RemoveChannelOptions};
use sdkconn_runtime::{ChannelTransport, Connection, Registry, RegistryConfig, RelayHandle};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, warn};

use crate::error::Result;
use crate::script::{Script, Step};

/// Yields given to detached tasks between steps.
const QUIESCE_YIELDS: usize = 32;

/// Trace lines that are not registry events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum TraceLine {
	/// The wallet sent `message` to the requester.
	Outbound { channel_id: String, message: OutboundMessage },
	/// The registry refused a step.
	Rejected { step: usize, error: String },
}

/// Final registry state, written as the last trace line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename = "summary", rename_all = "camelCase")]
pub struct Summary {
	pub channels: Vec<String>,
	pub disabled_hosts: BTreeMap<HostKey, u32>,
	pub loading: Vec<String>,
	pub rejected: usize,
}

pub async fn replay<W: Write>(script: &Script, config: RegistryConfig, out: &mut W) -> Result<Summary> {
	let registry = Registry::new(config);
	for (host, counter) in &script.disabled_hosts {
		registry.disabled_hosts().record(HostKey::from(host.clone()), *counter);
	}

	let mut events = registry.subscribe();
	let mut relays: BTreeMap<String, RelayHandle> = BTreeMap::new();
	let mut rejected = 0;

	for (index, step) in script.steps.iter().enumerate() {
		debug!(target: "sdkconn.replay", step = index, ?step, "applying step");
		if let Err(err) = apply(&registry, &mut relays, step).await {
			warn!(target: "sdkconn.replay", step = index, error = %err, "step rejected");
			rejected += 1;
			write_line(
				out,
				&TraceLine::Rejected {
					step: index,
					error: err.to_string(),
				},
			)?;
		}
		quiesce().await;
		flush(&mut events, &mut relays, out)?;
	}

	let summary = Summary {
		channels: registry.channel_ids(),
		disabled_hosts: registry.disabled_hosts().snapshot(),
		loading: registry.loading_sessions(),
		rejected,
	};
	write_line(out, &summary)?;
	Ok(summary)
}

async fn apply(
	registry: &Arc<Registry>,
	relays: &mut BTreeMap<String, RelayHandle>,
	step: &Step,
) -> sdkconn_runtime::Result<()> {
	match step {
		Step::Connect { channel_id } => {
			let (parts, relay) = ChannelTransport::pair();
			registry.connect(channel_id, parts)?;
			relays.insert(channel_id.clone(), relay);
		}
		Step::Remote { channel_id, event } => {
			connection(registry, channel_id)?;
			let relay = relays
				.get(channel_id)
				.ok_or_else(|| sdkconn_runtime::Error::ChannelNotFound(channel_id.clone()))?;
			relay.emit(event.clone())?;
		}
		Step::Loading { channel_id, loading } => connection(registry, channel_id)?.set_loading(*loading),
		Step::Request { channel_id, request_id } => connection(registry, channel_id)?.track_request(request_id.as_str()),
		Step::Complete { channel_id, request_id } => connection(registry, channel_id)?.complete_request(request_id),
		Step::Disapprove { channel_id } => {
			registry.disapprove_channel(channel_id);
		}
		Step::Enable { channel_id } => {
			registry.enable_host(channel_id);
		}
		Step::Remove {
			channel_id,
			emit_refresh,
			send_terminate,
		} => {
			let options = RemoveChannelOptions::new(channel_id.as_str())
				.with_emit_refresh(*emit_refresh)
				.with_send_terminate(*send_terminate);
			registry.remove_channel(options).await;
		}
		Step::Settle { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
	}
	Ok(())
}

fn connection(registry: &Registry, channel_id: &str) -> sdkconn_runtime::Result<Arc<Connection>> {
	registry
		.connection(channel_id)
		.ok_or_else(|| sdkconn_runtime::Error::ChannelNotFound(channel_id.to_string()))
}

async fn quiesce() {
	for _ in 0..QUIESCE_YIELDS {
		tokio::task::yield_now().await;
	}
}

fn flush<W: Write>(
	events: &mut broadcast::Receiver<RegistryEvent>,
	relays: &mut BTreeMap<String, RelayHandle>,
	out: &mut W,
) -> Result<()> {
	loop {
		match events.try_recv() {
			Ok(event) => write_line(out, &event)?,
			Err(TryRecvError::Lagged(skipped)) => {
				warn!(target: "sdkconn.replay", skipped, "registry events dropped, raise eventCapacity");
			}
			Err(TryRecvError::Empty | TryRecvError::Closed) => break,
		}
	}

	for (channel_id, relay) in relays.iter_mut() {
		while let Some(message) = relay.try_recv_outbound() {
			write_line(
				out,
				&TraceLine::Outbound {
					channel_id: channel_id.clone(),
					message,
				},
			)?;
		}
	}
	Ok(())
}

fn write_line<W: Write, T: Serialize>(out: &mut W, line: &T) -> Result<()> {
	serde_json::to_writer(&mut *out, line)?;
	out.write_all(b"\n")?;
	Ok(())
}

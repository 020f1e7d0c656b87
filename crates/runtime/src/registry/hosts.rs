//! Per-host disable tracking.

use std::collections::BTreeMap;

use dashmap::DashMap;
use sdkconn_protocol::HostKey;

/// Map of disabled hosts to their failure counter.
///
/// Presence is what matters to the lifecycle policy; the counter is carried
/// for whoever owns the reliability bookkeeping. Entries outlive the
/// connections they were recorded for.
#[derive(Debug, Default)]
pub struct HostLedger {
	hosts: DashMap<HostKey, u32>,
}

impl HostLedger {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn contains(&self, host: &HostKey) -> bool {
		self.hosts.contains_key(host)
	}

	pub fn get(&self, host: &HostKey) -> Option<u32> {
		self.hosts.get(host).map(|entry| *entry.value())
	}

	/// Marks `host` disabled with a zero counter. Returns false if it already was.
	pub fn disable(&self, host: HostKey) -> bool {
		let mut inserted = false;
		self.hosts.entry(host).or_insert_with(|| {
			inserted = true;
			0
		});
		inserted
	}

	/// Records `host` with an explicit counter, replacing any previous value.
	pub fn record(&self, host: HostKey, counter: u32) {
		self.hosts.insert(host, counter);
	}

	/// Re-enables `host`. Returns false if it was not disabled.
	pub fn enable(&self, host: &HostKey) -> bool {
		self.hosts.remove(host).is_some()
	}

	pub fn clear(&self) {
		self.hosts.clear();
	}

	pub fn len(&self) -> usize {
		self.hosts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.hosts.is_empty()
	}

	/// Sorted copy of the current entries.
	pub fn snapshot(&self) -> BTreeMap<HostKey, u32> {
		self.hosts
			.iter()
			.map(|entry| (entry.key().clone(), *entry.value()))
			.collect()
	}
}

//! Error types for the SDK connection runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while supervising channels.
#[derive(Debug, Error)]
pub enum Error {
	/// A connection with this channel id is already registered.
	#[error("Channel already registered: {0}")]
	ChannelExists(String),

	/// The channel's host is disabled and needs an explicit re-enable.
	#[error("Host disabled for channel {channel_id}: {host}")]
	HostDisabled { channel_id: String, host: String },

	/// No connection is registered under this channel id.
	#[error("Channel not found: {0}")]
	ChannelNotFound(String),

	/// Transport-level error reported by the relay layer.
	#[error("Transport error: {0}")]
	TransportError(String),

	/// Transport channel closed unexpectedly.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	/// The UI loading presenter failed.
	#[error("Loading presenter error: {0}")]
	Presenter(String),

	/// Invalid configuration.
	#[error("Invalid configuration: {0}")]
	Config(String),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns true if the error came from the transport rather than local state.
	pub fn is_transport(&self) -> bool {
		matches!(self, Error::TransportError(_) | Error::ChannelClosed)
	}
}

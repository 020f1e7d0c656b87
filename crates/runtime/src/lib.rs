//! SDK connection runtime - channel lifecycle, registry, and reconnection policy
//!
//! This crate supervises remote dApp channels relayed to the wallet:
//!
//! - **Connection**: One relay channel plus its local loading events
//! - **Registry**: Process-wide channel map, disabled hosts, loading indicator
//! - **Watcher**: Turns relay lifecycle events into registry side effects
//! - **Transport**: Seam to the relay client, with an in-memory implementation
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   remote events    ┌────────────┐
//! │    relay     ├───────────────────►│ Connection │
//! └──────▲───────┘                    └─────┬──────┘
//!        │ terminate / disconnect           │ handlers installed by
//!        │                                  │ watch_connection()
//! ┌──────┴───────┐  remove_channel     ┌────▼───────┐
//! │   Registry   │◄────────────────────┤  Watcher   │
//! │              │  loading state      │            │
//! └──────────────┘                     └────────────┘
//! ```
//!
//! Connections never call into the registry themselves. The watcher holds a
//! weak [`ChannelSupervisor`] handle, so dropping the registry tears
//! everything down.

pub mod config;
pub mod connection;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod transport;
pub mod watcher;

pub use config::RegistryConfig;
pub use connection::{Connection, RemoteChannel};
pub use error::{Error, Result};
pub use handlers::{EventSurface, HandlerId, Subscription};
pub use registry::{HostLedger, LoadingPresenter, LogPresenter, Registry};
// Re-export protocol types used across the public API
pub use sdkconn_protocol::{
	ConnectionStatus, HostKey, LoadingState, LocalEvent, LocalEventKind, OutboundMessage, RegistryEvent, RemoteEvent,
	RemoteEventKind, RemoveChannelOptions, SDK_REMOTE_ORIGIN,
};
pub use transport::{BoxFuture, ChannelTransport, RelayHandle, RelayTransport, TransportParts};
pub use watcher::{ChannelSupervisor, watch_connection};

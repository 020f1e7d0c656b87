//! Data types for SDK channel supervision.
//!
//! This crate holds the serde-serializable shapes shared between the
//! runtime, the replay tool, and whatever relay or UI layer sits around them:
//!
//! - [`ConnectionStatus`] and [`RemoteEvent`]: what the relay reports
//! - [`LocalEvent`]: what a connection raises about itself
//! - [`RemoveChannelOptions`] and [`LoadingState`]: registry call arguments
//! - [`HostKey`]: identity used by per-host disable tracking
//! - [`RegistryEvent`]: what the registry tells the UI
//!
//! Types here are plain data. Behaviour lives in `sdkconn-runtime`.

pub mod events;
pub mod host;
pub mod options;
pub mod status;

pub use events::*;
pub use host::*;
pub use options::*;
pub use status::*;

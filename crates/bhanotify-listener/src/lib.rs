//! Per-port notification pipeline.
//!
//! This is the layer that turns datagrams into events. Each bound port gets
//! a [`ListenerContext`] holding the session key and that port's duplicate
//! cache; [`PortListener`] drives it from a socket and hands classified
//! events to an [`EventSink`].

pub mod dedup;
pub mod error;
pub mod key;
pub mod listener;
pub mod pipeline;
pub mod sink;

pub use dedup::{DuplicateCache, DEFAULT_WINDOW};
pub use error::{ListenerError, Result};
pub use key::{provision, KeyProvider, StaticKey};
pub use listener::{spawn_all, ListenerHandle, ListenerStats, PortListener};
pub use pipeline::{FrameOutcome, ListenerContext, Notification, PipelineConfig};
pub use sink::EventSink;

/// Notification ports devices broadcast on.
pub const DEFAULT_PORTS: [u16; 2] = [6524, 35344];

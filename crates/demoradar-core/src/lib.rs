//! Extraction, rendering, and streaming for the demoradar bridge.
//!
//! Each poll cycle reads the newest tick table from a [`TickSource`],
//! reduces it to one ordered snapshot with [`normalize`], prints it as a
//! fixed-width table, and forwards it to the radar backend through a
//! reconnecting [`Publisher`].
//!
//! ```text
//! TickSource --> normalize --> render --> terminal
//!                          \-> OutboundPayload --> Publisher --> WebSocket
//! ```
//!
//! Everything runs on one sequential task. The only suspension points are
//! the fixed-delay sleeps and the socket connect/send calls.
//!
//! [`TickSource`]: source::TickSource
//! [`normalize`]: normalize::normalize
//! [`Publisher`]: publish::Publisher

pub mod config;
pub mod normalize;
pub mod poll;
pub mod publish;
pub mod render;
pub mod retry;
pub mod source;
pub mod watch;

// Re-export primary types for convenience.
pub use config::{BridgeConfig, ConfigError, DisplayMode};
pub use normalize::{ConnectivityFilter, NormalizeError, TickSnapshot, normalize};
pub use poll::{CycleOutcome, LoopSettings, PollLoop};
pub use publish::{Connection, Connector, Delivery, Publisher, TransportError, WsConnector};
pub use render::RenderOptions;
pub use retry::FixedDelayRetry;
pub use source::{JsonDumpSource, SourceError, TickSource};

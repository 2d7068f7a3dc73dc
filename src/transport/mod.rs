//! Local display transport
//!
//! The watcher talks to the display process over loopback TCP, one message
//! per connection.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐            ┌──────────────────────────────┐
//! │ watcher (clipqa)         │            │ display (clipqa-display)     │
//! │                          │  CLEAR     │                              │
//! │ TransportClient ─────────┼──QUESTION──┼─► TransportServer            │
//! │  - retry + backoff       │  ANSWER    │    - accept/read/parse       │
//! │  - ConnectionHealth      │  PING      │    - restart with backoff    │
//! │                          │            │    └─► DisplaySink           │
//! └──────────────────────────┘            └──────────────────────────────┘
//! ```
//!
//! # Protocol
//!
//! Plain UTF-8 text, see [`protocol`]. Malformed bytes are replaced on
//! decode; unknown messages are logged and dropped.

pub mod client;
pub mod protocol;
pub mod server;
pub mod sink;

pub use client::{ConnectionHealth, Dialer, TcpDialer, TransportClient};
pub use protocol::{Message, MessageKind};
pub use server::{ServerHandle, ServerPhase, TransportServer};
pub use sink::{DisplaySink, JsonLinesSink};

//! Real-time message channel
//!
//! # Architecture
//!
//! ```text
//! Client ──▶ TCP frame ──▶ inbound mpsc ──▶ MessageHandler ──▶ lifecycles
//!                                                │
//!                              correlated Response to the source session
//!
//! Lifecycles ──▶ EventBroadcaster ──▶ every registered session (global)
//! ```
//!
//! Sessions are registered in the [`SessionRegistry`] behind the
//! [`Connection`] trait, so the handler and broadcaster never care whether
//! a session sits on a TCP socket or an in-process channel.

mod bus;
mod handler;
mod registry;
pub mod tcp_server;
mod transport;

pub use bus::EventBroadcaster;
pub use handler::MessageHandler;
pub use registry::{ChannelConnection, Connection, SessionRegistry};
pub use transport::{read_frame, write_frame, TcpConnection};

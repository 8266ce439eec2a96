//! HTTP server module.
//!
//! The server includes:
//! - A bounded header-read timeout against slow-header clients
//! - Peer address capture for the health metrics middleware
//! - Graceful shutdown on SIGTERM/SIGINT

mod server;
mod shutdown;

pub use server::{start_server, ServerError};

//! Model Context Protocol session handling and JSON-RPC implementations
//!
//! Provides JSON-RPC formatting, the in-session protocol engine, session
//! lifecycle, the session registry and the session-aware request router.

pub mod registry;
pub mod router;
pub mod rpc;
pub mod server;
pub mod session;
pub mod stdio;

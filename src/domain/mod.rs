//! Domain operations exposed over the MCP protocol
//!
//! Provides the vacancy search tools registered with the gateway at startup.

pub mod vacancies;

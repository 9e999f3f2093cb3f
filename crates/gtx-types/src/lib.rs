//! Shared types for the GTX cross-chain order client.
//!
//! This crate holds the order model that is encoded and submitted to the
//! router contracts, the static chain configuration (networks, routers and
//! token tables) the client is parameterized with, and the schema validator
//! used to check configuration files before they are deserialized.

pub mod chains;
pub mod config;
pub mod order;
pub mod validation;

pub use chains::*;
pub use config::*;
pub use order::*;
pub use validation::*;

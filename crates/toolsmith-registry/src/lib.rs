//! Registry, client sync, and lifecycle management for generated servers.
#![doc = include_str!("../README.md")]

pub mod client;
pub mod manager;
pub mod model;
pub mod store;

pub use client::ClientConfigFile;
pub use manager::{RenderedServer, ServerManager, ToolChange};
pub use model::{Registry, ServerEntry, ServerSummary};
pub use store::{RegistryStore, RegistryTxn};

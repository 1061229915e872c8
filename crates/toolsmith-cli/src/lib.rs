//! CLI for Toolsmith.
//!
//! # Key Abstractions
//!
//! - [`ToolsmithCli<C>`]: CLI application parameterized over a config provider
//! - [`ToolsmithConfig`]: the TOML/env-backed configuration

#![doc = include_str!("../README.md")]

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;
pub mod patch_handlers;
pub mod server_handlers;

pub use app::ToolsmithCli;
pub use cli::{CliArgs, Command};
pub use config::ToolsmithConfig;

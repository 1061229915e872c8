//! Source handling for generated Toolsmith servers.
#![doc = include_str!("../README.md")]

pub mod lookup;
pub mod patcher;
pub mod spec;
pub mod template;

pub use lookup::{DeclaredTool, find_tool, find_tools};
pub use patcher::{SourcePatcher, merge};
pub use spec::{ParamSpec, ToolSpec};
pub use template::{render_server, render_server_skeleton, render_tool};

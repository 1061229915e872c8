//! CLI argument parsing and command definitions.

use clap::{Parser, Subcommand};

// ============================================================================
// CLI argument types
// ============================================================================

/// Top-level CLI arguments for `toolsmith`.
#[derive(Parser, Debug)]
#[command(name = "toolsmith", author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "TOOLSMITH_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the MCP server on stdin/stdout.
    Serve,

    /// Print version information.
    Version,

    /// Check that the registry and servers directory are usable.
    Health,

    /// Configuration operations.
    Config(ConfigCommand),

    /// Manage generated servers.
    Server(ServerCommand),

    /// Manage the tools of a generated server.
    Tool(ToolCommand),

    /// Merge a source fragment into an existing file.
    Patch {
        /// File to merge into.
        existing: String,

        /// File holding the fragment.
        fragment: String,

        /// Write the result back to the existing file instead of stdout.
        #[arg(long)]
        in_place: bool,
    },
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Get a configuration value by dotted key.
    Get {
        /// Dotted key (e.g., "servers.dir").
        key: String,
    },

    /// Set a configuration value by dotted key.
    Set {
        /// Dotted key (e.g., "servers.dir").
        key: String,

        /// Value to set.
        value: String,
    },

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },

    /// Export configuration as environment variables.
    Export {
        /// Format as Docker --env flags.
        #[arg(long)]
        docker_env: bool,
    },
}

#[derive(Parser, Debug)]
pub struct ServerCommand {
    #[command(subcommand)]
    pub command: ServerAction,
}

#[derive(Subcommand, Debug)]
pub enum ServerAction {
    /// Scaffold a new server and record it in the registry.
    Create {
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// List registered servers.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Delete a server's directory and registry entry.
    Remove { name: String },

    /// Regenerate a server's entry file from its recorded tools.
    Render {
        name: String,

        /// Overwrite the entry file instead of printing the source.
        #[arg(long)]
        write: bool,
    },
}

#[derive(Parser, Debug)]
pub struct ToolCommand {
    #[command(subcommand)]
    pub command: ToolAction,
}

#[derive(Subcommand, Debug)]
pub enum ToolAction {
    /// List the tools declared in a server's entry file.
    List {
        server: String,

        /// Print JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Generate a tool and merge it into a server.
    Add {
        server: String,

        /// Tool function name (snake_case).
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Parameter as `name:type[:description]`; repeatable.
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Python statements for the function body.
        #[arg(long)]
        body: Option<String>,
    },

    /// Delete a tool from a server.
    Remove { server: String, name: String },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_args_default() {
        let args = CliArgs::parse_from(["toolsmith"]);
        assert!(!args.verbose);
        assert!(!args.quiet);
        assert!(args.command.is_none());
    }

    #[test]
    fn test_cli_args_flags() {
        let args = CliArgs::parse_from(["toolsmith", "-v", "--config", "/tmp/c.toml", "serve"]);
        assert!(args.verbose);
        assert_eq!(args.config.as_deref(), Some("/tmp/c.toml"));
        assert!(matches!(args.command, Some(Command::Serve)));
    }

    #[test]
    fn test_config_set_command() {
        let args = CliArgs::parse_from(["toolsmith", "config", "set", "servers.dir", "/srv"]);
        match args.command {
            Some(Command::Config(cmd)) => match cmd.command {
                ConfigAction::Set { key, value } => {
                    assert_eq!(key, "servers.dir");
                    assert_eq!(value, "/srv");
                }
                other => panic!("Expected Set, got {other:?}"),
            },
            other => panic!("Expected Config command, got {other:?}"),
        }
    }

    #[test]
    fn test_server_create_command() {
        let args = CliArgs::parse_from(["toolsmith", "server", "create", "Demo", "-d", "A demo"]);
        match args.command {
            Some(Command::Server(cmd)) => match cmd.command {
                ServerAction::Create { name, description } => {
                    assert_eq!(name, "Demo");
                    assert_eq!(description, "A demo");
                }
                other => panic!("Expected Create, got {other:?}"),
            },
            other => panic!("Expected Server command, got {other:?}"),
        }
    }

    #[test]
    fn test_server_render_command() {
        let args = CliArgs::parse_from(["toolsmith", "server", "render", "Demo", "--write"]);
        match args.command {
            Some(Command::Server(cmd)) => {
                assert!(matches!(cmd.command, ServerAction::Render { write: true, .. }))
            }
            other => panic!("Expected Server command, got {other:?}"),
        }
    }

    #[test]
    fn test_tool_add_command_with_params() {
        let args = CliArgs::parse_from([
            "toolsmith",
            "tool",
            "add",
            "Demo",
            "add",
            "--description",
            "Add two numbers",
            "--param",
            "a:number:First",
            "-p",
            "b:number",
        ]);
        match args.command {
            Some(Command::Tool(cmd)) => match cmd.command {
                ToolAction::Add {
                    server,
                    name,
                    params,
                    body,
                    ..
                } => {
                    assert_eq!(server, "Demo");
                    assert_eq!(name, "add");
                    assert_eq!(params, vec!["a:number:First", "b:number"]);
                    assert!(body.is_none());
                }
                other => panic!("Expected Add, got {other:?}"),
            },
            other => panic!("Expected Tool command, got {other:?}"),
        }
    }

    #[test]
    fn test_patch_command() {
        let args = CliArgs::parse_from(["toolsmith", "patch", "a.py", "b.py", "--in-place"]);
        match args.command {
            Some(Command::Patch {
                existing,
                fragment,
                in_place,
            }) => {
                assert_eq!(existing, "a.py");
                assert_eq!(fragment, "b.py");
                assert!(in_place);
            }
            other => panic!("Expected Patch command, got {other:?}"),
        }
    }
}

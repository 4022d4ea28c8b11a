use std::path::PathBuf;

use clap::Parser;

/// MCP server exposing platform actors over HTTP/SSE.
///
/// Runs in standby mode when started with standby origin metadata, as a one-shot
/// debug run when the input names a debug actor, and as a full MCP server otherwise.
#[derive(Parser, Debug)]
#[command(name = "actors-mcp-server", version, about, long_about = None)]
pub struct Cli {
    /// Read the raw input JSON from this file instead of the platform input record
    #[arg(long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Listen port for local runs (overrides PORT; ignored on the platform)
    #[arg(long)]
    pub port: Option<u16>,
}

use std::sync::Arc;

use actors_mcp_server::actors::{ActorClient, ApifyClient};
use actors_mcp_server::bootstrap::{Bootstrap, EXIT_SUCCESS, Outcome, ShutdownHook};
use actors_mcp_server::cli::Cli;
use actors_mcp_server::config::{Env, PlatformEnv};
use actors_mcp_server::log::{EventLog, TracingLog};
use actors_mcp_server::mcp::SseServerFactory;
use actors_mcp_server::platform::platform_for;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let env = PlatformEnv::from_env(&Env::from_process());
    let platform = platform_for(&env)?;
    let client: Arc<dyn ActorClient> = Arc::new(ApifyClient::new(env.api_base.clone())?);
    let log: Arc<dyn EventLog> = Arc::new(TracingLog);
    // Only used after the dispatcher has checked that the token is present.
    let factory = SseServerFactory::new(client.clone(), env.token.clone().unwrap_or_default());
    let shutdown = ShutdownHook::new(platform.clone(), log.clone());

    let bootstrap = Bootstrap {
        env,
        port_override: cli.port,
        input_path: cli.input,
        platform,
        client,
        factory,
        log,
        shutdown: shutdown.clone(),
    };

    match bootstrap.run().await? {
        Outcome::Exit(code) => Ok(code),
        Outcome::Listening(server) => {
            shutdown.done().cancelled().await;
            server.cancel();
            Ok(EXIT_SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => std::process::ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::ExitCode::from(1)
        }
    }
}

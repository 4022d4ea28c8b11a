//! Startup dispatcher: reads the run configuration and picks the run mode.
//!
//! Decisions are plain values ([`Step`], [`Mode`], [`Outcome`]); the process
//! exit itself happens only in `main`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::actors::{ActorClient, CallOptions};
use crate::config::{PlatformEnv, RunConfiguration, resolve_binding};
use crate::error::ActorMcpError;
use crate::input::{
    Input, load_input_file, process_input, server_actor_list, standby_actor_list,
};
use crate::log::EventLog;
use crate::mcp::{Listen, ServerFactory, ServerOptions};
use crate::platform::Platform;

mod shutdown;

pub use shutdown::ShutdownHook;

pub const EXIT_MISSING_TOKEN: u8 = 1;
pub const EXIT_SUCCESS: u8 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T> {
    Continue(T),
    Terminate(u8),
}

/// What the process should run after input normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Standby(ServerOptions),
    Debug {
        actor: String,
        input: Value,
        options: CallOptions,
    },
    Server(ServerOptions),
}

#[derive(Debug)]
pub enum Outcome {
    /// Terminate with this exit code.
    Exit(u8),
    /// A server is listening; cancel the token to stop it.
    Listening(CancellationToken),
}

pub fn check_credentials(env: &PlatformEnv) -> Step<String> {
    match env.token.as_deref() {
        Some(token) => Step::Continue(token.to_string()),
        None => Step::Terminate(EXIT_MISSING_TOKEN),
    }
}

pub fn select_mode(is_standby: bool, input: &Input) -> Mode {
    if is_standby {
        return Mode::Standby(ServerOptions {
            enable_adding_actors: input.enable_adding_actors,
            enable_default_actors: false,
            actors: standby_actor_list(input.actors.as_ref()),
        });
    }

    if let Some((actor, payload)) = input.debug_target() {
        return Mode::Debug {
            actor: actor.to_string(),
            input: payload.clone(),
            options: CallOptions {
                memory: input.max_actor_memory_bytes,
                ..CallOptions::default()
            },
        };
    }

    Mode::Server(ServerOptions {
        enable_adding_actors: input.enable_adding_actors,
        enable_default_actors: true,
        actors: server_actor_list(input.actors.as_ref()),
    })
}

pub struct Bootstrap<F: ServerFactory> {
    pub env: PlatformEnv,
    pub port_override: Option<u16>,
    /// JSON file read instead of the platform input record.
    pub input_path: Option<PathBuf>,
    pub platform: Arc<dyn Platform>,
    pub client: Arc<dyn ActorClient>,
    pub factory: F,
    pub log: Arc<dyn EventLog>,
    pub shutdown: Arc<ShutdownHook>,
}

impl<F: ServerFactory> Bootstrap<F> {
    /// Runs the startup sequence up to a listening server or an exit decision.
    ///
    /// # Errors
    ///
    /// Failures of platform calls, input normalization, server startup, or the
    /// debug actor call are returned unchanged.
    pub async fn run(&self) -> Result<Outcome, ActorMcpError> {
        self.platform.init().await?;

        let is_standby = self.env.is_standby();

        let token = match check_credentials(&self.env) {
            Step::Continue(token) => token,
            Step::Terminate(code) => {
                self.log.error(
                    "APIFY_TOKEN is required but not set in the environment variables.",
                    &[],
                );
                return Ok(Outcome::Exit(code));
            }
        };

        let raw = match &self.input_path {
            Some(path) => load_input_file(path).await?,
            None => self.platform.get_input().await?.unwrap_or(Value::Null),
        };
        let input = process_input(raw)?;
        self.log
            .info("Loaded input", &[("input", serde_json::to_string(&input)?)]);

        let outcome = self.dispatch(is_standby, input, &token).await;
        self.shutdown.register();
        outcome
    }

    async fn dispatch(
        &self,
        is_standby: bool,
        input: Input,
        token: &str,
    ) -> Result<Outcome, ActorMcpError> {
        match select_mode(is_standby, &input) {
            Mode::Standby(options) => {
                self.log.info("Actor is running in the STANDBY mode.", &[]);
                let config = self.run_configuration(is_standby, input)?;
                self.serve(&config, options, "Actor web server listening")
                    .await
            }
            Mode::Debug {
                actor,
                input,
                options,
            } => {
                self.log.info(
                    "Running in debug mode with specific actor",
                    &[("actor", actor.clone())],
                );
                let result = self
                    .client
                    .call_actor_get_dataset(&actor, &input, token, &options)
                    .await?;
                self.platform.push_data(&result.items).await?;
                self.log.info(
                    "Pushed items to dataset",
                    &[("itemCount", result.count().to_string())],
                );
                self.platform.exit().await?;
                Ok(Outcome::Exit(EXIT_SUCCESS))
            }
            Mode::Server(options) => {
                self.log
                    .info("No debug actor specified, starting in MCP server mode", &[]);
                let config = self.run_configuration(is_standby, input)?;
                self.serve(&config, options, "MCP server listening").await
            }
        }
    }

    /// Host/port are only needed by the server branches, so the standby
    /// variables are resolved here rather than at startup.
    fn run_configuration(
        &self,
        is_standby: bool,
        input: Input,
    ) -> Result<RunConfiguration, ActorMcpError> {
        let binding = resolve_binding(&self.env, self.port_override)?;
        Ok(RunConfiguration {
            is_standby,
            host: binding.host,
            port: binding.port,
            input,
        })
    }

    async fn serve(
        &self,
        config: &RunConfiguration,
        options: ServerOptions,
        ready_msg: &'static str,
    ) -> Result<Outcome, ActorMcpError> {
        let server = self.factory.build(&config.host, options)?;

        let log = Arc::clone(&self.log);
        let host = config.host.clone();
        let port = config.port;
        let ct = server
            .listen(
                port,
                Box::new(move |_bound: SocketAddr| {
                    log.info(ready_msg, &[("host", host), ("port", port.to_string())]);
                }),
            )
            .await?;
        Ok(Outcome::Listening(ct))
    }
}

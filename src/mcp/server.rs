use std::sync::{Arc, RwLock};

use rmcp::model::{Implementation, ServerCapabilities, ServerInfo};
use rmcp::{ServerHandler, tool};
use serde_json::Value;

use super::ServerOptions;
use crate::actors::{ActorClient, CallOptions};

/// Actors preloaded when default actors are enabled.
pub const DEFAULT_ACTORS: &[&str] = &["apify/rag-web-browser"];

const MAX_ACTOR_ID_LEN: usize = 256;

#[derive(Clone)]
pub struct ActorsMcpServer {
    actors: Arc<RwLock<Vec<String>>>,
    enable_adding_actors: bool,
    public_host: String,
    client: Arc<dyn ActorClient>,
    token: String,
}

impl std::fmt::Debug for ActorsMcpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorsMcpServer")
            .field("actors", &self.loaded_actors())
            .field("enable_adding_actors", &self.enable_adding_actors)
            .field("public_host", &self.public_host)
            .finish_non_exhaustive()
    }
}

fn validate_actor_id(actor: &str) -> Result<&str, String> {
    let actor = actor.trim();
    if actor.is_empty() {
        return Err("Error: actor id is required".to_string());
    }
    if actor.len() > MAX_ACTOR_ID_LEN || actor.chars().any(char::is_whitespace) {
        return Err(format!("Error: invalid actor id: {actor}"));
    }
    Ok(actor)
}

impl ActorsMcpServer {
    pub fn new(
        public_host: &str,
        options: &ServerOptions,
        client: Arc<dyn ActorClient>,
        token: String,
    ) -> Self {
        let mut actors: Vec<String> = Vec::new();
        if options.enable_default_actors {
            actors.extend(DEFAULT_ACTORS.iter().map(|s| s.to_string()));
        }
        for actor in &options.actors {
            if !actors.contains(actor) {
                actors.push(actor.clone());
            }
        }

        Self {
            actors: Arc::new(RwLock::new(actors)),
            enable_adding_actors: options.enable_adding_actors,
            public_host: public_host.to_string(),
            client,
            token,
        }
    }

    pub fn loaded_actors(&self) -> Vec<String> {
        self.actors.read().map(|a| a.clone()).unwrap_or_default()
    }

    fn is_loaded(&self, actor: &str) -> bool {
        self.actors
            .read()
            .map(|a| a.iter().any(|loaded| loaded == actor))
            .unwrap_or(false)
    }

    /// Returns `Ok(true)` when the actor was newly added.
    fn try_add_actor(&self, actor: &str) -> Result<bool, String> {
        if !self.enable_adding_actors {
            return Err("Error: adding actors is disabled for this server".to_string());
        }
        let actor = validate_actor_id(actor)?;
        let mut actors = self
            .actors
            .write()
            .map_err(|_| "Error: actor registry is unavailable".to_string())?;
        if actors.iter().any(|loaded| loaded == actor) {
            return Ok(false);
        }
        actors.push(actor.to_string());
        Ok(true)
    }

    async fn run_actor(&self, actor: &str, input: &str) -> Result<String, String> {
        let actor = validate_actor_id(actor)?;
        if !self.is_loaded(actor) {
            return Err(format!(
                "Error: actor {actor} is not loaded. Use add_actor first."
            ));
        }
        let input: Value = if input.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(input).map_err(|e| format!("Error: input is not valid JSON: {e}"))?
        };

        let result = self
            .client
            .call_actor_get_dataset(actor, &input, &self.token, &CallOptions::default())
            .await
            .map_err(|e| format!("Error: {e}"))?;
        tracing::info!(actor, run_id = %result.run_id, items = result.count(), "Actor call finished");
        serde_json::to_string(&result.items).map_err(|e| format!("Error: {e}"))
    }
}

#[tool(tool_box)]
impl ActorsMcpServer {
    #[tool(description = "List the actors currently available through this server.")]
    async fn get_actors(&self) -> String {
        self.loaded_actors().join("\n")
    }

    #[tool(
        description = "Make an actor available to call_actor. The id has the form `username/actor-name`."
    )]
    async fn add_actor(&self, #[tool(param)] actor: String) -> Result<String, String> {
        match self.try_add_actor(&actor)? {
            true => Ok(format!("Added actor {}", actor.trim())),
            false => Ok(format!("Actor {} is already loaded", actor.trim())),
        }
    }

    #[tool(
        description = "Run a loaded actor with a JSON input object and return the items of its default dataset as JSON."
    )]
    async fn call_actor(
        &self,
        #[tool(param)] actor: String,
        #[tool(param)] input: String,
    ) -> Result<String, String> {
        self.run_actor(&actor, &input).await
    }
}

#[tool(tool_box)]
impl ServerHandler for ActorsMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "actors-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(format!(
                "Runs platform actors as tools (served from {}). \
                 Use `get_actors` to see what is loaded, `add_actor` to load more when enabled, \
                 and `call_actor` to run one and read its dataset items.",
                self.public_host
            )),
            ..Default::default()
        }
    }
}

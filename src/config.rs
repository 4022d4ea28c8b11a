//! Environment snapshot, platform metadata, and network binding resolution.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::ActorMcpError;
use crate::input::Input;

pub const DEFAULT_API_BASE: &str = "https://api.apify.com";
pub const DEFAULT_LOCAL_PORT: u16 = 3001;
pub const WILDCARD_HOST: &str = "0.0.0.0";
pub const STANDBY_ORIGIN: &str = "STANDBY";
const DEFAULT_INPUT_KEY: &str = "INPUT";
const DEFAULT_STORAGE_DIR: &str = "./storage";

/// Snapshot of the process environment taken once at startup.
#[derive(Debug, Clone, Default)]
pub struct Env {
    vars: HashMap<String, String>,
}

impl Env {
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the trimmed value, treating blank values as unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    fn first_of(&self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|n| self.get(n)).map(str::to_string)
    }
}

/// Platform metadata derived from the environment.
#[derive(Debug, Clone)]
pub struct PlatformEnv {
    pub is_at_home: bool,
    pub meta_origin: Option<String>,
    pub token: Option<String>,
    pub api_base: String,
    pub default_dataset_id: Option<String>,
    pub default_key_value_store_id: Option<String>,
    pub input_key: String,
    pub storage_dir: PathBuf,
    pub standby_url: Option<String>,
    pub standby_port: Option<String>,
    pub port: Option<String>,
}

impl PlatformEnv {
    pub fn from_env(env: &Env) -> Self {
        let is_at_home = env
            .get("APIFY_IS_AT_HOME")
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

        Self {
            is_at_home,
            meta_origin: env.first_of(&["APIFY_META_ORIGIN", "ACTOR_META_ORIGIN"]),
            token: env.first_of(&["APIFY_TOKEN"]),
            api_base: env
                .first_of(&["APIFY_API_BASE_URL"])
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            default_dataset_id: env
                .first_of(&["ACTOR_DEFAULT_DATASET_ID", "APIFY_DEFAULT_DATASET_ID"]),
            default_key_value_store_id: env.first_of(&[
                "ACTOR_DEFAULT_KEY_VALUE_STORE_ID",
                "APIFY_DEFAULT_KEY_VALUE_STORE_ID",
            ]),
            input_key: env
                .first_of(&["ACTOR_INPUT_KEY", "APIFY_INPUT_KEY"])
                .unwrap_or_else(|| DEFAULT_INPUT_KEY.to_string()),
            storage_dir: env
                .first_of(&["CRAWLEE_STORAGE_DIR", "APIFY_LOCAL_STORAGE_DIR"])
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR)),
            standby_url: env.first_of(&["ACTOR_STANDBY_URL"]),
            standby_port: env.first_of(&["ACTOR_STANDBY_PORT"]),
            port: env.first_of(&["PORT"]),
        }
    }

    pub fn is_standby(&self) -> bool {
        self.meta_origin.as_deref() == Some(STANDBY_ORIGIN)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub host: String,
    pub port: u16,
}

/// Resolves the host/port the server listens on.
///
/// At home both values come from the standby variables. Locally the host is
/// the wildcard address and the port is `port_override`, then `PORT`, then
/// [`DEFAULT_LOCAL_PORT`].
///
/// # Errors
///
/// Returns [`ActorMcpError::InvalidConfig`] when a required variable is
/// missing or a port does not parse.
pub fn resolve_binding(
    env: &PlatformEnv,
    port_override: Option<u16>,
) -> Result<Binding, ActorMcpError> {
    if env.is_at_home {
        let host = env
            .standby_url
            .clone()
            .ok_or_else(|| ActorMcpError::InvalidConfig {
                var: "ACTOR_STANDBY_URL".into(),
                reason: "is not set".into(),
            })?;
        let port = parse_port("ACTOR_STANDBY_PORT", env.standby_port.as_deref())?;
        return Ok(Binding { host, port });
    }

    let port = match (port_override, env.port.as_deref()) {
        (Some(port), _) => port,
        (None, Some(raw)) => parse_port("PORT", Some(raw))?,
        (None, None) => DEFAULT_LOCAL_PORT,
    };
    Ok(Binding {
        host: WILDCARD_HOST.to_string(),
        port,
    })
}

fn parse_port(var: &str, raw: Option<&str>) -> Result<u16, ActorMcpError> {
    let raw = raw.ok_or_else(|| ActorMcpError::InvalidConfig {
        var: var.into(),
        reason: "is not set".into(),
    })?;
    raw.parse::<u16>().map_err(|_| ActorMcpError::InvalidConfig {
        var: var.into(),
        reason: format!("is not a valid port: {raw}"),
    })
}

/// Startup configuration, derived once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    pub is_standby: bool,
    pub host: String,
    pub port: u16,
    pub input: Input,
}

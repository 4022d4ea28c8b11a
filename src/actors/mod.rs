//! Remote actor invocation.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ActorMcpError;

mod apify;

pub use apify::ApifyClient;

/// Per-call run options forwarded to the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOptions {
    pub memory: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub build: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CallResult {
    pub run_id: String,
    pub dataset_id: String,
    pub items: Vec<Value>,
}

impl CallResult {
    pub fn count(&self) -> usize {
        self.items.len()
    }
}

#[async_trait]
pub trait ActorClient: Send + Sync {
    /// Runs `actor_id` to completion and returns its default dataset items.
    async fn call_actor_get_dataset(
        &self,
        actor_id: &str,
        input: &Value,
        token: &str,
        options: &CallOptions,
    ) -> Result<CallResult, ActorMcpError>;
}

/// Converts `user/name` to the `user~name` form used in API paths.
pub(crate) fn actor_path_id(actor_id: &str) -> String {
    actor_id.trim().replace('/', "~")
}

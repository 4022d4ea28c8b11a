//! Platform runtime: input retrieval, dataset output, and lifecycle.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::PlatformEnv;
use crate::error::ActorMcpError;

mod apify;
mod local;

pub use apify::ApifyPlatform;
pub use local::LocalPlatform;

#[async_trait]
pub trait Platform: Send + Sync {
    /// Startup handshake. Calling it again is a no-op.
    async fn init(&self) -> Result<(), ActorMcpError>;

    /// Raw input record, `None` when no input was provided.
    async fn get_input(&self) -> Result<Option<Value>, ActorMcpError>;

    /// Appends items to the default output dataset.
    async fn push_data(&self, items: &[Value]) -> Result<(), ActorMcpError>;

    /// Graceful teardown. Only the first call has an effect.
    async fn exit(&self) -> Result<(), ActorMcpError>;
}

/// Selects the platform backend for the current environment.
pub fn platform_for(env: &PlatformEnv) -> Result<Arc<dyn Platform>, ActorMcpError> {
    if env.is_at_home {
        Ok(Arc::new(ApifyPlatform::new(env)?))
    } else {
        Ok(Arc::new(LocalPlatform::new(env)))
    }
}

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use super::Platform;
use crate::config::PlatformEnv;
use crate::error::ActorMcpError;

const KEY_VALUE_STORES_API: &str = "key-value-stores";
const DATASETS_API: &str = "datasets";
/// Request body cap of the dataset items endpoint, with headroom.
const MAX_PAYLOAD_BYTES: usize = 9 * 1024 * 1024;

/// Platform backend that talks to the hosted API.
pub struct ApifyPlatform {
    client: reqwest_middleware::ClientWithMiddleware,
    plain: reqwest::Client,
    base: String,
    token: Option<String>,
    key_value_store_id: Option<String>,
    dataset_id: Option<String>,
    input_key: String,
    max_payload_bytes: usize,
    initialized: AtomicBool,
    exited: AtomicBool,
}

impl ApifyPlatform {
    pub fn new(env: &PlatformEnv) -> Result<Self, ActorMcpError> {
        Ok(Self {
            client: crate::http::shared_client()?,
            plain: crate::http::plain_client()?,
            base: env.api_base.clone(),
            token: env.token.clone(),
            key_value_store_id: env.default_key_value_store_id.clone(),
            dataset_id: env.default_dataset_id.clone(),
            input_key: env.input_key.clone(),
            max_payload_bytes: MAX_PAYLOAD_BYTES,
            initialized: AtomicBool::new(false),
            exited: AtomicBool::new(false),
        })
    }

    fn require<'a>(value: &'a Option<String>, var: &str) -> Result<&'a str, ActorMcpError> {
        value.as_deref().ok_or_else(|| ActorMcpError::InvalidConfig {
            var: var.to_string(),
            reason: "is not set".into(),
        })
    }

    #[cfg(test)]
    fn with_max_payload_bytes(mut self, max_payload_bytes: usize) -> Self {
        self.max_payload_bytes = max_payload_bytes;
        self
    }

    fn authorize(
        &self,
        req: reqwest_middleware::RequestBuilder,
    ) -> reqwest_middleware::RequestBuilder {
        match self.token.as_deref() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

#[async_trait]
impl Platform for ApifyPlatform {
    async fn init(&self) -> Result<(), ActorMcpError> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!(api = %self.base, "Initializing actor on the platform");
        Ok(())
    }

    async fn get_input(&self) -> Result<Option<Value>, ActorMcpError> {
        let store = Self::require(&self.key_value_store_id, "ACTOR_DEFAULT_KEY_VALUE_STORE_ID")?;
        let url = crate::http::endpoint(
            &self.base,
            &format!("v2/key-value-stores/{store}/records/{}", self.input_key),
        );
        let resp = self.authorize(self.client.get(&url)).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(store, key = %self.input_key, "No input record");
            return Ok(None);
        }
        let value: Value = crate::http::decode_json(resp, KEY_VALUE_STORES_API).await?;
        Ok(Some(value))
    }

    async fn push_data(&self, items: &[Value]) -> Result<(), ActorMcpError> {
        if items.is_empty() {
            return Ok(());
        }
        let dataset = Self::require(&self.dataset_id, "ACTOR_DEFAULT_DATASET_ID")?;
        let url = crate::http::endpoint(&self.base, &format!("v2/datasets/{dataset}/items"));

        for body in batch_payloads(items, self.max_payload_bytes)? {
            let mut req = self
                .plain
                .post(&url)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
            if let Some(token) = self.token.as_deref() {
                req = req.bearer_auth(token);
            }
            let resp = req.send().await?;
            crate::http::expect_success(resp, DATASETS_API).await?;
        }
        Ok(())
    }

    async fn exit(&self) -> Result<(), ActorMcpError> {
        if self.exited.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!("Exiting actor");
        Ok(())
    }
}

/// Serializes items into JSON array bodies no larger than `max_bytes`.
fn batch_payloads(items: &[Value], max_bytes: usize) -> Result<Vec<Vec<u8>>, ActorMcpError> {
    let mut batches = Vec::new();
    let mut current: Vec<u8> = Vec::new();

    for item in items {
        let encoded = serde_json::to_vec(item)?;
        // "[" + item + "]"
        if encoded.len() + 2 > max_bytes {
            return Err(ActorMcpError::Api {
                api: DATASETS_API.to_string(),
                message: format!(
                    "Dataset item of {} bytes exceeds the {max_bytes} byte request limit",
                    encoded.len()
                ),
            });
        }
        // current already holds "[..." without the closing bracket.
        if !current.is_empty() && current.len() + 1 + encoded.len() + 1 > max_bytes {
            current.push(b']');
            batches.push(std::mem::take(&mut current));
        }
        current.push(if current.is_empty() { b'[' } else { b',' });
        current.extend_from_slice(&encoded);
    }

    if !current.is_empty() {
        current.push(b']');
        batches.push(current);
    }
    Ok(batches)
}

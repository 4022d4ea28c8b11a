//! Shared HTTP clients and response helpers for platform API calls.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;

use crate::error::ActorMcpError;

const ERROR_BODY_MAX_BYTES: usize = 2048;
pub(crate) const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;
const USER_AGENT: &str = concat!("actors-mcp-server/", env!("CARGO_PKG_VERSION"));

static HTTP_CLIENT: OnceLock<ClientWithMiddleware> = OnceLock::new();
static PLAIN_HTTP_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

fn base_client() -> Result<reqwest::Client, ActorMcpError> {
    // Run polling uses waitForFinish=60, so the timeout must outlast it.
    reqwest::Client::builder()
        .timeout(Duration::from_secs(90))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(USER_AGENT)
        .build()
        .map_err(ActorMcpError::HttpClientInit)
}

/// Returns a shared HTTP client that retries transient failures.
///
/// Only idempotent requests go through this client; see [`plain_client`].
pub(crate) fn shared_client() -> Result<ClientWithMiddleware, ActorMcpError> {
    if let Some(client) = HTTP_CLIENT.get() {
        return Ok(client.clone());
    }

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
    let client = ClientBuilder::new(base_client()?)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build();

    match HTTP_CLIENT.set(client.clone()) {
        Ok(()) => Ok(client),
        Err(_) => HTTP_CLIENT.get().cloned().ok_or_else(|| ActorMcpError::Api {
            api: "http-client".into(),
            message: "Shared HTTP client initialization race".into(),
        }),
    }
}

/// Returns a shared HTTP client without retries.
///
/// Starting a run or pushing items is not idempotent, so those requests must
/// not be replayed by middleware.
pub(crate) fn plain_client() -> Result<reqwest::Client, ActorMcpError> {
    if let Some(client) = PLAIN_HTTP_CLIENT.get() {
        return Ok(client.clone());
    }

    let client = base_client()?;
    match PLAIN_HTTP_CLIENT.set(client.clone()) {
        Ok(()) => Ok(client),
        Err(_) => PLAIN_HTTP_CLIENT
            .get()
            .cloned()
            .ok_or_else(|| ActorMcpError::Api {
                api: "http-client".into(),
                message: "Plain HTTP client initialization race".into(),
            }),
    }
}

pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

pub(crate) fn body_excerpt(bytes: &[u8]) -> String {
    let full = String::from_utf8_lossy(bytes);

    let truncated: &str = if full.len() > ERROR_BODY_MAX_BYTES {
        let mut end = ERROR_BODY_MAX_BYTES;
        while end > 0 && !full.is_char_boundary(end) {
            end -= 1;
        }
        &full[..end]
    } else {
        full.as_ref()
    };

    let mut s = truncated.trim().replace(['\n', '\r', '\t'], " ");
    if full.len() > ERROR_BODY_MAX_BYTES {
        s.push_str(" …");
    }
    s
}

pub(crate) async fn read_limited_body(
    mut resp: reqwest::Response,
    api: &str,
) -> Result<Vec<u8>, ActorMcpError> {
    let mut body: Vec<u8> = Vec::new();

    while let Some(chunk) = resp.chunk().await? {
        let next_len = body.len().saturating_add(chunk.len());
        if next_len > DEFAULT_MAX_BODY_BYTES {
            return Err(ActorMcpError::Api {
                api: api.to_string(),
                message: format!("Response body exceeded {DEFAULT_MAX_BODY_BYTES} bytes"),
            });
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}

/// Reads the body, maps non-2xx statuses to [`ActorMcpError::Api`], and
/// decodes JSON.
pub(crate) async fn decode_json<T: DeserializeOwned>(
    resp: reqwest::Response,
    api: &str,
) -> Result<T, ActorMcpError> {
    let status = resp.status();
    let bytes = read_limited_body(resp, api).await?;
    if !status.is_success() {
        return Err(ActorMcpError::Api {
            api: api.to_string(),
            message: format!("HTTP {status}: {}", body_excerpt(&bytes)),
        });
    }
    serde_json::from_slice(&bytes).map_err(|source| ActorMcpError::ApiJson {
        api: api.to_string(),
        source,
    })
}

/// Like [`decode_json`] but discards a successful body.
pub(crate) async fn expect_success(resp: reqwest::Response, api: &str) -> Result<(), ActorMcpError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let bytes = read_limited_body(resp, api).await?;
    Err(ActorMcpError::Api {
        api: api.to_string(),
        message: format!("HTTP {status}: {}", body_excerpt(&bytes)),
    })
}

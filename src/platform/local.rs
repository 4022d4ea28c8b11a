use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::Platform;
use crate::config::PlatformEnv;
use crate::error::ActorMcpError;

const DEFAULT_STORE: &str = "default";

/// Platform backend for local runs, backed by the storage directory layout:
/// `key_value_stores/default/<key>.json` and `datasets/default/<index>.json`.
pub struct LocalPlatform {
    storage_dir: PathBuf,
    input_key: String,
    // Serializes index allocation for dataset items.
    push_lock: Mutex<()>,
    initialized: AtomicBool,
    exited: AtomicBool,
}

impl LocalPlatform {
    pub fn new(env: &PlatformEnv) -> Self {
        Self {
            storage_dir: env.storage_dir.clone(),
            input_key: env.input_key.clone(),
            push_lock: Mutex::new(()),
            initialized: AtomicBool::new(false),
            exited: AtomicBool::new(false),
        }
    }

    fn key_value_store_dir(&self) -> PathBuf {
        self.storage_dir.join("key_value_stores").join(DEFAULT_STORE)
    }

    fn dataset_dir(&self) -> PathBuf {
        self.storage_dir.join("datasets").join(DEFAULT_STORE)
    }
}

async fn highest_item_index(dir: &Path) -> Result<u64, ActorMcpError> {
    let mut highest = 0;
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(err.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let index = name
            .to_str()
            .and_then(|n| n.strip_suffix(".json"))
            .and_then(|stem| stem.parse::<u64>().ok());
        if let Some(index) = index {
            highest = highest.max(index);
        }
    }
    Ok(highest)
}

#[async_trait]
impl Platform for LocalPlatform {
    async fn init(&self) -> Result<(), ActorMcpError> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        tokio::fs::create_dir_all(self.key_value_store_dir()).await?;
        tokio::fs::create_dir_all(self.dataset_dir()).await?;
        info!(storage = %self.storage_dir.display(), "Initializing actor with local storage");
        Ok(())
    }

    async fn get_input(&self) -> Result<Option<Value>, ActorMcpError> {
        let path = self
            .key_value_store_dir()
            .join(format!("{}.json", self.input_key));
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No input record");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn push_data(&self, items: &[Value]) -> Result<(), ActorMcpError> {
        let _guard = self.push_lock.lock().await;
        let dir = self.dataset_dir();
        tokio::fs::create_dir_all(&dir).await?;

        let mut index = highest_item_index(&dir).await?;
        for item in items {
            index += 1;
            let path = dir.join(format!("{index:09}.json"));
            tokio::fs::write(&path, serde_json::to_vec_pretty(item)?).await?;
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

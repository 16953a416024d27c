use std::{collections::HashMap, io::ErrorKind, path::PathBuf};

use anyhow::{anyhow, Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Visually unambiguous token alphabet: no I/O/0/1.
const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const TOKEN_LENGTH: usize = 8;
const MAX_TOKEN_ATTEMPTS: usize = 256;

/// A suspected-spam submission waiting for a manual accept/reject decision,
/// exactly the fields the mailer needs to relay it later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldRecord {
    pub from_display: String,
    pub reply_to: String,
    pub subject: String,
    pub body: String,
}

/// Durable hold queue, keyed by action token. The whole store is one JSON
/// file, rewritten via write-then-rename on every mutation; a missing file is
/// an empty store. The mutex serializes mutations so the in-memory map and
/// the file cannot diverge mid-write, and a failed write rolls the in-memory
/// change back.
pub struct HeldStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, HeldRecord>>,
}

impl HeldStore {
    pub async fn open(path: PathBuf) -> Result<Self> {
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("failed to parse held store {}", path.display()))?,
            Err(err) if err.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read held store {}", path.display()));
            }
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Stores a record under a fresh token and returns the token.
    pub async fn put(&self, record: HeldRecord) -> Result<String> {
        self.put_with(record, random_token).await
    }

    async fn put_with(&self, record: HeldRecord, generate: impl Fn() -> String) -> Result<String> {
        let mut entries = self.entries.lock().await;

        let mut token = None;
        for _ in 0..MAX_TOKEN_ATTEMPTS {
            let candidate = generate();
            if !entries.contains_key(&candidate) {
                token = Some(candidate);
                break;
            }
        }
        let token = token.ok_or_else(|| {
            anyhow!(
                "no free token after {MAX_TOKEN_ATTEMPTS} attempts ({} records held)",
                entries.len()
            )
        })?;

        entries.insert(token.clone(), record);
        if let Err(err) = self.write_store(&entries).await {
            entries.remove(&token);
            return Err(err);
        }
        tracing::info!(target: "store", token = %token, held = entries.len(), "submission held for review");
        Ok(token)
    }

    pub async fn get(&self, token: &str) -> Option<HeldRecord> {
        self.entries.lock().await.get(token).cloned()
    }

    /// Removes and returns the record for `token`; `Ok(None)` if unknown.
    pub async fn remove(&self, token: &str) -> Result<Option<HeldRecord>> {
        let mut entries = self.entries.lock().await;
        let Some(record) = entries.remove(token) else {
            return Ok(None);
        };
        if let Err(err) = self.write_store(&entries).await {
            entries.insert(token.to_string(), record);
            return Err(err);
        }
        tracing::info!(target: "store", token = %token, held = entries.len(), "held submission removed");
        Ok(Some(record))
    }

    async fn write_store(&self, entries: &HashMap<String, HeldRecord>) -> Result<()> {
        let payload = serde_json::to_vec_pretty(entries).context("failed to serialize held store")?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &payload)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

fn random_token() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..TOKEN_ALPHABET.len());
            TOKEN_ALPHABET[idx] as char
        })
        .collect()
}

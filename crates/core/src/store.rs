//! Persistence of the user's token list in a small key-value blob store.
use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use color_eyre::eyre::{self, WrapErr as _, ensure};
use serde::{Deserialize, Serialize};
use tokio::{fs, sync::Mutex};
use tracing::{debug, info, warn};

/// Key the token list is stored under.
pub const TOKEN_LIST_KEY: &str = "studio_featured_tokens";

const FEATURED_SYMBOLS: [&str; 3] = ["INC", "PLSX", "PLS"];

/// An entry of the user's token list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedToken {
    pub name: String,
    pub symbol: String,
    /// Free-form network label shown next to the token
    pub chain: String,
    /// URL of the token's price document
    pub api: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

impl TrackedToken {
    pub fn featured(symbol: &str) -> Self {
        Self {
            name: symbol.to_string(),
            symbol: symbol.to_string(),
            chain: "PulseChain".to_string(),
            api: format!("https://gopulse.com/api/token/{symbol}"),
            address: None,
            logo: None,
        }
    }

    /// Builds a user-supplied entry; symbol, price API and chain are required.
    pub fn custom(
        symbol: &str,
        api: &str,
        chain: &str,
        address: Option<String>,
    ) -> eyre::Result<Self> {
        let (symbol, api, chain) = (symbol.trim(), api.trim(), chain.trim());
        ensure!(
            !symbol.is_empty() && !api.is_empty() && !chain.is_empty(),
            "symbol, price api and chain must all be filled in"
        );

        Ok(Self {
            name: symbol.to_string(),
            symbol: symbol.to_string(),
            chain: chain.to_string(),
            api: api.to_string(),
            address: address.filter(|addr| !addr.trim().is_empty()),
            logo: None,
        })
    }
}

pub fn featured_tokens() -> Vec<TrackedToken> {
    FEATURED_SYMBOLS.iter().map(|s| TrackedToken::featured(s)).collect()
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn load(&self, key: &str) -> eyre::Result<Option<String>>;

    async fn save(&self, key: &str, value: String) -> eyre::Result<()>;
}

/// A store kept in a single JSON object on disk.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // serializes read-modify-write of the file
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> eyre::Result<HashMap<String, String>> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => serde_json::from_str(&raw)
                .wrap_err_with(|| format!("store file {} is corrupt", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e)
                .wrap_err_with(|| format!("failed to read store file {}", self.path.display())),
        }
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn load(&self, key: &str) -> eyre::Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn save(&self, key: &str, value: String) -> eyre::Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value);

        let raw = serde_json::to_string_pretty(&entries).wrap_err("failed to encode store")?;
        fs::write(&self.path, raw)
            .await
            .wrap_err_with(|| format!("failed to write store file {}", self.path.display()))
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn load(&self, key: &str) -> eyre::Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: String) -> eyre::Result<()> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// The user's token list on top of a [`KeyValueStore`].
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Saved token list, or the featured tokens when nothing was saved yet.
    pub async fn load(&self) -> eyre::Result<Vec<TrackedToken>> {
        match self.store.load(TOKEN_LIST_KEY).await? {
            Some(raw) => serde_json::from_str(&raw).wrap_err("saved token list is corrupt"),
            None => {
                debug!("no saved token list, using featured tokens");
                Ok(featured_tokens())
            }
        }
    }

    /// Like [`TokenStore::load`] but falls back to the featured tokens on error.
    pub async fn load_or_featured(&self) -> Vec<TrackedToken> {
        self.load().await.unwrap_or_else(|e| {
            warn!(error = %e, "failed to load token list, using featured tokens");
            featured_tokens()
        })
    }

    pub async fn save(&self, tokens: &[TrackedToken]) -> eyre::Result<()> {
        let raw = serde_json::to_string(tokens).wrap_err("failed to encode token list")?;
        self.store.save(TOKEN_LIST_KEY, raw).await
    }

    /// Appends `token` to the saved list and returns the new list.
    pub async fn add(&self, token: TrackedToken) -> eyre::Result<Vec<TrackedToken>> {
        let mut tokens = self.load().await?;
        info!(token.symbol = %token.symbol, token.chain = %token.chain, "adding token to list");
        tokens.push(token);
        self.save(&tokens).await?;
        Ok(tokens)
    }
}

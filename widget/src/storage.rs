//! Durable local session state.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// The two values that survive a page reload. Key names match the browser
/// storage entries older widget builds wrote, so visitor state carries over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(rename = "chatbotEmail")]
    pub email: Option<String>,
    #[serde(rename = "currentChatId")]
    pub chat_id: Option<String>,
}

/// Durable key/value storage backing the session.
pub trait StateStore: Send {
    fn load(&self) -> Result<PersistedState>;
    fn save(&self, state: &PersistedState) -> Result<()>;
}

/// Store backed by a single JSON file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store under the platform user data directory.
    pub fn in_user_data_dir() -> Result<Self> {
        let dir = dirs::data_dir()
            .context("no user data directory available")?
            .join("supportchat");
        fs::create_dir_all(&dir).context("Failed to create data directory")?;
        Ok(Self::new(dir.join("session.json")))
    }
}

impl StateStore for FileStore {
    fn load(&self) -> Result<PersistedState> {
        if !self.path.exists() {
            return Ok(PersistedState::default());
        }
        let json = fs::read(&self.path).context("Failed to read session file")?;
        serde_json::from_slice(&json).context("Failed to parse session file")
    }

    fn save(&self, state: &PersistedState) -> Result<()> {
        let json = serde_json::to_vec(state)?;
        fs::write(&self.path, json).context("Failed to write session file")?;
        Ok(())
    }
}

/// In-memory store for tests and headless embeddings. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<PersistedState>>,
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<PersistedState> {
        Ok(self.state.lock().unwrap().clone())
    }

    fn save(&self, state: &PersistedState) -> Result<()> {
        *self.state.lock().unwrap() = state.clone();
        Ok(())
    }
}

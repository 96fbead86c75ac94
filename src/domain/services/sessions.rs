#[cfg(test)]
#[path = "sessions_test.rs"]
mod tests;

use std::collections::HashMap;
use std::path;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

use anyhow::Result;
use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::models::BackendPrompt;
use crate::domain::models::LogRecord;
use crate::domain::models::Message;
use crate::domain::models::ProviderName;
use crate::domain::models::Role;
use crate::domain::models::Session;
use crate::domain::models::SessionError;
use crate::domain::models::SessionIndex;
use crate::infrastructure::backends::BackendManager;

const DEFAULT_TITLE: &str = "New Chat";

fn now_millis() -> i64 {
    return Utc::now().timestamp_millis();
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    return text.filter(|e| return !e.is_empty());
}

fn sorted(registry: &HashMap<String, Session>) -> Vec<Session> {
    let mut sessions = registry.values().cloned().collect::<Vec<Session>>();
    sessions.sort_by(|a, b| {
        return b
            .updated_at
            .cmp(&a.updated_at)
            .then_with(|| return b.created_at.cmp(&a.created_at))
            .then_with(|| return a.id.cmp(&b.id));
    });

    return sessions;
}

/// In-memory registry of chat sessions, mirrored to an index file and one
/// append-only log per session inside `data_dir`.
pub struct Sessions {
    data_dir: path::PathBuf,
    default_provider: ProviderName,
    backends: BackendManager,
    registry: Mutex<HashMap<String, Session>>,
    clock: AtomicI64,
}

impl Sessions {
    pub fn new(
        data_dir: path::PathBuf,
        default_provider: ProviderName,
        backends: BackendManager,
    ) -> Sessions {
        return Sessions {
            data_dir,
            default_provider,
            backends,
            registry: Mutex::new(HashMap::new()),
            clock: AtomicI64::new(0),
        };
    }

    pub fn create_id() -> String {
        return Uuid::new_v4().to_string();
    }

    pub fn data_dir(&self) -> &path::Path {
        return &self.data_dir;
    }

    pub fn default_provider(&self) -> ProviderName {
        return self.default_provider;
    }

    /// Millisecond timestamps that strictly increase across the whole store,
    /// even when several mutations land within the same millisecond.
    fn tick(&self) -> i64 {
        let now = now_millis();
        let previous = match self
            .clock
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                return Some(now.max(last + 1));
            }) {
            Ok(previous) => previous,
            Err(previous) => previous,
        };

        return now.max(previous + 1);
    }

    fn get_index_path(&self) -> path::PathBuf {
        return self.data_dir.join("index.json");
    }

    fn get_log_path(&self, id: &str) -> path::PathBuf {
        return self.data_dir.join(format!("{id}.jsonl"));
    }

    async fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            fs::create_dir_all(&self.data_dir).await?;
        }

        return Ok(());
    }

    async fn save_index(&self, registry: &HashMap<String, Session>) -> Result<()> {
        let index = SessionIndex {
            sessions: sorted(registry),
        };
        let payload = serde_json::to_string_pretty(&index)?;

        self.ensure_data_dir().await?;
        fs::write(self.get_index_path(), payload).await?;

        return Ok(());
    }

    async fn append_log(&self, id: &str, message: &Message) -> Result<()> {
        let mut line = serde_json::to_string(&LogRecord::new(self.tick(), message))?;
        line.push('\n');

        self.ensure_data_dir().await?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.get_log_path(id))
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        return Ok(());
    }

    /// Makes sure the data directory exists and, when `restore` is set, loads
    /// sessions from a previous run's index file.
    pub async fn init(&self, restore: bool) -> Result<usize> {
        self.ensure_data_dir().await?;
        if !restore {
            return Ok(0);
        }

        return self.restore().await;
    }

    /// Loads sessions from the index file. A missing file is a no-op and an
    /// unreadable one is logged and skipped. Sessions already held in memory
    /// are kept over their on-disk copies.
    pub async fn restore(&self) -> Result<usize> {
        let index_path = self.get_index_path();
        if !index_path.exists() {
            return Ok(0);
        }

        let payload = fs::read_to_string(&index_path).await?;
        let index: SessionIndex = match serde_json::from_str(&payload) {
            Ok(index) => index,
            Err(err) => {
                tracing::warn!(
                    error = ?err,
                    path = index_path.to_string_lossy().to_string(),
                    "Session index is unreadable, starting with no sessions"
                );
                return Ok(0);
            }
        };

        let mut registry = self.registry.lock().await;
        let mut restored = 0;
        for session in index.sessions {
            if registry.contains_key(&session.id) {
                continue;
            }
            self.clock.fetch_max(session.updated_at, Ordering::SeqCst);
            registry.insert(session.id.to_string(), session);
            restored += 1;
        }

        tracing::info!(count = restored, "Restored sessions");
        return Ok(restored);
    }

    pub async fn create(
        &self,
        title: Option<&str>,
        provider: Option<ProviderName>,
    ) -> Result<Session, SessionError> {
        let now = self.tick();
        let session = Session {
            id: Sessions::create_id(),
            title: non_empty(title).unwrap_or(DEFAULT_TITLE).to_string(),
            provider: provider.unwrap_or(self.default_provider),
            created_at: now,
            updated_at: now,
            messages: vec![],
        };

        let mut registry = self.registry.lock().await;
        registry.insert(session.id.to_string(), session.clone());
        self.save_index(&registry)
            .await
            .map_err(SessionError::Storage)?;

        tracing::debug!(id = session.id, provider = %session.provider, "Created session");
        return Ok(session);
    }

    /// Every session, most recently updated first.
    pub async fn list(&self) -> Vec<Session> {
        let registry = self.registry.lock().await;
        return sorted(&registry);
    }

    pub async fn get(&self, id: &str) -> Result<Session, SessionError> {
        let registry = self.registry.lock().await;
        return registry.get(id).cloned().ok_or(SessionError::NotFound);
    }

    pub async fn messages(&self, id: &str) -> Result<Vec<Message>, SessionError> {
        let registry = self.registry.lock().await;
        return registry
            .get(id)
            .map(|session| return session.messages.clone())
            .ok_or(SessionError::NotFound);
    }

    pub async fn update(
        &self,
        id: &str,
        title: Option<&str>,
        provider: Option<ProviderName>,
    ) -> Result<Session, SessionError> {
        let mut registry = self.registry.lock().await;
        let session = registry.get_mut(id).ok_or(SessionError::NotFound)?;

        if let Some(title) = non_empty(title) {
            session.title = title.to_string();
        }
        if let Some(provider) = provider {
            session.provider = provider;
        }
        session.updated_at = self.tick();
        let session = session.clone();

        self.save_index(&registry)
            .await
            .map_err(SessionError::Storage)?;

        return Ok(session);
    }

    pub async fn delete(&self, id: &str) -> Result<(), SessionError> {
        let mut registry = self.registry.lock().await;
        if registry.remove(id).is_none() {
            return Err(SessionError::NotFound);
        }

        self.save_index(&registry)
            .await
            .map_err(SessionError::Storage)?;

        if let Err(err) = fs::remove_file(self.get_log_path(id)).await {
            tracing::debug!(error = ?err, id = id, "Session log was not removed");
        }

        return Ok(());
    }

    /// Runs one chat turn: records the user message, asks the session's
    /// backend for a reply with the full history and records the reply.
    /// When the backend fails only the user message is kept.
    pub async fn chat(
        &self,
        id: &str,
        message: &str,
        provider: Option<ProviderName>,
    ) -> Result<String, SessionError> {
        if id.is_empty() {
            return Err(SessionError::Validation("sessionId required".to_string()));
        }
        if message.is_empty() {
            return Err(SessionError::Validation("message required".to_string()));
        }

        let (history, provider) = {
            let mut registry = self.registry.lock().await;
            let session = registry.get_mut(id).ok_or(SessionError::NotFound)?;

            if let Some(provider) = provider {
                session.provider = provider;
            }

            let user_message = Message::new(Role::User, message);
            session.messages.push(user_message.clone());
            session.updated_at = self.tick();
            let history = session.messages.clone();
            let provider = session.provider;

            self.append_log(id, &user_message)
                .await
                .map_err(SessionError::Storage)?;
            self.save_index(&registry)
                .await
                .map_err(SessionError::Storage)?;

            (history, provider)
        };

        let backend = self.backends.service(provider);
        let answer = match backend.get_completion(BackendPrompt::new(history)).await {
            Ok(answer) => answer,
            Err(err) => {
                tracing::error!(error = ?err, id = id, provider = %provider, "Backend failed to answer");
                return Err(SessionError::Backend(err));
            }
        };

        let mut registry = self.registry.lock().await;
        let session = match registry.get_mut(id) {
            Some(session) => session,
            None => {
                tracing::warn!(id = id, "Session was deleted while waiting on the backend");
                return Ok(answer);
            }
        };

        let assistant_message = Message::new(Role::Assistant, &answer);
        session.messages.push(assistant_message.clone());
        session.updated_at = self.tick();

        self.append_log(id, &assistant_message)
            .await
            .map_err(SessionError::Storage)?;
        self.save_index(&registry)
            .await
            .map_err(SessionError::Storage)?;

        return Ok(answer);
    }
}

//! Note operations shared by the HTTP handlers and the CLI.
//!
//! A save is: write the file, mirror the row, then replace the note's chunks
//! in the index. File I/O, embedding and SQLite run on the blocking pool.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::assistant::{self, AskResponse};
use crate::config::{CocoonConfig, RetrievalConfig};
use crate::db::migrations;
use crate::embedding::{self, EmbeddingProvider};
use crate::error::{CocoonError, Result};
use crate::llm::ChatModel;
use crate::mirror::{MirrorRecord, TableMirror};
use crate::profile::{self, OnboardingProfile};
use crate::retrieval::index::prepare_note;
use crate::retrieval::{self, ChunkHit, ReindexReport};
use crate::vault::{self, Note, NoteEntry, Vault};

pub type SharedDb = Arc<Mutex<Connection>>;

/// Outcome of a note write.
#[derive(Debug, Clone, Serialize)]
pub struct SavedNote {
    pub path: String,
    pub content: String,
    pub chunks: usize,
    /// False when the mirror rejected the row; the local file is still written.
    pub mirrored: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileReport {
    pub vault_path: String,
    pub completion: u32,
    pub notes: Vec<SavedNote>,
}

/// One user's share of a full rebuild.
#[derive(Debug, Clone, Serialize)]
pub struct UserReindex {
    pub user_id: String,
    #[serde(flatten)]
    pub report: ReindexReport,
}

#[derive(Clone)]
pub struct NoteService {
    db: SharedDb,
    embedder: Arc<dyn EmbeddingProvider>,
    model_id: String,
    mirror: Arc<dyn TableMirror>,
    llm: Option<Arc<dyn ChatModel>>,
    config: Arc<CocoonConfig>,
    vault_root: PathBuf,
}

impl NoteService {
    pub fn new(
        db: SharedDb,
        embedder: Arc<dyn EmbeddingProvider>,
        mirror: Arc<dyn TableMirror>,
        llm: Option<Arc<dyn ChatModel>>,
        config: Arc<CocoonConfig>,
    ) -> Self {
        let vault_root = config.resolved_vault_root();
        let model_id = embedding::model_id(&config.embedding);
        Self {
            db,
            embedder,
            model_id,
            mirror,
            llm,
            config,
            vault_root,
        }
    }

    pub fn config(&self) -> &CocoonConfig {
        &self.config
    }

    pub fn mirror_name(&self) -> &'static str {
        self.mirror.name()
    }

    pub fn llm_model(&self) -> Option<&str> {
        self.llm.as_deref().map(|m| m.model())
    }

    fn vault(&self, user_id: &str) -> Result<Vault> {
        Vault::open(&self.vault_root, user_id)
    }

    async fn blocking<T, F>(f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        tokio::task::spawn_blocking(f).await?
    }

    async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        Self::blocking(move || {
            let mut conn = db
                .lock()
                .map_err(|e| CocoonError::Internal(format!("db lock poisoned: {e}")))?;
            f(&mut conn)
        })
        .await
    }

    pub async fn save_note(
        &self,
        user_id: &str,
        path: &str,
        content: &str,
        metadata: Option<Map<String, Value>>,
    ) -> Result<SavedNote> {
        let vault = self.vault(user_id)?;
        let embedder = Arc::clone(&self.embedder);
        let max_chars = self.config.retrieval.chunk_max_chars;
        let (path, content, meta) = (path.to_string(), content.to_string(), metadata.clone());

        let (note, chunks, embeddings) = Self::blocking(move || {
            let note = vault.write_note(&path, &content, meta.as_ref())?;
            let (chunks, embeddings) = if vault::is_note_path(&note.path) {
                prepare_note(embedder.as_ref(), &note.content, max_chars)?
            } else {
                (Vec::new(), Vec::new())
            };
            Ok((note, chunks, embeddings))
        })
        .await?;

        let record = MirrorRecord::new(user_id, &note.path, &note.content, metadata.as_ref());
        let mirrored = match self.mirror.upsert(&record).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(user = %user_id, path = %note.path, mirror = self.mirror.name(), error = %e, "mirror upsert failed");
                false
            }
        };

        let (user, note_path) = (user_id.to_string(), note.path.clone());
        let indexed = self
            .with_db(move |conn| retrieval::index_note(conn, &user, &note_path, &chunks, &embeddings))
            .await?;

        tracing::info!(user = %user_id, path = %note.path, chunks = indexed, mirrored, "note saved");
        Ok(SavedNote {
            path: note.path,
            content: note.content,
            chunks: indexed,
            mirrored,
        })
    }

    pub async fn get_note(&self, user_id: &str, path: &str) -> Result<Note> {
        let vault = self.vault(user_id)?;
        let path = path.to_string();
        Self::blocking(move || vault.read_note(&path)).await
    }

    pub async fn list_notes(&self, user_id: &str) -> Result<Vec<NoteEntry>> {
        let vault = self.vault(user_id)?;
        Self::blocking(move || vault.list_notes()).await
    }

    /// Delete the file, its chunks and its mirrored row.
    pub async fn delete_note(&self, user_id: &str, path: &str) -> Result<()> {
        let vault = self.vault(user_id)?;
        let normalized = vault::normalize_rel_path(path)?;

        let rel = normalized.clone();
        Self::blocking(move || vault.delete_note(&rel)).await?;

        let (user, rel) = (user_id.to_string(), normalized.clone());
        let removed = self
            .with_db(move |conn| retrieval::remove_note(conn, &user, &rel))
            .await?;

        if let Err(e) = self.mirror.delete(user_id, &normalized).await {
            tracing::warn!(user = %user_id, path = %normalized, error = %e, "mirror delete failed");
        }
        tracing::info!(user = %user_id, path = %normalized, chunks = removed, "note deleted");
        Ok(())
    }

    /// Top-k chunks of `user_id` most similar to `query`.
    pub async fn search(
        &self,
        user_id: &str,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<Vec<ChunkHit>> {
        vault::validate_user_id(user_id)?;
        let query = query.trim();
        if query.is_empty() {
            return Err(CocoonError::Validation("query must not be empty".into()));
        }
        let top_k = resolve_top_k(top_k, &self.config.retrieval)?;

        let embedder = Arc::clone(&self.embedder);
        let text = query.to_string();
        let embedding = Self::blocking(move || {
            embedder
                .embed(&text)
                .map_err(|e| CocoonError::Embedding(e.to_string()))
        })
        .await?;

        let user = user_id.to_string();
        self.with_db(move |conn| retrieval::search(conn, &user, &embedding, top_k))
            .await
    }

    pub async fn ask(
        &self,
        user_id: &str,
        question: &str,
        top_k: Option<usize>,
    ) -> Result<AskResponse> {
        let question = assistant::validate_question(question)?;
        let hits = self.search(user_id, question, top_k).await?;
        assistant::answer(question, hits, self.llm.as_deref()).await
    }

    /// Rebuild the user's index from the files on disk.
    ///
    /// When no other user has chunks left, the whole index now comes from the
    /// configured model and it is recorded as the index's embedding model.
    pub async fn reindex(&self, user_id: &str) -> Result<ReindexReport> {
        let vault = self.vault(user_id)?;
        let embedder = Arc::clone(&self.embedder);
        let max_chars = self.config.retrieval.chunk_max_chars;
        let model_id = self.model_id.clone();
        self.with_db(move |conn| {
            let report = retrieval::reindex_user(conn, &vault, embedder.as_ref(), max_chars)?;
            let others = retrieval::indexed_users(conn)?
                .into_iter()
                .any(|u| u != vault.user_id());
            if !others {
                record_model(conn, &model_id)?;
            }
            Ok(report)
        })
        .await
    }

    /// Rebuild every user's index from the vault root, drop chunks of users
    /// whose vault is gone, then record the configured embedding model.
    pub async fn reindex_all(&self) -> Result<Vec<UserReindex>> {
        let root = self.vault_root.clone();
        let users = Self::blocking(move || vault::list_users(&root)).await?;

        let mut reports = Vec::with_capacity(users.len());
        for user_id in &users {
            let report = self.reindex(user_id).await?;
            reports.push(UserReindex {
                user_id: user_id.clone(),
                report,
            });
        }

        let model_id = self.model_id.clone();
        self.with_db(move |conn| {
            for orphan in retrieval::indexed_users(conn)?
                .into_iter()
                .filter(|u| !users.contains(u))
            {
                let removed = retrieval::clear_user(conn, &orphan)?;
                tracing::info!(user = %orphan, chunks = removed, "dropped chunks of missing vault");
            }
            record_model(conn, &model_id)
        })
        .await?;
        Ok(reports)
    }

    /// Write the onboarding starter notes through the normal save path.
    /// `raw` is the onboarding payload as received.
    pub async fn write_profile(&self, user_id: &str, raw: Value) -> Result<ProfileReport> {
        let vault = self.vault(user_id)?;
        let data = OnboardingProfile::from_payload(&raw)?;
        let mut notes = Vec::new();
        for starter in profile::starter_notes(user_id, &data, &raw)? {
            let saved = self
                .save_note(user_id, starter.path, &starter.content, starter.metadata)
                .await?;
            notes.push(saved);
        }
        let completion = profile::completion_percent(&data);
        tracing::info!(user = %user_id, notes = notes.len(), completion, "profile written");
        Ok(ProfileReport {
            vault_path: vault.base_path().display().to_string(),
            completion,
            notes,
        })
    }
}

fn record_model(conn: &Connection, model_id: &str) -> Result<()> {
    if migrations::get_embedding_model(conn)?.as_deref() != Some(model_id) {
        migrations::set_embedding_model(conn, model_id)?;
        tracing::info!(model = %model_id, "embedding model recorded");
    }
    Ok(())
}

/// Default an absent `top_k`, reject 0 and clamp to the configured maximum.
pub fn resolve_top_k(requested: Option<usize>, config: &RetrievalConfig) -> Result<usize> {
    match requested.unwrap_or(config.top_k) {
        0 => Err(CocoonError::Validation("top_k must be at least 1".into())),
        k => Ok(k.min(config.max_top_k.max(1))),
    }
}

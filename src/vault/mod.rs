//! Per-user Markdown vault on the local filesystem.
//!
//! Every user owns `<root>/user_<id>/`. Notes are addressed by `/`-separated
//! paths relative to that directory; only `.md` and `.txt` files count as notes
//! when listing or loading.

pub mod front_matter;

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use walkdir::WalkDir;

use crate::error::{CocoonError, Result};

/// File extensions treated as notes.
pub const NOTE_EXTENSIONS: [&str; 2] = ["md", "txt"];

/// A note's relative path and full content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub path: String,
    pub content: String,
}

/// Listing entry for a note.
#[derive(Debug, Clone, Serialize)]
pub struct NoteEntry {
    pub path: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

/// One user's vault directory.
#[derive(Debug, Clone)]
pub struct Vault {
    user_id: String,
    base_path: PathBuf,
}

impl Vault {
    /// Open (creating if needed) the vault for `user_id` under `root`.
    pub fn open(root: impl AsRef<Path>, user_id: &str) -> Result<Self> {
        validate_user_id(user_id)?;
        let base_path = root.as_ref().join(format!("user_{user_id}"));
        std::fs::create_dir_all(&base_path).map_err(|e| CocoonError::io(&base_path, e))?;
        Ok(Self {
            user_id: user_id.to_string(),
            base_path,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Write a note, optionally prefixed by a front-matter block.
    ///
    /// The stored content is trimmed and ends with exactly one newline. Parent
    /// folders are created and an existing file is replaced.
    pub fn write_note(
        &self,
        rel_path: &str,
        content: &str,
        metadata: Option<&Map<String, Value>>,
    ) -> Result<Note> {
        let (rel_path, full_path) = self.resolve(rel_path)?;

        let mut content = match metadata {
            Some(meta) if !meta.is_empty() => {
                format!("{}{}", front_matter::render(meta), content.trim())
            }
            _ => content.to_string(),
        };
        content = format!("{}\n", content.trim());

        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CocoonError::io(parent, e))?;
        }
        std::fs::write(&full_path, &content).map_err(|e| CocoonError::io(&full_path, e))?;

        tracing::debug!(user = %self.user_id, path = %rel_path, bytes = content.len(), "note written");
        Ok(Note {
            path: rel_path,
            content,
        })
    }

    pub fn read_note(&self, rel_path: &str) -> Result<Note> {
        let (rel_path, full_path) = self.resolve(rel_path)?;
        match std::fs::read_to_string(&full_path) {
            Ok(content) => Ok(Note {
                path: rel_path,
                content,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CocoonError::NotFound(rel_path))
            }
            Err(e) => Err(CocoonError::io(&full_path, e)),
        }
    }

    pub fn delete_note(&self, rel_path: &str) -> Result<()> {
        let (rel_path, full_path) = self.resolve(rel_path)?;
        if !full_path.is_file() {
            return Err(CocoonError::NotFound(rel_path));
        }
        std::fs::remove_file(&full_path).map_err(|e| CocoonError::io(&full_path, e))?;
        tracing::debug!(user = %self.user_id, path = %rel_path, "note deleted");
        Ok(())
    }

    /// All notes in the vault, sorted by path.
    pub fn list_notes(&self) -> Result<Vec<NoteEntry>> {
        let mut entries = Vec::new();
        for (rel_path, full_path) in self.walk_notes()? {
            let meta = std::fs::metadata(&full_path).map_err(|e| CocoonError::io(&full_path, e))?;
            let modified = meta
                .modified()
                .ok()
                .map(|t| DateTime::<Utc>::from(t).to_rfc3339());
            entries.push(NoteEntry {
                path: rel_path,
                size: meta.len(),
                modified,
            });
        }
        Ok(entries)
    }

    /// Load every note with its content, sorted by path.
    pub fn load_documents(&self) -> Result<Vec<Note>> {
        self.walk_notes()?
            .into_iter()
            .map(|(path, full_path)| {
                let content = std::fs::read_to_string(&full_path)
                    .map_err(|e| CocoonError::io(&full_path, e))?;
                Ok(Note { path, content })
            })
            .collect()
    }

    fn walk_notes(&self) -> Result<Vec<(String, PathBuf)>> {
        let mut found = Vec::new();
        for entry in WalkDir::new(&self.base_path).follow_links(false) {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                CocoonError::io(path, e.into())
            })?;
            if !entry.file_type().is_file() || !is_note_file(entry.path()) {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&self.base_path) else {
                continue;
            };
            found.push((to_rel_string(rel), entry.path().to_path_buf()));
        }
        found.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(found)
    }

    /// Normalize a relative note path and join it onto the vault directory.
    fn resolve(&self, rel_path: &str) -> Result<(String, PathBuf)> {
        let normalized = normalize_rel_path(rel_path)?;
        let full = self.base_path.join(&normalized);
        Ok((normalized, full))
    }
}

/// Ids of every user with a vault directory under `root`, sorted. A missing
/// root means no users.
pub fn list_users(root: impl AsRef<Path>) -> Result<Vec<String>> {
    let root = root.as_ref();
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(CocoonError::io(root, e)),
    };

    let mut users = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CocoonError::io(root, e))?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(user_id) = name.to_str().and_then(|n| n.strip_prefix("user_")) else {
            continue;
        };
        if validate_user_id(user_id).is_ok() {
            users.push(user_id.to_string());
        }
    }
    users.sort();
    Ok(users)
}

/// User ids become directory names, so keep them to a safe alphabet.
pub fn validate_user_id(user_id: &str) -> Result<()> {
    let ok = !user_id.is_empty()
        && user_id.len() <= 128
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(CocoonError::InvalidUser(user_id.to_string()))
    }
}

/// Reject absolute paths and parent traversal; collapse `.` and duplicate separators.
pub fn normalize_rel_path(rel_path: &str) -> Result<String> {
    let trimmed = rel_path.trim();
    let invalid = || CocoonError::InvalidPath(rel_path.to_string());
    if trimmed.is_empty() || trimmed.contains('\\') || trimmed.contains('\0') {
        return Err(invalid());
    }

    let mut parts = Vec::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str().ok_or_else(invalid)?),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(invalid())
            }
        }
    }
    if parts.is_empty() {
        return Err(invalid());
    }
    Ok(parts.join("/"))
}

/// Extension used as the mirror `file_type`.
pub fn file_type(rel_path: &str) -> String {
    Path::new(rel_path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Whether `rel_path` has a note extension (and so is listed and indexed).
pub fn is_note_path(rel_path: &str) -> bool {
    is_note_file(Path::new(rel_path))
}

fn is_note_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| NOTE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn to_rel_string(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(p) => p.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

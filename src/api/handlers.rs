use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::assistant::AskResponse;
use crate::error::Result;
use crate::retrieval::{ChunkHit, ReindexReport};
use crate::service::{NoteService, ProfileReport, SavedNote};
use crate::vault::{Note, NoteEntry};

/// Body extractor whose rejection is turned into a `CocoonError` by the handler.
type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct WriteNoteRequest {
    pub content: String,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub hits: Vec<ChunkHit>,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct NoteList {
    pub user_id: String,
    pub notes: Vec<NoteEntry>,
}

pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn list_notes(
    State(service): State<NoteService>,
    Path(user_id): Path<String>,
) -> Result<Json<NoteList>> {
    let notes = service.list_notes(&user_id).await?;
    Ok(Json(NoteList { user_id, notes }))
}

pub async fn read_note(
    State(service): State<NoteService>,
    Path((user_id, path)): Path<(String, String)>,
) -> Result<Json<Note>> {
    Ok(Json(service.get_note(&user_id, &path).await?))
}

pub async fn write_note(
    State(service): State<NoteService>,
    Path((user_id, path)): Path<(String, String)>,
    body: JsonBody<WriteNoteRequest>,
) -> Result<Json<SavedNote>> {
    let Json(req) = body?;
    let saved = service
        .save_note(&user_id, &path, &req.content, req.metadata)
        .await?;
    Ok(Json(saved))
}

pub async fn delete_note(
    State(service): State<NoteService>,
    Path((user_id, path)): Path<(String, String)>,
) -> Result<StatusCode> {
    service.delete_note(&user_id, &path).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn search(
    State(service): State<NoteService>,
    Path(user_id): Path<String>,
    body: JsonBody<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    let Json(req) = body?;
    let hits = service.search(&user_id, &req.query, req.top_k).await?;
    Ok(Json(SearchResponse {
        query: req.query,
        hits,
    }))
}

pub async fn ask(
    State(service): State<NoteService>,
    Path(user_id): Path<String>,
    body: JsonBody<AskRequest>,
) -> Result<Json<AskResponse>> {
    let Json(req) = body?;
    Ok(Json(service.ask(&user_id, &req.question, req.top_k).await?))
}

pub async fn reindex(
    State(service): State<NoteService>,
    Path(user_id): Path<String>,
) -> Result<Json<ReindexReport>> {
    Ok(Json(service.reindex(&user_id).await?))
}

pub async fn write_profile(
    State(service): State<NoteService>,
    Path(user_id): Path<String>,
    body: JsonBody<Value>,
) -> Result<Json<ProfileReport>> {
    let Json(raw) = body?;
    Ok(Json(service.write_profile(&user_id, raw).await?))
}

//! Process setup and the HTTP server entry point.
//!
//! [`build_service`] opens the database, builds the embedding provider, mirror
//! and chat model, and is shared by `serve` and the one-shot CLI commands.

use crate::config::CocoonConfig;
use crate::service::NoteService;
use crate::{api, db, embedding, llm, mirror};
use anyhow::{Context, Result};
use std::sync::{Arc, Mutex};

/// Open the DB, create providers, and record which embedding model built the index.
pub fn build_service(config: CocoonConfig) -> Result<NoteService> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");

    let model_id = embedding::model_id(&config.embedding);
    match db::migrations::get_embedding_model(&conn)? {
        Some(stored) if stored != model_id => {
            tracing::warn!(
                stored = %stored,
                configured = %model_id,
                "embedding model changed; run `cocoon reindex --all`"
            );
        }
        Some(_) => {}
        None => db::migrations::set_embedding_model(&conn, &model_id)?,
    }

    let db = Arc::new(Mutex::new(conn));

    let provider = embedding::create_provider(&config.embedding)?;
    let embedder: Arc<dyn embedding::EmbeddingProvider> = Arc::from(provider);
    tracing::info!(provider = %config.embedding.provider, "embedding provider ready");

    let mirror = mirror::create_mirror(&config.mirror, Arc::clone(&db))
        .context("failed to set up note mirror")?;
    tracing::info!(mirror = mirror.name(), "note mirror ready");

    let chat = llm::create_chat_model(&config.llm);

    Ok(NoteService::new(db, embedder, mirror, chat, Arc::new(config)))
}

/// Serve the HTTP API until Ctrl-C.
pub async fn serve(config: CocoonConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let service = build_service(config)?;
    let router = api::router(service);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "cocoon listening at http://{bind_addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}

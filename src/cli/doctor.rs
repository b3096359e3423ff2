//! CLI `doctor` command: database diagnostics and a config summary.

use anyhow::{Context, Result};

use cocoon::config::CocoonConfig;
use cocoon::db;
use cocoon::embedding::{self, local::model_files};

/// Run database diagnostics and print a health report.
pub fn doctor(config: &CocoonConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `cocoon serve` once to initialize it.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let conn = db::open_database(&db_path).context("failed to open database (may be corrupt)")?;
    let report = db::check_database_health(&conn).context("failed to run health check")?;
    let configured = embedding::model_id(&config.embedding);

    println!("Cocoon Health Report");
    println!("====================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!("sqlite-vec:        {}", report.sqlite_vec_version);
    println!("Vault root:        {}", config.resolved_vault_root().display());
    println!();
    println!("Embedding:");
    println!("  Provider:        {}", config.embedding.provider);
    println!(
        "  Stored model:    {}",
        report.embedding_model.as_deref().unwrap_or("(not set)")
    );
    println!("  Configured:      {configured}");
    match report.embedding_model {
        Some(ref stored) if stored != &configured => {
            println!("  WARNING: model mismatch! Run `cocoon reindex --all`.");
        }
        Some(_) => println!("  Status:          OK (match)"),
        None => {}
    }
    if config.embedding.provider == "local" {
        let (model, tokenizer) = model_files(&config.embedding);
        let present = model.exists() && tokenizer.exists();
        println!(
            "  Model files:     {}",
            if present { "present" } else { "missing (run `cocoon model download`)" }
        );
    }
    println!();
    println!("Mirror:            {}", config.mirror.provider);
    println!(
        "Chat model:        {}",
        if config.llm.enabled { config.llm.model.as_str() } else { "disabled" }
    );
    println!();
    println!("Row counts:");
    println!("  Users indexed:   {}", report.user_count);
    println!("  Chunks:          {}", report.chunk_count);
    println!("  Vectors:         {}", report.vector_count);
    println!("  Mirrored files:  {}", report.mirrored_files);
    if report.chunk_count != report.vector_count {
        println!("  WARNING: chunk/vector counts differ; reindex affected users.");
    }
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!();
        println!("Recovery steps:");
        println!("  1. Restore from a backup: cp backup.db {}", db_path.display());
        println!("  2. Or delete the index and run `cocoon reindex --all`;");
        println!("     notes themselves live in the vault and are not lost.");
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

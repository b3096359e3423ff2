use anyhow::Result;

use cocoon::service::NoteService;

/// Rebuild one user's index from the files in their vault.
pub async fn reindex(service: &NoteService, user_id: &str) -> Result<()> {
    let report = service.reindex(user_id).await?;
    println!(
        "Reindexed {} note(s) into {} chunk(s) for user {user_id}.",
        report.notes, report.chunks
    );
    Ok(())
}

/// Rebuild every user's index and record the configured embedding model.
pub async fn reindex_all(service: &NoteService) -> Result<()> {
    let reports = service.reindex_all().await?;
    for entry in &reports {
        println!(
            "  {:<24} {:>5} note(s) {:>6} chunk(s)",
            entry.user_id, entry.report.notes, entry.report.chunks
        );
    }
    println!("Reindexed {} user(s).", reports.len());
    Ok(())
}

use anyhow::Result;

use cocoon::service::NoteService;

/// Print the closest chunks for `query`.
pub async fn search(
    service: &NoteService,
    user_id: &str,
    query: &str,
    top_k: Option<usize>,
) -> Result<()> {
    let hits = service.search(user_id, query, top_k).await?;

    if hits.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("Found {} result(s)\n", hits.len());
    for (i, hit) in hits.iter().enumerate() {
        println!(
            "  {}. {} #{} (score: {:.4})",
            i + 1,
            hit.path,
            hit.position,
            hit.score
        );
        println!("     {}", preview(&hit.content, 120));
        println!();
    }
    Ok(())
}

/// Answer `question` from the user's notes.
pub async fn ask(
    service: &NoteService,
    user_id: &str,
    question: &str,
    top_k: Option<usize>,
) -> Result<()> {
    let response = service.ask(user_id, question, top_k).await?;

    if let Some(message) = &response.message {
        println!("{message}");
        return Ok(());
    }

    match (&response.answer, &response.model) {
        (Some(answer), Some(model)) => {
            println!("{answer}\n");
            println!("(answered by {model})");
        }
        _ => {
            println!("No chat model configured; retrieved context:\n");
            println!("{}", response.context);
        }
    }

    println!("\nSources:");
    for hit in &response.sources {
        println!("  - {} #{} (score: {:.4})", hit.path, hit.position, hit.score);
    }
    Ok(())
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    match flat.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}

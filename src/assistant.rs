//! Question answering over a user's retrieved note chunks.

use serde::Serialize;

use crate::error::{CocoonError, Result};
use crate::llm::ChatModel;
use crate::retrieval::search::join_context;
use crate::retrieval::ChunkHit;

pub const SYSTEM_PROMPT: &str = "You are a personal knowledge assistant. \
Answer the question using only the notes provided as context. \
If the notes do not contain the answer, say so plainly. Keep the answer short.";

pub const NO_MATCHES: &str = "No matching notes found for this question.";

#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub question: String,
    /// `None` when nothing matched or no chat model is configured.
    pub answer: Option<String>,
    pub context: String,
    pub sources: Vec<ChunkHit>,
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Trim a question, rejecting blank input.
pub fn validate_question(question: &str) -> Result<&str> {
    let question = question.trim();
    if question.is_empty() {
        return Err(CocoonError::Validation("question must not be empty".into()));
    }
    Ok(question)
}

pub fn user_prompt(context: &str, question: &str) -> String {
    format!("Notes:\n{context}\n\nQuestion: {question}")
}

/// Build the response for `question` from already-retrieved `hits`.
///
/// With a chat model the answer is its completion; without one the context is
/// returned on its own.
pub async fn answer(
    question: &str,
    hits: Vec<ChunkHit>,
    llm: Option<&dyn ChatModel>,
) -> Result<AskResponse> {
    if hits.is_empty() {
        return Ok(AskResponse {
            question: question.to_string(),
            answer: None,
            context: String::new(),
            sources: hits,
            model: None,
            message: Some(NO_MATCHES.into()),
        });
    }

    let context = join_context(&hits);
    let (answer, model) = match llm {
        Some(llm) => {
            let text = llm
                .complete(SYSTEM_PROMPT, &user_prompt(&context, question))
                .await?;
            (Some(text), Some(llm.model().to_string()))
        }
        None => (None, None),
    };

    tracing::debug!(sources = hits.len(), answered = answer.is_some(), "question handled");
    Ok(AskResponse {
        question: question.to_string(),
        answer,
        context,
        sources: hits,
        model,
        message: None,
    })
}

//! Line-based chunking of note text.

/// Split `text` into chunks of fewer than `max_chars` characters.
///
/// Lines are packed greedily: a line joins the current chunk while the chunk
/// plus the line stays under `max_chars`, otherwise the chunk is flushed and a
/// new one starts with that line. A line that alone reaches `max_chars` is cut
/// at char boundaries. Chunks are trimmed; blank chunks are dropped.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(2);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in text.lines() {
        for piece in split_long_line(line, max_chars - 1) {
            let piece_len = piece.chars().count();
            if current_len + piece_len >= max_chars {
                flush(&mut chunks, &mut current);
                current_len = 0;
            }
            current.push_str(piece);
            current.push('\n');
            current_len += piece_len + 1;
        }
    }
    flush(&mut chunks, &mut current);

    chunks
}

fn flush(chunks: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
    current.clear();
}

/// Cut a line into pieces of at most `limit` chars. Empty lines yield one empty piece.
fn split_long_line(line: &str, limit: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in line.char_indices() {
        if count == limit {
            pieces.push(&line[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    pieces.push(&line[start..]);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_text("# Title\n\nA line.", 500), vec!["# Title\n\nA line."]);
    }

    #[test]
    fn empty_and_blank_text_yield_nothing() {
        assert!(chunk_text("", 500).is_empty());
        assert!(chunk_text("\n  \n\n", 500).is_empty());
    }

    #[test]
    fn lines_are_packed_until_limit() {
        let text = "aaaa\nbbbb\ncccc\ndddd";
        // each line costs 5 chars with its newline
        let chunks = chunk_text(text, 11);
        assert_eq!(chunks, vec!["aaaa\nbbbb", "cccc\ndddd"]);
    }

    #[test]
    fn chunks_stay_under_limit() {
        let text = (0..200)
            .map(|i| format!("line number {i} with some words"))
            .collect::<Vec<_>>()
            .join("\n");
        for chunk in chunk_text(&text, 120) {
            assert!(chunk.chars().count() < 120, "chunk too long: {}", chunk.len());
        }
    }

    #[test]
    fn long_line_is_cut() {
        let line = "x".repeat(25);
        let chunks = chunk_text(&line, 10);
        assert_eq!(chunks, vec!["x".repeat(9), "x".repeat(9), "x".repeat(7)]);
    }

    #[test]
    fn multibyte_text_cut_on_char_boundaries() {
        let line = "é".repeat(12);
        let chunks = chunk_text(&line, 5);
        assert!(chunks.iter().all(|c| c.chars().all(|ch| ch == 'é')));
        assert_eq!(chunks.concat().chars().count(), 12);
    }

    #[test]
    fn no_content_is_lost() {
        let text = "alpha beta\ngamma\n\ndelta epsilon zeta\neta";
        let joined: String = chunk_text(text, 25).join(" ");
        for word in ["alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta"] {
            assert!(joined.contains(word), "{word} missing");
        }
    }
}

/// Relevance of `search_text` for an already trimmed, lowercased `query`.
///
/// - empty query: `1`
/// - no substring match: `0`
/// - match at the start: `120 - query length`
/// - match at a word start (`" " + query`): `100 - index of that word`
/// - any other match: `80 - index of the first occurrence`
///
/// Positions and lengths count characters. Results at or below zero are
/// reported as `0`, which excludes the candidate.
#[must_use]
pub fn score(search_text: &str, query: &str) -> u32 {
    if query.is_empty() {
        return 1;
    }

    let Some(first) = search_text.find(query) else {
        return 0;
    };

    let raw = if first == 0 {
        120 - char_len(query)
    } else if let Some(word_start) = find_word_start(search_text, query) {
        100 - char_index(search_text, word_start + 1)
    } else {
        80 - char_index(search_text, first)
    };

    u32::try_from(raw).unwrap_or(0)
}

/// Whether the candidate text contains the query at all, regardless of score.
/// Containment is what narrows monotonically as a query grows.
#[must_use]
pub fn contains(search_text: &str, query: &str) -> bool {
    search_text.contains(query)
}

/// Byte offset of the first `" " + query` occurrence
fn find_word_start(search_text: &str, query: &str) -> Option<usize> {
    search_text
        .match_indices(' ')
        .map(|(i, _)| i)
        .find(|&i| search_text[i + 1..].starts_with(query))
}

fn char_len(s: &str) -> i64 {
    i64::try_from(s.chars().count()).unwrap_or(i64::MAX)
}

fn char_index(s: &str, byte_offset: usize) -> i64 {
    char_len(&s[..byte_offset])
}

//! Term-frequency cosine similarity over pattern text.

use std::collections::HashMap;

use engram_core::Pattern;

/// Lowercased alphanumeric tokens; short words and stop words removed.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|token| token.len() > 2 && !is_stop_word(token))
        .collect()
}

fn is_stop_word(word: &str) -> bool {
    matches!(
        word,
        "the" | "and" | "for" | "are" | "was" | "with" | "this" | "that" | "from" | "have"
            | "has" | "had" | "not" | "but" | "you" | "your" | "when" | "then" | "than"
            | "into" | "onto" | "over" | "each" | "which" | "their" | "there" | "here"
            | "what" | "will" | "can" | "all" | "any" | "its" | "use" | "used" | "using"
    )
}

/// Term-frequency vector for a token stream.
pub fn term_frequencies(tokens: &[String]) -> HashMap<String, f64> {
    let mut counts: HashMap<String, f64> = HashMap::new();
    for token in tokens {
        *counts.entry(token.clone()).or_insert(0.0) += 1.0;
    }
    counts
}

/// Cosine similarity between two sparse term-frequency vectors.
///
/// Returns 0.0 when either vector is empty or has zero magnitude. Term
/// frequencies are non-negative, so the result lives in [0.0, 1.0]; the
/// clamp absorbs floating-point error at the top end.
pub fn cosine_similarity(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    // Walk the smaller map for the dot product.
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, weight)| large.get(term).map(|other| weight * other))
        .sum();

    let norm_a: f64 = a.values().map(|w| w * w).sum::<f64>().sqrt();
    let norm_b: f64 = b.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

/// The text a pattern is compared by: title, description, payload content.
pub fn pattern_text(pattern: &Pattern) -> String {
    format!(
        "{} {} {}",
        pattern.title,
        pattern.description,
        pattern.payload.describe()
    )
}

/// Content similarity between two patterns in [0.0, 1.0].
///
/// Identical content hashes short-circuit to 1.0 without tokenizing.
/// Patterns of different kinds never consolidate, whatever their wording,
/// so cross-kind pairs score 0.0.
pub fn pattern_similarity(a: &Pattern, b: &Pattern) -> f64 {
    if a.content_hash == b.content_hash {
        return 1.0;
    }
    if a.kind != b.kind {
        return 0.0;
    }
    let freq_a = term_frequencies(&tokenize(&pattern_text(a)));
    let freq_b = term_frequencies(&tokenize(&pattern_text(b)));
    cosine_similarity(&freq_a, &freq_b)
}

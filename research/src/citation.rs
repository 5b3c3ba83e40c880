//! Citation parsing (spec §4.9 step 6): accepts `[N]`, `[[N]]`, and `[[N]](url)` marker forms
//! via a single regex sweep, in the same "richest form first, never silently drop a resolvable
//! citation" spirit as `core/src/llm/mod.rs`'s JSON recovery parsing.

use regex::Regex;
use std::sync::OnceLock;

use crate::types::Reference;

/// One marker found in raw model output, before binding to a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawCitation {
    /// Byte range in the source text this marker occupies.
    span: (usize, usize),
    /// 1-based citation number.
    number: usize,
}

fn citation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Tries the richest form first: `[[N]](url)`, then `[[N]]`, then `[N]`.
        Regex::new(r"\[\[(\d+)\]\]\([^)]*\)|\[\[(\d+)\]\]|\[(\d+)\]").expect("valid regex")
    })
}

fn extract_number(captures: &regex::Captures<'_>) -> Option<usize> {
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .or_else(|| captures.get(3))
        .and_then(|m| m.as_str().parse().ok())
}

/// Rewrites every citation marker in `raw` to its canonical `[N]` form, dropping markers whose
/// `N` has no matching reference (logged as a warning), and returns the bound reference list in
/// first-appearance order.
///
/// `available` is the candidate reference pool, already ordered `references[N-1]`; only entries
/// actually cited in `raw` are returned.
#[must_use]
pub fn parse_citations(raw: &str, available: &[Reference]) -> (String, Vec<Reference>) {
    let regex = citation_regex();
    let mut canonical = String::with_capacity(raw.len());
    let mut last_end = 0;
    let mut cited = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for captures in regex.captures_iter(raw) {
        let whole = captures.get(0).expect("capture 0 always present");
        let Some(number) = extract_number(&captures) else {
            continue;
        };

        canonical.push_str(&raw[last_end..whole.start()]);
        last_end = whole.end();

        match available.get(number.saturating_sub(1)) {
            Some(reference) if number >= 1 => {
                canonical.push_str(&format!("[{number}]"));
                if seen.insert(number) {
                    cited.push(reference.clone());
                }
            }
            _ => {
                tracing::warn!(number, "dropping citation marker with no matching reference");
            }
        }
    }
    canonical.push_str(&raw[last_end..]);

    (canonical, cited)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(n: usize) -> Vec<Reference> {
        (1..=n)
            .map(|i| Reference {
                citation_number: i,
                doc_id: format!("doc{i}"),
                filename: format!("f{i}.pdf"),
                page: i,
                thumbnail_url: None,
                is_visual: false,
            })
            .collect()
    }

    #[test]
    fn accepts_all_three_marker_forms() {
        let raw = "Revenue grew [1]. Costs fell [[2]]. See chart [[3]](https://x/3).";
        let (canonical, cited) = parse_citations(raw, &refs(3));
        assert_eq!(
            canonical,
            "Revenue grew [1]. Costs fell [2]. See chart [3]."
        );
        assert_eq!(cited.len(), 3);
    }

    #[test]
    fn drops_unknown_citation_number() {
        let raw = "As shown [1] and [9].";
        let (canonical, cited) = parse_citations(raw, &refs(1));
        assert_eq!(canonical, "As shown [1] and .");
        assert_eq!(cited.len(), 1);
    }

    #[test]
    fn deduplicates_repeated_citations() {
        let raw = "[1] and again [1].";
        let (_, cited) = parse_citations(raw, &refs(1));
        assert_eq!(cited.len(), 1);
    }
}

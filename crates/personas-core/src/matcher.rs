//! Free-text relevance filtering.
//!
//! Selects which records are handed to the generator for a query. The rule
//! is deliberately simple:
//!
//! 1. Lower-case the query and split it on whitespace into terms.
//! 2. Build each record's [`search_text`](Record::search_text).
//! 3. A record matches if **any** term is a substring of that text.
//! 4. Collect matches in store order and stop scanning once `cap` is reached.
//!
//! Matching is substring containment, not word matching: `doc` matches
//! `documento`. The result is a prefix of store order, not a ranking.

use crate::record::Record;

/// Maximum number of records passed to the generator per query.
pub const DEFAULT_MATCH_CAP: usize = 5;

/// Normalizes a query into its distinct lower-case terms.
///
/// Order of first occurrence is kept. An empty or all-whitespace query
/// yields no terms.
pub fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for term in query.to_lowercase().split_whitespace() {
        if !terms.iter().any(|t| t == term) {
            terms.push(term.to_string());
        }
    }
    terms
}

/// Returns up to `cap` records matching any term of `query`, in store order.
pub fn match_records(query: &str, records: &[Record], cap: usize) -> Vec<Record> {
    match_terms(&query_terms(query), records, cap)
}

/// Same as [`match_records`] over already-normalized terms.
///
/// Records after the `cap`-th match are never inspected.
pub fn match_terms(terms: &[String], records: &[Record], cap: usize) -> Vec<Record> {
    let mut matches = Vec::new();
    if terms.is_empty() || cap == 0 {
        return matches;
    }

    for record in records {
        let text = record.search_text();
        if terms.iter().any(|term| text.contains(term.as_str())) {
            matches.push(record.clone());
            if matches.len() >= cap {
                break;
            }
        }
    }

    matches
}

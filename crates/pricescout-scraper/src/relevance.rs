//! Post-extraction relevance trimming.
//!
//! Store search pages routinely pad results with accessories or
//! "customers also bought" tiles. The filter here is advisory: it narrows
//! a result set but never empties it.

use pricescout_core::Product;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "the", "or", "for", "with", "without", "of", "in", "on", "to", "at", "by",
    "from", "new", "best", "cheap", "buy", "sale", "price", "deal", "deals", "offer", "offers",
];

/// Lowercased query tokens that carry meaning: stop words and
/// single-character tokens are dropped.
#[must_use]
pub fn query_tokens(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|t| t.chars().count() > 1 && !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// Returns `true` if `name` contains at least one token as a substring, or
/// if there are no tokens at all.
#[must_use]
pub fn is_relevant(name: &str, tokens: &[String]) -> bool {
    if tokens.is_empty() {
        return true;
    }
    let lower = name.to_lowercase();
    tokens.iter().any(|t| lower.contains(t.as_str()))
}

/// Keeps the products whose name matches `query`.
///
/// When nothing would survive, the input is returned untouched.
#[must_use]
pub fn filter_relevant(products: Vec<Product>, query: &str) -> Vec<Product> {
    let tokens = query_tokens(query);
    if tokens.is_empty() {
        return products;
    }

    let total = products.len();
    let (relevant, rest): (Vec<Product>, Vec<Product>) = products
        .into_iter()
        .partition(|p| is_relevant(&p.name, &tokens));

    if relevant.is_empty() {
        tracing::debug!(
            query,
            total,
            "relevance filter would drop every product; keeping unfiltered set"
        );
        return rest;
    }

    tracing::debug!(
        query,
        kept = relevant.len(),
        total,
        "applied relevance filter"
    );
    relevant
}

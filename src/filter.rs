// src/filter.rs
//! Keyword filter: plain case-insensitive substring match on titles.
//! Partial words match on purpose ("kantin" hits "Kantine").

use crate::extract::RawItem;
use crate::store::Match;

/// Keep items whose title contains any keyword, preserving input order.
/// Keywords are only lower-cased; whitespace is part of the keyword.
pub fn filter<S: AsRef<str>>(items: &[RawItem], keywords: &[S]) -> Vec<Match> {
    let lower_keywords: Vec<String> = keywords
        .iter()
        .map(|k| k.as_ref().to_lowercase())
        .collect();

    let mut out = Vec::new();
    for item in items {
        let title = item.title.to_lowercase();
        if lower_keywords.iter().any(|k| title.contains(k.as_str())) {
            tracing::info!(title = %item.title, date = %item.date, "relevant match found");
            out.push(Match::new(item.title.clone(), item.date.clone()));
        }
    }
    out
}

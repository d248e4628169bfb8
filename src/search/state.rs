//! Search presentation state

use std::fmt;

use crate::types::{ResultId, SearchResult};

/// What the search view should show.
///
/// Replaced wholesale on every transition. Two `Results` values are equal
/// when they hold the same result ids in the same order; scores and text
/// are not compared.
#[derive(Debug, Clone, Default)]
pub enum SearchState {
    #[default]
    Idle,
    Loading,
    Results(Vec<SearchResult>),
    /// No matches for the trimmed query
    Empty(String),
    Error(String),
}

impl SearchState {
    /// Result ids in display order; empty for non-`Results` states
    pub fn result_ids(&self) -> Vec<ResultId> {
        match self {
            Self::Results(results) => results.iter().map(SearchResult::id).collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

impl PartialEq for SearchState {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Idle, Self::Idle) | (Self::Loading, Self::Loading) => true,
            (Self::Results(a), Self::Results(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.id() == y.id())
            }
            (Self::Empty(a), Self::Empty(b)) => a == b,
            (Self::Error(a), Self::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for SearchState {}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Loading => f.write_str("searching..."),
            Self::Results(results) => write!(f, "{} results", results.len()),
            Self::Empty(query) => write!(f, "no results for \"{}\"", query),
            Self::Error(message) => write!(f, "error: {}", message),
        }
    }
}

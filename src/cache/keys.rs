//! Query key definitions.
//!
//! A `QueryKey` identifies one remote read (operation plus parameters). Keys
//! of different kinds never collide, so invalidating a detail entry can never
//! reach a list or search entry.

use std::fmt;

/// The remote operation a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    List,
    Detail,
    Search,
}

impl QueryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::List => "list",
            QueryKind::Detail => "detail",
            QueryKind::Search => "search",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical key of a cached read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// The full restaurant list.
    List,
    /// One restaurant detail, keyed by identifier.
    Detail(String),
    /// One search, keyed by the query exactly as entered.
    Search(String),
}

impl QueryKey {
    pub fn detail(id: impl Into<String>) -> Self {
        QueryKey::Detail(id.into())
    }

    pub fn search(query: impl Into<String>) -> Self {
        QueryKey::Search(query.into())
    }

    pub fn kind(&self) -> QueryKind {
        match self {
            QueryKey::List => QueryKind::List,
            QueryKey::Detail(_) => QueryKind::Detail,
            QueryKey::Search(_) => QueryKind::Search,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::List => f.write_str("restaurants/list"),
            QueryKey::Detail(id) => write!(f, "restaurants/detail/{id}"),
            QueryKey::Search(query) => write!(f, "restaurants/search/{query}"),
        }
    }
}

//! Tree error types

use std::fmt;

/// Structural limit enforced by the path trie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// Number of tokens in a path (separators count as tokens)
    PathSegments,
    /// Length of a path in bytes
    PathSize,
    /// Number of members attached at one node
    MembersAtLevel,
}

impl Limit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Limit::PathSegments => "path segments",
            Limit::PathSize => "path size",
            Limit::MembersAtLevel => "members at level",
        }
    }
}

/// Errors raised by tree mutations
///
/// Every error is raised before the tree is touched, so a failed insertion
/// never leaves a partial branch behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// A configured structural limit would be exceeded
    LimitExceeded {
        limit: Limit,
        max: usize,
        actual: usize,
    },
    /// Path contains no tokens
    EmptyPath,
    /// Multi-level wildcard used anywhere but the final token
    MisplacedWildcard,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LimitExceeded { limit, max, actual } => write!(
                f,
                "limit exceeded: {} is {} (max {})",
                limit.as_str(),
                actual,
                max
            ),
            Self::EmptyPath => write!(f, "path cannot be empty"),
            Self::MisplacedWildcard => write!(f, "multi-level wildcard must be the last token"),
        }
    }
}

impl std::error::Error for TreeError {}

impl TreeError {
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(self, Self::LimitExceeded { .. })
    }
}

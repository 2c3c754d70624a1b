//! Error types for the Guidepost domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Guidepost operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Registry errors ---
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    // --- Matching errors ---
    #[error("Match error: {0}")]
    Match(#[from] MatchError),

    // --- Content errors ---
    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    // --- Router errors ---
    #[error("Router error: {0}")]
    Router(#[from] RouterError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Taxonomy validation failures. Fatal at build time: a registry is either
/// fully constructed or not constructed at all.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    #[error("Duplicate skill id: {0}")]
    DuplicateId(String),

    #[error("Skill '{parent}' references undefined child '{child}'")]
    DanglingReference { parent: String, child: String },

    #[error("Cycle detected through skill '{0}'")]
    CycleDetected(String),

    #[error("Skill '{child}' has multiple parents ('{first}' and '{second}')")]
    MultipleParents {
        child: String,
        first: String,
        second: String,
    },

    #[error("Taxonomy contains no skills")]
    Empty,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MatchError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// Content loading failures. Every variant names the ref that failed so
/// callers can report which unit was unavailable, not a generic failure.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ContentError {
    #[error("Content not found: {ref_}")]
    NotFound { ref_: String },

    #[error("I/O failure loading '{ref_}': {reason}")]
    Io { ref_: String, reason: String },

    #[error("Timed out loading '{ref_}' after {secs}s")]
    Timeout { ref_: String, secs: u64 },
}

impl ContentError {
    /// The content ref this error refers to.
    pub fn ref_(&self) -> &str {
        match self {
            Self::NotFound { ref_ } | Self::Io { ref_, .. } | Self::Timeout { ref_, .. } => ref_,
        }
    }

    /// Whether a retry after cache invalidation could plausibly succeed.
    /// `NotFound` is definitive; I/O failures and timeouts are transient.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::NotFound { .. })
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RouterError {
    #[error("Unknown skill id: {0}")]
    UnknownSkill(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_error_displays_correctly() {
        let err = Error::Registry(RegistryError::DanglingReference {
            parent: "sql".into(),
            child: "sql.ghost".into(),
        });
        assert!(err.to_string().contains("sql.ghost"));
        assert!(err.to_string().contains("undefined"));
    }

    #[test]
    fn content_error_names_the_ref() {
        let err = ContentError::Io {
            ref_: "sql/optimizer.md".into(),
            reason: "permission denied".into(),
        };
        assert_eq!(err.ref_(), "sql/optimizer.md");
        assert!(err.to_string().contains("sql/optimizer.md"));
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn not_found_is_not_transient() {
        let not_found = ContentError::NotFound {
            ref_: "missing.md".into(),
        };
        let io = ContentError::Io {
            ref_: "flaky.md".into(),
            reason: "reset".into(),
        };
        let timeout = ContentError::Timeout {
            ref_: "slow.md".into(),
            secs: 5,
        };
        assert!(!not_found.is_transient());
        assert!(io.is_transient());
        assert!(timeout.is_transient());
    }
}

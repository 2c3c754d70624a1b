//! Request and response payloads — the externally visible surface.

use serde::{Deserialize, Serialize};

use crate::skill::SkillId;

/// A single routing request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Free-text user intent.
    pub query: String,

    /// Explicit skill override — bypasses matching entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_id: Option<SkillId>,

    /// Per-request output budget override, in characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<usize>,
}

impl Request {
    pub fn query(text: impl Into<String>) -> Self {
        Self {
            query: text.into(),
            skill_id: None,
            budget: None,
        }
    }

    pub fn with_skill(mut self, id: impl Into<SkillId>) -> Self {
        self.skill_id = Some(id.into());
        self
    }

    pub fn with_budget(mut self, chars: usize) -> Self {
        self.budget = Some(chars);
        self
    }
}

/// The outcome of a routing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// One skill selected; content attached.
    Resolved,
    /// Top candidates scored too close to pick one; candidates attached,
    /// no content loaded.
    Ambiguous,
    /// The request failed; error attached.
    Error,
}

/// One entry in a disambiguation listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub id: SkillId,
    pub title: String,
    pub summary: String,
    pub score: f32,
}

/// Machine-readable failure category, stable across message wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidQuery,
    UnknownSkill,
    ContentUnavailable,
}

/// A failure attached to an error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

/// The structured response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,

    /// Unique id for correlating logs with this request.
    pub request_id: String,

    /// The selected skill (resolved only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<SkillId>,

    /// Assembled content (resolved) or disambiguation listing (ambiguous).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Whether any content was cut to fit the budget (resolved only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncated: Option<bool>,

    /// Ranked near-tie candidates (ambiguous only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<CandidateSummary>,

    /// Failure details (error only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

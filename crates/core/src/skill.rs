//! Skill taxonomy types — the addressable units of curated guidance.
//!
//! A skill is one node in a curated tree: a set of trigger patterns that
//! signal relevance, references to the documents that back it, and ordered
//! child skills for narrower topics. `SkillDef` is the raw shape supplied
//! by the taxonomy source (TOML/JSON); the registry turns definitions into
//! validated `SkillNode`s.

use serde::{Deserialize, Serialize};

/// Stable, path-like skill identifier (e.g. `sql.optimizer`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillId(pub String);

impl SkillId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SkillId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SkillId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SkillId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// How a trigger pattern participates in scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Exact phrase — highest weight when found verbatim in the query.
    #[default]
    Phrase,
    /// Keyword set — contributes via token overlap with the query.
    Keyword,
    /// Negative — subtracts from the score when matched.
    Negative,
}

/// A single relevance cue declared on a skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    /// The phrase or keyword pattern, matched case-insensitively.
    pub pattern: String,

    /// How this pattern participates in scoring.
    #[serde(default)]
    pub kind: TriggerKind,
}

impl Trigger {
    pub fn phrase(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            kind: TriggerKind::Phrase,
        }
    }

    pub fn keyword(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            kind: TriggerKind::Keyword,
        }
    }

    pub fn negative(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            kind: TriggerKind::Negative,
        }
    }
}

/// The role a content unit plays for its skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentRole {
    /// The main guidance document. Included verbatim when it fits.
    Primary,
    /// Companion worked examples.
    Examples,
    /// Companion lookup tables.
    ReferenceTable,
}

impl std::fmt::Display for ContentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Primary => "primary",
            Self::Examples => "examples",
            Self::ReferenceTable => "reference_table",
        };
        f.write_str(s)
    }
}

/// A reference to one loadable document backing a skill.
///
/// The locator is opaque to everything except the content store that
/// resolves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRef {
    #[serde(rename = "ref")]
    pub ref_: String,

    pub role: ContentRole,
}

impl ContentRef {
    pub fn new(ref_: impl Into<String>, role: ContentRole) -> Self {
        Self {
            ref_: ref_.into(),
            role,
        }
    }

    pub fn primary(ref_: impl Into<String>) -> Self {
        Self::new(ref_, ContentRole::Primary)
    }

    pub fn examples(ref_: impl Into<String>) -> Self {
        Self::new(ref_, ContentRole::Examples)
    }
}

/// A raw skill definition as supplied by the taxonomy source.
///
/// Maps directly to one `[[skills]]` table in the taxonomy file. The
/// registry validates the full set and produces `SkillNode`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDef {
    pub id: SkillId,

    pub title: String,

    #[serde(default)]
    pub summary: String,

    /// Ordered relevance cues. May be empty for pure category nodes.
    #[serde(default)]
    pub triggers: Vec<Trigger>,

    /// Ordered child skill ids. Empty for leaves.
    #[serde(default)]
    pub children: Vec<SkillId>,

    /// Ordered document references backing this skill.
    #[serde(default)]
    pub content_refs: Vec<ContentRef>,

    /// Static priority used to separate otherwise-equal scores.
    #[serde(default)]
    pub weight: f32,
}

/// A validated skill node held by the registry.
///
/// Identical in shape to `SkillDef`; the distinction is that a `SkillNode`
/// only exists inside a registry whose id graph has been verified, and it
/// carries its computed tree depth (roots are depth 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillNode {
    pub id: SkillId,
    pub title: String,
    pub summary: String,
    pub triggers: Vec<Trigger>,
    pub children: Vec<SkillId>,
    pub content_refs: Vec<ContentRef>,
    pub weight: f32,
    pub depth: usize,
}

impl SkillNode {
    /// Whether this node has no child skills.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The primary content ref, if one is declared.
    pub fn primary_ref(&self) -> Option<&ContentRef> {
        self.content_refs
            .iter()
            .find(|r| r.role == ContentRole::Primary)
    }
}

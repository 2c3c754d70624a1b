//! Response assembler — composes bounded output from loaded content.
//!
//! Takes a selected skill and its materialized content units and produces
//! a single text payload that never exceeds the character budget. The
//! primary document goes first and verbatim when it fits; companions
//! follow in the skill's declared order. When the budget runs out, the
//! last included unit is cut at a character boundary and flagged with an
//! explicit marker — nothing is ever dropped silently.
//!
//! # Determinism
//!
//! Assembly is deterministic: identical inputs always produce identical
//! output. No randomness, no time-dependent logic.

use guidepost_core::content::ContentUnit;
use guidepost_core::request::CandidateSummary;
use guidepost_core::skill::{ContentRole, SkillNode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Marker appended where content was cut.
pub const TRUNCATION_MARKER: &str = "\n[truncated]";

/// Assembly tuning.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Maximum output size in characters.
    pub max_chars: usize,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self { max_chars: 8_000 }
    }
}

/// Per-unit inclusion statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionStats {
    #[serde(rename = "ref")]
    pub ref_: String,
    pub role: ContentRole,
    /// Characters of this unit present in the output (headers excluded).
    pub chars_included: usize,
    /// Characters the unit holds in full.
    pub chars_total: usize,
}

/// A unit that did not make it into the output at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropInfo {
    #[serde(rename = "ref")]
    pub ref_: String,
    pub reason: String,
}

/// The assembled payload plus its bookkeeping.
#[derive(Debug, Clone)]
pub struct Assembled {
    pub text: String,
    /// True whenever any content was cut or dropped to fit the budget.
    pub truncated: bool,
    pub sections: Vec<SectionStats>,
    pub drops: Vec<DropInfo>,
}

/// The response assembler. Stateless — create one and reuse it.
pub struct ResponseAssembler {
    config: AssemblerConfig,
}

impl ResponseAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(AssemblerConfig::default())
    }

    /// The configured budget, overridable per call.
    fn budget(&self, override_chars: Option<usize>) -> usize {
        override_chars.unwrap_or(self.config.max_chars)
    }

    /// Compose output for an unambiguously selected skill.
    ///
    /// `units` must be the loaded counterparts of `node.content_refs`, in
    /// any order; output follows the declared ref order.
    pub fn assemble(
        &self,
        node: &SkillNode,
        units: &[Arc<ContentUnit>],
        budget_override: Option<usize>,
    ) -> Assembled {
        let budget = self.budget(budget_override);
        let marker_chars = TRUNCATION_MARKER.chars().count();

        let mut text = String::new();
        let mut used = 0usize;
        let mut truncated = false;
        let mut sections: Vec<SectionStats> = Vec::new();
        let mut drops: Vec<DropInfo> = Vec::new();

        for (index, content_ref) in node.content_refs.iter().enumerate() {
            let Some(unit) = units.iter().find(|u| u.ref_ == content_ref.ref_) else {
                continue;
            };

            // Companions get a role header; the primary document leads bare.
            let header = if index == 0 {
                String::new()
            } else {
                format!("\n\n[{}] {}\n", content_ref.role, content_ref.ref_)
            };
            let header_chars = header.chars().count();
            let remaining = budget.saturating_sub(used);

            if truncated || remaining <= header_chars + marker_chars {
                // Nothing meaningful fits anymore.
                truncated = true;
                drops.push(DropInfo {
                    ref_: content_ref.ref_.clone(),
                    reason: "budget exhausted".into(),
                });
                continue;
            }

            let room_for_body = remaining - header_chars;
            if unit.chars <= room_for_body {
                text.push_str(&header);
                text.push_str(&unit.body);
                used += header_chars + unit.chars;
                sections.push(SectionStats {
                    ref_: content_ref.ref_.clone(),
                    role: content_ref.role,
                    chars_included: unit.chars,
                    chars_total: unit.chars,
                });
            } else {
                // Cut this unit at a char boundary and flag it.
                let keep = room_for_body - marker_chars;
                let cut: String = unit.body.chars().take(keep).collect();
                let cut_chars = cut.chars().count();
                text.push_str(&header);
                text.push_str(&cut);
                text.push_str(TRUNCATION_MARKER);
                used += header_chars + cut_chars + marker_chars;
                truncated = true;
                sections.push(SectionStats {
                    ref_: content_ref.ref_.clone(),
                    role: content_ref.role,
                    chars_included: cut_chars,
                    chars_total: unit.chars,
                });
            }
        }

        Assembled {
            text,
            truncated,
            sections,
            drops,
        }
    }

    /// Compose a disambiguation listing: ranked titles and summaries, no
    /// full content. The caller resolves the ambiguity before anything is
    /// loaded.
    pub fn assemble_ambiguous(
        &self,
        candidates: &[CandidateSummary],
        budget_override: Option<usize>,
    ) -> Assembled {
        let budget = self.budget(budget_override);

        let mut text = String::from("Multiple skills match; pick one:\n");
        for (rank, candidate) in candidates.iter().enumerate() {
            let line = if candidate.summary.is_empty() {
                format!("{}. {} ({:.2})\n", rank + 1, candidate.id, candidate.score)
            } else {
                format!(
                    "{}. {} ({:.2})\n   {}\n",
                    rank + 1,
                    candidate.id,
                    candidate.score,
                    candidate.summary
                )
            };
            text.push_str(&line);
        }

        let total = text.chars().count();
        let truncated = total > budget;
        if truncated {
            let marker_chars = TRUNCATION_MARKER.chars().count();
            let keep = budget.saturating_sub(marker_chars);
            text = text.chars().take(keep).collect();
            text.push_str(TRUNCATION_MARKER);
        }

        Assembled {
            text,
            truncated,
            sections: Vec::new(),
            drops: Vec::new(),
        }
    }
}

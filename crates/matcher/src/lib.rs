//! Trigger matcher — scores free-text intent against every skill.
//!
//! Scoring is a weighted sum per node: exact-phrase hits of declared
//! triggers (highest weight), keyword-overlap ratio between the tokenized
//! query and the node's trigger token set (medium weight), and the node's
//! static weight scaled down to a separator term. Negative triggers
//! subtract. Ties order by tree depth (the more specific node wins), then
//! lexicographically by id.
//!
//! # Determinism
//!
//! Identical query + identical registry always yields byte-identical
//! ranked output. Candidates are enumerated in the registry's stable
//! depth-first order and compared with a total order — no hash-map
//! iteration, no randomness.

use guidepost_core::error::MatchError;
use guidepost_core::skill::{SkillId, TriggerKind};
use guidepost_registry::Registry;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Matching weights and the ambiguity threshold.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Score added per exact phrase hit.
    pub phrase_weight: f32,
    /// Multiplier for the keyword-overlap ratio.
    pub overlap_weight: f32,
    /// Score subtracted per matched negative trigger.
    pub negative_weight: f32,
    /// Multiplier for a node's static weight.
    pub weight_factor: f32,
    /// Ranking is ambiguous when (top - second) < epsilon * top.
    pub ambiguity_epsilon: f32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            phrase_weight: 3.0,
            overlap_weight: 1.0,
            negative_weight: 2.0,
            weight_factor: 0.01,
            ambiguity_epsilon: 0.10,
        }
    }
}

/// One trigger that fired during scoring, and what it contributed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerHit {
    pub pattern: String,
    pub kind: TriggerKind,
    /// Signed score contribution (negative for negative triggers).
    pub contribution: f32,
}

/// Per-node scoring outcome. Ephemeral: produced per request, consumed by
/// the router, then discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub id: SkillId,
    pub score: f32,
    pub depth: usize,
    pub matched_triggers: Vec<TriggerHit>,
}

/// The full ranked candidate list for one query.
#[derive(Debug, Clone)]
pub struct Ranking {
    /// Highest score first. Never empty while the registry has nodes.
    pub results: Vec<MatchResult>,
    /// True when the top two scores are within the configured epsilon, or
    /// when nothing scored at all — either way the caller should present
    /// candidates instead of committing to one skill.
    pub ambiguous: bool,
}

impl Ranking {
    /// The winning candidate.
    pub fn top(&self) -> &MatchResult {
        &self.results[0]
    }
}

/// Scores queries against a registry. Stateless — create one and reuse it.
pub struct TriggerMatcher {
    config: MatcherConfig,
}

impl TriggerMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(MatcherConfig::default())
    }

    /// Rank every node in the registry against a query.
    ///
    /// A query that is empty or carries no scorable tokens is rejected
    /// before any scoring happens.
    pub fn rank(&self, registry: &Registry, query: &str) -> Result<Ranking, MatchError> {
        if query.trim().is_empty() {
            return Err(MatchError::InvalidQuery("query is empty".into()));
        }

        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Err(MatchError::InvalidQuery(
                "query contains no matchable words".into(),
            ));
        }

        let mut results: Vec<MatchResult> = registry
            .nodes_depth_first()
            .map(|node| self.score_node(node, &query_tokens))
            .collect();

        // Total order: score desc, depth desc (specific beats general),
        // id asc. f32 via total_cmp keeps the comparator consistent.
        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.depth.cmp(&a.depth))
                .then_with(|| a.id.cmp(&b.id))
        });

        let ambiguous = self.is_ambiguous(&results);

        debug!(
            candidates = results.len(),
            top = %results[0].id,
            top_score = results[0].score,
            ambiguous,
            "Query ranked"
        );

        Ok(Ranking { results, ambiguous })
    }

    fn score_node(
        &self,
        node: &guidepost_core::SkillNode,
        query_tokens: &[String],
    ) -> MatchResult {
        let mut score = 0.0f32;
        let mut hits: Vec<TriggerHit> = Vec::new();

        // The node's keyword set: every token of every non-negative trigger.
        let mut trigger_set: Vec<String> = Vec::new();
        for trigger in &node.triggers {
            if trigger.kind != TriggerKind::Negative {
                for token in tokenize(&trigger.pattern) {
                    if !trigger_set.contains(&token) {
                        trigger_set.push(token);
                    }
                }
            }
        }

        for trigger in &node.triggers {
            let pattern_tokens = tokenize(&trigger.pattern);
            if pattern_tokens.is_empty() {
                continue;
            }

            match trigger.kind {
                TriggerKind::Phrase => {
                    if contains_phrase(query_tokens, &pattern_tokens) {
                        score += self.config.phrase_weight;
                        hits.push(TriggerHit {
                            pattern: trigger.pattern.clone(),
                            kind: TriggerKind::Phrase,
                            contribution: self.config.phrase_weight,
                        });
                    }
                }
                TriggerKind::Negative => {
                    if contains_phrase(query_tokens, &pattern_tokens) {
                        score -= self.config.negative_weight;
                        hits.push(TriggerHit {
                            pattern: trigger.pattern.clone(),
                            kind: TriggerKind::Negative,
                            contribution: -self.config.negative_weight,
                        });
                    }
                }
                TriggerKind::Keyword => {
                    let overlapping = pattern_tokens
                        .iter()
                        .filter(|t| query_tokens.contains(t))
                        .count();
                    if overlapping > 0 {
                        let share = self.config.overlap_weight * overlapping as f32
                            / trigger_set.len() as f32;
                        hits.push(TriggerHit {
                            pattern: trigger.pattern.clone(),
                            kind: TriggerKind::Keyword,
                            contribution: share,
                        });
                    }
                }
            }
        }

        // Keyword-overlap ratio over the whole trigger set, phrase tokens
        // included: a near-miss phrase still counts through its words.
        if !trigger_set.is_empty() {
            let overlap = trigger_set
                .iter()
                .filter(|t| query_tokens.contains(t))
                .count();
            score += self.config.overlap_weight * overlap as f32 / trigger_set.len() as f32;
        }

        score += self.config.weight_factor * node.weight;

        MatchResult {
            id: node.id.clone(),
            score,
            depth: node.depth,
            matched_triggers: hits,
        }
    }

    fn is_ambiguous(&self, results: &[MatchResult]) -> bool {
        let top = results[0].score;
        if top <= 0.0 {
            // Nothing matched; there is no basis to commit to a skill.
            return true;
        }
        match results.get(1) {
            Some(second) => (top - second.score) < self.config.ambiguity_epsilon * top,
            None => false,
        }
    }
}

/// Lowercased alphanumeric tokens, in order, plural-normalized.
///
/// Queries and trigger patterns pass through the same pipeline, so the
/// normalization only has to be consistent, not linguistically exact.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(normalize_token)
        .collect()
}

/// Fold simple English plurals: "queries" and "query" must score alike.
fn normalize_token(token: &str) -> String {
    if token.len() > 4 {
        if let Some(stem) = token.strip_suffix("ies") {
            return format!("{stem}y");
        }
    }
    if token.len() > 3 && !token.ends_with("ss") {
        if let Some(stem) = token.strip_suffix('s') {
            return stem.to_string();
        }
    }
    token.to_string()
}

/// Whether `pattern` occurs as a contiguous token run inside `haystack`.
fn contains_phrase(haystack: &[String], pattern: &[String]) -> bool {
    if pattern.is_empty() || pattern.len() > haystack.len() {
        return false;
    }
    haystack.windows(pattern.len()).any(|w| w == pattern)
}

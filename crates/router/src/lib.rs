//! Router — the single-request orchestration facade.
//!
//! One call to [`Router::route`] walks the whole pipeline: rank skills
//! against the query, resolve the winner (or stop at a disambiguation
//! listing), materialize the winner's documents, and assemble the bounded
//! payload.
//!
//! # Request lifecycle
//!
//! `Received → Matching → (Ambiguous | Resolved) → Loading → Assembling →
//! Completed`, with `Failed` reachable from any stage. Matching is pure
//! and deterministic, so it is never retried; a transient loading failure
//! gets exactly one retry after cache invalidation before it surfaces.

use std::sync::Arc;
use std::time::Duration;

use guidepost_assembler::ResponseAssembler;
use guidepost_core::content::ContentUnit;
use guidepost_core::error::{ContentError, MatchError};
use guidepost_core::request::{CandidateSummary, ErrorInfo, ErrorKind, Request, Response, Status};
use guidepost_core::skill::{SkillDef, SkillNode};
use guidepost_loader::ContentLoader;
use guidepost_matcher::{Ranking, TriggerMatcher};
use guidepost_registry::{Registry, SharedRegistry};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Stages a request moves through. Logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Received,
    Matching,
    Ambiguous,
    Resolved,
    Loading,
    Assembling,
    Completed,
    Failed,
}

impl std::fmt::Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Received => "received",
            Self::Matching => "matching",
            Self::Ambiguous => "ambiguous",
            Self::Resolved => "resolved",
            Self::Loading => "loading",
            Self::Assembling => "assembling",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Router tuning.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Upper bound on a single backing fetch.
    pub fetch_timeout: Duration,
    /// Maximum entries in a disambiguation listing.
    pub max_candidates: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
            max_candidates: 5,
        }
    }
}

/// The facade over registry, matcher, loader, and assembler.
pub struct Router {
    registry: Arc<SharedRegistry>,
    matcher: TriggerMatcher,
    loader: ContentLoader,
    assembler: ResponseAssembler,
    config: RouterConfig,
}

impl Router {
    pub fn new(
        registry: Arc<SharedRegistry>,
        matcher: TriggerMatcher,
        loader: ContentLoader,
        assembler: ResponseAssembler,
        config: RouterConfig,
    ) -> Self {
        Self {
            registry,
            matcher,
            loader,
            assembler,
            config,
        }
    }

    /// Serve one request end to end.
    ///
    /// Never panics and never returns a bare error: every failure becomes
    /// a `Status::Error` response naming what went wrong.
    pub async fn route(&self, request: Request) -> Response {
        let request_id = Uuid::new_v4().to_string();

        let mut state = RequestState::Received;
        debug!(%request_id, state = %state, query = %request.query, "Request received");

        // A reload during the request cannot disturb this snapshot.
        let registry = self.registry.current();

        // Explicit skill override bypasses matching entirely.
        let node = if let Some(id) = &request.skill_id {
            match registry.get(id) {
                Some(node) => node.clone(),
                None => {
                    return self.fail(
                        &request_id,
                        RequestState::Received,
                        ErrorKind::UnknownSkill,
                        format!("no skill with id '{id}'"),
                    );
                }
            }
        } else {
            state = RequestState::Matching;
            debug!(%request_id, state = %state, "Ranking candidates");

            let ranking = match self.matcher.rank(&registry, &request.query) {
                Ok(ranking) => ranking,
                Err(MatchError::InvalidQuery(reason)) => {
                    return self.fail(
                        &request_id,
                        state,
                        ErrorKind::InvalidQuery,
                        format!("invalid query: {reason}"),
                    );
                }
            };

            if ranking.ambiguous {
                state = RequestState::Ambiguous;
                debug!(%request_id, state = %state, "Near-tie, returning candidates");
                return self.respond_ambiguous(&request_id, &registry, &ranking, &request);
            }

            let top = ranking.top();
            match registry.get(&top.id) {
                Some(node) => node.clone(),
                None => {
                    // Ranking derives from this same snapshot, so a miss
                    // would mean registry corruption; surface it anyway.
                    return self.fail(
                        &request_id,
                        state,
                        ErrorKind::UnknownSkill,
                        format!("ranked skill '{}' is not registered", top.id),
                    );
                }
            }
        };

        state = RequestState::Resolved;
        info!(%request_id, state = %state, skill = %node.id, "Skill selected");

        state = RequestState::Loading;
        let units = match self.load_all(&node).await {
            Ok(units) => units,
            Err(e) => {
                return self.fail(
                    &request_id,
                    state,
                    ErrorKind::ContentUnavailable,
                    e.to_string(),
                );
            }
        };

        state = RequestState::Assembling;
        debug!(%request_id, state = %state, units = units.len(), "Assembling response");
        let assembled = self.assembler.assemble(&node, &units, request.budget);

        state = RequestState::Completed;
        info!(
            %request_id,
            state = %state,
            skill = %node.id,
            chars = assembled.text.chars().count(),
            truncated = assembled.truncated,
            "Request completed"
        );

        Response {
            status: Status::Resolved,
            request_id,
            skill: Some(node.id.clone()),
            content: Some(assembled.text),
            truncated: Some(assembled.truncated),
            candidates: vec![],
            error: None,
        }
    }

    /// Rebuild the registry from new definitions and swap it in. In-flight
    /// requests keep the snapshot they started with.
    pub fn reload(
        &self,
        defs: Vec<SkillDef>,
    ) -> Result<(), guidepost_core::error::RegistryError> {
        self.registry.reload(defs)
    }

    /// Load every content unit a node declares, in declared order.
    ///
    /// Transient failures get one retry after invalidation; a missing
    /// document fails immediately. Either way the failing ref is named.
    async fn load_all(&self, node: &SkillNode) -> Result<Vec<Arc<ContentUnit>>, ContentError> {
        let mut units = Vec::with_capacity(node.content_refs.len());
        for content_ref in &node.content_refs {
            let unit = match self
                .loader
                .load_with_timeout(&content_ref.ref_, self.config.fetch_timeout)
                .await
            {
                Ok(unit) => unit,
                Err(e) if e.is_transient() => {
                    warn!(content_ref = %content_ref.ref_, error = %e, "Transient load failure, retrying once");
                    self.loader.invalidate(&content_ref.ref_);
                    self.loader
                        .load_with_timeout(&content_ref.ref_, self.config.fetch_timeout)
                        .await?
                }
                Err(e) => return Err(e),
            };
            units.push(unit);
        }
        Ok(units)
    }

    fn respond_ambiguous(
        &self,
        request_id: &str,
        registry: &Registry,
        ranking: &Ranking,
        request: &Request,
    ) -> Response {
        let candidates = self.pick_candidates(registry, ranking);
        let assembled = self.assembler.assemble_ambiguous(&candidates, request.budget);

        Response {
            status: Status::Ambiguous,
            request_id: request_id.to_string(),
            skill: None,
            content: Some(assembled.text),
            truncated: Some(assembled.truncated),
            candidates,
            error: None,
        }
    }

    /// The disambiguation slate: everything scoring close to the top, in
    /// rank order, capped.
    fn pick_candidates(&self, registry: &Registry, ranking: &Ranking) -> Vec<CandidateSummary> {
        let top_score = ranking.top().score;
        ranking
            .results
            .iter()
            .take(self.config.max_candidates)
            .filter(|r| top_score <= 0.0 || r.score >= top_score * 0.5)
            .filter_map(|r| {
                registry.get(&r.id).map(|node| CandidateSummary {
                    id: node.id.clone(),
                    title: node.title.clone(),
                    summary: node.summary.clone(),
                    score: r.score,
                })
            })
            .collect()
    }

    fn fail(
        &self,
        request_id: &str,
        state: RequestState,
        kind: ErrorKind,
        message: String,
    ) -> Response {
        warn!(%request_id, state = %state, terminal = %RequestState::Failed, error = %message, "Request failed");
        Response {
            status: Status::Error,
            request_id: request_id.to_string(),
            skill: None,
            content: None,
            truncated: None,
            candidates: vec![],
            error: Some(ErrorInfo { kind, message }),
        }
    }
}

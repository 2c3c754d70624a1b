//! End-to-end integration tests for the Guidepost routing pipeline.
//!
//! These tests exercise the full path from free-text intent to assembled
//! output: registry build, trigger ranking, content loading with caching,
//! and budget-bounded assembly.

use std::sync::Arc;
use std::time::Duration;

use guidepost_assembler::{AssemblerConfig, ResponseAssembler};
use guidepost_core::request::{ErrorKind, Request, Status};
use guidepost_core::skill::{ContentRef, SkillDef, Trigger};
use guidepost_loader::{ContentLoader, FsContentStore, InMemoryStore, LoaderConfig};
use guidepost_matcher::{MatcherConfig, TriggerMatcher};
use guidepost_registry::{Registry, SharedRegistry};
use guidepost_router::{Router, RouterConfig};

// ── Fixtures ─────────────────────────────────────────────────────────────

fn leaf(id: &str, triggers: Vec<Trigger>, refs: Vec<ContentRef>) -> SkillDef {
    SkillDef {
        id: id.into(),
        title: format!("Title for {id}"),
        summary: format!("Summary for {id}"),
        triggers,
        children: vec![],
        content_refs: refs,
        weight: 0.0,
    }
}

fn category(id: &str, children: &[&str]) -> SkillDef {
    SkillDef {
        id: id.into(),
        title: format!("Category {id}"),
        summary: format!("Guides under {id}"),
        triggers: vec![],
        children: children.iter().map(|c| (*c).into()).collect(),
        content_refs: vec![],
        weight: 0.0,
    }
}

/// A small two-category taxonomy: SQL guidance and spreadsheet guidance.
fn taxonomy() -> Vec<SkillDef> {
    vec![
        category("sql", &["sql.optimizer", "sql.debugger"]),
        leaf(
            "sql.optimizer",
            vec![
                Trigger::phrase("this query is slow"),
                Trigger::keyword("optimize index performance"),
            ],
            vec![
                ContentRef::primary("sql/optimizer.md"),
                ContentRef::examples("sql/optimizer-examples.md"),
            ],
        ),
        leaf(
            "sql.debugger",
            vec![
                Trigger::phrase("this query is failing"),
                Trigger::keyword("wrong results error"),
            ],
            vec![ContentRef::primary("sql/debugger.md")],
        ),
        category("spreadsheets", &["spreadsheets.formulas"]),
        leaf(
            "spreadsheets.formulas",
            vec![
                Trigger::phrase("vlookup"),
                Trigger::keyword("formula cell spreadsheet"),
            ],
            vec![ContentRef::primary("spreadsheets/formulas.md")],
        ),
    ]
}

fn store() -> InMemoryStore {
    InMemoryStore::new()
        .with_doc("sql/optimizer.md", "# Query Optimization\nAdd a covering index.")
        .with_doc("sql/optimizer-examples.md", "EXPLAIN ANALYZE SELECT ...")
        .with_doc("sql/debugger.md", "# Query Debugging\nBisect the predicate.")
        .with_doc("spreadsheets/formulas.md", "# Formulas\nUse VLOOKUP for joins.")
}

fn build_router(store: Arc<InMemoryStore>, defs: Vec<SkillDef>) -> Router {
    let registry = Arc::new(SharedRegistry::new(Registry::build(defs).unwrap()));
    Router::new(
        registry,
        TriggerMatcher::new(MatcherConfig::default()),
        ContentLoader::new(store, LoaderConfig::default()),
        ResponseAssembler::with_defaults(),
        RouterConfig {
            fetch_timeout: Duration::from_secs(2),
            ..RouterConfig::default()
        },
    )
}

// ── E2E: resolution ──────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_slow_query_resolves_to_optimizer() {
    let router = build_router(Arc::new(store()), taxonomy());

    let resp = router.route(Request::query("this query is slow")).await;

    assert_eq!(resp.status, Status::Resolved);
    assert_eq!(resp.skill.as_ref().unwrap().as_str(), "sql.optimizer");
    assert_eq!(resp.truncated, Some(false));

    let content = resp.content.unwrap();
    assert!(content.starts_with("# Query Optimization"));
    assert!(content.contains("covering index"));
    // Companion examples follow the primary document.
    assert!(content.contains("[examples] sql/optimizer-examples.md"));
    assert!(content.contains("EXPLAIN ANALYZE"));
}

#[tokio::test]
async fn e2e_distinct_intents_reach_distinct_skills() {
    let router = build_router(Arc::new(store()), taxonomy());

    let debugging = router
        .route(Request::query("this query is failing with wrong results"))
        .await;
    assert_eq!(debugging.skill.as_ref().unwrap().as_str(), "sql.debugger");

    let formulas = router
        .route(Request::query("how do I write a vlookup formula"))
        .await;
    assert_eq!(
        formulas.skill.as_ref().unwrap().as_str(),
        "spreadsheets.formulas"
    );
}

#[tokio::test]
async fn e2e_explicit_override_bypasses_matching() {
    let router = build_router(Arc::new(store()), taxonomy());

    let resp = router
        .route(Request::query("this query is slow").with_skill("spreadsheets.formulas"))
        .await;

    assert_eq!(resp.status, Status::Resolved);
    assert_eq!(resp.skill.unwrap().as_str(), "spreadsheets.formulas");
    assert!(resp.content.unwrap().contains("VLOOKUP"));
}

// ── E2E: ambiguity ───────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_near_tie_lists_candidates_and_loads_nothing() {
    let backing = Arc::new(
        InMemoryStore::new()
            .with_doc("tuning.md", "tuning body")
            .with_doc("profiling.md", "profiling body"),
    );
    let defs = vec![
        leaf(
            "perf.tuning",
            vec![Trigger::phrase("optimize query")],
            vec![ContentRef::primary("tuning.md")],
        ),
        leaf(
            "perf.profiling",
            vec![Trigger::phrase("optimize queries")],
            vec![ContentRef::primary("profiling.md")],
        ),
    ];
    let router = build_router(backing.clone(), defs);

    let resp = router.route(Request::query("optimize my query")).await;

    assert_eq!(resp.status, Status::Ambiguous);
    assert!(resp.skill.is_none());
    assert_eq!(resp.candidates.len(), 2);
    assert_eq!(resp.candidates[0].id.as_str(), "perf.profiling");
    assert_eq!(resp.candidates[1].id.as_str(), "perf.tuning");

    let listing = resp.content.unwrap();
    assert!(listing.contains("perf.tuning"));
    assert!(listing.contains("perf.profiling"));
    assert!(!listing.contains("tuning body"));

    // Disambiguation must not cost a single fetch.
    assert_eq!(backing.fetch_count(), 0);
}

#[tokio::test]
async fn e2e_unmatched_intent_presents_candidates_instead_of_guessing() {
    let router = build_router(Arc::new(store()), taxonomy());

    let resp = router.route(Request::query("bake sourdough bread")).await;
    assert_eq!(resp.status, Status::Ambiguous);
    assert!(!resp.candidates.is_empty());
}

// ── E2E: budget ──────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_budget_truncation_is_flagged_and_bounded() {
    let router = build_router(Arc::new(store()), taxonomy());

    let resp = router
        .route(Request::query("this query is slow").with_budget(30))
        .await;

    assert_eq!(resp.status, Status::Resolved);
    assert_eq!(resp.truncated, Some(true));
    let content = resp.content.unwrap();
    assert!(content.chars().count() <= 30);
    assert!(content.contains("[truncated]"));
}

// ── E2E: failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_empty_query_rejected_as_invalid_input() {
    let router = build_router(Arc::new(store()), taxonomy());

    let resp = router.route(Request::query("")).await;
    assert_eq!(resp.status, Status::Error);
    assert_eq!(resp.error.unwrap().kind, ErrorKind::InvalidQuery);
}

#[tokio::test]
async fn e2e_missing_document_reports_which_unit_failed() {
    let backing = Arc::new(InMemoryStore::new()); // nothing stored
    let router = build_router(backing, taxonomy());

    let resp = router.route(Request::query("this query is slow")).await;
    assert_eq!(resp.status, Status::Error);
    let error = resp.error.unwrap();
    assert_eq!(error.kind, ErrorKind::ContentUnavailable);
    assert!(error.message.contains("sql/optimizer.md"));
}

#[tokio::test]
async fn e2e_malformed_taxonomy_never_becomes_a_registry() {
    let defs = vec![category("a", &["b"]), category("b", &["a"])];
    assert!(Registry::build(defs).is_err());
}

// ── E2E: caching across requests ─────────────────────────────────────────

#[tokio::test]
async fn e2e_repeat_requests_hit_the_cache() {
    let backing = Arc::new(store());
    let router = Arc::new(build_router(backing.clone(), taxonomy()));

    for _ in 0..5 {
        let resp = router.route(Request::query("this query is slow")).await;
        assert_eq!(resp.status, Status::Resolved);
    }

    // Two refs back the optimizer; each is fetched once, ever.
    assert_eq!(backing.fetch_count(), 2);
}

#[tokio::test]
async fn e2e_concurrent_requests_collapse_fetches() {
    let backing = Arc::new(store());
    let router = Arc::new(build_router(backing.clone(), taxonomy()));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let router = router.clone();
        handles.push(tokio::spawn(async move {
            router.route(Request::query("this query is slow")).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().status, Status::Resolved);
    }

    assert_eq!(backing.fetch_count(), 2);
}

// ── E2E: reload ──────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_reload_serves_new_taxonomy_to_new_requests() {
    let backing = Arc::new(store().with_doc("git/rebase.md", "# Rebase\nUse --onto."));
    let router = build_router(backing, taxonomy());

    router
        .reload(vec![leaf(
            "git.rebase",
            vec![Trigger::phrase("rebase my branch")],
            vec![ContentRef::primary("git/rebase.md")],
        )])
        .unwrap();

    let resp = router.route(Request::query("rebase my branch")).await;
    assert_eq!(resp.status, Status::Resolved);
    assert_eq!(resp.skill.unwrap().as_str(), "git.rebase");

    // The previous taxonomy is gone for new requests.
    let old = router
        .route(Request::query("anything").with_skill("sql.optimizer"))
        .await;
    assert_eq!(old.status, Status::Error);
    assert_eq!(old.error.unwrap().kind, ErrorKind::UnknownSkill);
}

// ── E2E: filesystem store ────────────────────────────────────────────────

#[tokio::test]
async fn e2e_filesystem_backed_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let sql_dir = dir.path().join("sql");
    std::fs::create_dir_all(&sql_dir).unwrap();
    std::fs::write(sql_dir.join("optimizer.md"), "# Disk-backed guidance\n").unwrap();

    let registry = Arc::new(SharedRegistry::new(
        Registry::build(vec![leaf(
            "sql.optimizer",
            vec![Trigger::phrase("this query is slow")],
            vec![ContentRef::primary("sql/optimizer.md")],
        )])
        .unwrap(),
    ));
    let router = Router::new(
        registry,
        TriggerMatcher::new(MatcherConfig::default()),
        ContentLoader::new(
            Arc::new(FsContentStore::new(dir.path())),
            LoaderConfig::default(),
        ),
        ResponseAssembler::new(AssemblerConfig { max_chars: 4_000 }),
        RouterConfig::default(),
    );

    let resp = router.route(Request::query("this query is slow")).await;
    assert_eq!(resp.status, Status::Resolved);
    assert!(resp.content.unwrap().contains("Disk-backed guidance"));
}

// ── E2E: payload shape ───────────────────────────────────────────────────

#[tokio::test]
async fn e2e_response_serializes_to_stable_json_shape() {
    let router = build_router(Arc::new(store()), taxonomy());

    let resp = router.route(Request::query("this query is slow")).await;
    let value: serde_json::Value = serde_json::from_str(&serde_json::to_string(&resp).unwrap()).unwrap();

    assert_eq!(value["status"], "resolved");
    assert_eq!(value["skill"], "sql.optimizer");
    assert!(value["content"].is_string());
    assert_eq!(value["truncated"], false);
    // Irrelevant fields are omitted, not null.
    assert!(value.get("candidates").is_none());
    assert!(value.get("error").is_none());
}

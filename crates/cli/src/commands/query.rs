//! `guidepost query` — Route free-text intent to the best-matching skill.

use std::path::Path;
use std::sync::Arc;

use guidepost_assembler::{AssemblerConfig, ResponseAssembler};
use guidepost_core::request::{ErrorKind, Request, Response, Status};
use guidepost_loader::{ContentLoader, FsContentStore, LoaderConfig};
use guidepost_matcher::{MatcherConfig, TriggerMatcher};
use guidepost_registry::SharedRegistry;
use guidepost_router::{Router, RouterConfig};

use super::{build_registry, load_setup};

pub async fn run(
    config_path: &Path,
    text: &str,
    skill: Option<String>,
    budget: Option<usize>,
    json: bool,
) -> i32 {
    let (config, defs) = match load_setup(config_path) {
        Ok(setup) => setup,
        Err(code) => return code,
    };
    let registry = match build_registry(defs) {
        Ok(registry) => registry,
        Err(code) => return code,
    };

    let router = Router::new(
        Arc::new(SharedRegistry::new(registry)),
        TriggerMatcher::new(MatcherConfig {
            phrase_weight: config.matcher.phrase_weight,
            overlap_weight: config.matcher.overlap_weight,
            negative_weight: config.matcher.negative_weight,
            weight_factor: config.matcher.weight_factor,
            ambiguity_epsilon: config.matcher.ambiguity_epsilon,
        }),
        ContentLoader::new(
            Arc::new(FsContentStore::new(config.content_root.clone())),
            LoaderConfig {
                cache_capacity: config.loader.cache_capacity,
            },
        ),
        ResponseAssembler::new(AssemblerConfig {
            max_chars: config.assembler.max_chars,
        }),
        RouterConfig {
            fetch_timeout: std::time::Duration::from_secs(config.loader.fetch_timeout_secs),
            ..RouterConfig::default()
        },
    );

    let mut request = Request::query(text);
    request.skill_id = skill.map(Into::into);
    request.budget = budget;

    let response = router.route(request).await;
    print_response(&response, json);
    exit_code_for(&response)
}

fn print_response(response: &Response, json: bool) {
    if json {
        match serde_json::to_string_pretty(response) {
            Ok(payload) => println!("{payload}"),
            Err(e) => eprintln!("error: could not serialize response: {e}"),
        }
        return;
    }

    match response.status {
        Status::Resolved => {
            if let Some(skill) = &response.skill {
                println!("skill: {skill}");
            }
            if response.truncated == Some(true) {
                println!("note: output truncated to fit the budget");
            }
            if let Some(content) = &response.content {
                println!("\n{content}");
            }
        }
        Status::Ambiguous => {
            if let Some(content) = &response.content {
                println!("{content}");
            }
        }
        Status::Error => {
            if let Some(error) = &response.error {
                eprintln!("error: {}", error.message);
            }
        }
    }
}

/// Map a response to the documented exit-code contract.
fn exit_code_for(response: &Response) -> i32 {
    match response.status {
        Status::Resolved => 0,
        Status::Ambiguous => super::EXIT_AMBIGUOUS,
        Status::Error => match response.error.as_ref().map(|e| e.kind) {
            Some(ErrorKind::ContentUnavailable) => super::EXIT_CONTENT_FAILURE,
            Some(ErrorKind::InvalidQuery) | Some(ErrorKind::UnknownSkill) | None => {
                super::EXIT_INVALID_INPUT
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guidepost_core::request::ErrorInfo;

    fn response(status: Status, kind: Option<ErrorKind>) -> Response {
        Response {
            status,
            request_id: "req".into(),
            skill: None,
            content: None,
            truncated: None,
            candidates: vec![],
            error: kind.map(|kind| ErrorInfo {
                kind,
                message: "boom".into(),
            }),
        }
    }

    #[test]
    fn exit_codes_follow_the_contract() {
        assert_eq!(exit_code_for(&response(Status::Resolved, None)), 0);
        assert_eq!(exit_code_for(&response(Status::Ambiguous, None)), 1);
        assert_eq!(
            exit_code_for(&response(Status::Error, Some(ErrorKind::InvalidQuery))),
            2
        );
        assert_eq!(
            exit_code_for(&response(Status::Error, Some(ErrorKind::UnknownSkill))),
            2
        );
        assert_eq!(
            exit_code_for(&response(Status::Error, Some(ErrorKind::ContentUnavailable))),
            3
        );
    }
}

//! CLI subcommands.

pub mod check;
pub mod query;
pub mod show;
pub mod tree;

use std::path::Path;

use guidepost_config::AppConfig;
use guidepost_core::SkillDef;
use guidepost_registry::Registry;

/// Exit code for taxonomy/config problems that prevent startup.
pub const EXIT_REGISTRY_FAILURE: i32 = 4;
/// Exit code for invalid user input.
pub const EXIT_INVALID_INPUT: i32 = 2;
/// Exit code for backing-store failures.
pub const EXIT_CONTENT_FAILURE: i32 = 3;
/// Exit code for an ambiguous result (candidates printed).
pub const EXIT_AMBIGUOUS: i32 = 1;

/// Load config plus raw skill definitions, or report why we cannot start.
pub fn load_setup(config_path: &Path) -> Result<(AppConfig, Vec<SkillDef>), i32> {
    let config = match AppConfig::load_from(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return Err(EXIT_REGISTRY_FAILURE);
        }
    };

    let defs = match guidepost_config::load_taxonomy(&config.taxonomy_path) {
        Ok(defs) => defs,
        Err(e) => {
            eprintln!("error: {e}");
            return Err(EXIT_REGISTRY_FAILURE);
        }
    };

    Ok((config, defs))
}

/// Build the registry, or report the taxonomy violation.
pub fn build_registry(defs: Vec<SkillDef>) -> Result<Registry, i32> {
    Registry::build(defs).map_err(|e| {
        eprintln!("error: taxonomy rejected: {e}");
        EXIT_REGISTRY_FAILURE
    })
}

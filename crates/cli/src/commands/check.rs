//! `guidepost check` — Validate the taxonomy without serving anything.

use std::path::Path;

use super::{build_registry, load_setup};

pub fn run(config_path: &Path) -> i32 {
    let (config, defs) = match load_setup(config_path) {
        Ok(setup) => setup,
        Err(code) => return code,
    };

    let total_defs = defs.len();
    let registry = match build_registry(defs) {
        Ok(registry) => registry,
        Err(code) => return code,
    };

    let leaves = registry.leaves().count();
    let roots = registry.roots().count();
    let without_content = registry
        .nodes_depth_first()
        .filter(|n| n.content_refs.is_empty())
        .count();

    println!("Taxonomy OK: {}", config.taxonomy_path.display());
    println!("  skills: {total_defs}");
    println!("  roots:  {roots}");
    println!("  leaves: {leaves}");
    if without_content > 0 {
        println!("  note: {without_content} skill(s) declare no content refs");
    }

    0
}

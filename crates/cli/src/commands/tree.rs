//! `guidepost tree` — Print the skill taxonomy.

use std::path::Path;

use guidepost_core::SkillNode;
use guidepost_registry::Registry;

use super::{build_registry, load_setup};

pub fn run(config_path: &Path) -> i32 {
    let (_config, defs) = match load_setup(config_path) {
        Ok(setup) => setup,
        Err(code) => return code,
    };
    let registry = match build_registry(defs) {
        Ok(registry) => registry,
        Err(code) => return code,
    };

    println!("Skill taxonomy ({} skills)", registry.len());
    for root in registry.roots() {
        print_subtree(&registry, root);
    }

    0
}

fn print_subtree(registry: &Registry, node: &SkillNode) {
    let indent = "  ".repeat(node.depth + 1);
    let mark = if node.is_leaf() { "-" } else { "+" };
    println!(
        "{indent}{mark} {}  {} ({} triggers, {} docs)",
        node.id,
        node.title,
        node.triggers.len(),
        node.content_refs.len()
    );
    for child in registry.children_of(&node.id) {
        print_subtree(registry, child);
    }
}

//! `guidepost show` — Show one skill's definition without loading content.

use std::path::Path;

use guidepost_core::SkillId;

use super::{build_registry, load_setup, EXIT_INVALID_INPUT};

pub fn run(config_path: &Path, id: &str) -> i32 {
    let (_config, defs) = match load_setup(config_path) {
        Ok(setup) => setup,
        Err(code) => return code,
    };
    let registry = match build_registry(defs) {
        Ok(registry) => registry,
        Err(code) => return code,
    };

    let Some(node) = registry.get(&SkillId::from(id)) else {
        eprintln!("error: no skill with id '{id}'");
        return EXIT_INVALID_INPUT;
    };

    println!("id:      {}", node.id);
    println!("title:   {}", node.title);
    if !node.summary.is_empty() {
        println!("summary: {}", node.summary);
    }
    println!("depth:   {}", node.depth);
    if node.weight != 0.0 {
        println!("weight:  {}", node.weight);
    }

    if let Some(parent) = registry.parent_of(&node.id) {
        println!("parent:  {}", parent.id);
    }
    if !node.children.is_empty() {
        let children: Vec<&str> = node.children.iter().map(|c| c.as_str()).collect();
        println!("children: {}", children.join(", "));
    }

    if !node.triggers.is_empty() {
        println!("triggers:");
        for trigger in &node.triggers {
            println!("  [{:?}] {}", trigger.kind, trigger.pattern);
        }
    }
    if !node.content_refs.is_empty() {
        println!("content:");
        for content_ref in &node.content_refs {
            println!("  [{}] {}", content_ref.role, content_ref.ref_);
        }
    }

    0
}

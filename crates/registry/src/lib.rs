//! Skill registry — the canonical, validated skill taxonomy.
//!
//! Built once from raw definitions and read-only thereafter. Validation is
//! all-or-nothing: duplicate ids, dangling child references, nodes with two
//! parents, and cycles all abort the build, and no partial registry is ever
//! observable.
//!
//! Lookup by id is O(1); traversal follows the declared order — roots in
//! definition order, children in their declared order — so every walk of
//! the same registry yields the same sequence.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use guidepost_core::error::RegistryError;
use guidepost_core::skill::{SkillDef, SkillId, SkillNode};
use tracing::info;

/// The immutable skill taxonomy.
#[derive(Debug)]
pub struct Registry {
    nodes: HashMap<SkillId, SkillNode>,
    /// Depth-first visit order over all nodes.
    order: Vec<SkillId>,
    roots: Vec<SkillId>,
    parents: HashMap<SkillId, SkillId>,
}

impl Registry {
    /// Build a registry from raw definitions, validating the id graph.
    ///
    /// Checks, in order: non-empty input, id uniqueness, child references
    /// resolve, single parent per node, and reachability (a node reachable
    /// from no root sits on a cycle). Depth is computed during the same
    /// depth-first walk that fixes the traversal order.
    pub fn build(defs: Vec<SkillDef>) -> Result<Self, RegistryError> {
        if defs.is_empty() {
            return Err(RegistryError::Empty);
        }

        // Id uniqueness. Definition order is preserved separately since
        // HashMap iteration order is unspecified.
        let mut by_id: HashMap<SkillId, SkillDef> = HashMap::with_capacity(defs.len());
        let def_order: Vec<SkillId> = defs.iter().map(|d| d.id.clone()).collect();
        for def in defs {
            if by_id.insert(def.id.clone(), def.clone()).is_some() {
                return Err(RegistryError::DuplicateId(def.id.to_string()));
            }
        }

        // Child references resolve, and no node is claimed by two parents.
        let mut parents: HashMap<SkillId, SkillId> = HashMap::new();
        for id in &def_order {
            let def = &by_id[id];
            for child in &def.children {
                if !by_id.contains_key(child) {
                    return Err(RegistryError::DanglingReference {
                        parent: id.to_string(),
                        child: child.to_string(),
                    });
                }
                if let Some(first) = parents.get(child) {
                    return Err(RegistryError::MultipleParents {
                        child: child.to_string(),
                        first: first.to_string(),
                        second: id.to_string(),
                    });
                }
                parents.insert(child.clone(), id.clone());
            }
        }

        // Roots: definitions never referenced as a child, in definition order.
        let roots: Vec<SkillId> = def_order
            .iter()
            .filter(|id| !parents.contains_key(*id))
            .cloned()
            .collect();

        // Depth-first walk from the roots. With the single-parent invariant
        // already enforced, any node the walk never reaches sits on a cycle
        // (a root-less loop such as A -> B -> A).
        let mut order: Vec<SkillId> = Vec::with_capacity(by_id.len());
        let mut depths: HashMap<SkillId, usize> = HashMap::with_capacity(by_id.len());
        let mut stack: Vec<(SkillId, usize)> = roots.iter().rev().map(|r| (r.clone(), 0)).collect();

        while let Some((id, depth)) = stack.pop() {
            if depths.contains_key(&id) {
                return Err(RegistryError::CycleDetected(id.to_string()));
            }
            depths.insert(id.clone(), depth);
            order.push(id.clone());

            let def = &by_id[&id];
            for child in def.children.iter().rev() {
                stack.push((child.clone(), depth + 1));
            }
        }

        if order.len() != by_id.len() {
            let unreached = def_order
                .iter()
                .find(|id| !depths.contains_key(*id))
                .expect("some definition must be unreached");
            return Err(RegistryError::CycleDetected(unreached.to_string()));
        }

        let nodes: HashMap<SkillId, SkillNode> = by_id
            .into_iter()
            .map(|(id, def)| {
                let depth = depths[&id];
                (
                    id,
                    SkillNode {
                        id: def.id,
                        title: def.title,
                        summary: def.summary,
                        triggers: def.triggers,
                        children: def.children,
                        content_refs: def.content_refs,
                        weight: def.weight,
                        depth,
                    },
                )
            })
            .collect();

        info!(
            skills = nodes.len(),
            roots = roots.len(),
            "Registry built"
        );

        Ok(Self {
            nodes,
            order,
            roots,
            parents,
        })
    }

    /// Look up a node by id.
    pub fn get(&self, id: &SkillId) -> Option<&SkillNode> {
        self.nodes.get(id)
    }

    /// The direct children of a node, in declared order.
    pub fn children_of(&self, id: &SkillId) -> Vec<&SkillNode> {
        match self.nodes.get(id) {
            Some(node) => node.children.iter().filter_map(|c| self.nodes.get(c)).collect(),
            None => Vec::new(),
        }
    }

    /// The parent of a node, if it has one.
    pub fn parent_of(&self, id: &SkillId) -> Option<&SkillNode> {
        self.parents.get(id).and_then(|p| self.nodes.get(p))
    }

    /// Tree depth of a node (roots are 0).
    pub fn depth_of(&self, id: &SkillId) -> Option<usize> {
        self.nodes.get(id).map(|n| n.depth)
    }

    /// Root nodes, in definition order.
    pub fn roots(&self) -> impl Iterator<Item = &SkillNode> {
        self.roots.iter().filter_map(|id| self.nodes.get(id))
    }

    /// All nodes in stable depth-first order. Restartable: each call walks
    /// the same fixed order from the beginning.
    pub fn nodes_depth_first(&self) -> impl Iterator<Item = &SkillNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Leaf nodes only, in stable depth-first order.
    pub fn leaves(&self) -> impl Iterator<Item = &SkillNode> {
        self.nodes_depth_first().filter(|n| n.is_leaf())
    }

    /// Number of skills.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the registry holds no skills. Always false for a built
    /// registry; present for completeness.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A process-wide handle to the current registry.
///
/// Readers grab an `Arc` snapshot and keep it for the whole request;
/// `reload` builds a complete replacement and swaps the single reference.
/// A half-built tree is never observable: a failed build leaves the old
/// registry in place.
pub struct SharedRegistry {
    inner: RwLock<Arc<Registry>>,
}

impl SharedRegistry {
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: RwLock::new(Arc::new(registry)),
        }
    }

    /// Snapshot the current registry. The snapshot stays fully consistent
    /// even if a reload swaps the shared reference afterwards.
    pub fn current(&self) -> Arc<Registry> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Rebuild from new definitions and atomically swap. On failure the
    /// previous registry remains current.
    pub fn reload(&self, defs: Vec<SkillDef>) -> Result<(), RegistryError> {
        let fresh = Registry::build(defs)?;
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(fresh);
        info!("Registry reloaded");
        Ok(())
    }
}

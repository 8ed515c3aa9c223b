//! Plan persistence
//!
//! Saves a recorded program (a node and everything reachable from it) under
//! a name and restores it later for grafting onto the live graph.
//!
//! # Snapshot format
//!
//! A [`SavedPlan`] is a flat list of nodes addressed by local index. Entry 0
//! is the subtree root. Each node records its payload, the local index of
//! its owner and the local indices of its children in branch order, so loop
//! back-edges survive as plain indices next to the ownership tree.
//!
//! Plans are stored as pretty JSON, one `<name>.json` file per plan.

use crate::graph::{Graph, NodeId, NodeSpec};
use sdk::errors::EngineError;
use sdk::types::ActionKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info};

/// Snapshot format version written by this build
pub const PLAN_FORMAT_VERSION: u32 = 1;

/// One node of a saved plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedNode {
    #[serde(flatten)]
    pub spec: NodeSpec,
    #[serde(default)]
    pub owner: Option<usize>,
    #[serde(default)]
    pub children: Vec<usize>,
}

/// Index-addressed snapshot of a subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPlan {
    pub version: u32,
    pub nodes: Vec<SavedNode>,
}

impl SavedPlan {
    /// Capture `entry` and every node reachable from it
    ///
    /// Owners outside the captured set are dropped; for the program root
    /// (`root.children[0]`) every owner is inside the set.
    pub fn capture(graph: &Graph, entry: NodeId) -> Self {
        let order = graph.reachable(entry);
        let local: HashMap<NodeId, usize> = order
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index))
            .collect();

        let nodes = order
            .iter()
            .map(|id| {
                let node = &graph[*id];
                let owner = if *id == entry {
                    None
                } else {
                    node.owner().and_then(|owner| local.get(&owner).copied())
                };
                SavedNode {
                    spec: node.spec().clone(),
                    owner,
                    children: node
                        .children()
                        .iter()
                        .filter_map(|child| local.get(child).copied())
                        .collect(),
                }
            })
            .collect();

        Self {
            version: PLAN_FORMAT_VERSION,
            nodes,
        }
    }

    /// Check structural integrity before anything is grafted
    ///
    /// A valid plan has an entry node without owner, every other node owned
    /// by a node that lists it as a child, every index in range, an acyclic
    /// ownership chain, and no root sentinel.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.version != PLAN_FORMAT_VERSION {
            return Err(EngineError::PersistenceFailure(format!(
                "Unsupported plan version {} (expected {})",
                self.version, PLAN_FORMAT_VERSION
            )));
        }

        let count = self.nodes.len();
        let entry = self
            .nodes
            .first()
            .ok_or_else(|| EngineError::PersistenceFailure("Plan has no nodes".to_string()))?;
        if entry.owner.is_some() {
            return Err(EngineError::PersistenceFailure(
                "Plan entry node must not have an owner".to_string(),
            ));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if node.spec.kind == ActionKind::Root {
                return Err(EngineError::PersistenceFailure(format!(
                    "Node {} is a root sentinel",
                    index
                )));
            }
            if let Some(child) = node.children.iter().find(|child| **child >= count) {
                return Err(EngineError::PersistenceFailure(format!(
                    "Node {} references missing child {}",
                    index, child
                )));
            }
            if index == 0 {
                continue;
            }
            let owner = node.owner.ok_or_else(|| {
                EngineError::PersistenceFailure(format!("Node {} has no owner", index))
            })?;
            if owner >= count || !self.nodes[owner].children.contains(&index) {
                return Err(EngineError::PersistenceFailure(format!(
                    "Node {} has an inconsistent owner {}",
                    index, owner
                )));
            }
        }

        // Every ownership chain must reach the entry within `count` hops
        for start in 1..count {
            let mut current = start;
            let mut hops = 0;
            while let Some(owner) = self.nodes[current].owner {
                current = owner;
                hops += 1;
                if hops > count {
                    return Err(EngineError::PersistenceFailure(format!(
                        "Ownership cycle through node {}",
                        start
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(self).map_err(|e| {
            EngineError::PersistenceFailure(format!("Failed to serialize plan: {}", e))
        })
    }

    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json)
            .map_err(|e| EngineError::PersistenceFailure(format!("Failed to parse plan: {}", e)))
    }
}

/// Storage for named plans
pub trait PlanStore: Send + Sync {
    fn save(&self, name: &str, plan: &SavedPlan) -> Result<(), EngineError>;

    fn load(&self, name: &str) -> Result<SavedPlan, EngineError>;
}

/// Reject names that are empty or could escape the plan directory
pub fn validate_plan_name(name: &str) -> Result<(), EngineError> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.starts_with('.')
    {
        return Err(EngineError::PersistenceFailure(format!(
            "Invalid plan name '{}'",
            name
        )));
    }
    Ok(())
}

/// Plans stored as `<dir>/<name>.json`
#[derive(Debug, Clone)]
pub struct FilePlanStore {
    dir: PathBuf,
}

impl FilePlanStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, EngineError> {
        validate_plan_name(name)?;
        Ok(self.dir.join(format!("{}.json", name)))
    }
}

impl PlanStore for FilePlanStore {
    fn save(&self, name: &str, plan: &SavedPlan) -> Result<(), EngineError> {
        let path = self.path_for(name)?;
        let json = plan.to_json()?;

        fs::create_dir_all(&self.dir).map_err(|e| {
            EngineError::PersistenceFailure(format!("Failed to create plan directory: {}", e))
        })?;
        fs::write(&path, json).map_err(|e| {
            EngineError::PersistenceFailure(format!("Failed to write {}: {}", path.display(), e))
        })?;

        info!(plan = name, nodes = plan.len(), "Saved plan to {}", path.display());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<SavedPlan, EngineError> {
        let path = self.path_for(name)?;
        let json = fs::read_to_string(&path).map_err(|e| {
            EngineError::PersistenceFailure(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let plan = SavedPlan::from_json(&json)?;
        plan.validate()?;

        debug!(plan = name, nodes = plan.len(), "Loaded plan from {}", path.display());
        Ok(plan)
    }
}

/// In-process plan store; plans are kept as serialized JSON
#[derive(Debug, Default)]
pub struct MemoryPlanStore {
    plans: RwLock<HashMap<String, String>>,
}

impl MemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plans
            .read()
            .expect("MemoryPlanStore lock poisoned")
            .contains_key(name)
    }
}

impl PlanStore for MemoryPlanStore {
    fn save(&self, name: &str, plan: &SavedPlan) -> Result<(), EngineError> {
        validate_plan_name(name)?;
        let json = plan.to_json()?;
        self.plans
            .write()
            .expect("MemoryPlanStore lock poisoned")
            .insert(name.to_string(), json);
        Ok(())
    }

    fn load(&self, name: &str) -> Result<SavedPlan, EngineError> {
        validate_plan_name(name)?;
        let plans = self.plans.read().expect("MemoryPlanStore lock poisoned");
        let json = plans
            .get(name)
            .ok_or_else(|| EngineError::PersistenceFailure(format!("No plan named '{}'", name)))?;

        let plan = SavedPlan::from_json(json)?;
        plan.validate()?;
        Ok(plan)
    }
}

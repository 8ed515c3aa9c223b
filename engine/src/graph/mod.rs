//! Instruction Graph
//!
//! Arena of nodes addressed by `NodeId`. Ownership is a tree: every node
//! except the root is owned by exactly one parent, the first node it was
//! attached to. Traversal is a graph: loop headers are attached a second
//! time from the tail of their own body, and that second edge is a plain
//! index reference rather than an ownership claim.
//!
//! `children[0]` is the "true"/next branch, `children[1]` the "false"/else
//! branch. Ids increase in creation order and double as arena indices.

pub mod builder;

pub use builder::GraphBuilder;

use sdk::types::{ActionKind, MotionAction, MotionParams, SenseCondition};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::ops::Index;

/// Maximum depth printed by [`Graph::render`]; bounds output for cyclic graphs.
const RENDER_DEPTH: usize = 10;

/// Stable identifier of a node within one graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload of a node, independent of its position in a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub kind: ActionKind,
    #[serde(default)]
    pub action: Option<MotionAction>,
    #[serde(default)]
    pub params: MotionParams,
    #[serde(default)]
    pub sense: Option<SenseCondition>,
    #[serde(default)]
    pub say: Option<String>,
}

impl NodeSpec {
    pub fn root() -> Self {
        Self {
            kind: ActionKind::Root,
            action: None,
            params: MotionParams::default(),
            sense: None,
            say: None,
        }
    }

    /// A `Do` or `DoUntil` node; only `DoUntil` carries a sense condition
    pub fn motion(kind: ActionKind, action: MotionAction, params: MotionParams) -> Self {
        let sense = (kind == ActionKind::DoUntil).then(SenseCondition::default);
        Self {
            kind,
            action: Some(action),
            params,
            sense,
            say: None,
        }
    }

    /// A `While`, `DoWhile` or `If` header
    pub fn header(kind: ActionKind, sense: SenseCondition) -> Self {
        Self {
            kind,
            action: None,
            params: MotionParams::default(),
            sense: Some(sense),
            say: None,
        }
    }

    pub fn say(text: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Say,
            action: None,
            params: MotionParams::default(),
            sense: None,
            say: Some(text.into()),
        }
    }

    /// Zero-distance forward motion used as loop entry and if-merge point
    pub fn placeholder() -> Self {
        Self::motion(ActionKind::Do, MotionAction::Forward, MotionParams::default())
    }
}

/// A single graph vertex
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    spec: NodeSpec,
    owner: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    pub fn kind(&self) -> ActionKind {
        self.spec.kind
    }

    pub fn action(&self) -> Option<MotionAction> {
        self.spec.action
    }

    pub fn params(&self) -> &MotionParams {
        &self.spec.params
    }

    pub fn sense(&self) -> Option<SenseCondition> {
        self.spec.sense
    }

    pub fn say(&self) -> Option<&str> {
        self.spec.say.as_deref()
    }

    /// Parent in the ownership tree
    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn child(&self, branch: usize) -> Option<NodeId> {
        self.children.get(branch).copied()
    }
}

/// Arena-backed instruction graph with a fixed root sentinel
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Create a graph holding only the root sentinel
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                id: NodeId(0),
                spec: NodeSpec::root(),
                owner: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// First recorded instruction, `root.children[0]`
    pub fn first(&self) -> Option<NodeId> {
        self.nodes[0].child(0)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Number of nodes including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first().is_none()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Id the next allocated node will receive
    pub(crate) fn next_id(&self) -> NodeId {
        NodeId(self.nodes.len())
    }

    /// Allocate a node without attaching it anywhere
    pub(crate) fn add(&mut self, spec: NodeSpec) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            spec,
            owner: None,
            children: Vec::new(),
        });
        id
    }

    /// Append `child` to `parent.children`
    ///
    /// The first attachment of a node claims ownership; any later attachment
    /// of the same node is a traversal edge only.
    pub(crate) fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
        let node = &mut self.nodes[child.0];
        if node.owner.is_none() && child != NodeId(0) {
            node.owner = Some(parent);
        }
    }

    /// Allocate a node with pre-computed ownership and edges
    ///
    /// Callers must keep the ownership tree acyclic.
    pub(crate) fn insert_raw(
        &mut self,
        spec: NodeSpec,
        owner: Option<NodeId>,
        children: Vec<NodeId>,
    ) -> NodeId {
        let id = self.add(spec);
        let node = &mut self.nodes[id.0];
        node.owner = owner;
        node.children = children;
        id
    }

    /// Whether the edge `parent -> child` is a back-edge rather than ownership
    pub fn is_back_edge(&self, parent: NodeId, child: NodeId) -> bool {
        self[child].owner != Some(parent)
    }

    /// Every node reachable from `from` along child edges, in depth-first
    /// pre-order, each listed once
    pub fn reachable(&self, from: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![from];

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            order.push(id);
            for child in self[id].children.iter().rev() {
                if !seen.contains(child) {
                    stack.push(*child);
                }
            }
        }

        order
    }

    /// Deepest node reached by repeatedly following the last owned child
    ///
    /// Back-edges are never followed, so this terminates on cyclic graphs.
    pub fn deepest_last_owned(&self, from: NodeId) -> NodeId {
        let mut current = from;
        while let Some(next) = self[current]
            .children
            .iter()
            .rev()
            .copied()
            .find(|child| self[*child].owner == Some(current))
        {
            current = next;
        }
        current
    }

    /// Indented text dump of the subtree under `from`
    ///
    /// One line per visit: tab indentation, then id, kind, action, params,
    /// sense condition and say text. Loops are unrolled up to a fixed depth.
    pub fn render(&self, from: NodeId) -> String {
        let mut out = String::new();
        self.render_into(from, 0, &mut out);
        out
    }

    fn render_into(&self, id: NodeId, level: usize, out: &mut String) {
        let node = &self[id];
        let action = node
            .action()
            .map(|a| a.to_string())
            .unwrap_or_else(|| "None".to_string());
        let sense = node
            .sense()
            .map(|s| format!("{:?}", s))
            .unwrap_or_else(|| "None".to_string());
        let say = node
            .say()
            .map(|s| format!("{:?}", s))
            .unwrap_or_else(|| "None".to_string());
        let params = if node.kind().is_motion() {
            node.params().to_string()
        } else {
            "None".to_string()
        };

        out.push_str(&"\t".repeat(level));
        out.push_str(&format!(
            "{} {} {} {} {} {}\n",
            node.id,
            node.kind(),
            action,
            params,
            sense,
            say
        ));

        if level + 1 < RENDER_DEPTH {
            for child in &node.children {
                self.render_into(*child, level + 1, out);
            }
        }
    }
}

impl Index<NodeId> for Graph {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

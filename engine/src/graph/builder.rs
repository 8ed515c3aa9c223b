//! Graph Builder
//!
//! Incremental, stack-based construction of the instruction graph. New nodes
//! hang off the insertion cursor and become the cursor. Block headers wait
//! on a LIFO stack until a closing instruction links their branch or
//! back-edge.
//!
//! Closing is matched by position only: `end if` closes whatever block is on
//! top of the stack, even a `while`. Out-of-order closes are not detected.

use crate::graph::{Graph, NodeId, NodeSpec};
use crate::store::SavedPlan;
use sdk::errors::EngineError;
use sdk::types::{ActionKind, SenseCondition};
use tracing::debug;

/// Builder state for one compiler session
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    graph: Graph,
    cursor: NodeId,
    open_blocks: Vec<NodeId>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Empty graph with the cursor on the root
    pub fn new() -> Self {
        let graph = Graph::new();
        let cursor = graph.root();
        Self {
            graph,
            cursor,
            open_blocks: Vec::new(),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn cursor(&self) -> NodeId {
        self.cursor
    }

    /// Unmatched headers, bottom of the stack first
    pub fn open_blocks(&self) -> &[NodeId] {
        &self.open_blocks
    }

    /// Attach a `Do`, `DoUntil` or `Say` node at the cursor and move onto it
    pub fn append(&mut self, spec: NodeSpec) -> NodeId {
        let id = self.graph.add(spec);
        self.graph.attach(self.cursor, id);
        debug!(
            node_id = %id,
            parent = %self.cursor,
            kind = %self.graph[id].kind(),
            "Appended node"
        );
        self.cursor = id;
        id
    }

    /// Open an `If`, `While` or `DoWhile` block
    ///
    /// `If` and `While` headers are attached at the cursor right away. A
    /// `DoWhile` attaches a placeholder that becomes the body entry and keeps
    /// its header detached until the block closes; both go on the stack,
    /// header on top. Returns the header id.
    pub fn open_block(
        &mut self,
        kind: ActionKind,
        sense: SenseCondition,
    ) -> Result<NodeId, EngineError> {
        match kind {
            ActionKind::If | ActionKind::While => {
                let header = self.append(NodeSpec::header(kind, sense));
                self.open_blocks.push(header);
                Ok(header)
            }
            ActionKind::DoWhile => {
                let entry = self.append(NodeSpec::placeholder());
                self.open_blocks.push(entry);
                let header = self.graph.add(NodeSpec::header(kind, sense));
                self.open_blocks.push(header);
                debug!(node_id = %header, body_entry = %entry, "Opened do-while block");
                Ok(header)
            }
            other => Err(EngineError::MalformedInstruction(format!(
                "{} does not open a block",
                other
            ))),
        }
    }

    /// Close the innermost open block, whatever its kind
    ///
    /// - `DoWhile`: the header is attached after the body tail, becomes the
    ///   cursor, and gets the body entry as its child (the back-edge).
    /// - `While`: the header is attached after the body tail (the back-edge)
    ///   and becomes the cursor, so the next node lands on its exit branch.
    /// - `If`: a merge node is attached both as the header's fallthrough
    ///   branch and after the body tail, and becomes the cursor.
    ///
    /// Returns the kind of the block that was closed.
    pub fn close_block(&mut self) -> Result<ActionKind, EngineError> {
        let header = *self.open_blocks.last().ok_or(EngineError::UnbalancedBlock)?;
        let kind = self.graph[header].kind();

        match kind {
            ActionKind::DoWhile => {
                let depth = self.open_blocks.len();
                if depth < 2 {
                    return Err(EngineError::UnbalancedBlock);
                }
                let entry = self.open_blocks[depth - 2];
                self.open_blocks.truncate(depth - 2);

                self.graph.attach(self.cursor, header);
                self.cursor = header;
                self.graph.attach(header, entry);
            }
            ActionKind::While => {
                self.open_blocks.pop();
                self.graph.attach(self.cursor, header);
                self.cursor = header;
            }
            ActionKind::If => {
                self.open_blocks.pop();
                let merge = self.graph.add(NodeSpec::placeholder());
                self.graph.attach(header, merge);
                self.graph.attach(self.cursor, merge);
                self.cursor = merge;
            }
            other => {
                // Only headers are ever pushed above a body entry
                return Err(EngineError::MalformedInstruction(format!(
                    "{} is not a block header",
                    other
                )));
            }
        }

        debug!(node_id = %header, kind = %kind, cursor = %self.cursor, "Closed block");
        Ok(kind)
    }

    /// Snapshot of the whole recorded program, `root.children[0]` downwards
    pub fn snapshot_program(&self) -> Result<SavedPlan, EngineError> {
        let first = self.graph.first().ok_or(EngineError::EmptyGraph)?;
        Ok(SavedPlan::capture(&self.graph, first))
    }

    /// Graft a saved plan as a child of the cursor
    ///
    /// Restored nodes get fresh ids in snapshot order. The cursor moves to
    /// the deepest last-owned descendant of the grafted entry. The plan is
    /// validated first so a bad plan leaves the graph untouched.
    pub fn graft(&mut self, plan: &SavedPlan) -> Result<NodeId, EngineError> {
        plan.validate()?;

        let base = self.graph.next_id().index();
        let local = |index: usize| {
            // Ids are allocated sequentially below, so local index maps by offset
            NodeId::from_index(base + index)
        };

        for node in &plan.nodes {
            self.graph.insert_raw(
                node.spec.clone(),
                node.owner.map(local),
                node.children.iter().copied().map(local).collect(),
            );
        }

        let entry = local(0);
        self.graph.attach(self.cursor, entry);
        self.cursor = self.graph.deepest_last_owned(entry);

        debug!(
            entry = %entry,
            nodes = plan.len(),
            cursor = %self.cursor,
            "Grafted plan"
        );
        Ok(entry)
    }

    /// Reset to an empty graph; nothing from the old session survives
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdk::types::{MotionAction, MotionParams};

    fn forward(distance: f64) -> NodeSpec {
        NodeSpec::motion(
            ActionKind::Do,
            MotionAction::Forward,
            MotionParams::new(0.0, distance, 0.0, 1.0),
        )
    }

    #[test]
    fn test_append_moves_cursor() {
        let mut builder = GraphBuilder::new();
        let a = builder.append(forward(1.0));
        let b = builder.append(forward(2.0));

        assert_eq!(builder.graph().first(), Some(a));
        assert_eq!(builder.graph()[a].children(), &[b]);
        assert_eq!(builder.cursor(), b);
        assert!(a < b);
    }

    #[test]
    fn test_if_block_shape() {
        let mut builder = GraphBuilder::new();
        let header = builder.open_block(ActionKind::If, SenseCondition::Unlinked).unwrap();
        let body = builder.append(forward(1.0));
        assert_eq!(builder.close_block().unwrap(), ActionKind::If);

        let graph = builder.graph();
        let merge = builder.cursor();
        assert_eq!(graph[header].children(), &[body, merge]);
        assert_eq!(graph[body].children(), &[merge]);
        assert_eq!(graph[merge].owner(), Some(header));
        assert_eq!(graph[merge].params().travel(), 0.0);
        assert!(builder.open_blocks().is_empty());
    }

    #[test]
    fn test_empty_if_merges_on_both_branches() {
        let mut builder = GraphBuilder::new();
        let header = builder.open_block(ActionKind::If, SenseCondition::Unlinked).unwrap();
        builder.close_block().unwrap();

        let merge = builder.cursor();
        assert_eq!(builder.graph()[header].children(), &[merge, merge]);
    }

    #[test]
    fn test_while_block_back_edge() {
        let mut builder = GraphBuilder::new();
        let header = builder
            .open_block(ActionKind::While, SenseCondition::Unlinked)
            .unwrap();
        let body = builder.append(forward(1.0));
        assert_eq!(builder.close_block().unwrap(), ActionKind::While);

        let graph = builder.graph();
        assert_eq!(builder.cursor(), header);
        assert_eq!(graph[body].children(), &[header]);
        assert!(graph.is_back_edge(body, header));

        // The next instruction lands on the exit branch
        let after = builder.append(forward(2.0));
        assert_eq!(builder.graph()[header].children(), &[body, after]);
    }

    #[test]
    fn test_do_while_block_shape() {
        let mut builder = GraphBuilder::new();
        let header = builder
            .open_block(ActionKind::DoWhile, SenseCondition::Unlinked)
            .unwrap();
        let entry = builder.graph().first().unwrap();
        assert_eq!(builder.open_blocks(), &[entry, header]);
        assert_eq!(builder.graph()[header].owner(), None);

        let body = builder.append(forward(1.0));
        assert_eq!(builder.close_block().unwrap(), ActionKind::DoWhile);

        let graph = builder.graph();
        assert_eq!(builder.cursor(), header);
        assert_eq!(graph[entry].children(), &[body]);
        assert_eq!(graph[body].children(), &[header]);
        assert_eq!(graph[header].children(), &[entry]);
        assert_eq!(graph[header].owner(), Some(body));
        assert!(graph.is_back_edge(header, entry));
        assert!(builder.open_blocks().is_empty());
    }

    #[test]
    fn test_close_without_open_block() {
        let mut builder = GraphBuilder::new();
        builder.append(forward(1.0));
        let before = builder.graph().len();

        let err = builder.close_block().unwrap_err();
        assert!(matches!(err, EngineError::UnbalancedBlock));
        assert_eq!(builder.graph().len(), before);
    }

    #[test]
    fn test_lifo_close_ignores_keyword_kind() {
        let mut builder = GraphBuilder::new();
        builder
            .open_block(ActionKind::While, SenseCondition::Unlinked)
            .unwrap();
        builder.open_block(ActionKind::If, SenseCondition::Unlinked).unwrap();

        // Whatever closes first closes the If on top
        assert_eq!(builder.close_block().unwrap(), ActionKind::If);
        assert_eq!(builder.close_block().unwrap(), ActionKind::While);
    }

    #[test]
    fn test_open_block_rejects_plain_kinds() {
        let mut builder = GraphBuilder::new();
        assert!(builder
            .open_block(ActionKind::Say, SenseCondition::Unlinked)
            .is_err());
        assert!(builder.graph().is_empty());
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut builder = GraphBuilder::new();
        builder
            .open_block(ActionKind::While, SenseCondition::Unlinked)
            .unwrap();
        builder.append(forward(1.0));
        builder.clear();

        assert!(builder.graph().is_empty());
        assert_eq!(builder.graph().len(), 1);
        assert_eq!(builder.cursor(), builder.graph().root());
        assert!(builder.open_blocks().is_empty());
    }

    #[test]
    fn test_snapshot_of_empty_graph() {
        let builder = GraphBuilder::new();
        assert!(matches!(
            builder.snapshot_program(),
            Err(EngineError::EmptyGraph)
        ));
    }

    #[test]
    fn test_graft_resumes_at_tail() {
        let mut source = GraphBuilder::new();
        source.append(forward(1.0));
        source.append(NodeSpec::say("done"));
        let plan = source.snapshot_program().unwrap();

        let mut target = GraphBuilder::new();
        let anchor = target.append(forward(5.0));
        let entry = target.graft(&plan).unwrap();

        let graph = target.graph();
        assert_eq!(graph[anchor].children(), &[entry]);
        assert_eq!(graph[entry].owner(), Some(anchor));
        assert_eq!(graph[target.cursor()].say(), Some("done"));
    }

    #[test]
    fn test_graft_rejects_invalid_plan_without_mutation() {
        let mut source = GraphBuilder::new();
        source.append(forward(1.0));
        let mut plan = source.snapshot_program().unwrap();
        plan.nodes[0].children.push(42);

        let mut target = GraphBuilder::new();
        target.append(forward(5.0));
        let before = (target.graph().len(), target.cursor());

        assert!(target.graft(&plan).is_err());
        assert_eq!((target.graph().len(), target.cursor()), before);
    }
}

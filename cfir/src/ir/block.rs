//! Basic blocks and their dominator-tree nodes.

use crate::ir::BlockId;

/// One node of a dominator tree (forward or post). Depth 0 is always the tree root.
#[derive(Clone, Debug, Default)]
pub struct DomNode {
    pub idom: Option<BlockId>,
    pub children: Vec<BlockId>,
    pub depth: u32,
}

/// A basic block: a maximal straight-line instruction sequence with a single entry at the top
/// and a single exit at the bottom.
#[derive(Clone, Debug)]
pub struct Block {
    /// Monotonically assigned at creation by the owning function. Stable for the block's
    /// lifetime but not renumbered on removal of other blocks (the writer assigns the labels
    /// that appear in the textual format separately, in traversal order).
    pub(crate) number: u32,
    pub(crate) insns: Vec<crate::ir::InsnId>,
    pub(crate) fall_through: Option<BlockId>,
    pub(crate) preds: Vec<BlockId>,
    pub(crate) succs: Vec<BlockId>,
    pub(crate) dom: DomNode,
    pub(crate) pdom: DomNode,
}

impl Block {
    pub(crate) fn new(number: u32) -> Self {
        Block {
            number,
            insns: Vec::new(),
            fall_through: None,
            preds: Vec::new(),
            succs: Vec::new(),
            dom: DomNode::default(),
            pdom: DomNode::default(),
        }
    }

    /// The block's stable creation-order number.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Instructions contained in this block, in order.
    pub fn insns(&self) -> &[crate::ir::InsnId] {
        &self.insns
    }

    /// The fall-through successor, if any.
    pub fn fall_through(&self) -> Option<BlockId> {
        self.fall_through
    }

    /// All successors (fall-through, if any, plus explicit branch targets).
    pub fn successors(&self) -> &[BlockId] {
        &self.succs
    }

    /// All predecessors.
    pub fn predecessors(&self) -> &[BlockId] {
        &self.preds
    }

    /// This block's node in the forward dominator tree. Only meaningful while
    /// `Function::dominators_valid()` holds.
    pub fn dom_node(&self) -> &DomNode {
        &self.dom
    }

    /// This block's node in the post-dominator tree. Only meaningful while
    /// `Function::post_dominators_valid()` holds.
    pub fn pdom_node(&self) -> &DomNode {
        &self.pdom
    }

    pub(crate) fn dom_node_mut(&mut self) -> &mut DomNode {
        &mut self.dom
    }

    pub(crate) fn pdom_node_mut(&mut self) -> &mut DomNode {
        &mut self.pdom
    }

    /// True if this block has no instructions at all.
    pub fn is_empty(&self) -> bool {
        self.insns.is_empty()
    }

    /// Index of the last instruction in this block, if any. Whether that instruction is
    /// actually a branch is a question for `Function`, which has access to the instruction
    /// arena; `Block` only knows instruction order.
    pub(crate) fn last_index(&self) -> Option<usize> {
        self.insns.len().checked_sub(1)
    }
}

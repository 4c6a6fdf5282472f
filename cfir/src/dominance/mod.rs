//! Forward and post-dominator trees (component D).
//!
//! `Function` caches two validity flags, `dominators_valid`/`post_dominators_valid`, cleared by
//! every edge-mutating operation in `ir::function`. [`update_dominators`]/
//! [`update_post_dominators`] recompute only when the corresponding flag is false; this is the
//! sole coherence contract between graph mutation and analysis. Reading dominator state without
//! calling one of these first is a bug in the caller, not something this module defends against
//! at runtime (mirroring the teacher's own `debug_assert!(self.is_valid())` stance in
//! `flowgraph.rs`/`dominator_tree.rs`: the check is there to catch mistakes in testing, not to
//! paper over them in release builds).

mod tree;

use crate::ir::{BlockId, Function};

/// Recompute the forward dominator tree if it is currently invalid.
pub fn update_dominators(f: &mut Function) {
    if f.dominators_valid() {
        return;
    }
    log::trace!("recomputing forward dominator tree");
    let blocks: Vec<BlockId> = f.blocks().collect();
    let root = f.entry();
    tree::calc_doms(
        f,
        &blocks,
        root,
        tree::predecessors_of,
        tree::forward_node,
        tree::forward_node_mut,
    );
    f.set_dominators_valid(true);
}

/// Recompute the post-dominator tree if it is currently invalid.
pub fn update_post_dominators(f: &mut Function) {
    if f.post_dominators_valid() {
        return;
    }
    log::trace!("recomputing post-dominator tree");
    let blocks: Vec<BlockId> = f.blocks().collect();
    let root = f.exit();
    tree::calc_doms(
        f,
        &blocks,
        root,
        tree::successors_of,
        tree::post_node,
        tree::post_node_mut,
    );
    f.set_post_dominators_valid(true);
}

/// The dominance frontier of `block`: blocks `X` such that `block` dominates a predecessor of
/// `X` but does not strictly dominate `X` itself. Requires `f.dominators_valid()`.
pub fn dominance_frontier(f: &Function, block: BlockId) -> Vec<BlockId> {
    debug_assert!(f.dominators_valid(), "dominators are stale");
    tree::dominance_frontier(f, tree::forward_node, tree::successors_of, block)
}

/// The post-dominance frontier of `block`, the dual computed over the post-dominator tree and
/// predecessor edges. Requires `f.post_dominators_valid()`.
pub fn post_dominance_frontier(f: &Function, block: BlockId) -> Vec<BlockId> {
    debug_assert!(f.post_dominators_valid(), "post-dominators are stale");
    tree::dominance_frontier(f, tree::post_node, tree::predecessors_of, block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Function, InsertPos, InsnData};

    /// entry -(if c)-> A, entry -(fallthrough)-> B; A and B both fall through to J; J -> exit.
    /// A and B are each dominated only by entry; J is dominated by entry but by neither A nor B,
    /// so A's only dominance-frontier member is J.
    fn build_diamond() -> (Function, BlockId, BlockId, BlockId, BlockId, BlockId) {
        let mut f = Function::new("diamond");
        let entry = f.entry();
        let exit = f.exit();
        let a = f.make_block();
        let b = f.make_block();
        let j = f.make_block();

        let cond = f.make_reg("c");
        let fun_arg = f.make_insn(InsnData::FunArg { n: 0, result: cond });
        f.insert_insn(entry, fun_arg, InsertPos::Append);
        let branch = f.make_insn(InsnData::CondBranch { cond, target: None });
        f.insert_insn(entry, branch, InsertPos::Append);
        f.set_branch_target(branch, Some(a));
        f.set_fall_through(entry, Some(b));

        f.set_fall_through(a, Some(j));
        f.set_fall_through(b, Some(j));
        f.set_fall_through(j, Some(exit));
        (f, entry, a, b, j, exit)
    }

    #[test]
    fn diamond_idoms_and_frontiers() {
        let (mut f, entry, a, _b, j, exit) = build_diamond();
        update_dominators(&mut f);

        assert_eq!(f.block(a).dom_node().idom, Some(entry));
        assert_eq!(f.block(j).dom_node().idom, Some(entry), "J is only dominated by entry, not by A or B");
        assert_eq!(f.block(exit).dom_node().idom, Some(j));

        let frontier = dominance_frontier(&f, a);
        assert_eq!(frontier, vec![j], "A's only successor it doesn't strictly dominate is J");
    }

    #[test]
    fn post_dominators_walk_backward_from_exit() {
        let (mut f, entry, a, _b, j, exit) = build_diamond();
        update_post_dominators(&mut f);

        assert_eq!(f.block(a).pdom_node().idom, Some(j));
        assert_eq!(f.block(j).pdom_node().idom, Some(exit));
        assert_eq!(f.block(entry).pdom_node().idom, Some(j), "every path from entry passes through J");
    }
}

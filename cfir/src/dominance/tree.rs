//! The direction-agnostic dominator-tree engine.
//!
//! Forward and post dominance are the same fixpoint computation run over different edge
//! directions and from different roots. Rather than duplicate the algorithm (or reach for the
//! source's pointer-to-member selector, which has no clean Rust equivalent), both trees are
//! computed by the same functions here, parameterized by a pair of plain function pointers: one
//! that lists a block's "predecessors" for this direction (literal predecessors for the forward
//! tree, successors for the post tree) and one pair that projects a `Block`'s forward or post
//! `DomNode`.

use crate::ir::{Block, BlockId, DomNode, Function};

pub(crate) type NeighborsFn = fn(&Function, BlockId) -> Vec<BlockId>;
pub(crate) type NodeFn = fn(&Block) -> &DomNode;
pub(crate) type NodeMutFn = fn(&mut Block) -> &mut DomNode;

pub(crate) fn predecessors_of(f: &Function, b: BlockId) -> Vec<BlockId> {
    f.block(b).predecessors().to_vec()
}

pub(crate) fn successors_of(f: &Function, b: BlockId) -> Vec<BlockId> {
    f.block(b).successors().to_vec()
}

pub(crate) fn forward_node(b: &Block) -> &DomNode {
    b.dom_node()
}

pub(crate) fn forward_node_mut(b: &mut Block) -> &mut DomNode {
    b.dom_node_mut()
}

pub(crate) fn post_node(b: &Block) -> &DomNode {
    b.pdom_node()
}

pub(crate) fn post_node_mut(b: &mut Block) -> &mut DomNode {
    b.pdom_node_mut()
}

/// Does `a` dominate `b` (reflexively) in the dominator tree currently being built, following
/// idom pointers from `b` upward. Used during the fixpoint both to detect candidates that would
/// close a cycle (back edges) and, after convergence, as the public dominance query.
fn dominates_wip(f: &Function, node: NodeFn, a: BlockId, b: BlockId) -> bool {
    let mut cur = Some(b);
    while let Some(c) = cur {
        if c == a {
            return true;
        }
        cur = node(f.block(c)).idom;
    }
    false
}

/// Nearest common ancestor of `a` and `b` in the dominator tree currently being built, found by
/// walking both upward in lockstep once their depths are equalized. Returns `None` if their
/// ancestor chains never meet (can happen transiently, mid-fixpoint, before a block's segment of
/// the graph has been linked into the tree at all).
fn common_dominator(f: &Function, node: NodeFn, a: BlockId, b: BlockId) -> Option<BlockId> {
    let mut a = Some(a);
    let mut b = Some(b);
    while let (Some(x), Some(y)) = (a, b) {
        let dx = node(f.block(x)).depth;
        let dy = node(f.block(y)).depth;
        if dx > dy {
            a = node(f.block(x)).idom;
        } else if dy > dx {
            b = node(f.block(y)).idom;
        } else {
            break;
        }
    }
    loop {
        match (a, b) {
            (Some(x), Some(y)) if x == y => return Some(x),
            (Some(x), Some(_y)) => {
                a = node(f.block(x)).idom;
                b = node(f.block(_y)).idom;
            }
            _ => return None,
        }
    }
}

fn update_depths(f: &mut Function, node: NodeFn, node_mut: NodeMutFn, block: BlockId, depth: u32) {
    node_mut(f.block_mut(block)).depth = depth;
    let children = node(f.block(block)).children.clone();
    for child in children {
        update_depths(f, node, node_mut, child, depth + 1);
    }
}

/// Re-parent `block` under `new_dom` (or make it a root if `None`), updating the old and new
/// parents' children lists and this subtree's depths.
fn set_dominator(
    f: &mut Function,
    node: NodeFn,
    node_mut: NodeMutFn,
    block: BlockId,
    new_dom: Option<BlockId>,
) {
    let old_dom = node(f.block(block)).idom;
    if let Some(old) = old_dom {
        node_mut(f.block_mut(old)).children.retain(|&c| c != block);
    }
    node_mut(f.block_mut(block)).idom = new_dom;
    match new_dom {
        Some(new) => {
            node_mut(f.block_mut(new)).children.push(block);
            let depth = node(f.block(new)).depth + 1;
            update_depths(f, node, node_mut, block, depth);
        }
        None => update_depths(f, node, node_mut, block, 0),
    }
}

/// Run the iterative data-flow dominator computation (Cooper/Harvey/Kennedy, reduced to its
/// simplest fixpoint form) for every block reachable in `blocks`, rooted at `root`, using
/// `neighbors` to get each block's "predecessors" for this direction.
pub(crate) fn calc_doms(
    f: &mut Function,
    blocks: &[BlockId],
    root: BlockId,
    neighbors: NeighborsFn,
    node: NodeFn,
    node_mut: NodeMutFn,
) {
    for &b in blocks {
        let n = node_mut(f.block_mut(b));
        n.idom = None;
        n.children.clear();
        n.depth = 0;
    }

    let mut changed = true;
    while changed {
        changed = false;
        for &b in blocks {
            if b == root {
                continue;
            }
            let old_dom = node(f.block(b)).idom;
            let mut new_dom: Option<BlockId> = None;
            for p in neighbors(f, b) {
                if dominates_wip(f, node, b, p) {
                    // p is (transiently) a descendant of b: this edge is a back edge relative
                    // to the partially-built tree, and including it here would form a cycle.
                    continue;
                }
                new_dom = Some(match new_dom {
                    None => p,
                    Some(nd) => match common_dominator(f, node, nd, p) {
                        Some(cd) => cd,
                        None => continue,
                    },
                });
            }
            if new_dom != old_dom {
                set_dominator(f, node, node_mut, b, new_dom);
                changed = true;
            }
        }
    }
}

/// Collect the dominance frontier of `root`: blocks `X` such that `root` dominates some
/// predecessor of `X` but does not strictly dominate `X` itself. Implemented as a DFS of
/// `root`'s dominator subtree, checking each descendant's neighbors in `succ_of` (successors for
/// the forward frontier).
pub(crate) fn dominance_frontier(
    f: &Function,
    node: NodeFn,
    succ_of: NeighborsFn,
    root: BlockId,
) -> Vec<BlockId> {
    let mut frontier = Vec::new();
    extend_frontier(f, node, succ_of, root, root, &mut frontier);
    frontier
}

fn extend_frontier(
    f: &Function,
    node: NodeFn,
    succ_of: NeighborsFn,
    root: BlockId,
    at: BlockId,
    frontier: &mut Vec<BlockId>,
) {
    for succ in succ_of(f, at) {
        if !strictly_dominates_wip(f, node, root, succ) && !frontier.contains(&succ) {
            frontier.push(succ);
        }
    }
    for child in node(f.block(at)).children.clone() {
        extend_frontier(f, node, succ_of, root, child, frontier);
    }
}

pub(crate) fn dominates(f: &Function, node: NodeFn, a: BlockId, b: BlockId) -> bool {
    dominates_wip(f, node, a, b)
}

pub(crate) fn strictly_dominates_wip(f: &Function, node: NodeFn, a: BlockId, b: BlockId) -> bool {
    a != b && dominates_wip(f, node, a, b)
}

use crate::ir::{BlockId, Function};
use std::collections::VecDeque;

/// Destroy every block with no path from the entry, working outward from blocks that already
/// have no predecessors. Destroying a block removes it from its successors' predecessor lists,
/// which can itself orphan further blocks, so the search folds that discovery into the same
/// worklist walk rather than computing reachability up front and destroying afterward.
pub fn remove_unreachable(f: &mut Function) {
    let entry = f.entry();
    let mut queue: VecDeque<BlockId> = f
        .blocks()
        .filter(|&b| b != entry && f.block(b).predecessors().is_empty())
        .collect();

    while let Some(b) = queue.pop_front() {
        if b == entry || !f.block(b).predecessors().is_empty() {
            // Already destroyed, or gained a predecessor since being queued.
            continue;
        }
        let succs = f.block(b).successors().to_vec();
        f.destroy_block(b);
        for succ in succs {
            if succ != entry && f.block(succ).predecessors().is_empty() {
                queue.push_back(succ);
            }
        }
    }
}

use crate::ir::{BlockId, Function, InsertPos};

/// Merge straight-line chains and fold away degenerate branches, iterated to a fixpoint.
///
/// Requires the entry to have at least one successor and the exit to have none (the usual
/// well-formed-function precondition); both hold trivially unless a caller has left the graph in
/// a transient state.
pub fn combine_blocks(f: &mut Function) {
    debug_assert!(f.block(f.exit()).successors().is_empty());
    debug_assert!(!f.block(f.entry()).successors().is_empty());
    debug_assert_ne!(f.entry(), f.exit());

    loop {
        let mut changed = false;
        for b in f.blocks().collect::<Vec<_>>() {
            if b == f.exit() {
                continue;
            }
            if fold_redundant_branch(f, b) {
                changed = true;
                continue;
            }
            if splice_unique_successor(f, b) {
                changed = true;
                continue;
            }
            if retarget_through_empty_successor(f, b) {
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

/// If `b` ends in a branch whose target coincides with `b`'s fall-through, the branch decides
/// nothing: drop it. Note this does *not* merge `b` into its successor in the same iteration
/// (that happens, if at all, on the next fixpoint pass) — relied on for termination.
fn fold_redundant_branch(f: &mut Function, b: BlockId) -> bool {
    let Some(&last) = f.block(b).insns().last() else {
        return false;
    };
    if !f.insn(last).is_branch() {
        return false;
    }
    if f.insn(last).branch_target().is_some() && f.insn(last).branch_target() == f.block(b).fall_through() {
        f.destroy_insn(last);
        return true;
    }
    false
}

/// If `b` has exactly one successor `s` (not itself, not exit) reached purely through its
/// fall-through (no live terminator remains, so nothing is in the way of appending `s`'s
/// instructions after `b`'s), and `s` has exactly one predecessor, splice `s`'s instructions onto
/// the end of `b`, adopt `s`'s fall-through as `b`'s, and orphan `s`.
fn splice_unique_successor(f: &mut Function, b: BlockId) -> bool {
    let succs = f.block(b).successors();
    if succs.len() != 1 {
        return false;
    }
    let s = succs[0];
    if s == b || s == f.exit() {
        return false;
    }
    if f.block(b).fall_through() != Some(s) {
        return false;
    }
    if f.block(s).predecessors().len() != 1 {
        return false;
    }

    let insns = f.block(s).insns().to_vec();
    for insn in insns {
        f.detach_insn(insn);
        f.insert_insn(b, insn, InsertPos::Append);
    }
    let s_fall_through = f.block(s).fall_through();
    f.set_fall_through(s, None);
    f.set_fall_through(b, s_fall_through);
    true
}

/// If some successor `s` of `b` is empty and its fall-through is not itself, retarget `b`'s edge
/// to `s` directly at `s`'s fall-through (skipping the empty hop). Orphans `s` if it had only
/// that one predecessor.
fn retarget_through_empty_successor(f: &mut Function, b: BlockId) -> bool {
    for s in f.block(b).successors().to_vec() {
        if s == f.exit() || !f.block(s).is_empty() {
            continue;
        }
        let Some(target) = f.block(s).fall_through() else {
            continue;
        };
        if target == s {
            continue;
        }
        let had_one_pred = f.block(s).predecessors().len() == 1;
        f.change_successor(b, s, target);
        if had_one_pred {
            f.set_fall_through(s, None);
        }
        return true;
    }
    false
}

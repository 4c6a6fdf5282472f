//! The four graph-simplification passes, each checked against a scenario from the
//! specification's testable-properties section.

use cfir::ir::{Function, InsertPos, InsnData};
use cfir::passes::{combine_blocks, propagate_through_copies, remove_unreachable, remove_useless_copies};

#[test]
fn combine_blocks_splices_unique_successor_chain() {
    let mut f = Function::new("chain");
    let entry = f.entry();
    let exit = f.exit();
    let mid = f.make_block();

    let x = f.make_reg("x");
    let one = f.make_const_reg(1);
    let def = f.make_insn(InsnData::Copy { arg: one, result: x });
    f.insert_insn(entry, def, InsertPos::Append);
    f.set_fall_through(entry, Some(mid));

    let y = f.make_reg("y");
    let def2 = f.make_insn(InsnData::Copy { arg: x, result: y });
    f.insert_insn(mid, def2, InsertPos::Append);
    f.set_fall_through(mid, Some(exit));

    combine_blocks(&mut f);

    assert_eq!(f.blocks().count(), 2, "entry and mid should have merged, leaving just entry and exit");
    assert_eq!(f.block(entry).insns().len(), 2);
    assert_eq!(f.block(entry).fall_through(), Some(exit));
}

#[test]
fn combine_blocks_drops_redundant_branch_without_merging_same_iteration() {
    // B1: if (c) goto B3; fall through B3 (both edges lead to the same place).
    let mut f = Function::new("redundant");
    let entry = f.entry();
    let exit = f.exit();
    let b3 = f.make_block();

    let c = f.make_reg("c");
    let one = f.make_const_reg(1);
    let def_c = f.make_insn(InsnData::Copy { arg: one, result: c });
    f.insert_insn(entry, def_c, InsertPos::Append);
    let branch = f.make_insn(InsnData::CondBranch { cond: c, target: None });
    f.insert_insn(entry, branch, InsertPos::Append);
    f.set_branch_target(branch, Some(b3));
    f.set_fall_through(entry, Some(b3));
    f.set_fall_through(b3, Some(exit));

    combine_blocks(&mut f);

    // The branch is gone (both its targets coincided) and entry/b3 are spliced into one block
    // since entry now has a single successor again.
    assert!(f.block(entry).insns().iter().all(|&i| !f.insn(i).is_branch()));
}

/// `entry -> empty -> j` where `empty` has no instructions and is the sole predecessor of `j`.
/// `combine_blocks` must retarget `entry`'s edge straight to `j` and orphan `empty`.
#[test]
fn combine_blocks_skips_empty_block() {
    let mut f = Function::new("empty_skip");
    let entry = f.entry();
    let exit = f.exit();
    let empty = f.make_block();
    let j = f.make_block();

    let x = f.make_reg("x");
    let one = f.make_const_reg(1);
    let def = f.make_insn(InsnData::Copy { arg: one, result: x });
    f.insert_insn(entry, def, InsertPos::Append);
    f.set_fall_through(entry, Some(empty));
    f.set_fall_through(empty, Some(j));

    let y = f.make_reg("y");
    let read = f.make_insn(InsnData::Copy { arg: x, result: y });
    f.insert_insn(j, read, InsertPos::Append);
    f.set_fall_through(j, Some(exit));

    combine_blocks(&mut f);

    assert_eq!(f.block(entry).successors(), &[j], "entry should now point directly at j, skipping the empty hop");
    assert!(f.block(empty).predecessors().is_empty(), "empty is orphaned once its only predecessor is retargeted");
}

#[test]
fn combine_blocks_is_idempotent() {
    let mut f = Function::new("idempotent");
    let entry = f.entry();
    let exit = f.exit();
    let a = f.make_block();
    let b = f.make_block();
    let reg = f.make_reg("r");
    let one = f.make_const_reg(1);
    let def = f.make_insn(InsnData::Copy { arg: one, result: reg });
    f.insert_insn(entry, def, InsertPos::Append);
    f.set_fall_through(entry, Some(a));
    f.set_fall_through(a, Some(b));
    f.set_fall_through(b, Some(exit));

    combine_blocks(&mut f);
    let blocks_after_first: Vec<_> = f.blocks().collect();
    let insns_after_first: Vec<_> = blocks_after_first.iter().map(|&b| f.block(b).insns().to_vec()).collect();

    combine_blocks(&mut f);
    let blocks_after_second: Vec<_> = f.blocks().collect();
    let insns_after_second: Vec<_> = blocks_after_second.iter().map(|&b| f.block(b).insns().to_vec()).collect();

    assert_eq!(blocks_after_first, blocks_after_second);
    assert_eq!(insns_after_first, insns_after_second);
}

/// A single block that is its own fall-through, containing only a `nop`, reachable from entry
/// but with no path to exit. `exit` itself therefore has an empty predecessor list and is a
/// legitimate removal target; the scenario checks that destroying it doesn't disturb the
/// self-loop and doesn't trip `combine_blocks`'s "entry has a successor" precondition.
#[test]
fn self_loop_survives_even_though_exit_is_unreachable() {
    let mut f = Function::new("self_loop");
    let entry = f.entry();
    let loop_block = f.make_block();
    let nop = f.make_insn(InsnData::Nop);
    f.insert_insn(loop_block, nop, InsertPos::Append);
    f.set_fall_through(entry, Some(loop_block));
    f.set_fall_through(loop_block, Some(loop_block));

    remove_unreachable(&mut f);

    assert!(f.block(entry).successors().contains(&loop_block), "the self-loop is reachable from entry and must survive");
    assert!(f.block(loop_block).successors().contains(&loop_block), "the self-edge itself must survive");
    assert!(f.block(f.exit()).predecessors().is_empty(), "exit has no path to it and is orphaned");

    // combine_blocks' precondition assert (entry has at least one successor) must not fire.
    combine_blocks(&mut f);
}

/// B1 has a redundant branch (`if (c) goto B3; fall_through B3`) and is spliced away by
/// `combine_blocks`; a wholly separate, predecessor-less `B2: nop; fall_through B3` is left
/// completely untouched by that pass -- reachability pruning is `remove_unreachable`'s job, not
/// `combine_blocks`'s.
#[test]
fn combine_blocks_leaves_unrelated_unreachable_block_untouched() {
    let mut f = Function::new("unreachable_after_branch_elimination");
    let entry = f.entry();
    let exit = f.exit();
    let b3 = f.make_block();
    let b2 = f.make_block();

    let c = f.make_reg("c");
    let one = f.make_const_reg(1);
    let def_c = f.make_insn(InsnData::Copy { arg: one, result: c });
    f.insert_insn(entry, def_c, InsertPos::Append);
    let branch = f.make_insn(InsnData::CondBranch { cond: c, target: None });
    f.insert_insn(entry, branch, InsertPos::Append);
    f.set_branch_target(branch, Some(b3));
    f.set_fall_through(entry, Some(b3));
    f.set_fall_through(b3, Some(exit));

    let nop = f.make_insn(InsnData::Nop);
    f.insert_insn(b2, nop, InsertPos::Append);
    f.set_fall_through(b2, Some(b3));

    combine_blocks(&mut f);

    assert!(f.blocks().any(|b| b == b2), "combine_blocks never prunes for reachability");
    assert_eq!(f.block(b2).insns(), &[nop], "B2's own body is untouched");
    assert_eq!(f.block(b2).successors(), &[b3]);
    assert!(f.block(entry).insns().iter().all(|&i| !f.insn(i).is_branch()), "B1's redundant branch is gone");
}

#[test]
fn remove_unreachable_leaves_only_entry_reachable_blocks() {
    let mut f = Function::new("unreachable");
    let entry = f.entry();
    let exit = f.exit();
    let live = f.make_block();
    let dead = f.make_block();
    f.set_fall_through(entry, Some(live));
    f.set_fall_through(live, Some(exit));
    // `dead` has no predecessor at all.
    f.set_fall_through(dead, Some(exit));

    remove_unreachable(&mut f);

    let remaining: Vec<_> = f.blocks().collect();
    assert!(remaining.contains(&live));
    assert!(!remaining.contains(&dead));
    for b in remaining {
        if b != entry {
            assert!(!f.block(b).predecessors().is_empty() || b == entry);
        }
    }
}

/// `a := 1; b := a; c := b; return c` -- after propagation every use should trace back to `a`;
/// after dead-copy removal, `b`'s and `c`'s copies are gone.
#[test]
fn copy_chain_propagates_and_dead_copies_are_removed() {
    let mut f = Function::new("copy_chain");
    let entry = f.entry();
    let exit = f.exit();

    let a = f.make_reg("a");
    let b = f.make_reg("b");
    let c = f.make_reg("c");
    let one = f.make_const_reg(1);

    let def_a = f.make_insn(InsnData::Copy { arg: one, result: a });
    f.insert_insn(entry, def_a, InsertPos::Append);
    let def_b = f.make_insn(InsnData::Copy { arg: a, result: b });
    f.insert_insn(entry, def_b, InsertPos::Append);
    let def_c = f.make_insn(InsnData::Copy { arg: b, result: c });
    f.insert_insn(entry, def_c, InsertPos::Append);
    let ret = f.make_insn(InsnData::FunResult { n: 0, arg: c });
    f.insert_insn(entry, ret, InsertPos::Append);
    f.set_fall_through(entry, Some(exit));

    // Registers are visited in creation order, so a single call collapses the whole chain:
    // rewriting b's uses updates c's defining instruction in place before c itself is visited.
    propagate_through_copies(&mut f);

    let InsnData::FunResult { arg, .. } = &f.insn(ret).data else {
        panic!("expected FunResult");
    };
    assert_eq!(*arg, a, "fun_result should now read directly from `a`");

    assert!(f.reg(b).uses.is_empty());
    assert!(f.reg(c).uses.is_empty());

    remove_useless_copies(&mut f);

    assert!(!f.block(entry).insns().contains(&def_b));
    assert!(!f.block(entry).insns().contains(&def_c));
    assert!(f.block(entry).insns().contains(&def_a));
    assert!(f.block(entry).insns().contains(&ret));
}

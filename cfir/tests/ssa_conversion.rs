//! SSA construction/destruction over the diamond and critical-edge scenarios from the
//! specification's testable-properties section.

use cfir::dominance;
use cfir::ir::{Function, InsertPos, InsnData};
use cfir::ssa;

/// entry -(if c)-> A, entry -(fallthrough)-> B; A, B both fall through to J; J falls through
/// to exit. A writes `r := 1`, B writes `r := 2`, J reads `r`.
fn build_diamond() -> (Function, cfir::ir::RegId, cfir::ir::RegId) {
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

    let r = f.make_reg("r");
    let one = f.make_const_reg(1);
    let copy_a = f.make_insn(InsnData::Copy { arg: one, result: r });
    f.insert_insn(a, copy_a, InsertPos::Append);
    f.set_fall_through(a, Some(j));

    let two = f.make_const_reg(2);
    let copy_b = f.make_insn(InsnData::Copy { arg: two, result: r });
    f.insert_insn(b, copy_b, InsertPos::Append);
    f.set_fall_through(b, Some(j));

    let out = f.make_reg("out");
    let read_j = f.make_insn(InsnData::Copy { arg: r, result: out });
    f.insert_insn(j, read_j, InsertPos::Append);
    f.set_fall_through(j, Some(exit));

    (f, r, out)
}

#[test]
fn diamond_ssa_insertion_and_renaming() {
    let (mut f, r, out) = build_diamond();
    dominance::update_dominators(&mut f);
    ssa::convert_to_ssa_form(&mut f).expect("diamond SSA conversion");

    // Find J: the block whose first instruction is a PhiFun for `r`.
    let j = f
        .blocks()
        .find(|&b| {
            f.block(b)
                .insns()
                .first()
                .is_some_and(|&i| f.insn(i).is_phi_fun())
        })
        .expect("a PhiFun was inserted at the join block");

    let phi_insn = f.block(j).insns()[0];
    let InsnData::PhiFun { result: phi_result, inputs } = &f.insn(phi_insn).data else {
        panic!("expected PhiFun");
    };
    assert_eq!(f.reg(*phi_result).ssa_proto, Some(r));
    assert_eq!(inputs.len(), 2, "diamond join should get exactly two phi inputs");

    // Every non-constant register now has exactly one definition (I10).
    for reg in f.regs().collect::<Vec<_>>() {
        if f.reg(reg).is_constant() {
            continue;
        }
        assert!(
            f.reg(reg).defs.len() <= 1,
            "register {reg:?} ({}) has {} defs post-SSA",
            f.reg(reg).name,
            f.reg(reg).defs.len()
        );
    }

    // J's second instruction (after the phi) now reads the phi's renamed result.
    let second = f.block(j).insns()[1];
    let InsnData::Copy { arg, result } = &f.insn(second).data else {
        panic!("expected the read of r in J to still be a Copy");
    };
    assert_eq!(*arg, *phi_result);
    assert_eq!(f.reg(*result).ssa_proto, Some(out));
}

#[test]
fn diamond_no_critical_edges_simple_phi_elimination() {
    let (mut f, _r, _out) = build_diamond();
    dominance::update_dominators(&mut f);
    ssa::convert_to_ssa_form(&mut f).unwrap();
    let block_count_before = f.blocks().count();

    ssa::convert_from_ssa_form(&mut f);

    // No critical edges in a diamond (A and B each have exactly one successor), so no blocks
    // are interposed.
    assert_eq!(f.blocks().count(), block_count_before);

    // No PhiFun/PhiFunInp survive.
    for b in f.blocks().collect::<Vec<_>>() {
        for &insn in f.block(b).insns() {
            assert!(!f.insn(insn).is_phi_fun());
            assert!(!f.insn(insn).is_phi_fun_inp());
        }
    }

    // Each of A and B now ends with a Copy into the (former) phi's result register.
    for b in f.blocks().collect::<Vec<_>>() {
        if b == f.entry() || b == f.exit() {
            continue;
        }
        let insns = f.block(b).insns();
        if insns.len() >= 2 {
            // A and B each have their original Copy plus one appended phi-elimination Copy.
            let last = *insns.last().unwrap();
            assert!(matches!(f.insn(last).data, InsnData::Copy { .. }));
        }
    }
}

/// S has a conditional branch to T1 and a fall-through to T2; T1 begins with a φ fed by S.
/// Eliminating φs must split the S→T1 edge because S has two successors and T1 (after the
/// split search below) is fed from more than one predecessor.
#[test]
fn critical_edge_is_split_before_phi_elimination() {
    let mut f = Function::new("crit");
    let entry = f.entry();
    let exit = f.exit();
    let s = f.make_block();
    let t1 = f.make_block();
    let t2 = f.make_block();
    let join = f.make_block();

    // entry always falls through into S.
    f.set_fall_through(entry, Some(s));

    let cond = f.make_reg("c");
    let fun_arg = f.make_insn(InsnData::FunArg { n: 0, result: cond });
    f.insert_insn(entry, fun_arg, InsertPos::Append);

    let a = f.make_reg("a");
    let const1 = f.make_const_reg(1);
    let def_a = f.make_insn(InsnData::Copy { arg: const1, result: a });
    f.insert_insn(s, def_a, InsertPos::Append);
    let s_cond = f.make_reg("sc");
    let def_sc = f.make_insn(InsnData::Copy { arg: const1, result: s_cond });
    f.insert_insn(s, def_sc, InsertPos::Append);
    let branch = f.make_insn(InsnData::CondBranch {
        cond: s_cond,
        target: None,
    });
    f.insert_insn(s, branch, InsertPos::Append);
    f.set_branch_target(branch, Some(t1));
    f.set_fall_through(s, Some(t2));

    // A second predecessor of T1, so T1 has >1 predecessors once both reach it (makes the
    // S->T1 edge critical: S has >1 successors, T1 has >1 predecessors).
    let const2 = f.make_const_reg(2);
    let def_other = f.make_insn(InsnData::Copy {
        arg: const2,
        result: a,
    });
    f.insert_insn(t2, def_other, InsertPos::Append);
    f.set_fall_through(t2, Some(t1));

    f.set_fall_through(t1, Some(join));
    f.set_fall_through(join, Some(exit));

    dominance::update_dominators(&mut f);
    ssa::convert_to_ssa_form(&mut f).unwrap();

    let s_successors_before = f.block(s).successors().len();
    assert_eq!(s_successors_before, 2, "S must have two successors for its S->T1 edge to be critical");

    let block_count_before = f.blocks().count();
    ssa::convert_from_ssa_form(&mut f);
    assert!(
        f.blocks().count() > block_count_before,
        "critical edge splitting must interpose a new block"
    );

    // S's branch no longer targets the original T1 block directly for the critical edge; it
    // now targets the newly interposed splitter block, whose sole job is the copy.
    let new_target = f
        .block(s)
        .successors()
        .iter()
        .copied()
        .find(|&b| b != t2)
        .expect("S still has a non-fallthrough successor");
    assert_ne!(new_target, t1, "the critical edge must be split via an interposed block");
    assert_eq!(f.block(new_target).successors(), &[t1]);
    assert_eq!(f.block(new_target).insns().len(), 1, "the interposed block holds exactly the copy");
}

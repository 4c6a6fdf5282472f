//! SSA construction and destruction (component E): φ-insertion at dominance frontiers,
//! dominator-tree-driven renaming, and φ-elimination by copy insertion on (split) critical
//! edges.

use crate::dominance;
use crate::error::IrError;
use crate::ir::{BlockId, Function, InsertPos, InsnData, InsnId, RegId};
use std::collections::{HashMap, HashSet};

/// Insert φ-functions, rename every definition and use into SSA form. Requires (and leaves)
/// `f.dominators_valid()`.
pub fn convert_to_ssa_form(f: &mut Function) -> Result<(), IrError> {
    dominance::update_dominators(f);
    log::debug!("converting {} to SSA form", f.name);
    insert_phi_functions(f);
    let entry = f.entry();
    let mut counters: HashMap<RegId, u32> = HashMap::new();
    rename_block(f, entry, HashMap::new(), &mut counters)?;
    Ok(())
}

/// φ-function placement. For every register, the classic worklist formulation: start from its
/// definition sites, and for each block newly reached by propagating through a dominance
/// frontier, place a φ there (if one isn't already present) and treat that block as a new
/// definition site in turn, since the φ itself is a definition.
fn insert_phi_functions(f: &mut Function) {
    let mut defsites: HashMap<RegId, Vec<BlockId>> = HashMap::new();
    for block in f.blocks().collect::<Vec<_>>() {
        for &insn in f.block(block).insns().to_vec().iter() {
            for r in f.insn(insn).results() {
                let sites = defsites.entry(r).or_default();
                if sites.last() != Some(&block) {
                    sites.push(block);
                }
            }
        }
    }

    for (proto, defs) in defsites {
        let mut has_phi: HashSet<BlockId> = HashSet::new();
        let mut worklist: Vec<BlockId> = defs.clone();
        let mut queued: HashSet<BlockId> = defs.into_iter().collect();
        while let Some(b) = worklist.pop() {
            for frontier_block in dominance::dominance_frontier(f, b) {
                if has_phi.insert(frontier_block) {
                    prepend_phi(f, frontier_block, proto);
                    if queued.insert(frontier_block) {
                        worklist.push(frontier_block);
                    }
                }
            }
        }
    }
}

/// Prepend a `PhiFun` for `proto` at the start of `block`. The φ's result is a placeholder
/// register that remembers `proto` via `ssa_proto`; the renaming walk replaces it with a real
/// SSA value register when it reaches this instruction, exactly as it does for every other
/// definition.
fn prepend_phi(f: &mut Function, block: BlockId, proto: RegId) -> InsnId {
    let proto_name = f.reg(proto).name.clone();
    let placeholder = f.make_reg(format!("{proto_name}.phi"));
    f.reg_mut(placeholder).ssa_proto = Some(proto);
    let phi = f.make_insn(InsnData::PhiFun {
        result: placeholder,
        inputs: Vec::new(),
    });
    f.insert_insn(block, phi, InsertPos::Prepend);
    phi
}

/// Depth-first walk of the forward dominator tree, carrying a hierarchical environment mapping
/// proto registers to their current SSA value register at this point in the walk.
fn rename_block(
    f: &mut Function,
    block: BlockId,
    mut env: HashMap<RegId, RegId>,
    counters: &mut HashMap<RegId, u32>,
) -> Result<(), IrError> {
    for insn in f.block(block).insns().to_vec() {
        for (i, arg) in f.insn(insn).args().iter().enumerate() {
            if let Some(&mapped) = env.get(arg) {
                f.change_arg(insn, i, mapped);
            }
        }
        for (i, result) in f.insn(insn).results().iter().enumerate() {
            let proto = f.reg(*result).ssa_proto.unwrap_or(*result);
            let index = counters.entry(proto).or_insert(0);
            let name = format!("{}.{}", f.reg(proto).name, *index);
            *index += 1;
            let new_reg = f.make_reg(name);
            f.reg_mut(new_reg).ssa_proto = Some(proto);
            f.reg_mut(proto).ssa_values.push(new_reg);
            f.change_result(insn, i, new_reg);
            env.insert(proto, new_reg);
        }
    }

    for child in f.block(block).dom_node().children.clone() {
        rename_block(f, child, env.clone(), counters)?;
    }

    for succ in f.block(block).successors().to_vec() {
        let phis: Vec<InsnId> = f
            .block(succ)
            .insns()
            .iter()
            .copied()
            .take_while(|&i| f.insn(i).is_phi_fun())
            .collect();
        for phi in phis {
            let phi_result = f.insn(phi).results()[0];
            let proto = f.reg(phi_result).ssa_proto.unwrap_or(phi_result);
            let current =
                env.get(&proto)
                    .copied()
                    .ok_or_else(|| IrError::PhiInputMissingValue {
                        register: proto,
                        block,
                    })?;
            let inp = f.make_insn(InsnData::PhiFunInp {
                arg: current,
                phi_fun: Some(phi),
            });
            f.insert_insn(block, inp, InsertPos::BeforeBranch);
        }
    }

    Ok(())
}

/// Eliminate φ-functions: split critical edges, then replace every φ with a `Copy` on each
/// incoming edge, in the (possibly newly-interposed) predecessor block.
pub fn convert_from_ssa_form(f: &mut Function) {
    log::debug!("converting {} out of SSA form", f.name);
    split_critical_edges(f);
    eliminate_phi_functions(f);
}

fn split_critical_edges(f: &mut Function) {
    for src in f.blocks().collect::<Vec<_>>() {
        if f.block(src).successors().len() <= 1 {
            continue;
        }
        let mut by_target: HashMap<BlockId, Vec<InsnId>> = HashMap::new();
        for &insn in f.block(src).insns() {
            if let InsnData::PhiFunInp {
                phi_fun: Some(phi), ..
            } = &f.insn(insn).data
            {
                if let Some(target) = f.insn(*phi).block() {
                    by_target.entry(target).or_default().push(insn);
                }
            }
        }
        for (target, inps) in by_target {
            log::trace!("splitting critical edge {:?} -> {:?}", src, target);
            let split = f.make_block();
            f.change_successor(src, target, split);
            f.set_fall_through(split, Some(target));
            for inp in inps {
                f.detach_insn(inp);
                f.insert_insn(split, inp, InsertPos::Append);
            }
        }
    }
}

fn eliminate_phi_functions(f: &mut Function) {
    for block in f.blocks().collect::<Vec<_>>() {
        let phis: Vec<InsnId> = f
            .block(block)
            .insns()
            .iter()
            .copied()
            .take_while(|&i| f.insn(i).is_phi_fun())
            .collect();
        for phi in phis {
            let (result, inputs) = match &f.insn(phi).data {
                InsnData::PhiFun { result, inputs } => (*result, inputs.clone()),
                _ => unreachable!("take_while guarantees PhiFun"),
            };
            for inp in &inputs {
                let arg = match &f.insn(*inp).data {
                    InsnData::PhiFunInp { arg, .. } => *arg,
                    _ => unreachable!("PhiFun.inputs only ever holds PhiFunInp ids"),
                };
                let home = f.insn(*inp).block().expect("phi input is still attached");
                let copy = f.make_insn(InsnData::Copy { arg, result });
                f.insert_insn(home, copy, InsertPos::BeforeBranch);
            }
            for inp in inputs {
                f.destroy_insn(inp);
            }
            f.destroy_insn(phi);
        }
    }
}

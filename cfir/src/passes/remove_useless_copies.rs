use crate::ir::{Function, InsnData};

/// Delete every `Copy` whose result register has no remaining uses.
pub fn remove_useless_copies(f: &mut Function) {
    let dead: Vec<_> = f
        .blocks()
        .flat_map(|b| f.block(b).insns().to_vec())
        .filter(|&insn| match &f.insn(insn).data {
            InsnData::Copy { result, .. } => f.reg(*result).uses.is_empty(),
            _ => false,
        })
        .collect();

    for insn in dead {
        f.destroy_insn(insn);
    }
}

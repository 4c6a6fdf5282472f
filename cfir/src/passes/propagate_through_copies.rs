use crate::ir::{Function, InsnData};

/// For every register `r` with exactly one defining `Copy` instruction `r := s`, where `s` also
/// has exactly one definition, rewrite every use of `r` to use `s` directly: `s`'s single
/// definition dominates the copy, which dominates every use of `r`, so it dominates them too.
///
/// Each register's source is read fresh from its defining instruction at the moment that
/// register is visited, rather than pre-collected before any rewrite runs. A copy's argument is
/// the same instruction slot whether the copy itself is being used as someone else's source or is
/// itself being rewritten, so a chain `c := b; b := a` collapses in a single forward scan over the
/// registers in creation order: rewriting `b`'s uses updates `c`'s defining instruction in place,
/// so by the time `c` is visited its source already reads `a`, not the original `b`.
pub fn propagate_through_copies(f: &mut Function) {
    for r in f.regs().collect::<Vec<_>>() {
        let defs = f.reg(r).defs.clone();
        if defs.len() != 1 {
            continue;
        }
        let InsnData::Copy { arg: s, .. } = &f.insn(defs[0]).data else {
            continue;
        };
        let s = *s;
        if f.reg(s).defs.len() != 1 {
            continue;
        }
        let uses = f.reg(r).uses.clone();
        for insn in uses {
            f.replace_arg_reg(insn, r, s);
        }
    }
}

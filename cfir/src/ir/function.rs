//! A function: the unit that owns blocks, instructions, registers and constant values.
//!
//! All graph mutation funnels through the handful of methods below so that I1–I5 (back-link
//! consistency, edge symmetry, fall-through membership, successor completeness, entry/exit
//! degree) can never be observed broken from outside this module. This mirrors the way
//! `ControlFlowGraph::recompute_ebb` centralizes edge bookkeeping in the teacher: rather than
//! have every call site patch up predecessor lists by hand, a single `recompute_successors`
//! recomputes a block's successor set from its fall-through and terminator and diffs it against
//! the old set to patch predecessors exactly once.

use crate::ir::{Block, BlockId, Insn, InsnData, InsnId, RegId, Register, ValueId};
use crate::ir_bug;
use cranelift_entity::PrimaryMap;
use std::collections::HashMap;

/// Where to splice a new instruction into a block.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InsertPos {
    /// After the last instruction.
    Append,
    /// Before the first instruction.
    Prepend,
    /// Immediately before the block's terminator, or at the end if the block has none.
    BeforeBranch,
}

/// A function: blocks, instructions, registers and constant values, plus the two dominator-tree
/// validity flags.
pub struct Function {
    pub name: String,
    blocks: PrimaryMap<BlockId, Block>,
    insns: PrimaryMap<InsnId, Insn>,
    regs: PrimaryMap<RegId, Register>,
    values: PrimaryMap<ValueId, crate::ir::Value>,
    const_cache: HashMap<i64, RegId>,
    entry: BlockId,
    exit: BlockId,
    next_block_number: u32,
    dominators_valid: bool,
    post_dominators_valid: bool,
}

impl Function {
    /// A new function with just its entry and exit blocks, both always present for the
    /// lifetime of the function (I5: entry has no predecessors, exit has no successors, trivially
    /// true here since neither has any edges yet).
    pub fn new(name: impl Into<String>) -> Self {
        let mut blocks = PrimaryMap::new();
        let entry = blocks.push(Block::new(0));
        let exit = blocks.push(Block::new(1));
        Function {
            name: name.into(),
            blocks,
            insns: PrimaryMap::new(),
            regs: PrimaryMap::new(),
            values: PrimaryMap::new(),
            const_cache: HashMap::new(),
            entry,
            exit,
            next_block_number: 2,
            dominators_valid: false,
            post_dominators_valid: false,
        }
    }

    pub fn entry(&self) -> BlockId {
        self.entry
    }

    pub fn exit(&self) -> BlockId {
        self.exit
    }

    pub fn dominators_valid(&self) -> bool {
        self.dominators_valid
    }

    pub fn post_dominators_valid(&self) -> bool {
        self.post_dominators_valid
    }

    pub(crate) fn set_dominators_valid(&mut self, valid: bool) {
        self.dominators_valid = valid;
    }

    pub(crate) fn set_post_dominators_valid(&mut self, valid: bool) {
        self.post_dominators_valid = valid;
    }

    fn invalidate_dominators(&mut self) {
        self.dominators_valid = false;
        self.post_dominators_valid = false;
    }

    // ---- arenas -----------------------------------------------------------------------------

    pub fn blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks.keys()
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id]
    }

    pub(crate) fn block_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id]
    }

    pub fn insn(&self, id: InsnId) -> &Insn {
        &self.insns[id]
    }

    pub fn regs(&self) -> impl Iterator<Item = RegId> + '_ {
        self.regs.keys()
    }

    pub fn reg(&self, id: RegId) -> &Register {
        &self.regs[id]
    }

    pub(crate) fn reg_mut(&mut self, id: RegId) -> &mut Register {
        &mut self.regs[id]
    }

    pub fn value(&self, id: ValueId) -> crate::ir::Value {
        self.values[id]
    }

    /// Create a new, unconnected block.
    pub fn make_block(&mut self) -> BlockId {
        let number = self.next_block_number;
        self.next_block_number += 1;
        self.blocks.push(Block::new(number))
    }

    /// Declare a new named register.
    pub fn make_reg(&mut self, name: impl Into<String>) -> RegId {
        self.regs.push(Register::named(name.into()))
    }

    /// Get or create the anonymous constant register for an integer literal, sharing one
    /// register per distinct value within this function (the format allows, but does not
    /// require, sharing; implementations may share without observable effect since constant
    /// registers are never written to).
    pub fn make_const_reg(&mut self, literal: i64) -> RegId {
        if let Some(&r) = self.const_cache.get(&literal) {
            return r;
        }
        let value = self.values.push(crate::ir::Value(literal));
        let r = self.regs.push(Register::constant(value));
        self.const_cache.insert(literal, r);
        r
    }

    // ---- instruction construction ------------------------------------------------------------

    /// Allocate an instruction and link it into its registers' use/def lists. The instruction is
    /// not yet attached to any block; use [`Function::insert_insn`] for that.
    pub fn make_insn(&mut self, data: InsnData) -> InsnId {
        let id = self.insns.push(Insn::new(data));
        for arg in self.insns[id].args() {
            self.regs[arg].uses.push(id);
        }
        for result in self.insns[id].results() {
            self.regs[result].defs.push(id);
        }
        if let InsnData::PhiFunInp {
            phi_fun: Some(phi), ..
        } = &self.insns[id].data
        {
            let phi = *phi;
            self.insns[phi].data.phi_fun_register_input(id);
        }
        id
    }

    /// Attach a previously-created, unattached instruction to a block.
    pub fn insert_insn(&mut self, block: BlockId, insn: InsnId, pos: InsertPos) {
        if self.insns[insn].block.is_some() {
            ir_bug!("insert_insn on an already-attached instruction");
        }
        let was_branch = self.insns[insn].is_branch();
        let index = match pos {
            InsertPos::Append => self.blocks[block].insns.len(),
            InsertPos::Prepend => 0,
            InsertPos::BeforeBranch => {
                let has_terminator = self
                    .blocks[block]
                    .last_index()
                    .map(|i| self.insns[self.blocks[block].insns[i]].is_branch())
                    .unwrap_or(false);
                if has_terminator {
                    self.blocks[block].insns.len() - 1
                } else {
                    self.blocks[block].insns.len()
                }
            }
        };
        self.blocks[block].insns.insert(index, insn);
        self.insns[insn].block = Some(block);
        if was_branch {
            self.recompute_successors(block);
        }
    }

    /// Detach an instruction from its block without touching register use/def lists. Used when
    /// moving an instruction to a different block (critical-edge splitting migrates
    /// `PhiFunInp`s this way).
    pub fn detach_insn(&mut self, insn: InsnId) {
        let Some(block) = self.insns[insn].block else {
            return;
        };
        let was_branch = self.insns[insn].is_branch();
        let list = &mut self.blocks[block].insns;
        if let Some(pos) = list.iter().position(|&i| i == insn) {
            list.remove(pos);
        }
        self.insns[insn].block = None;
        if was_branch {
            self.recompute_successors(block);
        }
    }

    /// Fully destroy an instruction: detach from its block (if any), unlink from every
    /// register's use/def list, and for `PhiFun`/`PhiFunInp` tear down the phi association.
    pub fn destroy_insn(&mut self, insn: InsnId) {
        self.detach_insn(insn);
        for arg in self.insns[insn].args() {
            self.regs[arg].uses.retain(|&i| i != insn);
        }
        for result in self.insns[insn].results() {
            self.regs[result].defs.retain(|&i| i != insn);
        }
        match &self.insns[insn].data {
            InsnData::PhiFun { inputs, .. } => {
                for &inp in inputs.clone().iter() {
                    if let InsnData::PhiFunInp { phi_fun, .. } = &mut self.insns[inp].data {
                        *phi_fun = None;
                    }
                }
            }
            InsnData::PhiFunInp {
                phi_fun: Some(phi), ..
            } => {
                let phi = *phi;
                if let InsnData::PhiFun { inputs, .. } = &mut self.insns[phi].data {
                    inputs.retain(|&i| i != insn);
                }
            }
            _ => {}
        }
    }

    /// Rewrite the `index`-th argument of an instruction, updating use lists. Panics if `index`
    /// is out of range for the instruction's variant.
    pub fn change_arg(&mut self, insn: InsnId, index: usize, new_reg: RegId) {
        let old = self.arg_slot_mut(insn, index);
        let old_reg = *old;
        *old = new_reg;
        if old_reg != new_reg {
            self.regs[old_reg].uses.retain(|&i| i != insn);
            self.regs[new_reg].uses.push(insn);
        }
    }

    /// Rewrite the `index`-th result of an instruction, updating def lists.
    pub fn change_result(&mut self, insn: InsnId, index: usize, new_reg: RegId) {
        let old = self.result_slot_mut(insn, index);
        let old_reg = *old;
        *old = new_reg;
        if old_reg != new_reg {
            self.regs[old_reg].defs.retain(|&i| i != insn);
            self.regs[new_reg].defs.push(insn);
        }
    }

    fn arg_slot_mut(&mut self, insn: InsnId, index: usize) -> &mut RegId {
        match &mut self.insns[insn].data {
            InsnData::Copy { arg, .. } if index == 0 => arg,
            InsnData::Calc { args, .. } => &mut args[index],
            InsnData::CondBranch { cond, .. } if index == 0 => cond,
            InsnData::FunResult { arg, .. } if index == 0 => arg,
            InsnData::PhiFunInp { arg, .. } if index == 0 => arg,
            _ => ir_bug!("arg index {} out of range for instruction", index),
        }
    }

    fn result_slot_mut(&mut self, insn: InsnId, index: usize) -> &mut RegId {
        match &mut self.insns[insn].data {
            InsnData::Copy { result, .. } if index == 0 => result,
            InsnData::Calc { result, .. } if index == 0 => result,
            InsnData::FunArg { result, .. } if index == 0 => result,
            InsnData::PhiFun { result, .. } if index == 0 => result,
            _ => ir_bug!("result index {} out of range for instruction", index),
        }
    }

    /// Replace every occurrence of `old` in `insn`'s arguments with `new`.
    pub fn replace_arg_reg(&mut self, insn: InsnId, old: RegId, new: RegId) {
        let args = self.insns[insn].args();
        for (i, a) in args.iter().enumerate() {
            if *a == old {
                self.change_arg(insn, i, new);
            }
        }
    }

    // ---- edges --------------------------------------------------------------------------------

    /// Compare-and-swap the fall-through edge.
    pub fn set_fall_through(&mut self, block: BlockId, to: Option<BlockId>) {
        if self.blocks[block].fall_through == to {
            return;
        }
        self.blocks[block].fall_through = to;
        self.recompute_successors(block);
    }

    /// Retarget whichever edges of `block` point at `from` (its fall-through and/or its
    /// terminator) to point at `to` instead.
    pub fn change_successor(&mut self, block: BlockId, from: BlockId, to: BlockId) {
        if self.blocks[block].fall_through == Some(from) {
            self.blocks[block].fall_through = Some(to);
        }
        if let Some(idx) = self.blocks[block].last_index() {
            let term = self.blocks[block].insns[idx];
            if self.insns[term].branch_target() == Some(from) {
                self.insns[term].set_branch_target(Some(to));
            }
        }
        self.recompute_successors(block);
    }

    /// Retarget a `CondBranch`'s target, mirroring the successor-list update.
    pub fn set_branch_target(&mut self, insn: InsnId, target: Option<BlockId>) {
        self.insns[insn].set_branch_target(target);
        if let Some(block) = self.insns[insn].block {
            self.recompute_successors(block);
        }
    }

    /// Recompute `block`'s successor set from its fall-through and terminator, diffing against
    /// the previous set to patch the affected blocks' predecessor lists exactly once. This is
    /// the single choke point through which every edge-changing operation above passes, which is
    /// what keeps I2–I4 honest without each call site re-deriving them by hand.
    fn recompute_successors(&mut self, block: BlockId) {
        let mut new_succs: Vec<BlockId> = Vec::new();
        if let Some(ft) = self.blocks[block].fall_through {
            new_succs.push(ft);
        }
        if let Some(idx) = self.blocks[block].last_index() {
            let term = self.blocks[block].insns[idx];
            if let Some(target) = self.insns[term].branch_target() {
                if !new_succs.contains(&target) {
                    new_succs.push(target);
                }
            }
        }
        let old_succs = self.blocks[block].succs.clone();
        if old_succs == new_succs {
            return;
        }
        for &old in &old_succs {
            if !new_succs.contains(&old) {
                self.blocks[old].preds.retain(|&p| p != block);
            }
        }
        for &new in &new_succs {
            if !old_succs.contains(&new) {
                self.blocks[new].preds.push(block);
            }
        }
        self.blocks[block].succs = new_succs;
        self.invalidate_dominators();
    }

    // ---- block lifecycle ------------------------------------------------------------------

    /// Destroy a block: destroy each of its instructions, clear its fall-through, and unhook it
    /// from every predecessor (replacing each predecessor's edge to this block with this
    /// block's own fall-through, or removing it if this block has none), then remove it from
    /// the successor set of those predecessors.
    pub fn destroy_block(&mut self, block: BlockId) {
        let insns: Vec<InsnId> = self.blocks[block].insns.clone();
        for insn in insns {
            self.destroy_insn(insn);
        }
        let fall_through = self.blocks[block].fall_through;
        self.blocks[block].fall_through = None;
        let preds: Vec<BlockId> = self.blocks[block].preds.clone();
        for pred in preds {
            self.change_successor_or_clear(pred, block, fall_through);
        }
        let succs: Vec<BlockId> = self.blocks[block].succs.clone();
        for succ in succs {
            self.blocks[succ].preds.retain(|&p| p != block);
        }
        self.blocks[block].succs.clear();
        self.blocks[block].preds.clear();
        debug_assert!(self.blocks[block].preds.is_empty());
        debug_assert!(self.blocks[block].succs.is_empty());
    }

    fn change_successor_or_clear(&mut self, block: BlockId, from: BlockId, to: Option<BlockId>) {
        match to {
            Some(to) => self.change_successor(block, from, to),
            None => {
                if self.blocks[block].fall_through == Some(from) {
                    self.blocks[block].fall_through = None;
                }
                if let Some(idx) = self.blocks[block].last_index() {
                    let term = self.blocks[block].insns[idx];
                    if self.insns[term].branch_target() == Some(from) {
                        self.insns[term].set_branch_target(None);
                    }
                }
                self.recompute_successors(block);
            }
        }
    }

    // ---- instruction-level queries ----------------------------------------------------------

    /// `a` dominates `b`: same block, `a` precedes `b` in instruction order (false if equal);
    /// different blocks, `a`'s block strictly dominates `b`'s block. Requires
    /// `dominators_valid()` when `a` and `b` are in different blocks.
    pub fn insn_dominates(&self, a: InsnId, b: InsnId) -> bool {
        if a == b {
            return false;
        }
        match (self.insns[a].block, self.insns[b].block) {
            (Some(ba), Some(bb)) if ba == bb => {
                let insns = &self.blocks[ba].insns;
                let pa = insns.iter().position(|&i| i == a);
                let pb = insns.iter().position(|&i| i == b);
                matches!((pa, pb), (Some(pa), Some(pb)) if pa < pb)
            }
            (Some(ba), Some(bb)) => self.strictly_dominates(ba, bb),
            _ => false,
        }
    }

    /// Whether `a` strictly dominates `b` in the forward dominator tree. Requires
    /// `dominators_valid()`.
    pub fn strictly_dominates(&self, a: BlockId, b: BlockId) -> bool {
        if a == b {
            return false;
        }
        self.dominates(a, b)
    }

    /// Whether `a` dominates `b` (reflexively) in the forward dominator tree.
    pub fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        debug_assert!(self.dominators_valid, "dominators are stale");
        let mut cur = Some(b);
        while let Some(c) = cur {
            if c == a {
                return true;
            }
            cur = self.blocks[c].dom.idom;
        }
        false
    }
}

impl InsnData {
    pub(crate) fn phi_fun_register_input(&mut self, inp: InsnId) {
        if let InsnData::PhiFun { inputs, .. } = self {
            inputs.push(inp);
        } else {
            ir_bug!("phi_fun_register_input on a non-PhiFun instruction");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fall_through_is_symmetric_between_pred_and_succ() {
        let mut f = Function::new("f");
        let entry = f.entry();
        let exit = f.exit();
        f.set_fall_through(entry, Some(exit));

        assert_eq!(f.block(entry).successors(), &[exit]);
        assert_eq!(f.block(exit).predecessors(), &[entry]);
    }

    #[test]
    fn retargeting_fall_through_updates_old_and_new_predecessor_lists() {
        let mut f = Function::new("f");
        let entry = f.entry();
        let exit = f.exit();
        let mid = f.make_block();

        f.set_fall_through(entry, Some(mid));
        f.set_fall_through(entry, Some(exit));

        assert!(f.block(mid).predecessors().is_empty(), "mid should no longer be a successor of entry");
        assert_eq!(f.block(exit).predecessors(), &[entry]);
    }

    #[test]
    fn branch_and_fall_through_both_contribute_distinct_successors() {
        let mut f = Function::new("f");
        let entry = f.entry();
        let exit = f.exit();
        let taken = f.make_block();

        let cond = f.make_reg("c");
        let branch = f.make_insn(InsnData::CondBranch { cond, target: None });
        f.insert_insn(entry, branch, InsertPos::Append);
        f.set_branch_target(branch, Some(taken));
        f.set_fall_through(entry, Some(exit));

        let succs = f.block(entry).successors();
        assert_eq!(succs.len(), 2);
        assert!(succs.contains(&taken));
        assert!(succs.contains(&exit));
    }

    #[test]
    fn branch_target_equal_to_fall_through_yields_one_successor() {
        let mut f = Function::new("f");
        let entry = f.entry();
        let exit = f.exit();

        let cond = f.make_reg("c");
        let branch = f.make_insn(InsnData::CondBranch { cond, target: None });
        f.insert_insn(entry, branch, InsertPos::Append);
        f.set_branch_target(branch, Some(exit));
        f.set_fall_through(entry, Some(exit));

        assert_eq!(f.block(entry).successors(), &[exit], "a redundant branch must not duplicate the successor");
    }

    #[test]
    fn destroy_block_splices_fall_through_into_its_predecessors() {
        let mut f = Function::new("f");
        let entry = f.entry();
        let exit = f.exit();
        let mid = f.make_block();

        f.set_fall_through(entry, Some(mid));
        f.set_fall_through(mid, Some(exit));
        f.destroy_block(mid);

        assert_eq!(f.block(entry).successors(), &[exit], "entry should now fall through directly to exit");
        assert!(f.block(exit).predecessors().contains(&entry));
    }

    #[test]
    fn edge_mutation_invalidates_cached_dominators() {
        let mut f = Function::new("f");
        let entry = f.entry();
        let exit = f.exit();
        f.set_dominators_valid(true);
        f.set_fall_through(entry, Some(exit));
        assert!(!f.dominators_valid(), "changing an edge must invalidate the dominator tree");
    }
}


//! The instruction hierarchy.
//!
//! Cranelift's `InstructionData` is a tagged sum over a *large* opcode set, dispatched by
//! pattern match rather than by vtable. This IR's instruction set is much smaller, but the same
//! idiom applies: one closed `InsnData` enum instead of the pointer-graph's class hierarchy with
//! RTTI-based dispatch, and teardown is one non-virtual function (`Function::remove_insn`) that
//! matches on the tag instead of a chain of virtual destructors that have to special-case
//! `CondBranch` because the vtable has already been torn down to the base by the time the base
//! destructor runs.

use crate::ir::{BlockId, InsnId, RegId};
use crate::ir_bug;
use smallvec::SmallVec;

/// The operator of a `Calc` instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CalcOp {
    Add,
    Sub,
    Mul,
    Div,
    Neg,
}

impl CalcOp {
    /// Number of register arguments this operator takes (1 for `Neg`, 2 otherwise).
    pub fn arity(self) -> usize {
        match self {
            CalcOp::Neg => 1,
            CalcOp::Add | CalcOp::Sub | CalcOp::Mul | CalcOp::Div => 2,
        }
    }

    /// The textual infix/prefix operator, as written by the writer and accepted by the reader.
    pub fn symbol(self) -> &'static str {
        match self {
            CalcOp::Add => "+",
            CalcOp::Sub => "-",
            CalcOp::Mul => "*",
            CalcOp::Div => "/",
            CalcOp::Neg => "-",
        }
    }
}

/// The variant-specific payload of an instruction. Args/results are exposed uniformly through
/// [`Insn::args`]/[`Insn::results`] regardless of which arm is active.
#[derive(Clone, Debug)]
pub enum InsnData {
    /// Opaque, side-effecting no-op. Never removed by dead-code elimination (see
    /// `Insn::has_side_effect`): the source IR keeps Nops across passes, and this
    /// implementation makes that contract explicit rather than accidental.
    Nop,
    /// Pure register-to-register move.
    Copy { arg: RegId, result: RegId },
    /// Pure arithmetic. `args` has one element for `Neg`, two otherwise.
    Calc {
        op: CalcOp,
        args: SmallVec<[RegId; 2]>,
        result: RegId,
    },
    /// Conditional branch terminator. `target` is `None` only transiently, while the reader or
    /// a transformation is still wiring the block graph together.
    CondBranch { cond: RegId, target: Option<BlockId> },
    /// The `n`th formal parameter. Valid only in the entry block.
    FunArg { n: u32, result: RegId },
    /// The `n`th return value. Valid only in the exit block; no instruction may follow it.
    FunResult { n: u32, arg: RegId },
    /// A φ-function. Valid only at a block's prologue, contiguous with other `PhiFun`s.
    /// `inputs` tracks the associated `PhiFunInp` instructions so destruction can clean them up.
    PhiFun { result: RegId, inputs: Vec<InsnId> },
    /// One incoming edge's value for a `PhiFun` in a successor block. Valid only at a block's
    /// epilogue, immediately before the terminator (or at the very end if there is none).
    PhiFunInp {
        arg: RegId,
        phi_fun: Option<InsnId>,
    },
}

/// An instruction, owned by at most one [`crate::ir::Block`] at a time.
#[derive(Clone, Debug)]
pub struct Insn {
    pub(crate) block: Option<BlockId>,
    pub data: InsnData,
}

impl Insn {
    pub(crate) fn new(data: InsnData) -> Self {
        Insn { block: None, data }
    }

    /// The block that currently contains this instruction, if any.
    pub fn block(&self) -> Option<BlockId> {
        self.block
    }

    /// Registers read by this instruction, in order.
    pub fn args(&self) -> SmallVec<[RegId; 2]> {
        match &self.data {
            InsnData::Nop => SmallVec::new(),
            InsnData::Copy { arg, .. } => SmallVec::from_slice(&[*arg]),
            InsnData::Calc { args, .. } => args.clone(),
            InsnData::CondBranch { cond, .. } => SmallVec::from_slice(&[*cond]),
            InsnData::FunArg { .. } => SmallVec::new(),
            InsnData::FunResult { arg, .. } => SmallVec::from_slice(&[*arg]),
            InsnData::PhiFun { .. } => SmallVec::new(),
            InsnData::PhiFunInp { arg, .. } => SmallVec::from_slice(&[*arg]),
        }
    }

    /// Registers written by this instruction, in order.
    pub fn results(&self) -> SmallVec<[RegId; 1]> {
        match &self.data {
            InsnData::Nop => SmallVec::new(),
            InsnData::Copy { result, .. } => SmallVec::from_slice(&[*result]),
            InsnData::Calc { result, .. } => SmallVec::from_slice(&[*result]),
            InsnData::CondBranch { .. } => SmallVec::new(),
            InsnData::FunArg { result, .. } => SmallVec::from_slice(&[*result]),
            InsnData::FunResult { .. } => SmallVec::new(),
            InsnData::PhiFun { result, .. } => SmallVec::from_slice(&[*result]),
            InsnData::PhiFunInp { .. } => SmallVec::new(),
        }
    }

    /// Whether this instruction may affect control flow (and is therefore constrained to be the
    /// last instruction in its block).
    pub fn is_branch(&self) -> bool {
        matches!(self.data, InsnData::CondBranch { .. })
    }

    /// Whether this instruction can never be removed even if all of its results are unused.
    pub fn has_side_effect(&self) -> bool {
        matches!(self.data, InsnData::Nop | InsnData::FunResult { .. })
    }

    /// The branch target, for `CondBranch` instructions.
    pub fn branch_target(&self) -> Option<BlockId> {
        match &self.data {
            InsnData::CondBranch { target, .. } => *target,
            _ => None,
        }
    }

    /// Retarget a `CondBranch`. No-op (aside from the panic guard) on any other variant: callers
    /// are expected to check `is_branch()` first, exactly as `Insn::branch_target` returns `None`
    /// rather than panicking, so that passes can probe without matching on the variant
    /// themselves.
    pub(crate) fn set_branch_target(&mut self, target: Option<BlockId>) {
        match &mut self.data {
            InsnData::CondBranch { target: t, .. } => *t = target,
            _ => ir_bug!("set_branch_target on a non-branch instruction"),
        }
    }

    pub fn is_phi_fun(&self) -> bool {
        matches!(self.data, InsnData::PhiFun { .. })
    }

    pub fn is_phi_fun_inp(&self) -> bool {
        matches!(self.data, InsnData::PhiFunInp { .. })
    }

    pub fn is_fun_result(&self) -> bool {
        matches!(self.data, InsnData::FunResult { .. })
    }

    pub fn is_fun_arg(&self) -> bool {
        matches!(self.data, InsnData::FunArg { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cranelift_entity::EntityRef;

    fn reg(n: u32) -> RegId {
        RegId::new(n as usize)
    }

    #[test]
    fn calc_arity_matches_operand_count() {
        assert_eq!(CalcOp::Neg.arity(), 1);
        assert_eq!(CalcOp::Add.arity(), 2);
        assert_eq!(CalcOp::Sub.arity(), 2);
        assert_eq!(CalcOp::Mul.arity(), 2);
        assert_eq!(CalcOp::Div.arity(), 2);
    }

    #[test]
    fn calc_args_and_results() {
        let insn = Insn::new(InsnData::Calc {
            op: CalcOp::Add,
            args: smallvec::smallvec![reg(0), reg(1)],
            result: reg(2),
        });
        assert_eq!(insn.args().as_slice(), &[reg(0), reg(1)]);
        assert_eq!(insn.results().as_slice(), &[reg(2)]);
        assert!(!insn.is_branch());
        assert!(!insn.has_side_effect());
    }

    #[test]
    fn nop_has_no_operands_but_has_a_side_effect() {
        let insn = Insn::new(InsnData::Nop);
        assert!(insn.args().is_empty());
        assert!(insn.results().is_empty());
        assert!(insn.has_side_effect());
    }

    #[test]
    fn cond_branch_is_a_branch_with_no_results() {
        let insn = Insn::new(InsnData::CondBranch { cond: reg(0), target: None });
        assert!(insn.is_branch());
        assert!(insn.results().is_empty());
        assert_eq!(insn.branch_target(), None);
    }
}

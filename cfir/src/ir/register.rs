//! Symbolic registers.

use crate::ir::{InsnId, RegId, ValueId};

/// A symbolic, typeless storage cell (not a machine register).
///
/// Constant registers are anonymous: they carry `constant = Some(_)` and an empty `name`.
/// Named, non-constant registers are the `reg` declarations of the textual format.
#[derive(Clone, Debug, Default)]
pub struct Register {
    /// Source-level name. Empty for anonymous constant registers.
    pub name: String,
    /// The constant this register is permanently bound to, if any.
    pub constant: Option<ValueId>,
    /// Instructions whose `args` contain this register.
    pub uses: Vec<InsnId>,
    /// Instructions whose `results` contain this register.
    pub defs: Vec<InsnId>,
    /// The pre-SSA register this one was renamed from, if this register was produced by SSA
    /// conversion.
    pub ssa_proto: Option<RegId>,
    /// The SSA registers renamed from this one, in allocation order. Only ever non-empty on a
    /// register that is itself someone's `ssa_proto`.
    pub ssa_values: Vec<RegId>,
}

impl Register {
    pub(crate) fn named(name: String) -> Self {
        Register {
            name,
            ..Default::default()
        }
    }

    pub(crate) fn constant(value: ValueId) -> Self {
        Register {
            constant: Some(value),
            ..Default::default()
        }
    }

    /// True for anonymous constant registers introduced for integer literals.
    pub fn is_constant(&self) -> bool {
        self.constant.is_some()
    }
}

//! Entity references into the arenas owned by a [`crate::ir::Function`].
//!
//! Blocks, instructions, registers and constant values are never referenced through Rust
//! references: a `Function` is a dense web of cross-links (block ↔ instruction, register ↔
//! instruction, block ↔ block) and modeling that with borrows or `Rc`/`RefCell` fights the
//! borrow checker at every turn. Instead each entity kind gets its own 32-bit index type into a
//! typed arena (`PrimaryMap`) held by the `Function`. This is the single most important
//! redesign point relative to the pointer-graph this IR is modeled on: an id-based arena makes
//! dangling-reference bugs and destructor-order bugs unrepresentable at the API boundary.

use core::fmt;
use cranelift_entity::entity_impl;

/// A reference to a [`crate::ir::Block`] in a function.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u32);
entity_impl!(BlockId, "block");

/// A reference to an [`crate::ir::Insn`] in a function.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InsnId(u32);
entity_impl!(InsnId, "insn");

/// A reference to a [`crate::ir::Register`] in a function.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegId(u32);
entity_impl!(RegId, "r");

/// A reference to a constant [`crate::ir::Value`] in a function.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(u32);
entity_impl!(ValueId, "val");

/// A reference to any of the entities defined in this module, for use in diagnostics.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub enum AnyEntity {
    Block(BlockId),
    Insn(InsnId),
    Reg(RegId),
    Value(ValueId),
}

impl fmt::Display for AnyEntity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            AnyEntity::Block(r) => r.fmt(f),
            AnyEntity::Insn(r) => r.fmt(f),
            AnyEntity::Reg(r) => r.fmt(f),
            AnyEntity::Value(r) => r.fmt(f),
        }
    }
}

impl fmt::Debug for AnyEntity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        (self as &dyn fmt::Display).fmt(f)
    }
}

impl From<BlockId> for AnyEntity {
    fn from(r: BlockId) -> Self {
        AnyEntity::Block(r)
    }
}

impl From<InsnId> for AnyEntity {
    fn from(r: InsnId) -> Self {
        AnyEntity::Insn(r)
    }
}

impl From<RegId> for AnyEntity {
    fn from(r: RegId) -> Self {
        AnyEntity::Reg(r)
    }
}

impl From<ValueId> for AnyEntity {
    fn from(r: ValueId) -> Self {
        AnyEntity::Value(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cranelift_entity::EntityRef;

    #[test]
    fn display_prefixes() {
        assert_eq!(BlockId::new(3).to_string(), "block3");
        assert_eq!(InsnId::new(3).to_string(), "insn3");
        assert_eq!(RegId::new(3).to_string(), "r3");
        assert_eq!(ValueId::new(3).to_string(), "val3");
    }
}

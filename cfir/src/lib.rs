//! A compiler middle-end intermediate representation: basic blocks, a small tagged-sum
//! instruction set, dominator/post-dominator trees, and SSA construction/destruction.
//!
//! The data model lives in [`ir`]; [`dominance`] and [`ssa`] are analyses and transforms over it;
//! [`passes`] holds the graph-simplification passes. [`error`] draws the line between
//! invariant-violation bugs (always-on panics via [`ir_bug!`]) and the one recoverable error
//! condition SSA conversion can hit ([`error::IrError`]).

pub mod dominance;
pub mod error;
pub mod ir;
pub mod passes;
pub mod ssa;

pub use error::IrError;

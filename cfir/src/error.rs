//! Invariant-violation "bugs" versus ordinary recoverable errors.
//!
//! The IR data model never lets an invariant-violation become a `Result`: a dangling dominator
//! pointer or a φ-input with no value in its predecessor is a bug in the caller (or in this
//! crate), not a condition a well-behaved program recovers from. These are raised through
//! [`ir_bug!`], which panics with the name of the violated invariant, mirroring the
//! `debug_assert!`-laden invariant checks the dominator tree and flow graph code is modeled on,
//! escalated to an always-on assertion since this IR has no separate verifier pass to catch the
//! same mistake later.

/// Panic, naming the invariant that was violated.
///
/// Unlike `debug_assert!`, this fires in release builds too: there is no verifier pass that
/// would otherwise catch a corrupted graph before it silently produces wrong output.
#[macro_export]
macro_rules! ir_bug {
    ($($arg:tt)*) => {
        panic!("cfir invariant violated: {}", format_args!($($arg)*))
    };
}

/// A fatal, IR-level error produced by the SSA converter when the graph cannot satisfy an
/// invariant no caller could have prevented by construction (e.g. a φ input with no reaching
/// value). Distinct from [`ir_bug!`] in that it is raised from deep inside a multi-step
/// algorithm where unwinding via `Result` keeps the call sites readable; it still represents a
/// corrupt-graph condition, never an expected/recoverable one.
#[derive(Debug, thiserror::Error)]
pub enum IrError {
    #[error("phi input has no value in predecessor (register {register}, block {block})")]
    PhiInputMissingValue {
        register: crate::ir::RegId,
        block: crate::ir::BlockId,
    },
}

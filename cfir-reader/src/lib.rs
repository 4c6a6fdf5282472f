//! Textual I/O for [`cfir`]: a line-oriented reader that parses IR text into a
//! [`cfir::ir::Program`], a writer that emits it back out in canonical form, and the
//! [`error::SrcContext`] collaborator that turns a [`error::ParseError`] into a rendered,
//! file-and-line-aware message.
//!
//! The reader and writer are deliberately split from `cfir` itself (component G/H versus
//! A–F): the core data model has no notion of source text, and this crate has no notion of
//! dominance or SSA beyond what it needs to print the writer's optional annotations.

mod error;
mod lexer;
mod parser;
mod writer;

pub use error::{FileSrcContext, Location, ParseError, ParseResult, SrcContext};
pub use parser::parse;
pub use writer::{write_function, write_program, WriteOptions};

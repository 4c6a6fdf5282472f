//! `Location`, `ParseError`, and the `SrcContext` collaborator that renders them.

use std::fmt;

/// The location of a token or error in the source text.
///
/// Line numbers start from 1; line 0 is reserved for errors attributed to the command line
/// itself (an unreadable file, a missing argument) rather than to a position in it. Column is
/// only ever populated by the lexer, for errors that can be pinned to a single character (an
/// unrecognized symbol); parser-level errors are reported at the start of the offending line,
/// since whitespace carries no meaning in this grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line_number: u32,
    pub column: Option<u32>,
}

impl Location {
    pub fn line(line_number: u32) -> Self {
        Location {
            line_number,
            column: None,
        }
    }

    pub fn new(line_number: u32, column: u32) -> Self {
        Location {
            line_number,
            column: Some(column),
        }
    }
}

/// A parse error, carrying the location at which it was detected.
#[derive(Debug, thiserror::Error)]
#[error("{location}: {message}")]
pub struct ParseError {
    pub location: Location,
    pub message: String,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.line_number == 0 {
            write!(f, "command line")
        } else {
            match self.column {
                Some(col) => write!(f, "{}:{}", self.line_number, col),
                None => write!(f, "{}", self.line_number),
            }
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Build an `Err(ParseError)` at a location, with `format!`-style message arguments.
macro_rules! err {
    ( $loc:expr, $msg:expr ) => {
        Err($crate::ParseError {
            location: $loc,
            message: $msg.to_string(),
        })
    };
    ( $loc:expr, $fmt:expr, $( $arg:expr ),+ ) => {
        Err($crate::ParseError {
            location: $loc,
            message: format!( $fmt, $( $arg ),+ ),
        })
    };
}

pub(crate) use err;

/// Resolves a `Location` to human-readable context (file name, the offending source line, and a
/// caret under the column if one is known) and terminates the process. The reader itself never
/// formats or prints; it only produces `ParseError`s for its caller to hand to a `SrcContext`.
pub trait SrcContext {
    fn error(&self, loc: Location, msg: &str) -> !;
}

/// A `SrcContext` backed by an in-memory copy of the source text and an associated file name
/// (or `<stdin>`).
pub struct FileSrcContext<'a> {
    pub file_name: &'a str,
    pub source: &'a str,
}

impl<'a> FileSrcContext<'a> {
    pub fn new(file_name: &'a str, source: &'a str) -> Self {
        FileSrcContext { file_name, source }
    }

    /// Render a `ParseError` the way [`SrcContext::error`] would, without terminating the
    /// process. Used by callers (like `cfir-tools`) that want to control the exit path
    /// themselves rather than have the library call `std::process::exit`.
    pub fn render(&self, err: &ParseError) -> String {
        let mut out = format!("{}:{}: {}", self.file_name, err.location, err.message);
        if err.location.line_number > 0 {
            if let Some(line) = self.source.lines().nth((err.location.line_number - 1) as usize) {
                out.push('\n');
                out.push_str(line);
                if let Some(col) = err.location.column {
                    out.push('\n');
                    out.push_str(&" ".repeat(col as usize));
                    out.push('^');
                }
            }
        }
        out
    }
}

impl<'a> SrcContext for FileSrcContext<'a> {
    fn error(&self, loc: Location, msg: &str) -> ! {
        let err = ParseError {
            location: loc,
            message: msg.to_string(),
        };
        eprintln!("{}", self.render(&err));
        std::process::exit(1)
    }
}

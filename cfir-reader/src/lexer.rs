//! Line-oriented tokenizer. Whitespace within a line is insignificant; `#` begins a comment that
//! runs to the end of the line. Each non-blank, non-comment-only line becomes one [`Line`] of
//! tokens, which the parser consumes one statement at a time.

use crate::error::{err, Location, ParseResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Fun,
    Reg,
    If,
    Goto,
    Nop,
    FunArg,
    FunResult,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Colon,
    ColonEq,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    Label(u32),
    Ident(String),
    Int(i64),
}

/// One source line's worth of tokens, already stripped of comments. Empty lines are never
/// produced; the lexer skips them entirely.
pub struct Line {
    pub location: Location,
    pub tokens: Vec<(Token, Location)>,
}

pub fn lex(source: &str) -> ParseResult<Vec<Line>> {
    let mut lines = Vec::new();
    for (i, raw) in source.lines().enumerate() {
        let line_number = (i + 1) as u32;
        let code = match raw.find('#') {
            Some(idx) => &raw[..idx],
            None => raw,
        };
        let tokens = lex_line(code, line_number)?;
        if !tokens.is_empty() {
            lines.push(Line {
                location: Location::line(line_number),
                tokens,
            });
        }
    }
    Ok(lines)
}

fn lex_line(code: &str, line_number: u32) -> ParseResult<Vec<(Token, Location)>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = code.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let col = i as u32;
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        match c {
            '{' => {
                tokens.push((Token::LBrace, Location::new(line_number, col)));
                i += 1;
            }
            '}' => {
                tokens.push((Token::RBrace, Location::new(line_number, col)));
                i += 1;
            }
            '(' => {
                tokens.push((Token::LParen, Location::new(line_number, col)));
                i += 1;
            }
            ')' => {
                tokens.push((Token::RParen, Location::new(line_number, col)));
                i += 1;
            }
            ',' => {
                tokens.push((Token::Comma, Location::new(line_number, col)));
                i += 1;
            }
            '+' => {
                tokens.push((Token::Plus, Location::new(line_number, col)));
                i += 1;
            }
            '-' => {
                tokens.push((Token::Minus, Location::new(line_number, col)));
                i += 1;
            }
            '*' => {
                tokens.push((Token::Star, Location::new(line_number, col)));
                i += 1;
            }
            '/' => {
                tokens.push((Token::Slash, Location::new(line_number, col)));
                i += 1;
            }
            ':' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push((Token::ColonEq, Location::new(line_number, col)));
                    i += 2;
                } else {
                    tokens.push((Token::Colon, Location::new(line_number, col)));
                    i += 1;
                }
            }
            '_' if chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()) => {
                let start = i;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let digits: String = chars[start + 1..i].iter().collect();
                let n: u32 = digits.parse().map_err(|_| crate::error::ParseError {
                    location: Location::new(line_number, col),
                    message: format!("label number out of range: _{digits}"),
                })?;
                tokens.push((Token::Label(n), Location::new(line_number, col)));
            }
            '0'..='9' => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let digits: String = chars[start..i].iter().collect();
                let n: i64 = digits.parse().map_err(|_| crate::error::ParseError {
                    location: Location::new(line_number, col),
                    message: format!("integer literal out of range: {digits}"),
                })?;
                tokens.push((Token::Int(n), Location::new(line_number, col)));
            }
            c if is_ident_start(c) => {
                let start = i;
                while i < chars.len() && is_ident_continue(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let tok = match word.as_str() {
                    "fun" => Token::Fun,
                    "reg" => Token::Reg,
                    "if" => Token::If,
                    "goto" => Token::Goto,
                    "nop" => Token::Nop,
                    "fun_arg" => Token::FunArg,
                    "fun_result" => Token::FunResult,
                    _ => Token::Ident(word),
                };
                tokens.push((tok, Location::new(line_number, col)));
            }
            other => {
                return err!(
                    Location::new(line_number, col),
                    "unexpected character '{}'",
                    other
                );
            }
        }
    }
    Ok(tokens)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

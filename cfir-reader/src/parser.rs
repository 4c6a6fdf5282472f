//! Recursive-descent parser: turns a token stream into a [`cfir::ir::Program`].

use crate::error::{err, Location, ParseError, ParseResult};
use crate::lexer::{lex, Line, Token};
use cfir::ir::{BlockId, CalcOp, Function, InsertPos, InsnData, Program, RegId};
use std::collections::{HashMap, HashSet};

pub fn parse(source: &str) -> ParseResult<Program> {
    let lines = lex(source)?;
    let mut program = Program::new();
    let mut pos = 0;
    while pos < lines.len() {
        let (f, consumed) = parse_function(&lines[pos..])?;
        let name = f.name.clone();
        pos += consumed;
        if program.add_function(f).is_err() {
            return err!(lines[pos - consumed].location, "duplicate function name '{}'", name);
        }
    }
    Ok(program)
}

type Toks<'a> = std::iter::Peekable<std::slice::Iter<'a, (Token, Location)>>;

fn expect(toks: &mut Toks, want: &Token, loc: Location) -> ParseResult<()> {
    match toks.next() {
        Some((t, _)) if t == want => Ok(()),
        other => unexpected(other, loc, &format!("{want:?}")),
    }
}

fn expect_end(toks: &mut Toks, loc: Location) -> ParseResult<()> {
    match toks.next() {
        None => Ok(()),
        Some((t, _)) => err!(loc, "unexpected trailing token {:?}", t),
    }
}

fn unexpected<T>(found: Option<&(Token, Location)>, loc: Location, wanted: &str) -> ParseResult<T> {
    match found {
        Some((t, at)) => err!(*at, "expected {}, found {:?}", wanted, t),
        None => err!(loc, "expected {}, found end of line", wanted),
    }
}

/// Parse one `fun ... { ... }` block starting at `lines[0]`. Returns the function and the number
/// of lines consumed, so the caller can advance past it to find the next function (if any).
fn parse_function(lines: &[Line]) -> ParseResult<(Function, usize)> {
    let mut i = 0;
    let header = &lines[i];
    i += 1;
    let mut toks = header.tokens.iter().peekable();
    expect(&mut toks, &Token::Fun, header.location)?;
    let name = match toks.next() {
        Some((Token::Ident(name), _)) => name.clone(),
        other => return unexpected(other, header.location, "function name"),
    };
    expect_end(&mut toks, header.location)?;

    let open = lines.get(i).ok_or_else(|| ParseError {
        location: header.location,
        message: "expected '{' after function name".to_string(),
    })?;
    i += 1;
    let mut toks = open.tokens.iter().peekable();
    expect(&mut toks, &Token::LBrace, open.location)?;
    expect_end(&mut toks, open.location)?;

    let mut f = Function::new(name);
    let mut regs: HashMap<String, RegId> = HashMap::new();
    let mut labels: HashMap<u32, BlockId> = HashMap::new();
    let mut order: Vec<BlockId> = vec![f.entry()];
    let mut current: BlockId = f.entry();
    let mut seen_label = false;
    let mut seen_fun_result = false;
    let mut explicit_fall: HashSet<BlockId> = HashSet::new();
    let mut pending_branches: Vec<(cfir::ir::InsnId, u32, Location)> = Vec::new();
    let mut pending_gotos: Vec<(BlockId, u32, Location)> = Vec::new();

    loop {
        let line = lines.get(i).ok_or_else(|| ParseError {
            location: open.location,
            message: "unterminated function body".to_string(),
        })?;
        i += 1;
        let mut toks = line.tokens.iter().peekable();
        match toks.next() {
            Some((Token::RBrace, _)) => {
                expect_end(&mut toks, line.location)?;
                break;
            }
            Some((Token::Reg, _)) => {
                reject_if_fun_result_seen(seen_fun_result, line.location)?;
                let name = match toks.next() {
                    Some((Token::Ident(name), _)) => name.clone(),
                    other => return unexpected(other, line.location, "register name"),
                };
                expect_end(&mut toks, line.location)?;
                if regs.contains_key(&name) {
                    return err!(line.location, "duplicate register declaration '{}'", name);
                }
                let r = f.make_reg(name.clone());
                regs.insert(name, r);
            }
            Some((Token::Label(n), _)) => {
                reject_if_fun_result_seen(seen_fun_result, line.location)?;
                let n = *n;
                expect(&mut toks, &Token::Colon, line.location)?;
                expect_end(&mut toks, line.location)?;
                if labels.contains_key(&n) {
                    return err!(line.location, "duplicate label '_{}'", n);
                }
                let block = if seen_label { f.make_block() } else { f.entry() };
                labels.insert(n, block);
                if !order.contains(&block) {
                    order.push(block);
                }
                current = block;
                seen_label = true;
            }
            Some((Token::FunArg, _)) => {
                reject_if_fun_result_seen(seen_fun_result, line.location)?;
                if current != f.entry() {
                    return err!(line.location, "fun_arg may only appear in the entry block");
                }
                let n = parse_index(&mut toks, line.location)?;
                let reg = parse_reg_ref(&mut toks, &regs, line.location)?;
                expect_end(&mut toks, line.location)?;
                let insn = f.make_insn(InsnData::FunArg { n, result: reg });
                f.insert_insn(current, insn, InsertPos::Append);
            }
            Some((Token::FunResult, _)) => {
                let n = parse_index(&mut toks, line.location)?;
                let reg = parse_reg_ref(&mut toks, &regs, line.location)?;
                expect_end(&mut toks, line.location)?;
                let insn = f.make_insn(InsnData::FunResult { n, arg: reg });
                f.insert_insn(f.exit(), insn, InsertPos::Append);
                seen_fun_result = true;
            }
            Some((Token::Nop, _)) => {
                reject_if_fun_result_seen(seen_fun_result, line.location)?;
                expect_end(&mut toks, line.location)?;
                let insn = f.make_insn(InsnData::Nop);
                f.insert_insn(current, insn, InsertPos::Append);
            }
            Some((Token::If, _)) => {
                reject_if_fun_result_seen(seen_fun_result, line.location)?;
                expect(&mut toks, &Token::LParen, line.location)?;
                let cond = parse_reg_ref(&mut toks, &regs, line.location)?;
                expect(&mut toks, &Token::RParen, line.location)?;
                expect(&mut toks, &Token::Goto, line.location)?;
                let target_label = match toks.next() {
                    Some((Token::Label(n), _)) => *n,
                    other => return unexpected(other, line.location, "branch target label"),
                };
                expect_end(&mut toks, line.location)?;
                let insn = f.make_insn(InsnData::CondBranch { cond, target: None });
                f.insert_insn(current, insn, InsertPos::Append);
                pending_branches.push((insn, target_label, line.location));
            }
            Some((Token::Goto, _)) => {
                reject_if_fun_result_seen(seen_fun_result, line.location)?;
                let target_label = match toks.next() {
                    Some((Token::Label(n), _)) => *n,
                    other => return unexpected(other, line.location, "goto target label"),
                };
                expect_end(&mut toks, line.location)?;
                if !explicit_fall.insert(current) {
                    return err!(line.location, "block already has an explicit successor");
                }
                pending_gotos.push((current, target_label, line.location));
            }
            Some((Token::Ident(name), _)) => {
                reject_if_fun_result_seen(seen_fun_result, line.location)?;
                let first_reg = regs.get(name).copied().ok_or_else(|| ParseError {
                    location: line.location,
                    message: format!("unknown register '{name}'"),
                })?;
                parse_assignment(&mut f, &mut toks, &regs, current, first_reg, line.location)?;
            }
            other => return unexpected(other, line.location, "declaration or statement"),
        }
    }

    for (insn, label, loc) in pending_branches {
        let target = *labels.get(&label).ok_or_else(|| ParseError {
            location: loc,
            message: format!("undefined label '_{label}'"),
        })?;
        f.set_branch_target(insn, Some(target));
    }
    for (block, label, loc) in &pending_gotos {
        let target = *labels.get(label).ok_or_else(|| ParseError {
            location: *loc,
            message: format!("undefined label '_{label}'"),
        })?;
        f.set_fall_through(*block, Some(target));
    }

    let exit = f.exit();
    for (idx, &block) in order.iter().enumerate() {
        if explicit_fall.contains(&block) {
            continue;
        }
        let default = order.get(idx + 1).copied().unwrap_or(exit);
        f.set_fall_through(block, Some(default));
    }

    Ok((f, i))
}

fn parse_index(toks: &mut Toks, loc: Location) -> ParseResult<u32> {
    match toks.next() {
        Some((Token::Int(n), _)) if *n >= 0 => Ok(*n as u32),
        other => unexpected(other, loc, "a non-negative integer index"),
    }
}

fn parse_reg_ref(toks: &mut Toks, regs: &HashMap<String, RegId>, loc: Location) -> ParseResult<RegId> {
    match toks.next() {
        Some((Token::Ident(name), at)) => regs.get(name).copied().ok_or_else(|| ParseError {
            location: *at,
            message: format!("unknown register '{name}'"),
        }),
        other => unexpected(other, loc, "a register name"),
    }
}

/// A right-hand-side value: either a reference to a previously-declared register, or an integer
/// literal, which resolves to (and may share) an anonymous constant register.
fn parse_rvalue(f: &mut Function, toks: &mut Toks, regs: &HashMap<String, RegId>, loc: Location) -> ParseResult<RegId> {
    match toks.next() {
        Some((Token::Ident(name), at)) => regs.get(name).copied().ok_or_else(|| ParseError {
            location: *at,
            message: format!("unknown register '{name}'"),
        }),
        Some((Token::Int(n), _)) => Ok(f.make_const_reg(*n)),
        other => unexpected(other, loc, "a register name or integer literal"),
    }
}

/// Everything except another `fun_result` line must be rejected once a `fun_result` has been
/// seen in this function body; consecutive `fun_result` lines (for multi-value returns) are fine.
fn reject_if_fun_result_seen(seen_fun_result: bool, loc: Location) -> ParseResult<()> {
    if seen_fun_result {
        return err!(loc, "no instruction may follow fun_result");
    }
    Ok(())
}

/// `<reg>(, <reg>)* := <rvalue>(, <rvalue>)*` — single assignment, unary negation, binary
/// arithmetic, or a parallel copy (same arity on both sides, each right-hand side a plain
/// rvalue).
fn parse_assignment(
    f: &mut Function,
    toks: &mut Toks,
    regs: &HashMap<String, RegId>,
    block: BlockId,
    first_reg: RegId,
    loc: Location,
) -> ParseResult<()> {
    let mut results = vec![first_reg];
    while matches!(toks.peek(), Some((Token::Comma, _))) {
        toks.next();
        let reg = parse_reg_ref(toks, regs, loc)?;
        results.push(reg);
    }
    expect(toks, &Token::ColonEq, loc)?;

    if results.len() > 1 {
        for (i, result) in results.iter().enumerate() {
            if i > 0 {
                expect(toks, &Token::Comma, loc)?;
            }
            let arg = parse_rvalue(f, toks, regs, loc)?;
            let insn = f.make_insn(InsnData::Copy { arg, result: *result });
            f.insert_insn(block, insn, InsertPos::Append);
        }
        expect_end(toks, loc)?;
        return Ok(());
    }

    let result = results[0];
    if matches!(toks.peek(), Some((Token::Minus, _))) {
        toks.next();
        let arg = parse_rvalue(f, toks, regs, loc)?;
        expect_end(toks, loc)?;
        let insn = f.make_insn(InsnData::Calc {
            op: CalcOp::Neg,
            args: smallvec::smallvec![arg],
            result,
        });
        f.insert_insn(block, insn, InsertPos::Append);
        return Ok(());
    }

    let first = parse_rvalue(f, toks, regs, loc)?;
    let op = match toks.peek() {
        Some((Token::Plus, _)) => Some(CalcOp::Add),
        Some((Token::Minus, _)) => Some(CalcOp::Sub),
        Some((Token::Star, _)) => Some(CalcOp::Mul),
        Some((Token::Slash, _)) => Some(CalcOp::Div),
        _ => None,
    };
    match op {
        Some(op) => {
            toks.next();
            let second = parse_rvalue(f, toks, regs, loc)?;
            expect_end(toks, loc)?;
            let insn = f.make_insn(InsnData::Calc {
                op,
                args: smallvec::smallvec![first, second],
                result,
            });
            f.insert_insn(block, insn, InsertPos::Append);
        }
        None => {
            expect_end(toks, loc)?;
            let insn = f.make_insn(InsnData::Copy { arg: first, result });
            f.insert_insn(block, insn, InsertPos::Append);
        }
    }
    Ok(())
}

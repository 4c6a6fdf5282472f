//! Parser/writer round-trip: `parse(emit(P))` must be textually stable once `P` has already
//! gone through one parse/emit cycle (block numbers are allowed to be renumbered by the writer,
//! so the only way to compare "the same" two programs without a structural-equality API is to
//! check that emitting twice in a row produces identical text).

use cfir_reader::{parse, write_program, WriteOptions};
use pretty_assertions::assert_eq;

fn assert_stable_roundtrip(source: &str) {
    let program = parse(source).expect("initial parse must succeed");
    let once = write_program(&program, WriteOptions::bare());

    let reparsed = parse(&once).unwrap_or_else(|e| panic!("re-parsing emitted IR failed: {e}\n---\n{once}"));
    let twice = write_program(&reparsed, WriteOptions::bare());

    assert_eq!(once, twice, "emit(parse(emit(P))) must equal emit(P)");
}

#[test]
fn trivial_function_roundtrips() {
    assert_stable_roundtrip(
        r#"
fun g
{
   reg a
_0:
   fun_arg 0 a
   fun_result 0 a
}
"#,
    );
}

#[test]
fn two_function_program_with_loop_roundtrips() {
    assert_stable_roundtrip(
        r#"
fun g
{
   reg a
_0:
   fun_arg 0 a
   fun_result 0 a
}

fun f
{
   reg x
   reg y
_0:
   fun_arg 0 x
   if (x) goto _2
_1:
   y := x + x
_2:
   y := x * x
_3:
   if (y) goto _3
_4:
   y := y - x
_5:
   fun_result 0 y
}
"#,
    );
}

#[test]
fn parallel_copy_roundtrips() {
    assert_stable_roundtrip(
        r#"
fun pc
{
   reg a
   reg b
   reg c
   reg d
_0:
   a := 10
   b := 20
   c, d := a, b
   fun_result 0 c
}
"#,
    );
}

#[test]
fn unary_and_binary_arithmetic_roundtrips() {
    assert_stable_roundtrip(
        r#"
fun arith
{
   reg x
   reg y
   reg z
_0:
   fun_arg 0 x
   y := - x
   z := y * 2
   fun_result 0 z
}
"#,
    );
}

#[test]
fn duplicate_function_name_is_rejected() {
    let source = r#"
fun f
{
_0:
   nop
}

fun f
{
_0:
   nop
}
"#;
    let err = parse(source).expect_err("duplicate function names must be rejected");
    assert!(err.message.contains("duplicate function name"));
}

#[test]
fn unknown_register_is_rejected() {
    let source = r#"
fun f
{
_0:
   a := 1
}
"#;
    let err = parse(source).expect_err("undeclared register must be rejected");
    assert!(err.message.contains("unknown register"));
}

#[test]
fn fun_result_must_be_last() {
    let source = r#"
fun f
{
   reg a
_0:
   fun_result 0 a
   nop
}
"#;
    let err = parse(source).expect_err("an instruction after fun_result must be rejected");
    assert!(err.message.contains("fun_result"));
}

//! # IR Tests
//!
//! Tests for function construction, validation errors, value rendering, and the
//! JSON function description.

use loopcost_core::common::IrError;
use loopcost_core::ir::{BinOp, Function, FunctionBuilder, LoopSpec, ValueKind};

use crate::common::fixtures;

const SUM_JSON: &str = r#"{
    "name": "sum",
    "symbols": ["a", "n"],
    "blocks": [
        { "name": "entry", "insts": [ { "op": "jump", "target": "for.cond" } ] },
        { "name": "for.cond", "insts": [
            { "op": "induction", "name": "i", "start": 0, "step": 1 },
            { "op": "cmp", "name": "cond", "lhs": "i", "rhs": 64 },
            { "op": "branch", "then": "for.body", "else": "for.end" } ] },
        { "name": "for.body", "insts": [
            { "op": "add", "name": "idx", "lhs": "i", "rhs": 2 },
            { "op": "address", "name": "p", "operands": ["a", 0, "idx"] },
            { "op": "load", "name": "x", "address": "p" },
            { "op": "store", "address": "p", "value": 7 },
            { "op": "jump", "target": "for.inc" } ] },
        { "name": "for.inc", "insts": [
            { "op": "add", "name": "i.next", "lhs": "i", "rhs": 1 },
            { "op": "jump", "target": "for.cond" } ] },
        { "name": "for.end", "insts": [ { "op": "return" } ] }
    ],
    "loops": [
        { "header": "for.cond", "latch": "for.inc",
          "blocks": ["for.cond", "for.body", "for.inc"], "bound": 64 }
    ]
}"#;

// ══════════════════════════════════════════════════════════
// Builder
// ══════════════════════════════════════════════════════════

#[test]
fn test_constants_are_uniqued() {
    let mut b = FunctionBuilder::new("f");
    let x = b.constant(3);
    let y = b.constant(3);
    let z = b.constant(4);
    assert_eq!(x, y);
    assert_ne!(x, z);
}

#[test]
fn test_matmul_loop_forest() {
    let m = fixtures::matmul(8);
    let f = &m.func;
    assert_eq!(f.roots(), &[m.i]);
    assert_eq!(f.children(m.i), &[m.j]);
    assert_eq!(f.children(m.j), &[m.k]);
    assert!(f.is_innermost(m.k));
    assert_eq!(f.loop_name(m.k), "for.k");
    assert_eq!(f.loop_data(m.k).parent, Some(m.j));
    assert_eq!(f.exit_bound(m.i), Some(8));
    assert!(f.is_structurally_empty(f.find_block("for.i.body").unwrap()));
    assert!(!f.is_structurally_empty(f.find_block("for.k.body").unwrap()));
}

#[test]
fn test_induction_is_placed_in_header() {
    let m = fixtures::matmul(8);
    let iv = m.func.induction_variable(m.j).unwrap();
    assert!(matches!(
        m.func.value_kind(iv),
        ValueKind::Induction { loop_id, start: 0, step: 1 } if *loop_id == m.j
    ));
    assert_eq!(m.func.find_loop("for.j"), Some(m.j));
}

#[test]
fn test_describe_value() {
    let m = fixtures::matmul(8);
    let f = &m.func;
    let pa = f.find_value("arrayidx.a").unwrap();
    assert_eq!(f.describe_value(pa), "%arrayidx.a = address @a, 0, %i, %k");
    let i = f.find_value("i").unwrap();
    assert_eq!(f.describe_value(i), "%i = induction [start 0, step 1] in for.i");
    let sum = f.find_value("add").unwrap();
    assert_eq!(f.describe_value(sum), "%add = add %c.val, %mul");
}

#[test]
fn test_empty_address_is_rejected() {
    let mut b = FunctionBuilder::new("f");
    let bb = b.block("entry");
    let _ = b.address(bb, "p", &[]);
    b.ret(bb);
    assert!(matches!(b.finish(), Err(IrError::EmptyAddress(name)) if name == "p"));
}

#[test]
fn test_duplicate_value_name_is_rejected() {
    let mut b = FunctionBuilder::new("f");
    let bb = b.block("entry");
    let _ = b.symbol("x");
    let _ = b.opaque(bb, "x");
    b.ret(bb);
    assert!(matches!(b.finish(), Err(IrError::Duplicate { kind: "value", .. })));
}

#[test]
fn test_loop_must_contain_latch() {
    let mut b = FunctionBuilder::new("f");
    let h = b.block("h");
    let l = b.block("l");
    let _ = b.add_loop(LoopSpec::new(h, l, vec![h]));
    assert!(matches!(
        b.finish(),
        Err(IrError::MissingLoopBlock { role: "latch", .. })
    ));
}

#[test]
fn test_child_blocks_must_be_nested() {
    let mut b = FunctionBuilder::new("f");
    let oh = b.block("outer");
    let ol = b.block("outer.inc");
    let ih = b.block("inner");
    let il = b.block("inner.inc");
    let outer = b.add_loop(LoopSpec::new(oh, ol, vec![oh, ol, ih]));
    let _ = b.add_loop(LoopSpec::new(ih, il, vec![ih, il]).within(outer));
    assert!(matches!(b.finish(), Err(IrError::NotNested { .. })));
}

#[test]
fn test_dangling_operand_is_rejected() {
    let mut other = FunctionBuilder::new("other");
    let _ = other.symbol("a");
    let _ = other.symbol("b");
    let foreign = other.symbol("c");

    let mut b = FunctionBuilder::new("f");
    let bb = b.block("entry");
    let x = b.symbol("x");
    let _ = b.binary(bb, "y", BinOp::Add, x, foreign);
    b.ret(bb);
    assert!(matches!(b.finish(), Err(IrError::UnknownValue(_))));
}

// ══════════════════════════════════════════════════════════
// JSON Description
// ══════════════════════════════════════════════════════════

#[test]
fn test_from_json_builds_function() {
    let f = Function::from_json(SUM_JSON).unwrap();
    assert_eq!(f.name(), "sum");
    assert_eq!(f.roots().len(), 1);
    let l = f.roots()[0];
    assert_eq!(f.loop_name(l), "for.cond");
    assert_eq!(f.exiting_block(l), Some(f.header(l)));
    assert_eq!(f.exit_bound(l), Some(64));

    let p = f.find_value("p").unwrap();
    assert_eq!(f.describe_value(p), "%p = address @a, 0, %idx");
    assert_eq!(f.address_operands(p).map(<[_]>::len), Some(3));
}

#[test]
fn test_from_json_rejects_undefined_value() {
    let json = SUM_JSON.replace(r#""address": "p" }"#, r#""address": "q" }"#);
    let err = Function::from_json(&json).unwrap_err();
    assert!(matches!(err, IrError::Undefined { kind: "value", name } if name == "q"));
}

#[test]
fn test_from_json_rejects_unknown_op() {
    let json = SUM_JSON.replace(r#""op": "return""#, r#""op": "halt""#);
    assert!(matches!(Function::from_json(&json), Err(IrError::Json(_))));
}

#[test]
fn test_from_json_multiple_exits() {
    let json = SUM_JSON.replace(r#""bound": 64"#, r#""bound": 64, "multiple_exits": true"#);
    let f = Function::from_json(&json).unwrap();
    assert_eq!(f.exiting_block(f.roots()[0]), None);
}

#[test]
fn test_from_json_induction_outside_header() {
    let json = r#"{
        "name": "bad",
        "blocks": [ { "name": "entry", "insts": [
            { "op": "induction", "name": "i" }, { "op": "return" } ] } ]
    }"#;
    assert!(matches!(
        Function::from_json(json),
        Err(IrError::Undefined { kind: "loop headed by block", .. })
    ));
}

//! # Driver Tests
//!
//! Tests for function-level analysis: nest discovery feeding the cost model,
//! merged cost tables, section rendering, and JSON entries.

use loopcost_core::analysis::{SECTIONS, analyze_function};
use loopcost_core::common::SENTINEL_COST;
use loopcost_core::{Config, Function, LinearAnalyzer};
use pretty_assertions::assert_eq;

use crate::common::fixtures::{self, PairShape};

const MATMUL_JSON: &str = r#"{
    "name": "matmul",
    "symbols": ["a", "b", "c"],
    "blocks": [
        { "name": "entry", "insts": [ { "op": "jump", "target": "for.i" } ] },
        { "name": "for.i", "insts": [
            { "op": "induction", "name": "i" },
            { "op": "cmp", "name": "i.cond", "lhs": "i", "rhs": 5000 },
            { "op": "branch", "then": "for.i.body", "else": "for.end" } ] },
        { "name": "for.i.body", "insts": [ { "op": "jump", "target": "for.j" } ] },
        { "name": "for.j", "insts": [
            { "op": "induction", "name": "j" },
            { "op": "cmp", "name": "j.cond", "lhs": "j", "rhs": 5000 },
            { "op": "branch", "then": "for.j.body", "else": "for.i.inc" } ] },
        { "name": "for.j.body", "insts": [ { "op": "jump", "target": "for.k" } ] },
        { "name": "for.k", "insts": [
            { "op": "induction", "name": "k" },
            { "op": "cmp", "name": "k.cond", "lhs": "k", "rhs": 5000 },
            { "op": "branch", "then": "for.k.body", "else": "for.j.inc" } ] },
        { "name": "for.k.body", "insts": [
            { "op": "address", "name": "pa", "operands": ["a", 0, "i", "k"] },
            { "op": "load", "name": "va", "address": "pa" },
            { "op": "address", "name": "pb", "operands": ["b", 0, "k", "j"] },
            { "op": "load", "name": "vb", "address": "pb" },
            { "op": "mul", "name": "prod", "lhs": "va", "rhs": "vb" },
            { "op": "address", "name": "pc", "operands": ["c", 0, "i", "j"] },
            { "op": "load", "name": "vc", "address": "pc" },
            { "op": "add", "name": "sum", "lhs": "vc", "rhs": "prod" },
            { "op": "store", "address": "pc", "value": "sum" },
            { "op": "jump", "target": "for.k.inc" } ] },
        { "name": "for.k.inc", "insts": [
            { "op": "add", "name": "k.next", "lhs": "k", "rhs": 1 },
            { "op": "jump", "target": "for.k" } ] },
        { "name": "for.j.inc", "insts": [
            { "op": "add", "name": "j.next", "lhs": "j", "rhs": 1 },
            { "op": "jump", "target": "for.j" } ] },
        { "name": "for.i.inc", "insts": [
            { "op": "add", "name": "i.next", "lhs": "i", "rhs": 1 },
            { "op": "jump", "target": "for.i" } ] },
        { "name": "for.end", "insts": [ { "op": "return" } ] }
    ],
    "loops": [
        { "header": "for.i", "latch": "for.i.inc", "bound": 5000,
          "blocks": ["for.i", "for.i.body", "for.j", "for.j.body", "for.k",
                     "for.k.body", "for.k.inc", "for.j.inc", "for.i.inc"] },
        { "header": "for.j", "latch": "for.j.inc", "parent": "for.i", "bound": 5000,
          "blocks": ["for.j", "for.j.body", "for.k", "for.k.body", "for.k.inc", "for.j.inc"] },
        { "header": "for.k", "latch": "for.k.inc", "parent": "for.j", "bound": 5000,
          "blocks": ["for.k", "for.k.body", "for.k.inc"] }
    ]
}"#;

#[test]
fn test_analyze_matmul_from_json() {
    let func = Function::from_json(MATMUL_JSON).unwrap();
    let report = analyze_function(&func, &LinearAnalyzer::new(), &Config::default());
    let i = func.find_loop("for.i").unwrap();
    let j = func.find_loop("for.j").unwrap();
    let k = func.find_loop("for.k").unwrap();

    assert_eq!(report.function_name(), "matmul");
    assert_eq!(report.nests().len(), 1);
    assert_eq!(report.cost_of(i), 250_025_000_000.0);
    assert_eq!(report.cost_of(j), 62_525_000_000.0);
    assert_eq!(report.cost_of(k), 156_275_000_000.0);
}

#[test]
fn test_loops_outside_perfect_nests_report_sentinel() {
    let t = fixtures::two_children();
    let report = analyze_function(&t.func, &LinearAnalyzer::new(), &Config::default());

    assert_eq!(report.nests().len(), 2);
    assert_eq!(report.cost_of(t.outer), SENTINEL_COST);
    assert_eq!(report.costs().get(t.outer), None);
    // a[0][j] over 100 iterations: 100 / 4.
    assert_eq!(report.cost_of(t.first), 25.0);
    assert_eq!(report.cost_of(t.second), 25.0);
}

#[test]
fn test_rejected_nest_is_reported() {
    let p = fixtures::pair(PairShape {
        split_body: true,
        ..PairShape::default()
    });
    let report = analyze_function(&p.func, &LinearAnalyzer::new(), &Config::default());
    assert_eq!(report.nests().len(), 1);
    assert!(report.nests()[0].is_rejected());
    assert_eq!(report.costs().get(p.outer), Some(SENTINEL_COST));
    assert_eq!(report.costs().get(p.inner), Some(SENTINEL_COST));
}

#[test]
fn test_function_without_loops() {
    let func = Function::from_json(
        r#"{ "name": "flat", "blocks": [ { "name": "entry", "insts": [ { "op": "return" } ] } ] }"#,
    )
    .unwrap();
    let report = analyze_function(&func, &LinearAnalyzer::new(), &Config::default());
    assert!(report.nests().is_empty());
    assert!(report.costs().is_empty());
    assert_eq!(report.render(&func, &[]), "Printing Loop Costs: (empty)\n");
}

#[test]
fn test_render_sections() {
    let s = fixtures::single_loop(Some(8), |b, body, iv| {
        let a = b.symbol("a");
        let zero = b.constant(0);
        let _ = b.address(body, "p", &[a, zero, iv]);
    });
    let report = analyze_function(&s.func, &LinearAnalyzer::new(), &Config::default());

    let trip = "Printing Trip Counts: \nLoop: for.cond\tTripCount: 8\n";
    let groups = "Printing Reference Groups: \nRef group: %p = address @a, 0, %i\n";
    let costs = "Printing Loop Costs: \nLoop: for.cond\tCosts: 2\n";

    assert_eq!(report.render(&s.func, &["costs".to_string()]), costs);
    assert_eq!(
        report.render(&s.func, &["groups".to_string(), "trip_counts".to_string()]),
        format!("{trip}{groups}")
    );
    assert_eq!(report.render(&s.func, &[]), format!("{trip}{groups}{costs}"));
    let all: Vec<String> = SECTIONS.iter().map(ToString::to_string).collect();
    assert_eq!(report.render(&s.func, &all), format!("{trip}{groups}{costs}"));
    assert_eq!(report.render(&s.func, &["unknown".to_string()]), "");
}

#[test]
fn test_entries() {
    let t = fixtures::two_children();
    let report = analyze_function(&t.func, &LinearAnalyzer::new(), &Config::default());
    let entries = report.entries(&t.func);

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].loop_name, "outer");
    assert_eq!(entries[0].depth, None);
    assert_eq!(entries[0].cost, SENTINEL_COST);
    assert_eq!(entries[1].loop_name, "inner.j");
    assert_eq!(entries[1].depth, Some(0));
    assert_eq!(entries[1].cost, 25.0);

    let json = serde_json::to_value(&entries[1]).unwrap();
    assert_eq!(json["loop"], "inner.j");
    assert_eq!(json["cost"], 25.0);
}

//! # Stride Classification Tests
//!
//! Tests for induction variable search through index expressions and the
//! invariant / contiguous / strided classification under both access orders.

use loopcost_core::config::AccessOrder;
use loopcost_core::cost::{StrideClass, classify_access, induction_occurs_in};
use loopcost_core::ir::BinOp;
use rstest::rstest;

use crate::common::fixtures;

#[rstest]
#[case("arrayidx.a", "i", AccessOrder::RowMajor, StrideClass::Strided { position: 2 })]
#[case("arrayidx.a", "k", AccessOrder::RowMajor, StrideClass::Contiguous { position: 3 })]
#[case("arrayidx.a", "j", AccessOrder::RowMajor, StrideClass::Invariant)]
#[case("arrayidx.b", "k", AccessOrder::RowMajor, StrideClass::Strided { position: 2 })]
#[case("arrayidx.b", "j", AccessOrder::RowMajor, StrideClass::Contiguous { position: 3 })]
#[case("arrayidx.a", "i", AccessOrder::ColumnMajor, StrideClass::Contiguous { position: 2 })]
#[case("arrayidx.a", "k", AccessOrder::ColumnMajor, StrideClass::Strided { position: 3 })]
#[case("arrayidx.c", "k", AccessOrder::ColumnMajor, StrideClass::Invariant)]
fn test_matmul_classes(
    #[case] access: &str,
    #[case] iv: &str,
    #[case] order: AccessOrder,
    #[case] expected: StrideClass,
) {
    let m = fixtures::matmul(64);
    let address = m.func.find_value(access).unwrap();
    let iv = m.func.find_value(iv).unwrap();
    assert_eq!(classify_access(&m.func, address, iv, order), expected);
}

#[rstest]
#[case(StrideClass::Invariant, 1.0)]
#[case(StrideClass::Contiguous { position: 3 }, 1250.0)]
#[case(StrideClass::Strided { position: 2 }, 5000.0)]
fn test_penalties(#[case] class: StrideClass, #[case] expected: f64) {
    assert_eq!(class.penalty(5000, 4), expected);
}

#[test]
fn test_contiguous_penalty_is_not_rounded() {
    assert_eq!(StrideClass::Contiguous { position: 1 }.penalty(10, 4), 2.5);
}

#[test]
fn test_search_goes_through_computed_values() {
    let mut ids = Vec::new();
    let s = fixtures::single_loop(Some(10), |b, body, iv| {
        let two = b.constant(2);
        let scaled = b.binary(body, "scaled", BinOp::Mul, iv, two);
        let shifted = b.binary(body, "shifted", BinOp::Add, scaled, two);
        ids.push(shifted);
        ids.push(two);
    });
    assert!(induction_occurs_in(&s.func, ids[0], s.iv));
    assert!(induction_occurs_in(&s.func, s.iv, s.iv));
    assert!(!induction_occurs_in(&s.func, ids[1], s.iv));
}

#[test]
fn test_search_stops_at_other_phis() {
    let mut ids = Vec::new();
    let s = fixtures::single_loop(Some(10), |b, body, _| {
        let phi = b.phi(body, "acc");
        let one = b.constant(1);
        ids.push(b.binary(body, "acc.next", BinOp::Add, phi, one));
    });
    assert!(!induction_occurs_in(&s.func, ids[0], s.iv));

    // The outer induction variable is a stop, not a path to the inner one.
    let m = fixtures::matmul(8);
    let i = m.func.find_value("i").unwrap();
    let k = m.func.find_value("k").unwrap();
    assert!(!induction_occurs_in(&m.func, i, k));
}

#[test]
fn test_last_matching_position_wins() {
    let mut ids = Vec::new();
    let s = fixtures::single_loop(Some(10), |b, body, iv| {
        let a = b.symbol("a");
        let zero = b.constant(0);
        ids.push(b.address(body, "diag", &[a, zero, iv, iv]));
        ids.push(b.address(body, "transposed", &[a, zero, iv, zero]));
    });
    assert_eq!(
        classify_access(&s.func, ids[0], s.iv, AccessOrder::RowMajor),
        StrideClass::Contiguous { position: 3 }
    );
    assert_eq!(
        classify_access(&s.func, ids[0], s.iv, AccessOrder::ColumnMajor),
        StrideClass::Strided { position: 3 }
    );
    assert_eq!(
        classify_access(&s.func, ids[1], s.iv, AccessOrder::RowMajor),
        StrideClass::Strided { position: 2 }
    );
}

#[test]
fn test_base_operand_is_never_an_index() {
    let mut ids = Vec::new();
    let s = fixtures::single_loop(Some(10), |b, body, iv| {
        let zero = b.constant(0);
        ids.push(b.address(body, "p", &[iv, zero]));
        ids.push(b.address(body, "bare", &[iv]));
    });
    for &address in &ids {
        assert_eq!(
            classify_access(&s.func, address, s.iv, AccessOrder::RowMajor),
            StrideClass::Invariant
        );
    }
}

#[test]
fn test_non_address_is_invariant() {
    let s = fixtures::single_loop(Some(10), |_, _, _| {});
    assert_eq!(
        classify_access(&s.func, s.iv, s.iv, AccessOrder::RowMajor),
        StrideClass::Invariant
    );
}

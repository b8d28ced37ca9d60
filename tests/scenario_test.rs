//! Data-driven classification scenarios
//!
//! Each case builds an outcome table from literal rows, compiles it against
//! a fallback contract, and classifies one execution outcome.

use pretty_assertions::assert_eq;
use rstest::rstest;
use spec_oracle::{
    AcceptAll, BehaviorType, BooleanExpression, CheckerKind, Classification, ExceptionType,
    ExecutionOutcome, FnExpression, OutcomeChecker, OutcomeTableBuilder, RejectExceptions,
    SpecificationRow, ThrowsClause, Value, Violation,
};

/// Postcondition `result > 0`
fn positive() -> Option<Box<dyn BooleanExpression>> {
    Some(Box::new(FnExpression::new("result > 0", |v: &Value| {
        matches!(v, Value::Int(n) if *n > 0)
    })))
}

fn throws(names: &[&str]) -> Vec<ThrowsClause> {
    names.iter().map(|n| ThrowsClause::new(*n, "")).collect()
}

fn returned(n: i64) -> ExecutionOutcome {
    ExecutionOutcome::Returned(Value::Int(n))
}

fn threw(name: &str) -> ExecutionOutcome {
    ExecutionOutcome::threw(ExceptionType::new(name))
}

// ============================================================================
// Scenario A: no specification
// ============================================================================

#[rstest]
#[case(returned(1))]
#[case(returned(-1))]
fn scenario_no_specification_defers(#[case] outcome: ExecutionOutcome) {
    let table = OutcomeTableBuilder::new().finish();
    assert!(!table.is_invalid_prestate());

    let checker = table.into_checker(OutcomeChecker::default_contract(AcceptAll));
    assert_eq!(checker.kind(), CheckerKind::Default);
    assert_eq!(
        checker.classify(&outcome),
        Classification::Deferred(BehaviorType::Expected)
    );
}

#[test]
fn scenario_no_specification_uses_fallback_policy() {
    let checker = OutcomeTableBuilder::new()
        .finish()
        .into_checker(OutcomeChecker::default_contract(RejectExceptions));
    assert_eq!(
        checker.classify(&threw("IllegalStateException")),
        Classification::Deferred(BehaviorType::Error)
    );
}

// ============================================================================
// Scenario B: invalid input
// ============================================================================

#[rstest]
#[case(returned(7))]
#[case(threw("IllegalStateException"))]
fn scenario_invalid_input(#[case] outcome: ExecutionOutcome) {
    let mut builder = OutcomeTableBuilder::new();
    builder.add(SpecificationRow::new(false, None, vec![]));
    let table = builder.finish();
    assert!(table.is_invalid_prestate());

    let checker = table.into_checker(OutcomeChecker::default_contract(AcceptAll));
    assert_eq!(checker.classify(&outcome), Classification::Invalid);
}

#[test]
fn scenario_invalid_ignores_unsatisfied_postconditions() {
    let mut builder = OutcomeTableBuilder::new();
    builder
        .add_row(false, positive(), vec![])
        .add_row(false, positive(), vec![]);
    let table = builder.finish();
    assert!(table.is_invalid_prestate());
    assert_eq!(
        table
            .into_checker(OutcomeChecker::default_contract(AcceptAll))
            .classify(&returned(-3)),
        Classification::Invalid
    );
}

// ============================================================================
// Scenario C: sanctioned exception, guard held elsewhere too
// ============================================================================

fn scenario_c_checker() -> OutcomeChecker {
    let mut builder = OutcomeTableBuilder::new();
    builder
        .add_row(true, positive(), vec![])
        .add_row(false, None, throws(&["IllegalStateException"]));
    let table = builder.finish();
    assert!(!table.is_invalid_prestate());
    table.into_checker(OutcomeChecker::default_contract(AcceptAll))
}

#[rstest]
#[case::sanctioned(threw("IllegalStateException"), BehaviorType::Expected)]
#[case::wrong_exception(threw("IllegalArgumentException"), BehaviorType::Error)]
#[case::postcondition_holds(returned(5), BehaviorType::Error)]
#[case::postcondition_fails(returned(-5), BehaviorType::Error)]
fn scenario_sanctioned_exception(
    #[case] outcome: ExecutionOutcome,
    #[case] expected: BehaviorType,
) {
    let checker = scenario_c_checker();
    assert_eq!(checker.kind(), CheckerKind::ExpectedException);
    assert_eq!(checker.classify(&outcome).behavior(), expected);
}

#[test]
fn scenario_sanctioned_exception_reports_missing_throw() {
    let result = scenario_c_checker().classify(&returned(5));
    assert_eq!(
        result,
        Classification::Error(Violation::MissingException {
            expected: throws(&["IllegalStateException"]),
        })
    );
}

#[test]
fn scenario_exception_sets_are_unioned() {
    let mut builder = OutcomeTableBuilder::new();
    builder
        .add_row(true, None, throws(&["A"]))
        .add_row(true, None, throws(&["B", "C"]));
    let checker = builder
        .finish()
        .into_checker(OutcomeChecker::default_contract(AcceptAll));
    assert_eq!(checker.classify(&threw("C")), Classification::Expected);
}

#[test]
fn scenario_sanctioned_supertype_admits_subtype() {
    let mut builder = OutcomeTableBuilder::new();
    builder.add_row(true, None, throws(&["RuntimeException"]));
    let checker = builder
        .finish()
        .into_checker(OutcomeChecker::default_contract(AcceptAll));
    let outcome = ExecutionOutcome::threw(
        ExceptionType::new("ConcurrentModificationException").extends("RuntimeException"),
    );
    assert_eq!(checker.classify(&outcome), Classification::Expected);
}

// ============================================================================
// Scenario D: postcondition violation
// ============================================================================

#[rstest]
#[case::holds(returned(3), Classification::Deferred(BehaviorType::Expected))]
#[case::violated(
    returned(0),
    Classification::Error(Violation::PostconditionFailed { description: "result > 0".into() })
)]
#[case::exception_defers(
    threw("ArithmeticException"),
    Classification::Deferred(BehaviorType::Error)
)]
fn scenario_postcondition(#[case] outcome: ExecutionOutcome, #[case] expected: Classification) {
    let mut builder = OutcomeTableBuilder::new();
    builder.add_row(true, positive(), vec![]);
    let checker = builder
        .finish()
        .into_checker(OutcomeChecker::default_contract(RejectExceptions));
    assert_eq!(checker.kind(), CheckerKind::PostCondition);
    assert_eq!(checker.classify(&outcome), expected);
}

#[test]
fn scenario_satisfied_guard_without_constraints_defers() {
    let mut builder = OutcomeTableBuilder::new();
    builder.add_row(true, None, vec![]).add_row(false, positive(), vec![]);
    let checker = builder
        .finish()
        .into_checker(OutcomeChecker::default_contract(AcceptAll));
    assert_eq!(checker.kind(), CheckerKind::Default);
    assert_eq!(
        checker.classify(&returned(-1)),
        Classification::Deferred(BehaviorType::Expected)
    );
}

#[test]
fn scenario_all_postconditions_must_hold() {
    let even: Option<Box<dyn BooleanExpression>> = Some(Box::new(FnExpression::new(
        "result is even",
        |v: &Value| matches!(v, Value::Int(n) if n % 2 == 0),
    )));
    let mut builder = OutcomeTableBuilder::new();
    builder
        .add_row(true, positive(), vec![])
        .add_row(true, even, vec![]);
    let checker = builder
        .finish()
        .into_checker(OutcomeChecker::default_contract(AcceptAll));
    assert_eq!(
        checker.classify(&returned(3)),
        Classification::Error(Violation::PostconditionFailed {
            description: "result is even".into()
        })
    );
}

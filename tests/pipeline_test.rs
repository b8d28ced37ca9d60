//! End-to-end: specification files → closure → pre-state table → checker

use pretty_assertions::assert_eq;
use spec_oracle::{
    load_specifications, BehaviorType, Classification, ExceptionBehaviorContract, ExceptionKind,
    ExceptionType, ExecutionOutcome, OperationSignature, OracleConfig, OutcomeChecker,
    SpecificationIndex, ThrownException, Value, Violation,
};
use std::collections::HashMap;
use std::io::Write;
use tempfile::Builder;

const SPECS: &str = r#"
- operation:
    class_name: Counter
    name: add
    parameter_types: [int]
  identifiers:
    receiver_name: counter
    parameters: [amount]
  preconditions:
    - guard:
        condition: "amount >= 0"
  postconditions:
    - description: result grows by amount
      guard:
        condition: "true"
      property:
        condition: "result == counter.value + amount"
- operation:
    class_name: Accumulator
    name: add
    parameter_types: [int]
  identifiers:
    receiver_name: acc
    parameters: [delta]
  preconditions:
    - guard:
        condition: "delta < 100"
  throws:
    - description: rejects a frozen accumulator
      guard:
        condition: "acc.frozen"
      exception: IllegalStateException
"#;

fn counter_add() -> OperationSignature {
    OperationSignature::new("Counter", "add", &["int"])
}

fn accumulator_add() -> OperationSignature {
    OperationSignature::new("Accumulator", "add", &["int"])
}

fn receiver(value: i64, frozen: bool) -> Value {
    let mut fields = HashMap::new();
    fields.insert("value".to_string(), Value::Int(value));
    fields.insert("frozen".to_string(), Value::Bool(frozen));
    fields.into()
}

fn index() -> SpecificationIndex {
    let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(SPECS.as_bytes()).unwrap();
    let specs = load_specifications(file.path()).unwrap();
    assert_eq!(specs.len(), 2);

    let mut index = SpecificationIndex::from_specifications(&specs).unwrap();
    index.add_override(counter_add(), accumulator_add());
    index
}

fn fallback() -> OutcomeChecker {
    OutcomeChecker::default_contract(ExceptionBehaviorContract::new(OracleConfig::default()))
}

fn classify(receiver: &Value, amount: i64, outcome: ExecutionOutcome) -> Classification {
    let conditions = index().conditions_for(&counter_add());
    assert_eq!(conditions.len(), 2);
    let table = conditions
        .check_prestate(Some(receiver), &[Value::Int(amount)])
        .unwrap();
    table.into_checker(fallback()).classify(&outcome)
}

#[test]
fn test_postcondition_holds() {
    let result = classify(&receiver(10, false), 5, ExecutionOutcome::Returned(Value::Int(15)));
    assert_eq!(result, Classification::Deferred(BehaviorType::Expected));
}

#[test]
fn test_postcondition_violated() {
    let result = classify(&receiver(10, false), 5, ExecutionOutcome::Returned(Value::Int(14)));
    assert_eq!(
        result,
        Classification::Error(Violation::PostconditionFailed {
            description: "result grows by amount".into()
        })
    );
}

#[test]
fn test_inherited_throws_overrides_postcondition() {
    let frozen = receiver(10, true);
    let thrown = ExecutionOutcome::threw(ExceptionType::new("IllegalStateException"));
    assert_eq!(classify(&frozen, 5, thrown), Classification::Expected);

    let returned = ExecutionOutcome::Returned(Value::Int(15));
    assert!(classify(&frozen, 5, returned).is_error());
}

#[test]
fn test_invalid_only_when_no_declaration_admits_prestate() {
    let table = index()
        .conditions_for(&counter_add())
        .check_prestate(Some(&receiver(0, false)), &[Value::Int(-1)])
        .unwrap();
    // amount >= 0 fails; delta < 100 holds
    assert!(!table.is_invalid_prestate());

    let table = index()
        .conditions_for(&accumulator_add())
        .check_prestate(Some(&receiver(0, false)), &[Value::Int(500)])
        .unwrap();
    assert!(table.is_invalid_prestate());
    assert_eq!(
        table
            .into_checker(fallback())
            .classify(&ExecutionOutcome::Returned(Value::Null)),
        Classification::Invalid
    );
}

#[test]
fn test_unspecified_operation_uses_default_contract() {
    let other = OperationSignature::new("Counter", "reset", &[]);
    let table = index()
        .conditions_for(&other)
        .check_prestate(Some(&receiver(0, false)), &[])
        .unwrap();
    assert!(table.is_empty());

    let npe = ExecutionOutcome::Threw(ThrownException::new(
        ExceptionType::new("NullPointerException").with_kind(ExceptionKind::NullDereference),
    ));
    assert_eq!(
        table.into_checker(fallback()).classify(&npe),
        Classification::Deferred(BehaviorType::Error)
    );
}

//! Outcome checkers: deferred classification of one call
//!
//! A checker is compiled from an [`OutcomeTable`](crate::table::OutcomeTable)
//! before the call runs, then consumes the actual [`ExecutionOutcome`] and
//! renders a [`Classification`]. [`OutcomeChecker::classify`] takes `self`,
//! so a checker can be evaluated exactly once.
//!
//! ## Evaluation rules
//!
//! | Checker | `Returned(v)` | `Threw(t)` |
//! |---------|---------------|------------|
//! | `ExpectedException` | Error | Expected if `t` is sanctioned, else Error |
//! | `Invalid` | Invalid | Invalid |
//! | `PostCondition` | Error if any check fails, else `next` | `next` |
//! | `Default` | contract verdict | contract verdict |

use crate::classification::{Classification, Violation};
use crate::contract::DefaultContract;
use crate::expression::BooleanExpression;
use crate::outcome::{ExceptionType, ExecutionOutcome, ThrowsClause, Value};
use std::fmt;
use tracing::{debug, warn};

/// Discriminant of an [`OutcomeChecker`], for logging and assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckerKind {
    ExpectedException,
    Invalid,
    PostCondition,
    Default,
}

impl fmt::Display for CheckerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CheckerKind::ExpectedException => "expected-exception",
            CheckerKind::Invalid => "invalid",
            CheckerKind::PostCondition => "postcondition",
            CheckerKind::Default => "default",
        })
    }
}

/// The union of exception sets sanctioned for one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedExceptions {
    sets: Vec<Vec<ThrowsClause>>,
}

impl ExpectedExceptions {
    pub fn new(sets: Vec<Vec<ThrowsClause>>) -> Self {
        Self { sets }
    }

    pub fn sets(&self) -> &[Vec<ThrowsClause>] {
        &self.sets
    }

    /// Every sanctioned clause, in accumulation order
    pub fn clauses(&self) -> impl Iterator<Item = &ThrowsClause> {
        self.sets.iter().flatten()
    }

    /// Whether a thrown type is a member of any sanctioned set
    pub fn admits(&self, thrown: &ExceptionType) -> bool {
        self.clauses().any(|clause| clause.admits(thrown))
    }

    fn classify(&self, outcome: &ExecutionOutcome) -> Classification {
        match outcome {
            ExecutionOutcome::Threw(thrown) if self.admits(&thrown.exception_type) => {
                Classification::Expected
            }
            ExecutionOutcome::Threw(thrown) => {
                Classification::Error(Violation::UnexpectedException {
                    thrown: thrown.exception_type.name.clone(),
                    expected: self.clauses().cloned().collect(),
                })
            }
            ExecutionOutcome::Returned(_) => Classification::Error(Violation::MissingException {
                expected: self.clauses().cloned().collect(),
            }),
        }
    }
}

/// A classifier for one call site, built before the call executes
pub enum OutcomeChecker {
    /// The call must throw one of the sanctioned exceptions
    ExpectedException(ExpectedExceptions),
    /// No specification admits the pre-state; every outcome is invalid
    Invalid,
    /// Check postconditions on normal return, then defer to `next`
    PostCondition {
        checks: Vec<Box<dyn BooleanExpression>>,
        next: Box<OutcomeChecker>,
    },
    /// Pass-through to the ambient default contract
    Default(Box<dyn DefaultContract>),
}

impl OutcomeChecker {
    /// Wrap a default contract as a fallback checker
    pub fn default_contract(contract: impl DefaultContract + 'static) -> Self {
        OutcomeChecker::Default(Box::new(contract))
    }

    pub fn kind(&self) -> CheckerKind {
        match self {
            OutcomeChecker::ExpectedException(_) => CheckerKind::ExpectedException,
            OutcomeChecker::Invalid => CheckerKind::Invalid,
            OutcomeChecker::PostCondition { .. } => CheckerKind::PostCondition,
            OutcomeChecker::Default(_) => CheckerKind::Default,
        }
    }

    /// Classify the call's outcome, consuming the checker
    pub fn classify(self, outcome: &ExecutionOutcome) -> Classification {
        let kind = self.kind();
        let classification = match self {
            OutcomeChecker::ExpectedException(expected) => expected.classify(outcome),
            OutcomeChecker::Invalid => Classification::Invalid,
            OutcomeChecker::PostCondition { checks, next } => match outcome {
                ExecutionOutcome::Returned(value) => match failed_postcondition(&checks, value) {
                    Some(violation) => Classification::Error(violation),
                    None => next.classify(outcome),
                },
                ExecutionOutcome::Threw(_) => next.classify(outcome),
            },
            OutcomeChecker::Default(contract) => {
                Classification::Deferred(contract.classify(outcome))
            }
        };
        debug!(checker = %kind, verdict = %classification.behavior(), "classified call outcome");
        classification
    }
}

/// First postcondition that does not hold of `value`, if any
fn failed_postcondition(checks: &[Box<dyn BooleanExpression>], value: &Value) -> Option<Violation> {
    for check in checks {
        match check.check(value) {
            Ok(true) => {}
            Ok(false) => {
                return Some(Violation::PostconditionFailed {
                    description: check.description().to_string(),
                })
            }
            Err(e) => {
                warn!(
                    postcondition = check.description(),
                    error = %e,
                    "postcondition not evaluable"
                );
                return Some(Violation::PostconditionUnevaluable {
                    description: check.description().to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }
    None
}

impl fmt::Debug for OutcomeChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeChecker::ExpectedException(expected) => {
                f.debug_tuple("ExpectedException").field(expected).finish()
            }
            OutcomeChecker::Invalid => f.write_str("Invalid"),
            OutcomeChecker::PostCondition { checks, next } => f
                .debug_struct("PostCondition")
                .field("checks", checks)
                .field("next", next)
                .finish(),
            OutcomeChecker::Default(contract) => f.debug_tuple("Default").field(contract).finish(),
        }
    }
}

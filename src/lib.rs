// Production-quality lints
#![warn(
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
// Deny truly dangerous patterns
#![deny(clippy::mem_forget)]
// Allow common patterns in library code
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! # spec-oracle: specification-based test oracle
//!
//! Classifies the outcome of a generated call against every specification
//! that applies to it.
//!
//! ## Core Concept
//!
//! An operation must honor the contract on its own declaration **and** the
//! contracts on every declaration it overrides or implements. Before a call
//! runs, each applicable specification is evaluated against the pre-state
//! and recorded as one row of an [`OutcomeTable`]. The table compiles into
//! an [`OutcomeChecker`]; after the call runs, the checker consumes the
//! [`ExecutionOutcome`] and renders a [`Classification`]:
//!
//! - **Expected**: behavior the specifications sanction
//! - **Error**: a specification was violated
//! - **Invalid**: the input was outside every specification's domain
//! - **Deferred**: no specification decided; the default contract did
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use spec_oracle::*;
//!
//! let specs = load_specifications(Path::new("specs.yaml"))?;
//! let mut index = SpecificationIndex::from_specifications(&specs)?;
//! index.add_override(array_list_get.clone(), list_get.clone());
//!
//! let conditions = index.conditions_for(&array_list_get);
//! let table = conditions.check_prestate(Some(&receiver), &args)?;
//! if table.is_invalid_prestate() {
//!     return Ok(()); // not a legitimate test case
//! }
//!
//! let fallback = OutcomeChecker::default_contract(
//!     ExceptionBehaviorContract::new(OracleConfig::default()),
//! );
//! let checker = table.into_checker(fallback);
//! let outcome = execute(&receiver, &args); // external collaborator
//! match checker.classify(&outcome) {
//!     Classification::Error(violation) => report(violation),
//!     other => keep(other.behavior()),
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                                                             │
//! │  SPECS (YAML/JSON + CEL)                                    │
//! │       │                                                     │
//! │       └──► SpecificationIndex ──► OperationConditions       │
//! │                                        │                    │
//! │  PRE-STATE ──► check_prestate ─────────┘                    │
//! │                     │                                       │
//! │                     ▼                                       │
//! │               OutcomeTable ──► is_invalid_prestate()        │
//! │                     │                                       │
//! │                     └──► into_checker(fallback)             │
//! │                                 │                           │
//! │  EXECUTION OUTCOME ──► OutcomeChecker::classify             │
//! │                                 │                           │
//! │                                 ▼                           │
//! │                           Classification                    │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The table and checker are pure and synchronous. Each call site owns its
//! own table and checker; nothing is shared between call sites.

// Core modules
pub mod classification;
pub mod config;
pub mod error;
pub mod outcome;

// Classification engine
pub mod checker;
pub mod contract;
pub mod table;

// Specifications and expressions
pub mod cel;
pub mod conditions;
pub mod expression;
pub mod spec;

// Re-exports
pub use cel::{Bindings, CelCompiler, CelExpression, CelValue};
pub use checker::{CheckerKind, ExpectedExceptions, OutcomeChecker};
pub use classification::{BehaviorType, Classification, Violation};
pub use conditions::{ExecutableSpecification, OperationConditions, SpecificationIndex};
pub use config::OracleConfig;
pub use contract::{AcceptAll, DefaultContract, ExceptionBehaviorContract, RejectExceptions};
pub use error::{Error, Result};
pub use expression::{BooleanExpression, BoundPostcondition, FnExpression};
pub use outcome::{
    ExceptionKind, ExceptionType, ExecutionOutcome, ThrowsClause, ThrownException, Value,
};
pub use spec::{
    load_specifications, Guard, Identifiers, OperationSignature, OperationSpecification,
    Postcondition, Precondition, ThrowsCondition, CONSTRUCTOR_NAME,
};
pub use table::{OutcomeTable, OutcomeTableBuilder, SpecificationRow};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

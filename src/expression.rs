//! Post-state boolean expressions
//!
//! A postcondition is checked against the value a call returned. Anything
//! that implements [`BooleanExpression`] can sit in an outcome table; the
//! crate ships a CEL-backed implementation ([`BoundPostcondition`]) and a
//! closure adapter ([`FnExpression`]).

use crate::cel::{Bindings, CelExpression};
use crate::error::Result;
use crate::outcome::Value;
use std::fmt;
use std::sync::Arc;

/// A property required of the post-state when a call returns normally
pub trait BooleanExpression: fmt::Debug {
    /// Evaluate the property against the returned value
    fn check(&self, result: &Value) -> Result<bool>;

    /// Human-readable description, used in violation reports
    fn description(&self) -> &str;
}

/// A CEL property with the call's pre-state already bound
///
/// The pre-state bindings are captured when the outcome table is built,
/// before the call executes, so the property can compare the result with
/// the arguments as they were.
#[derive(Debug, Clone)]
pub struct BoundPostcondition {
    description: String,
    property: Arc<CelExpression>,
    prestate: Bindings,
    result_name: String,
}

impl BoundPostcondition {
    pub fn new(
        description: impl Into<String>,
        property: Arc<CelExpression>,
        prestate: Bindings,
        result_name: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            property,
            prestate,
            result_name: result_name.into(),
        }
    }

    pub fn source(&self) -> &str {
        self.property.source()
    }
}

impl BooleanExpression for BoundPostcondition {
    fn check(&self, result: &Value) -> Result<bool> {
        let mut vars = self.prestate.clone();
        vars.insert(self.result_name.clone(), result.clone());
        self.property.eval_bool(&vars)
    }

    fn description(&self) -> &str {
        if self.description.is_empty() {
            self.property.source()
        } else {
            &self.description
        }
    }
}

/// Closure-backed property, mostly for embedding and tests
pub struct FnExpression<F> {
    description: String,
    predicate: F,
}

impl<F> FnExpression<F>
where
    F: Fn(&Value) -> bool,
{
    pub fn new(description: impl Into<String>, predicate: F) -> Self {
        Self {
            description: description.into(),
            predicate,
        }
    }
}

impl<F> fmt::Debug for FnExpression<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnExpression")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<F> BooleanExpression for FnExpression<F>
where
    F: Fn(&Value) -> bool,
{
    fn check(&self, result: &Value) -> Result<bool> {
        Ok((self.predicate)(result))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

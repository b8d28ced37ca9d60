//! Classification: the verdict rendered for one executed call

use crate::outcome::ThrowsClause;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Verdict vocabulary shared by checkers, default contracts and config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorType {
    /// Behavior the specifications sanction
    Expected,
    /// The code under test violated a specification
    Error,
    /// The input was outside every specification's domain
    Invalid,
}

impl fmt::Display for BehaviorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BehaviorType::Expected => "expected",
            BehaviorType::Error => "error",
            BehaviorType::Invalid => "invalid",
        })
    }
}

/// Why a call was classified as an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A specification required an exception but the call returned normally
    MissingException { expected: Vec<ThrowsClause> },
    /// An exception was thrown that no applicable clause sanctions
    UnexpectedException {
        thrown: String,
        expected: Vec<ThrowsClause>,
    },
    /// A postcondition evaluated to false
    PostconditionFailed { description: String },
    /// A postcondition could not be evaluated against the result
    PostconditionUnevaluable { description: String, reason: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MissingException { expected } => {
                write!(f, "expected exception not thrown: {}", join_clauses(expected))
            }
            Violation::UnexpectedException { thrown, expected } => write!(
                f,
                "{} thrown, expected one of: {}",
                thrown,
                join_clauses(expected)
            ),
            Violation::PostconditionFailed { description } => {
                write!(f, "postcondition failed: {}", description)
            }
            Violation::PostconditionUnevaluable {
                description,
                reason,
            } => write!(f, "postcondition '{}' not evaluable: {}", description, reason),
        }
    }
}

fn join_clauses(clauses: &[ThrowsClause]) -> String {
    clauses
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Final classification of one executed call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "detail", rename_all = "snake_case")]
pub enum Classification {
    Expected,
    Error(Violation),
    Invalid,
    /// No specification decided; the default contract's verdict
    Deferred(BehaviorType),
}

impl Classification {
    /// Collapse to the shared verdict vocabulary
    pub fn behavior(&self) -> BehaviorType {
        match self {
            Classification::Expected => BehaviorType::Expected,
            Classification::Error(_) => BehaviorType::Error,
            Classification::Invalid => BehaviorType::Invalid,
            Classification::Deferred(behavior) => *behavior,
        }
    }

    pub fn is_error(&self) -> bool {
        self.behavior() == BehaviorType::Error
    }

    pub fn is_invalid(&self) -> bool {
        self.behavior() == BehaviorType::Invalid
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Classification::Deferred(_))
    }

    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Classification::Error(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Error(v) => write!(f, "error: {}", v),
            Classification::Deferred(b) => write!(f, "{} (default contract)", b),
            other => write!(f, "{}", other.behavior()),
        }
    }
}

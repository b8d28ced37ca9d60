//! Execution outcomes and the exception model
//!
//! The execution collaborator runs the call and hands back an
//! [`ExecutionOutcome`]: either the returned value or the exception that
//! escaped. Exception types are compared by name with subtyping through an
//! explicit, ordered supertype chain.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value produced by a call (re-exported from cel-interpreter so results can
/// be bound directly into postcondition expressions)
pub use cel_interpreter::Value;

/// Broad category of an exception, used by the default contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionKind {
    /// Declared by the operation signature; callers must handle it
    Checked,
    /// Runtime failure not named by the signature
    #[default]
    Unchecked,
    /// Dereference of a null/absent value
    NullDereference,
    OutOfMemory,
    StackOverflow,
}

/// An exception type identifier
///
/// `supertypes` lists ancestors nearest first. Membership checks use
/// [`ExceptionType::is_subtype_of`], so a clause naming a base type admits
/// every subtype.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct ExceptionType {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supertypes: Vec<String>,

    #[serde(default)]
    pub kind: ExceptionKind,
}

impl ExceptionType {
    /// An unchecked exception type with no declared ancestors
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supertypes: Vec::new(),
            kind: ExceptionKind::Unchecked,
        }
    }

    /// Append an ancestor to the supertype chain
    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    pub fn with_kind(mut self, kind: ExceptionKind) -> Self {
        self.kind = kind;
        self
    }

    /// Reflexive subtype test against a type name
    pub fn is_subtype_of(&self, name: &str) -> bool {
        self.name == name || self.supertypes.iter().any(|s| s == name)
    }
}

impl fmt::Display for ExceptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// An exception sanctioned by a specification, with its explanatory comment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct ThrowsClause {
    /// Name of the sanctioned exception type
    pub exception: String,

    #[serde(default)]
    pub comment: String,
}

impl ThrowsClause {
    pub fn new(exception: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            exception: exception.into(),
            comment: comment.into(),
        }
    }

    /// Whether a thrown exception satisfies this clause
    pub fn admits(&self, thrown: &ExceptionType) -> bool {
        thrown.is_subtype_of(&self.exception)
    }
}

impl fmt::Display for ThrowsClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.comment.is_empty() {
            f.write_str(&self.exception)
        } else {
            write!(f, "{} ({})", self.exception, self.comment)
        }
    }
}

/// An exception that escaped the call
#[derive(Debug, Clone, PartialEq)]
pub struct ThrownException {
    pub exception_type: ExceptionType,

    pub message: Option<String>,

    /// Whether any argument of the call was null
    pub null_input: bool,
}

impl ThrownException {
    pub fn new(exception_type: ExceptionType) -> Self {
        Self {
            exception_type,
            message: None,
            null_input: false,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_null_input(mut self, null_input: bool) -> Self {
        self.null_input = null_input;
        self
    }
}

/// What happened when the call executed
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// Normal return; `Value::Null` for operations without a result
    Returned(Value),
    /// An exception escaped the call
    Threw(ThrownException),
}

impl ExecutionOutcome {
    pub fn returned(value: impl Into<Value>) -> Self {
        ExecutionOutcome::Returned(value.into())
    }

    pub fn threw(exception_type: ExceptionType) -> Self {
        ExecutionOutcome::Threw(ThrownException::new(exception_type))
    }

    pub fn is_exceptional(&self) -> bool {
        matches!(self, ExecutionOutcome::Threw(_))
    }
}

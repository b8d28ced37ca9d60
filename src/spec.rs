//! Operation specification documents: the input data model
//!
//! An `OperationSpecification` describes the contract written on one
//! operation declaration. Guards and properties are CEL expressions over the
//! declaration's identifiers.
//!
//! ## Example Specification
//!
//! ```yaml
//! operation:
//!   class_name: net.Connection
//!   name: send
//!   parameter_types: [int]
//! identifiers:
//!   receiver_name: conn
//!   parameters: [code]
//! preconditions:
//!   - description: code must be non-negative
//!     guard:
//!       condition: "code >= 0"
//! postconditions:
//!   - description: returns the bytes written
//!     guard:
//!       condition: "code > 0"
//!     property:
//!       condition: "result == code"
//! throws:
//!   - description: throws if the connection is closed
//!     guard:
//!       condition: "!conn.open"
//!     exception: IllegalStateException
//! ```

use crate::cel::CelCompiler;
use crate::error::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Name used for constructors in [`OperationSignature::name`]
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// The contract on one operation declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(
    title = "Operation Specification",
    description = "Contract on one operation declaration"
)]
pub struct OperationSpecification {
    /// The declaration the contract is written on
    pub operation: OperationSignature,

    /// Names the expressions use for receiver, parameters and result
    #[serde(default)]
    pub identifiers: Identifiers,

    /// Conditions the pre-state must satisfy
    #[serde(default, alias = "pre", skip_serializing_if = "Vec::is_empty")]
    pub preconditions: Vec<Precondition>,

    /// Properties of the post-state on normal return
    #[serde(default, alias = "post", skip_serializing_if = "Vec::is_empty")]
    pub postconditions: Vec<Postcondition>,

    /// Exceptions the operation must throw when their guard holds
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub throws: Vec<ThrowsCondition>,
}

/// Identifies an operation declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct OperationSignature {
    /// Declaring type
    #[serde(alias = "classname")]
    pub class_name: String,

    /// Operation name; `<init>` for constructors
    pub name: String,

    #[serde(default)]
    pub parameter_types: Vec<String>,
}

impl OperationSignature {
    pub fn new(
        class_name: impl Into<String>,
        name: impl Into<String>,
        parameter_types: &[&str],
    ) -> Self {
        Self {
            class_name: class_name.into(),
            name: name.into(),
            parameter_types: parameter_types.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }
}

impl fmt::Display for OperationSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}({})",
            self.class_name,
            self.name,
            self.parameter_types.join(", ")
        )
    }
}

/// Expression identifiers for receiver, parameters and result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Identifiers {
    #[serde(default = "default_receiver_name")]
    pub receiver_name: String,

    #[serde(default)]
    pub parameters: Vec<String>,

    #[serde(default = "default_return_name")]
    pub return_name: String,
}

fn default_receiver_name() -> String {
    "receiver".to_string()
}

fn default_return_name() -> String {
    "result".to_string()
}

impl Default for Identifiers {
    fn default() -> Self {
        Self {
            receiver_name: default_receiver_name(),
            parameters: Vec::new(),
            return_name: default_return_name(),
        }
    }
}

/// A boolean condition with its description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Guard {
    #[serde(default)]
    pub description: String,

    /// CEL expression
    pub condition: String,
}

impl Guard {
    pub fn new(condition: impl Into<String>) -> Self {
        Self {
            description: String::new(),
            condition: condition.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Precondition {
    #[serde(default)]
    pub description: String,

    pub guard: Guard,
}

/// A guard/property pair: when `guard` holds in the pre-state, `property`
/// must hold in the post-state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Postcondition {
    #[serde(default)]
    pub description: String,

    pub guard: Guard,

    pub property: Guard,
}

/// A guard/throws pair: when `guard` holds, the call must throw `exception`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ThrowsCondition {
    #[serde(default)]
    pub description: String,

    pub guard: Guard,

    /// Exception type name
    pub exception: String,
}

impl OperationSpecification {
    /// An empty specification for an operation with default identifiers
    pub fn new(operation: OperationSignature) -> Self {
        Self {
            operation,
            identifiers: Identifiers::default(),
            preconditions: Vec::new(),
            postconditions: Vec::new(),
            throws: Vec::new(),
        }
    }

    /// Parse specification from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_norway::from_str(yaml)?)
    }

    /// Serialize specification to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_norway::to_string(self)?)
    }

    /// Parse specification from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize specification to JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Compute hash of specification for change detection
    pub fn hash(&self) -> String {
        use sha2::{Digest, Sha256};
        let content = self.to_yaml().unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("sha256:{}", hex::encode(&hasher.finalize()[..8]))
    }

    /// Identifiers visible to pre-state guards. A constructor has no receiver
    /// before it runs.
    pub fn prestate_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .identifiers
            .parameters
            .iter()
            .map(String::as_str)
            .collect();
        if !self.operation.is_constructor() {
            names.push(&self.identifiers.receiver_name);
        }
        names
    }

    /// Identifiers visible to post-state properties; for a constructor the
    /// constructed object is the result
    pub fn poststate_names(&self) -> Vec<&str> {
        let mut names = self.prestate_names();
        names.push(&self.identifiers.return_name);
        names
    }

    /// Validate specification, returning human-readable problems
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let op = &self.operation;

        if op.class_name.is_empty() || op.name.is_empty() {
            errors.push("Operation class_name and name are required".into());
        }

        let ids = &self.identifiers;
        if !ids.parameters.is_empty() && ids.parameters.len() != op.parameter_types.len() {
            errors.push(format!(
                "{} parameter identifiers for {} parameter types",
                ids.parameters.len(),
                op.parameter_types.len()
            ));
        }

        let receiver = (!op.is_constructor()).then_some(&ids.receiver_name);
        let mut seen = HashSet::new();
        for name in ids
            .parameters
            .iter()
            .chain(receiver)
            .chain([&ids.return_name])
        {
            if !seen.insert(name.as_str()) {
                errors.push(format!("Duplicate identifier: {}", name));
            }
        }

        let pre = self.prestate_names();
        let post = self.poststate_names();
        let mut check = |what: &str, guard: &Guard, names: &[&str]| {
            if guard.condition.trim().is_empty() {
                errors.push(format!("{}: empty condition", what));
            } else if let Err(e) = CelCompiler::validate_variables(&guard.condition, names) {
                errors.push(format!("{}: {}", what, e));
            }
        };

        for (i, p) in self.preconditions.iter().enumerate() {
            check(&format!("precondition {}", i + 1), &p.guard, &pre[..]);
        }
        for (i, p) in self.postconditions.iter().enumerate() {
            check(&format!("postcondition {} guard", i + 1), &p.guard, &pre[..]);
            check(&format!("postcondition {} property", i + 1), &p.property, &post[..]);
        }
        for (i, t) in self.throws.iter().enumerate() {
            check(&format!("throws {} guard", i + 1), &t.guard, &pre[..]);
        }

        for (i, t) in self.throws.iter().enumerate() {
            if t.exception.trim().is_empty() {
                errors.push(format!("throws {}: exception type is required", i + 1));
            }
        }

        errors
    }
}

/// Load a list of specifications; `.json` is read as JSON, anything else as YAML
pub fn load_specifications(path: &Path) -> Result<Vec<OperationSpecification>> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    let specs = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .map_err(|e| Error::SpecParse(format!("{}: {}", path.display(), e)))?,
        _ => serde_norway::from_str(&content)
            .map_err(|e| Error::SpecParse(format!("{}: {}", path.display(), e)))?,
    };
    Ok(specs)
}

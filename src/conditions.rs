//! Specification closure and pre-state evaluation
//!
//! A call must be checked against every specification in the
//! override/implements closure of the invoked operation. This module
//! compiles specification documents into executable form, resolves the
//! closure for an operation, and evaluates each specification against the
//! call's pre-state to fill an [`OutcomeTable`].
//!
//! ```text
//! SpecificationIndex ──conditions_for(op)──► OperationConditions
//!                                                  │
//!                   check_prestate(receiver, args) │
//!                                                  ▼
//!                                            OutcomeTable ──into_checker──► OutcomeChecker
//! ```

use crate::cel::{Bindings, CelExpression};
use crate::error::{Error, Result};
use crate::expression::{BooleanExpression, BoundPostcondition};
use crate::outcome::{ThrowsClause, Value};
use crate::spec::{Guard, OperationSignature, OperationSpecification};
use crate::table::{OutcomeTable, OutcomeTableBuilder, SpecificationRow};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::debug;

/// A guard compiled to CEL
#[derive(Debug)]
struct CompiledGuard {
    description: String,
    expression: CelExpression,
}

impl CompiledGuard {
    fn compile(guard: &Guard) -> Result<Self> {
        Ok(Self {
            description: guard.description.clone(),
            expression: CelExpression::new(guard.condition.as_str())?,
        })
    }

    fn check(&self, prestate: &Bindings) -> Result<bool> {
        self.expression.eval_bool(prestate).map_err(|e| match e {
            Error::CelEval(msg) if !self.description.is_empty() => {
                Error::CelEval(format!("{} ({})", msg, self.description))
            }
            other => other,
        })
    }
}

#[derive(Debug)]
struct GuardPropertyPair {
    guard: CompiledGuard,
    description: String,
    property: Arc<CelExpression>,
}

#[derive(Debug)]
struct GuardThrowsPair {
    guard: CompiledGuard,
    clause: ThrowsClause,
}

/// One specification, compiled for evaluation
#[derive(Debug)]
pub struct ExecutableSpecification {
    signature: OperationSignature,
    receiver_name: Option<String>,
    parameter_names: Vec<String>,
    return_name: String,
    preconditions: Vec<CompiledGuard>,
    guard_property_pairs: Vec<GuardPropertyPair>,
    guard_throws_pairs: Vec<GuardThrowsPair>,
}

impl ExecutableSpecification {
    /// Compile every guard and property of a specification
    pub fn compile(spec: &OperationSpecification) -> Result<Self> {
        let problems = spec.validate();
        if !problems.is_empty() {
            return Err(Error::SpecParse(format!(
                "{}: {}",
                spec.operation,
                problems.join("; ")
            )));
        }

        let preconditions = spec
            .preconditions
            .iter()
            .map(|p| CompiledGuard::compile(&p.guard))
            .collect::<Result<Vec<_>>>()?;

        let guard_property_pairs = spec
            .postconditions
            .iter()
            .map(|p| {
                Ok(GuardPropertyPair {
                    guard: CompiledGuard::compile(&p.guard)?,
                    description: if p.description.is_empty() {
                        p.property.description.clone()
                    } else {
                        p.description.clone()
                    },
                    property: Arc::new(CelExpression::new(p.property.condition.as_str())?),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let guard_throws_pairs = spec
            .throws
            .iter()
            .map(|t| {
                Ok(GuardThrowsPair {
                    guard: CompiledGuard::compile(&t.guard)?,
                    clause: ThrowsClause::new(t.exception.as_str(), t.description.as_str()),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let ids = &spec.identifiers;
        Ok(Self {
            signature: spec.operation.clone(),
            receiver_name: (!spec.operation.is_constructor()).then(|| ids.receiver_name.clone()),
            parameter_names: ids.parameters.clone(),
            return_name: ids.return_name.clone(),
            preconditions,
            guard_property_pairs,
            guard_throws_pairs,
        })
    }

    pub fn signature(&self) -> &OperationSignature {
        &self.signature
    }

    /// Bind receiver and arguments to this specification's identifiers
    ///
    /// Overriding declarations may name their parameters differently, so
    /// binding is per specification.
    pub fn bind_prestate(&self, receiver: Option<&Value>, args: &[Value]) -> Result<Bindings> {
        if !self.parameter_names.is_empty() && self.parameter_names.len() != args.len() {
            return Err(Error::CelEval(format!(
                "{}: expected {} arguments, got {}",
                self.signature,
                self.parameter_names.len(),
                args.len()
            )));
        }

        let mut bindings: Bindings = self
            .parameter_names
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect();
        if let (Some(name), Some(value)) = (&self.receiver_name, receiver) {
            bindings.insert(name.clone(), value.clone());
        }
        Ok(bindings)
    }

    /// Evaluate the pre-state parts of this specification
    ///
    /// - guard satisfied: every precondition holds
    /// - postcondition: property of the first guard/property pair whose guard
    ///   holds, with the pre-state bound
    /// - declared exceptions: the clause of every guard/throws pair whose
    ///   guard holds
    pub fn check_prestate(&self, prestate: &Bindings) -> Result<SpecificationRow> {
        let mut guard_satisfied = true;
        for precondition in &self.preconditions {
            if !precondition.check(prestate)? {
                guard_satisfied = false;
                break;
            }
        }

        let mut postcondition = None;
        for pair in &self.guard_property_pairs {
            if pair.guard.check(prestate)? {
                postcondition = Some(BoundPostcondition::new(
                    pair.description.as_str(),
                    Arc::clone(&pair.property),
                    prestate.clone(),
                    self.return_name.as_str(),
                ));
                break;
            }
        }

        let mut declared_exceptions = Vec::new();
        for pair in &self.guard_throws_pairs {
            if pair.guard.check(prestate)? {
                declared_exceptions.push(pair.clause.clone());
            }
        }

        Ok(SpecificationRow::new(
            guard_satisfied,
            postcondition.map(|p| Box::new(p) as Box<dyn BooleanExpression>),
            declared_exceptions,
        ))
    }
}

/// The ordered specification closure for one operation
#[derive(Debug, Clone, Default)]
pub struct OperationConditions {
    specifications: Vec<Arc<ExecutableSpecification>>,
}

impl OperationConditions {
    pub fn new(specifications: Vec<Arc<ExecutableSpecification>>) -> Self {
        Self { specifications }
    }

    pub fn is_empty(&self) -> bool {
        self.specifications.is_empty()
    }

    pub fn len(&self) -> usize {
        self.specifications.len()
    }

    pub fn specifications(&self) -> &[Arc<ExecutableSpecification>] {
        &self.specifications
    }

    /// Evaluate every specification against the pre-state, one table row
    /// each, in closure order
    pub fn check_prestate(&self, receiver: Option<&Value>, args: &[Value]) -> Result<OutcomeTable> {
        let mut builder = OutcomeTableBuilder::new();
        for spec in &self.specifications {
            let prestate = spec.bind_prestate(receiver, args)?;
            builder.add(spec.check_prestate(&prestate)?);
        }
        Ok(builder.finish())
    }
}

/// Specifications by operation, with override/implements links
#[derive(Debug, Default)]
pub struct SpecificationIndex {
    specifications: HashMap<OperationSignature, Vec<Arc<ExecutableSpecification>>>,
    parents: HashMap<OperationSignature, Vec<OperationSignature>>,
}

impl SpecificationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and index a list of specification documents
    pub fn from_specifications(specs: &[OperationSpecification]) -> Result<Self> {
        let mut index = Self::new();
        for spec in specs {
            index.add_specification(spec)?;
        }
        Ok(index)
    }

    pub fn add_specification(&mut self, spec: &OperationSpecification) -> Result<()> {
        let compiled = ExecutableSpecification::compile(spec)?;
        self.specifications
            .entry(spec.operation.clone())
            .or_default()
            .push(Arc::new(compiled));
        Ok(())
    }

    /// Record that `operation` overrides or implements `parent`
    pub fn add_override(&mut self, operation: OperationSignature, parent: OperationSignature) {
        let parents = self.parents.entry(operation).or_default();
        if !parents.contains(&parent) {
            parents.push(parent);
        }
    }

    /// Resolve the specification closure of an operation: its own
    /// specifications first, then those of overridden/implemented
    /// declarations, breadth-first
    pub fn conditions_for(&self, operation: &OperationSignature) -> OperationConditions {
        let mut specifications = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([operation]);

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(specs) = self.specifications.get(current) {
                specifications.extend(specs.iter().cloned());
            }
            if let Some(parents) = self.parents.get(current) {
                queue.extend(parents.iter());
            }
        }

        debug!(
            operation = %operation,
            declarations = visited.len(),
            specifications = specifications.len(),
            "resolved specification closure"
        );
        OperationConditions::new(specifications)
    }
}

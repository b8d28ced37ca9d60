//! Expected-outcome tables
//!
//! An operation must satisfy the specification written on its own
//! declaration and every specification on declarations it overrides or
//! implements. For one call site, the caller evaluates each applicable
//! specification against the pre-state and adds one row per declaration.
//! The table keeps only what classification needs:
//!
//! 1. whether any row's precondition held,
//! 2. the postconditions of rows whose precondition held,
//! 3. every non-empty set of sanctioned exceptions, whether or not that
//!    row's precondition held.
//!
//! Building happens in [`OutcomeTableBuilder`]; [`OutcomeTableBuilder::finish`]
//! freezes it into an [`OutcomeTable`], which answers the pre-state query and
//! compiles into an [`OutcomeChecker`].
//!
//! ## Checker precedence
//!
//! 1. No rows: the fallback checker, unchanged.
//! 2. Any sanctioned exceptions: an expected-exception checker over their union.
//! 3. No precondition held: the invalid checker.
//! 4. Postconditions present: a postcondition checker in front of the fallback.
//! 5. Otherwise: the fallback checker, unchanged.

use crate::checker::{ExpectedExceptions, OutcomeChecker};
use crate::expression::BooleanExpression;
use crate::outcome::ThrowsClause;
use tracing::{debug, trace};

/// The pre-state verdict of one specification for one call
#[derive(Debug)]
pub struct SpecificationRow {
    /// Whether every precondition of the specification held
    pub guard_satisfied: bool,
    /// Property required of the post-state on normal return
    pub postcondition: Option<Box<dyn BooleanExpression>>,
    /// Exceptions whose guards held
    pub declared_exceptions: Vec<ThrowsClause>,
}

impl SpecificationRow {
    pub fn new(
        guard_satisfied: bool,
        postcondition: Option<Box<dyn BooleanExpression>>,
        declared_exceptions: Vec<ThrowsClause>,
    ) -> Self {
        Self {
            guard_satisfied,
            postcondition,
            declared_exceptions,
        }
    }

    /// A row whose precondition failed and which sanctions nothing
    pub fn unsatisfied() -> Self {
        Self::new(false, None, Vec::new())
    }
}

/// Accumulates rows for one call site
#[derive(Debug)]
pub struct OutcomeTableBuilder {
    table: OutcomeTable,
}

impl Default for OutcomeTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OutcomeTableBuilder {
    pub fn new() -> Self {
        Self {
            table: OutcomeTable {
                is_empty: true,
                has_satisfied_precondition: false,
                post_conditions: Vec::new(),
                exception_sets: Vec::new(),
            },
        }
    }

    /// Add the pre-state outcome of one specification
    pub fn add(&mut self, row: SpecificationRow) -> &mut Self {
        trace!(
            guard_satisfied = row.guard_satisfied,
            has_postcondition = row.postcondition.is_some(),
            throws = row.declared_exceptions.len(),
            "outcome table row"
        );

        let table = &mut self.table;
        // A vacuous row still marks the table non-empty: only a table that
        // received rows can describe an invalid pre-state.
        table.is_empty = false;
        if row.guard_satisfied {
            if let Some(postcondition) = row.postcondition {
                table.post_conditions.push(postcondition);
            }
            table.has_satisfied_precondition = true;
        }
        if !row.declared_exceptions.is_empty() {
            table.exception_sets.push(row.declared_exceptions);
        }
        self
    }

    /// Convenience form of [`add`](Self::add) taking the row's fields
    pub fn add_row(
        &mut self,
        guard_satisfied: bool,
        postcondition: Option<Box<dyn BooleanExpression>>,
        declared_exceptions: Vec<ThrowsClause>,
    ) -> &mut Self {
        self.add(SpecificationRow::new(
            guard_satisfied,
            postcondition,
            declared_exceptions,
        ))
    }

    /// Freeze the table; no rows can be added afterwards
    pub fn finish(self) -> OutcomeTable {
        self.table
    }
}

impl Extend<SpecificationRow> for OutcomeTableBuilder {
    fn extend<I: IntoIterator<Item = SpecificationRow>>(&mut self, rows: I) {
        for row in rows {
            self.add(row);
        }
    }
}

impl FromIterator<SpecificationRow> for OutcomeTableBuilder {
    fn from_iter<I: IntoIterator<Item = SpecificationRow>>(rows: I) -> Self {
        let mut builder = Self::new();
        builder.extend(rows);
        builder
    }
}

/// The finished outcome table for one call site
#[derive(Debug)]
pub struct OutcomeTable {
    is_empty: bool,
    has_satisfied_precondition: bool,
    post_conditions: Vec<Box<dyn BooleanExpression>>,
    exception_sets: Vec<Vec<ThrowsClause>>,
}

impl OutcomeTable {
    /// No specification applied to the call
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    pub fn has_satisfied_precondition(&self) -> bool {
        self.has_satisfied_precondition
    }

    pub fn post_conditions(&self) -> &[Box<dyn BooleanExpression>] {
        &self.post_conditions
    }

    pub fn exception_sets(&self) -> &[Vec<ThrowsClause>] {
        &self.exception_sets
    }

    /// Whether the pre-state is definitely invalid: specifications applied,
    /// none of their preconditions held, and none sanctions an exception
    pub fn is_invalid_prestate(&self) -> bool {
        !self.is_empty && !self.has_satisfied_precondition && self.exception_sets.is_empty()
    }

    /// Compile the table into a checker, consuming it
    ///
    /// `fallback` classifies the call when no specification constrains it.
    pub fn into_checker(self, fallback: OutcomeChecker) -> OutcomeChecker {
        let exception_sets = self.exception_sets.len();
        let post_conditions = self.post_conditions.len();
        let checker = self.select_checker(fallback);
        debug!(
            checker = %checker.kind(),
            exception_sets,
            post_conditions,
            "compiled outcome checker"
        );
        checker
    }

    fn select_checker(self, fallback: OutcomeChecker) -> OutcomeChecker {
        if self.is_empty {
            return fallback;
        }

        // sanctioned exceptions override guards and postconditions
        if !self.exception_sets.is_empty() {
            return OutcomeChecker::ExpectedException(ExpectedExceptions::new(self.exception_sets));
        }

        if !self.has_satisfied_precondition {
            return OutcomeChecker::Invalid;
        }

        if !self.post_conditions.is_empty() {
            return OutcomeChecker::PostCondition {
                checks: self.post_conditions,
                next: Box::new(fallback),
            };
        }

        fallback
    }
}

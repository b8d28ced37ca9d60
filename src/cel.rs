//! CEL (Common Expression Language) compilation and evaluation
//!
//! Guards and postcondition properties in specification documents are CEL
//! expressions over the operation's identifiers (receiver, parameters and
//! result). This module:
//! - Compiles CEL strings (using cel-interpreter)
//! - Evaluates them against variable bindings
//! - Reports the free variables an expression reads (using cel-parser's AST
//!   to leave out names the expression binds itself, such as the `x` in
//!   `xs.all(x, x > 0)`)

use crate::error::{Error, Result};
use std::collections::{HashMap, HashSet};

use cel_interpreter::{Context, Program, Value};
use cel_parser::ast::Expr;
use cel_parser::Expression as CelExpr;

/// Re-export cel-interpreter Value for use in evaluation
pub use cel_interpreter::Value as CelValue;

/// Variable bindings an expression is evaluated against
pub type Bindings = HashMap<String, CelValue>;

/// CEL compiler - compiles expressions and inspects their variables
pub struct CelCompiler;

impl CelCompiler {
    /// Compile a CEL expression
    pub fn compile(expr: &str) -> Result<Program> {
        Program::compile(expr).map_err(|e| Error::CelParse(format!("{}: {:?}", expr, e)))
    }

    fn execute(expr: &str, program: &Program, vars: &Bindings) -> Result<CelValue> {
        let mut context = Context::default();
        for (name, value) in vars {
            context.add_variable_from_value(name.clone(), value.clone());
        }

        program
            .execute(&context)
            .map_err(|e| Error::CelEval(format!("{}: {:?}", expr, e)))
    }

    fn execute_bool(expr: &str, program: &Program, vars: &Bindings) -> Result<bool> {
        match Self::execute(expr, program, vars)? {
            Value::Bool(b) => Ok(b),
            other => Err(Error::CelEval(format!(
                "{}: expected bool result, got {:?}",
                expr, other
            ))),
        }
    }

    /// Extract the free variable names of a CEL expression
    pub fn extract_variables(expr: &str) -> Result<Vec<String>> {
        let program = Self::compile(expr)?;
        Ok(free_variables(expr, &program))
    }

    /// Validate that all free variables in a CEL expression are defined
    pub fn validate_variables(expr: &str, valid_names: &[&str]) -> Result<()> {
        let referenced = Self::extract_variables(expr)?;
        check_defined(expr, &referenced, valid_names)
    }
}

/// Every identifier the interpreter resolves, minus the loop and
/// accumulator variables of macro comprehensions (`all`, `exists`,
/// `exists_one`, `map`, `filter`)
fn free_variables(source: &str, program: &Program) -> Vec<String> {
    let mut bound = HashSet::new();
    if let Ok(ast) = cel_parser::Parser::new().parse(source) {
        collect_bound_variables(&ast, &mut bound);
    }

    let mut vars: Vec<String> = program
        .references()
        .variables()
        .into_iter()
        .filter(|name| !bound.contains(*name))
        .map(str::to_string)
        .collect();
    vars.sort();
    vars.dedup();
    vars
}

fn collect_bound_variables(expr: &CelExpr, bound: &mut HashSet<String>) {
    match &expr.expr {
        Expr::Comprehension(comprehension) => {
            bound.insert(comprehension.iter_var.clone());
            bound.insert(comprehension.accu_var.clone());
            for part in [
                &comprehension.iter_range,
                &comprehension.accu_init,
                &comprehension.loop_cond,
                &comprehension.loop_step,
                &comprehension.result,
            ] {
                collect_bound_variables(part, bound);
            }
        }
        Expr::Call(call) => {
            if let Some(target) = &call.target {
                collect_bound_variables(target, bound);
            }
            for arg in &call.args {
                collect_bound_variables(arg, bound);
            }
        }
        Expr::Select(select) => collect_bound_variables(&select.operand, bound),
        Expr::List(list) => {
            for element in &list.elements {
                collect_bound_variables(element, bound);
            }
        }
        _ => {}
    }
}

fn check_defined(expr: &str, referenced: &[String], valid_names: &[&str]) -> Result<()> {
    match referenced
        .iter()
        .find(|var| !valid_names.contains(&var.as_str()))
    {
        Some(var) => Err(Error::CelParse(format!(
            "Undefined variable '{}' in expression: {}",
            var, expr
        ))),
        None => Ok(()),
    }
}

/// A CEL expression that compiled successfully
///
/// Holds the compiled program alongside its source so evaluation failures can
/// name the expression they came from.
pub struct CelExpression {
    source: String,
    program: Program,
}

impl CelExpression {
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let program = CelCompiler::compile(&source)?;
        Ok(Self { source, program })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn eval_bool(&self, vars: &Bindings) -> Result<bool> {
        CelCompiler::execute_bool(&self.source, &self.program, vars)
    }

    /// Free variable names this expression reads, sorted
    pub fn referenced_variables(&self) -> Vec<String> {
        free_variables(&self.source, &self.program)
    }

    pub fn validate_variables(&self, valid_names: &[&str]) -> Result<()> {
        check_defined(&self.source, &self.referenced_variables(), valid_names)
    }
}

impl std::fmt::Debug for CelExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CelExpression").field(&self.source).finish()
    }
}

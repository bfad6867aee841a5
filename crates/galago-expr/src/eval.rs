//! Concrete evaluation of candidate expressions under variable assignments.
//!
//! Counterexample replay evaluates each candidate against stored witness
//! states, so this path runs far more often than the solvers do. It is a
//! plain tree walk with no allocation beyond variable lookup.

use std::collections::BTreeMap;
use std::fmt;

use crate::ast::Expr;
use crate::errors::EvalError;

/// A runtime value: program variables are integers, formulas are booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum Value {
    Int(i64),
    Bool(bool),
}

impl Value {
    pub fn sort_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "Int",
            Value::Bool(_) => "Bool",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// A variable assignment, optionally backed by a default for unbound names.
///
/// Witness states from the oracle only mention the variables the solver chose
/// to pin down; the replay convention binds everything else to `Int(1)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Binding {
    values: BTreeMap<String, Value>,
    default: Option<Value>,
}

impl Binding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: BTreeMap<String, Value>) -> Self {
        Self {
            values,
            default: None,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.get(name).copied().or(self.default)
    }
}

fn int_operand(value: Value, operation: &'static str) -> Result<i64, EvalError> {
    value.as_int().ok_or(EvalError::SortMismatch {
        operation,
        expected: "Int",
        found: "Bool",
    })
}

fn bool_operand(value: Value, operation: &'static str) -> Result<bool, EvalError> {
    value.as_bool().ok_or(EvalError::SortMismatch {
        operation,
        expected: "Bool",
        found: "Int",
    })
}

fn int_binop(
    l: &Expr,
    r: &Expr,
    binding: &Binding,
    operation: &'static str,
) -> Result<(i64, i64), EvalError> {
    Ok((
        int_operand(eval(l, binding)?, operation)?,
        int_operand(eval(r, binding)?, operation)?,
    ))
}

/// Evaluate an expression under a binding.
pub fn eval(expr: &Expr, binding: &Binding) -> Result<Value, EvalError> {
    match expr {
        Expr::Var(name) => binding
            .get(name)
            .ok_or_else(|| EvalError::UnboundVariable { name: name.clone() }),
        Expr::IntLit(n) => Ok(Value::Int(*n)),
        Expr::BoolLit(b) => Ok(Value::Bool(*b)),
        Expr::Add(l, r) => {
            let (a, b) = int_binop(l, r, binding, "+")?;
            Ok(Value::Int(a + b))
        }
        Expr::Sub(l, r) => {
            let (a, b) = int_binop(l, r, binding, "-")?;
            Ok(Value::Int(a - b))
        }
        Expr::Mul(l, r) => {
            let (a, b) = int_binop(l, r, binding, "*")?;
            Ok(Value::Int(a * b))
        }
        Expr::Eq(l, r) => match (eval(l, binding)?, eval(r, binding)?) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a == b)),
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a == b)),
            (a, b) => Err(EvalError::SortMismatch {
                operation: "==",
                expected: a.sort_name(),
                found: b.sort_name(),
            }),
        },
        Expr::Ne(l, r) => match (eval(l, binding)?, eval(r, binding)?) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a != b)),
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a != b)),
            (a, b) => Err(EvalError::SortMismatch {
                operation: "!=",
                expected: a.sort_name(),
                found: b.sort_name(),
            }),
        },
        Expr::Lt(l, r) => {
            let (a, b) = int_binop(l, r, binding, "<")?;
            Ok(Value::Bool(a < b))
        }
        Expr::Le(l, r) => {
            let (a, b) = int_binop(l, r, binding, "<=")?;
            Ok(Value::Bool(a <= b))
        }
        Expr::Gt(l, r) => {
            let (a, b) = int_binop(l, r, binding, ">")?;
            Ok(Value::Bool(a > b))
        }
        Expr::Ge(l, r) => {
            let (a, b) = int_binop(l, r, binding, ">=")?;
            Ok(Value::Bool(a >= b))
        }
        Expr::And(es) => {
            for e in es {
                if !bool_operand(eval(e, binding)?, "&&")? {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        Expr::Or(es) => {
            for e in es {
                if bool_operand(eval(e, binding)?, "||")? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        Expr::Not(e) => Ok(Value::Bool(!bool_operand(eval(e, binding)?, "!")?)),
        Expr::Implies(l, r) => {
            if !bool_operand(eval(l, binding)?, "==>")? {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(bool_operand(eval(r, binding)?, "==>")?))
        }
    }
}

/// Evaluate a formula and require a boolean result.
pub fn holds(expr: &Expr, binding: &Binding) -> Result<bool, EvalError> {
    match eval(expr, binding)? {
        Value::Bool(b) => Ok(b),
        Value::Int(_) => Err(EvalError::NotBoolean { found: "Int" }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;

    fn bind(pairs: &[(&str, i64)]) -> Binding {
        let mut b = Binding::new();
        for (name, value) in pairs {
            b.set(*name, Value::Int(*value));
        }
        b
    }

    #[test]
    fn arithmetic_and_comparison() {
        let e = Expr::var("x").add(Expr::int(1)).le(Expr::var("n"));
        assert_eq!(
            eval(&e, &bind(&[("x", 2), ("n", 3)])),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            eval(&e, &bind(&[("x", 3), ("n", 3)])),
            Ok(Value::Bool(false))
        );
    }

    #[test]
    fn unbound_variable_is_an_error_in_strict_bindings() {
        let e = Expr::var("x").gt(Expr::int(0));
        assert_eq!(
            eval(&e, &Binding::new()),
            Err(EvalError::UnboundVariable { name: "x".into() })
        );
    }

    #[test]
    fn default_fills_unbound_variables() {
        let e = Expr::var("x").add(Expr::var("y")).eq(Expr::int(2));
        let b = bind(&[("x", 1)]).with_default(Value::Int(1));
        assert_eq!(eval(&e, &b), Ok(Value::Bool(true)));
    }

    #[test]
    fn connectives_short_circuit() {
        // The unbound variable on the right is never reached.
        let e = Expr::and(vec![Expr::bool(false), Expr::var("missing").gt(Expr::int(0))]);
        assert_eq!(eval(&e, &Binding::new()), Ok(Value::Bool(false)));

        let e = Expr::or(vec![Expr::bool(true), Expr::var("missing").gt(Expr::int(0))]);
        assert_eq!(eval(&e, &Binding::new()), Ok(Value::Bool(true)));
    }

    #[test]
    fn sort_mismatch_is_reported() {
        let e = Expr::bool(true).add(Expr::int(1));
        assert_eq!(
            eval(&e, &Binding::new()),
            Err(EvalError::SortMismatch {
                operation: "+",
                expected: "Int",
                found: "Bool",
            })
        );
    }

    #[test]
    fn holds_rejects_integer_expressions() {
        let e = Expr::var("x").add(Expr::int(1));
        let b = bind(&[("x", 0)]);
        assert_eq!(holds(&e, &b), Err(EvalError::NotBoolean { found: "Int" }));
    }

    #[test]
    fn implication_truth_table() {
        let imp = Expr::var("p")
            .gt(Expr::int(0))
            .implies(Expr::var("q").gt(Expr::int(0)));
        assert_eq!(holds(&imp, &bind(&[("p", 0), ("q", 0)])), Ok(true));
        assert_eq!(holds(&imp, &bind(&[("p", 1), ("q", 0)])), Ok(false));
        assert_eq!(holds(&imp, &bind(&[("p", 1), ("q", 1)])), Ok(true));
    }
}

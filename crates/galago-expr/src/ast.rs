use std::collections::BTreeSet;
use std::fmt;

/// A candidate-invariant expression over integer program variables.
///
/// Leaves are variables and literals; comparisons produce booleans, which
/// combine under the usual connectives. A variable name ending in `!` refers
/// to the post-state copy of the variable inside transition templates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum Expr {
    /// Variable reference by name.
    Var(String),
    IntLit(i64),
    BoolLit(bool),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Eq(Box<Expr>, Box<Expr>),
    Ne(Box<Expr>, Box<Expr>),
    Lt(Box<Expr>, Box<Expr>),
    Le(Box<Expr>, Box<Expr>),
    Gt(Box<Expr>, Box<Expr>),
    Ge(Box<Expr>, Box<Expr>),
    /// N-ary conjunction. Empty means `true`.
    And(Vec<Expr>),
    /// N-ary disjunction. Empty means `false`.
    Or(Vec<Expr>),
    Not(Box<Expr>),
    Implies(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn int(n: i64) -> Self {
        Expr::IntLit(n)
    }

    pub fn bool(b: bool) -> Self {
        Expr::BoolLit(b)
    }

    pub fn add(self, other: Expr) -> Self {
        Expr::Add(Box::new(self), Box::new(other))
    }

    pub fn sub(self, other: Expr) -> Self {
        Expr::Sub(Box::new(self), Box::new(other))
    }

    pub fn mul(self, other: Expr) -> Self {
        Expr::Mul(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn eq(self, other: Expr) -> Self {
        Expr::Eq(Box::new(self), Box::new(other))
    }

    pub fn ne(self, other: Expr) -> Self {
        Expr::Ne(Box::new(self), Box::new(other))
    }

    pub fn lt(self, other: Expr) -> Self {
        Expr::Lt(Box::new(self), Box::new(other))
    }

    pub fn le(self, other: Expr) -> Self {
        Expr::Le(Box::new(self), Box::new(other))
    }

    pub fn gt(self, other: Expr) -> Self {
        Expr::Gt(Box::new(self), Box::new(other))
    }

    pub fn ge(self, other: Expr) -> Self {
        Expr::Ge(Box::new(self), Box::new(other))
    }

    pub fn and(exprs: Vec<Expr>) -> Self {
        Expr::And(exprs)
    }

    pub fn or(exprs: Vec<Expr>) -> Self {
        Expr::Or(exprs)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    pub fn implies(self, other: Expr) -> Self {
        Expr::Implies(Box::new(self), Box::new(other))
    }

    /// Collect every variable name occurring in the expression.
    pub fn collect_vars(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Var(name) => {
                out.insert(name.clone());
            }
            Expr::IntLit(_) | Expr::BoolLit(_) => {}
            Expr::Add(l, r)
            | Expr::Sub(l, r)
            | Expr::Mul(l, r)
            | Expr::Eq(l, r)
            | Expr::Ne(l, r)
            | Expr::Lt(l, r)
            | Expr::Le(l, r)
            | Expr::Gt(l, r)
            | Expr::Ge(l, r)
            | Expr::Implies(l, r) => {
                l.collect_vars(out);
                r.collect_vars(out);
            }
            Expr::And(es) | Expr::Or(es) => {
                for e in es {
                    e.collect_vars(out);
                }
            }
            Expr::Not(e) => e.collect_vars(out),
        }
    }

    pub fn free_vars(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_vars(&mut out);
        out
    }

    /// Rewrite every variable `v` to its post-state copy `v!`.
    ///
    /// Used to build the inductive-step query: the consequent of the step is
    /// the candidate over the primed state.
    pub fn primed(&self) -> Expr {
        match self {
            Expr::Var(name) => Expr::Var(format!("{name}!")),
            Expr::IntLit(n) => Expr::IntLit(*n),
            Expr::BoolLit(b) => Expr::BoolLit(*b),
            Expr::Add(l, r) => l.primed().add(r.primed()),
            Expr::Sub(l, r) => l.primed().sub(r.primed()),
            Expr::Mul(l, r) => l.primed().mul(r.primed()),
            Expr::Eq(l, r) => l.primed().eq(r.primed()),
            Expr::Ne(l, r) => l.primed().ne(r.primed()),
            Expr::Lt(l, r) => l.primed().lt(r.primed()),
            Expr::Le(l, r) => l.primed().le(r.primed()),
            Expr::Gt(l, r) => l.primed().gt(r.primed()),
            Expr::Ge(l, r) => l.primed().ge(r.primed()),
            Expr::And(es) => Expr::And(es.iter().map(Expr::primed).collect()),
            Expr::Or(es) => Expr::Or(es.iter().map(Expr::primed).collect()),
            Expr::Not(e) => e.primed().not(),
            Expr::Implies(l, r) => l.primed().implies(r.primed()),
        }
    }

    /// Binding strength for infix printing. Higher binds tighter.
    fn precedence(&self) -> u8 {
        match self {
            Expr::Var(_) | Expr::IntLit(_) | Expr::BoolLit(_) => 7,
            Expr::Mul(..) => 6,
            Expr::Add(..) | Expr::Sub(..) => 5,
            Expr::Eq(..)
            | Expr::Ne(..)
            | Expr::Lt(..)
            | Expr::Le(..)
            | Expr::Gt(..)
            | Expr::Ge(..) => 4,
            Expr::Not(_) => 3,
            Expr::And(_) => 2,
            Expr::Or(_) => 1,
            Expr::Implies(..) => 0,
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        if self.precedence() < min {
            write!(f, "(")?;
            self.fmt_infix(f)?;
            write!(f, ")")
        } else {
            self.fmt_infix(f)
        }
    }

    fn fmt_binary(
        &self,
        f: &mut fmt::Formatter<'_>,
        l: &Expr,
        op: &str,
        r: &Expr,
    ) -> fmt::Result {
        let prec = self.precedence();
        l.fmt_child(f, prec)?;
        write!(f, " {op} ")?;
        // Right operand needs to bind tighter so `a - (b - c)` keeps parens.
        r.fmt_child(f, prec + 1)
    }

    fn fmt_infix(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{name}"),
            Expr::IntLit(n) => write!(f, "{n}"),
            Expr::BoolLit(b) => write!(f, "{b}"),
            Expr::Add(l, r) => self.fmt_binary(f, l, "+", r),
            Expr::Sub(l, r) => self.fmt_binary(f, l, "-", r),
            Expr::Mul(l, r) => self.fmt_binary(f, l, "*", r),
            Expr::Eq(l, r) => self.fmt_binary(f, l, "==", r),
            Expr::Ne(l, r) => self.fmt_binary(f, l, "!=", r),
            Expr::Lt(l, r) => self.fmt_binary(f, l, "<", r),
            Expr::Le(l, r) => self.fmt_binary(f, l, "<=", r),
            Expr::Gt(l, r) => self.fmt_binary(f, l, ">", r),
            Expr::Ge(l, r) => self.fmt_binary(f, l, ">=", r),
            Expr::And(es) => match es.len() {
                0 => write!(f, "true"),
                _ => {
                    for (i, e) in es.iter().enumerate() {
                        if i > 0 {
                            write!(f, " && ")?;
                        }
                        e.fmt_child(f, self.precedence() + 1)?;
                    }
                    Ok(())
                }
            },
            Expr::Or(es) => match es.len() {
                0 => write!(f, "false"),
                _ => {
                    for (i, e) in es.iter().enumerate() {
                        if i > 0 {
                            write!(f, " || ")?;
                        }
                        e.fmt_child(f, self.precedence() + 1)?;
                    }
                    Ok(())
                }
            },
            Expr::Not(e) => {
                write!(f, "!")?;
                e.fmt_child(f, 7)
            }
            Expr::Implies(l, r) => {
                let prec = self.precedence();
                l.fmt_child(f, prec + 1)?;
                write!(f, " ==> ")?;
                r.fmt_child(f, prec)
            }
        }
    }
}

/// The infix rendering doubles as the verifier-facing program text and as
/// the candidate's identity key in caches.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_infix(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_compose() {
        let e = Expr::var("x").add(Expr::int(1)).le(Expr::var("n"));
        assert_eq!(
            e,
            Expr::Le(
                Box::new(Expr::Add(
                    Box::new(Expr::Var("x".into())),
                    Box::new(Expr::IntLit(1))
                )),
                Box::new(Expr::Var("n".into()))
            )
        );
    }

    #[test]
    fn display_uses_minimal_parens() {
        let e = Expr::and(vec![
            Expr::var("x").ge(Expr::int(0)),
            Expr::var("x").le(Expr::var("n")),
        ]);
        assert_eq!(e.to_string(), "x >= 0 && x <= n");

        let nested = Expr::var("a").sub(Expr::var("b").sub(Expr::var("c")));
        assert_eq!(nested.to_string(), "a - (b - c)");

        let left = Expr::var("a").sub(Expr::var("b")).sub(Expr::var("c"));
        assert_eq!(left.to_string(), "a - b - c");
    }

    #[test]
    fn display_parenthesizes_or_under_and() {
        let e = Expr::and(vec![
            Expr::or(vec![
                Expr::var("x").eq(Expr::int(0)),
                Expr::var("y").eq(Expr::int(0)),
            ]),
            Expr::var("z").gt(Expr::int(1)),
        ]);
        assert_eq!(e.to_string(), "(x == 0 || y == 0) && z > 1");
    }

    #[test]
    fn display_negation() {
        let e = Expr::var("x").lt(Expr::var("y")).not();
        assert_eq!(e.to_string(), "!(x < y)");
        let lit = Expr::bool(false).not();
        assert_eq!(lit.to_string(), "!false");
    }

    #[test]
    fn primed_renames_every_variable() {
        let e = Expr::var("x").add(Expr::var("y")).le(Expr::int(3));
        assert_eq!(e.primed().to_string(), "x! + y! <= 3");
    }

    #[test]
    fn free_vars_are_sorted_and_deduped() {
        let e = Expr::var("y")
            .add(Expr::var("x"))
            .le(Expr::var("x").mul(Expr::int(2)));
        let vars: Vec<_> = e.free_vars().into_iter().collect();
        assert_eq!(vars, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn empty_connectives_print_as_literals() {
        assert_eq!(Expr::and(vec![]).to_string(), "true");
        assert_eq!(Expr::or(vec![]).to_string(), "false");
    }
}

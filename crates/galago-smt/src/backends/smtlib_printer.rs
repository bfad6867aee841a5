use galago_expr::Expr;

/// Print an expression in SMT-LIB2 format.
///
/// Primed names such as `x!` are legal SMT-LIB simple symbols, so no quoting
/// is needed for post-state variables.
pub fn to_smtlib(expr: &Expr) -> String {
    match expr {
        Expr::Var(name) => name.clone(),
        Expr::IntLit(n) => {
            if *n < 0 {
                format!("(- {})", -n)
            } else {
                n.to_string()
            }
        }
        Expr::BoolLit(b) => {
            if *b {
                "true".to_string()
            } else {
                "false".to_string()
            }
        }
        Expr::Add(lhs, rhs) => format!("(+ {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        Expr::Sub(lhs, rhs) => format!("(- {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        Expr::Mul(lhs, rhs) => format!("(* {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        Expr::Eq(lhs, rhs) => format!("(= {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        Expr::Ne(lhs, rhs) => format!("(distinct {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        Expr::Lt(lhs, rhs) => format!("(< {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        Expr::Le(lhs, rhs) => format!("(<= {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        Expr::Gt(lhs, rhs) => format!("(> {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        Expr::Ge(lhs, rhs) => format!("(>= {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        Expr::And(exprs) => {
            if exprs.is_empty() {
                "true".to_string()
            } else if exprs.len() == 1 {
                to_smtlib(&exprs[0])
            } else {
                let inner: Vec<String> = exprs.iter().map(to_smtlib).collect();
                format!("(and {})", inner.join(" "))
            }
        }
        Expr::Or(exprs) => {
            if exprs.is_empty() {
                "false".to_string()
            } else if exprs.len() == 1 {
                to_smtlib(&exprs[0])
            } else {
                let inner: Vec<String> = exprs.iter().map(to_smtlib).collect();
                format!("(or {})", inner.join(" "))
            }
        }
        Expr::Not(inner) => format!("(not {})", to_smtlib(inner)),
        Expr::Implies(lhs, rhs) => format!("(=> {} {})", to_smtlib(lhs), to_smtlib(rhs)),
    }
}

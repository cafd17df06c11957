//! Basis expression tree.

use std::fmt;

/// A parsed basis term.
///
/// Variables are resolved to indices into the per-path value vector when the
/// expression is parsed, so evaluation does no name lookups.
#[derive(Debug, Clone, PartialEq)]
pub enum BasisExpr {
    /// Numeric literal.
    Constant(f64),
    /// Variable by index, with its name kept for display.
    Variable {
        /// Index into the values passed to [`BasisExpr::eval`].
        index: usize,
        /// Name as written.
        name: String,
    },
    /// Sum of two sub-expressions.
    Add(Box<BasisExpr>, Box<BasisExpr>),
    /// Product of two sub-expressions.
    Multiply(Box<BasisExpr>, Box<BasisExpr>),
    /// Sub-expression raised to a non-negative integer power.
    Power(Box<BasisExpr>, i32),
}

impl BasisExpr {
    /// Evaluate against the variable values of one path.
    pub fn eval(&self, values: &[f64]) -> f64 {
        match self {
            BasisExpr::Constant(c) => *c,
            BasisExpr::Variable { index, .. } => values[*index],
            BasisExpr::Add(a, b) => a.eval(values) + b.eval(values),
            BasisExpr::Multiply(a, b) => a.eval(values) * b.eval(values),
            BasisExpr::Power(base, exp) => base.eval(values).powi(*exp),
        }
    }

    /// True if the expression contains no variables.
    pub fn is_constant(&self) -> bool {
        match self {
            BasisExpr::Constant(_) => true,
            BasisExpr::Variable { .. } => false,
            BasisExpr::Add(a, b) | BasisExpr::Multiply(a, b) => a.is_constant() && b.is_constant(),
            BasisExpr::Power(base, exp) => *exp == 0 || base.is_constant(),
        }
    }
}

impl fmt::Display for BasisExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BasisExpr::Constant(c) => write!(f, "{}", c),
            BasisExpr::Variable { name, .. } => write!(f, "{}", name),
            BasisExpr::Add(a, b) => write!(f, "({} + {})", a, b),
            BasisExpr::Multiply(a, b) => write!(f, "{} * {}", a, b),
            BasisExpr::Power(base, exp) => match base.as_ref() {
                BasisExpr::Constant(_) | BasisExpr::Variable { .. } => write!(f, "{}**{}", base, exp),
                _ => write!(f, "({})**{}", base, exp),
            },
        }
    }
}

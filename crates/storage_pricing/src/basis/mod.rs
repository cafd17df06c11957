//! Regression basis functions written as algebraic expressions.
//!
//! A basis is a `+`-separated list of terms such as
//! `1 + x_st + x_lt + s + s**2 + s * x_st`. Variables are the model's factor
//! values on the regression date (named by the model), the spot price `s`
//! and the time to the decision date in years `t`.
//!
//! Expressions are parsed once into [`BasisExpr`] trees; unknown variable
//! names are reported at parse time.
//!
//! # Example
//!
//! ```
//! use storage_pricing::basis::{BasisFunctions, BasisVariables};
//!
//! let vars = BasisVariables::new(["x_st", "x_lt"]);
//! let basis = BasisFunctions::parse("1 + x_st + s**2 + s * x_lt", &vars).unwrap();
//! assert_eq!(basis.len(), 4);
//!
//! // Values are ordered factors, then s, then t.
//! let mut row = vec![0.0; basis.len()];
//! basis.evaluate_into(&[0.1, -0.2, 10.0, 0.5], &mut row);
//! assert_eq!(row, vec![1.0, 0.1, 100.0, -2.0]);
//!
//! assert!(BasisFunctions::parse("1 + x_sw", &vars).is_err());
//! ```

mod error;
mod expr;
mod lexer;
mod parser;

pub use error::BasisError;
pub use expr::BasisExpr;

use storage_models::models::MultiFactorModel;

/// Name of the spot price variable.
pub const SPOT: &str = "s";
/// Name of the time variable.
pub const TIME: &str = "t";

/// Variable names available to basis expressions.
///
/// Value vectors passed to evaluation are laid out as the factor values in
/// model order, then the spot price, then time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasisVariables {
    factor_names: Vec<String>,
}

impl BasisVariables {
    /// Variables for factors with the given names.
    pub fn new<I, S>(factor_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            factor_names: factor_names.into_iter().map(Into::into).collect(),
        }
    }

    /// Variables for a model's factors.
    pub fn for_model(model: &MultiFactorModel) -> Self {
        Self::new(model.factor_names().iter().cloned())
    }

    /// Number of factors.
    pub fn num_factors(&self) -> usize {
        self.factor_names.len()
    }

    /// Length of a value vector: factors plus spot and time.
    pub fn num_values(&self) -> usize {
        self.factor_names.len() + 2
    }

    /// Value index of `name`, if it is a known variable.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        if let Some(i) = self.factor_names.iter().position(|n| n == name) {
            return Some(i);
        }
        match name {
            SPOT => Some(self.factor_names.len()),
            TIME => Some(self.factor_names.len() + 1),
            _ => None,
        }
    }

    fn expected(&self) -> String {
        self.factor_names
            .iter()
            .map(String::as_str)
            .chain([SPOT, TIME])
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A parsed set of regression basis functions.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisFunctions {
    terms: Vec<BasisExpr>,
    num_values: usize,
}

impl BasisFunctions {
    /// Parse `expr` against `variables`.
    ///
    /// # Errors
    ///
    /// - [`BasisError::UnknownBasisVariable`] for a name that is neither a
    ///   factor, `s` nor `t`
    /// - [`BasisError::Parse`] for malformed text or non-integer powers
    /// - [`BasisError::Empty`] for blank input
    pub fn parse(expr: &str, variables: &BasisVariables) -> Result<Self, BasisError> {
        let tokens = lexer::tokenize(expr)?;
        let resolve = |name: &str, position: usize| {
            variables
                .index_of(name)
                .ok_or_else(|| BasisError::UnknownBasisVariable {
                    name: name.to_string(),
                    position,
                    expected: variables.expected(),
                })
        };
        let terms = parser::parse(tokens, expr.len(), &resolve)?;
        Ok(Self {
            terms,
            num_values: variables.num_values(),
        })
    }

    /// Number of basis functions.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// True if there are no basis functions.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Parsed terms.
    pub fn terms(&self) -> &[BasisExpr] {
        &self.terms
    }

    /// Expected length of value vectors.
    pub fn num_values(&self) -> usize {
        self.num_values
    }

    /// Evaluate every term for one path into `out`.
    pub fn evaluate_into(&self, values: &[f64], out: &mut [f64]) {
        for (slot, term) in out.iter_mut().zip(&self.terms) {
            *slot = term.eval(values);
        }
    }
}

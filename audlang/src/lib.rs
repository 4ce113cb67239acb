//! Core expression model of the Audience Definition Language.
//!
//! Expressions reaching this crate are already decomposed into the core operators: inclusive bounds are
//! disjunctions (`a >= 5` is `a > 5 OR a = 5`), inequality is a negated equality and every negation wraps
//! a single match.

pub mod ast;
mod display;
pub mod error;

pub use ast::{CombiType, CombinedExpression, CoreExpression, MatchExpression, MatchOperator, NegationExpression, Operand, SpecialSetType};
pub use error::ExpressionError;

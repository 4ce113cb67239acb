use crate::ast::MatchOperator;
use thiserror::Error;

/// Errors raised when an expression is assembled from parts that do not fit together
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("Argument name must not be empty")]
    EmptyArgName,
    #[error("Missing operand for {arg_name} {}", .operator.symbol())]
    MissingOperand { arg_name: String, operator: MatchOperator },
    #[error("IS UNKNOWN does not take an operand (argument {arg_name})")]
    UnexpectedOperand { arg_name: String },
    #[error("Operator {} does not support argument references (argument {arg_name})", .operator.symbol())]
    ReferenceNotAllowed { arg_name: String, operator: MatchOperator },
}

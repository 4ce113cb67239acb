//! Error types of the conversion engine.
//!
//! Lookup, capability and formatting problems are reported per query through [`ConversionError`].
//! Configuration problems are detected while building the mapping and surface as [`ConfigError`].
//! Internal inconsistencies (builder misuse, broken tree invariants) are defects and panic.

use crate::types::{AdlType, DefaultSolrType};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("No mapping found for argument {0}")]
    NoMapping(String),
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),
    #[error("CONTAINS is not supported for argument {arg_name}: {reason}")]
    ContainsNotSupported { arg_name: String, reason: CapabilityReason },
    #[error("Less than / greater than is not supported for argument {arg_name}: {reason}")]
    LessThanGreaterThanNotSupported { arg_name: String, reason: CapabilityReason },
    #[error("Reference match not supported ({arg_name} vs. @{ref_arg_name}): {reason}")]
    ReferenceMatchNotSupported { arg_name: String, ref_arg_name: String, reason: CapabilityReason },
    #[error("Unable to format value {value:?} of argument {arg_name}: {reason}")]
    Formatting { arg_name: String, value: String, reason: String },
    #[error("Unresolved variable ${{{0}}}")]
    UnresolvedVariable(String),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Why a capability (contains, ordering, reference matching) was refused
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CapabilityReason {
    #[error("disabled by directive")]
    DisabledByDirective,
    #[error("not supported by type {0:?}")]
    UnsupportedType(DefaultSolrType),
    #[error("incompatible types {left:?} and {right:?}")]
    IncompatibleTypes { left: DefaultSolrType, right: DefaultSolrType },
    #[error("fields live on different node types ({left} vs. {right})")]
    NodeTypeMismatch { left: String, right: String },
    #[error("collection field {0} cannot be used in a function query")]
    CollectionField(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionErrorKind {
    Lookup,
    Capability,
    Formatting,
    Configuration,
}

impl ConversionError {
    pub fn kind(&self) -> ConversionErrorKind {
        match self {
            ConversionError::NoMapping(_) | ConversionError::UnknownNodeType(_) | ConversionError::UnresolvedVariable(_) => {
                ConversionErrorKind::Lookup
            }
            ConversionError::ContainsNotSupported { .. }
            | ConversionError::LessThanGreaterThanNotSupported { .. }
            | ConversionError::ReferenceMatchNotSupported { .. } => ConversionErrorKind::Capability,
            ConversionError::Formatting { .. } => ConversionErrorKind::Formatting,
            ConversionError::Config(_) => ConversionErrorKind::Configuration,
        }
    }

    pub(crate) fn formatting(arg_name: &str, value: &str, reason: impl Into<String>) -> Self {
        ConversionError::Formatting { arg_name: arg_name.to_string(), value: value.to_string(), reason: reason.into() }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid {what} name: {name:?}")]
    InvalidName { what: &'static str, name: String },
    #[error("Duplicate node type: {0}")]
    DuplicateNodeType(String),
    #[error("Node type {0} cannot be a second main node type")]
    SecondMainNodeType(String),
    #[error("Node type {node_type} referenced by {referenced_by} is not declared")]
    UndeclaredNodeType { node_type: String, referenced_by: String },
    #[error("Invalid argument name: {0:?}")]
    InvalidArgName(String),
    #[error("Duplicate argument: {0}")]
    DuplicateArgument(String),
    #[error("Argument {arg_name} of type {arg_type:?} cannot be stored in a field of type {field_type:?}")]
    IncompatibleTypes { arg_name: String, arg_type: AdlType, field_type: DefaultSolrType },
    #[error("Argument {0} is mapped to the main document and cannot be multi-doc")]
    MultiDocOnMainNodeType(String),
    #[error("Document filter {field_name} of node type {node_type} must not be blank")]
    BlankDocumentFilter { node_type: String, field_name: String },
}

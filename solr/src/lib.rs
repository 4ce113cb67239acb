//! Conversion of Audlang core expressions into Solr filter queries.
//!
//! Arguments are mapped to fields of a main document, of nested documents (block join) or of dependent
//! documents (join by key). A conversion runs in stages:
//!
//! 1. [`NegationPropagator`] makes the "value is known" part of strict negations explicit
//! 2. [`tree::MatchTreeHelper`] builds the match tree and consolidates it
//! 3. [`tree::NodeTypeGrouper`] collects conditions that can share one join
//! 4. [`factory::MatchFilterFactory`] and [`query::SolrFilterQueryBuilder`] render the filter queries
//!
//! [`SolrExpressionConverter`] runs all of them.

pub mod config;
pub mod context;
pub mod converter;
pub mod error;
pub mod factory;
pub mod format;
pub mod mapping;
pub mod negation;
pub mod query;
pub mod tree;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::{ConversionDirective, SolrConversionConfig, DIRECTIVES_VARIABLE};
pub use context::SolrConversionProcessContext;
pub use converter::SolrExpressionConverter;
pub use error::{CapabilityReason, ConfigError, ConversionError, ConversionErrorKind};
pub use negation::NegationPropagator;
pub use query::{SolrFilterQuery, SolrQueryDefinition};
pub use types::{AdlType, DefaultSolrType, SolrType, SolrValueFormatter};

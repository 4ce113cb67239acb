//! Solr-side query representation and the filter query builder.

mod builder;
mod definition;
mod field;
mod filter;

pub use builder::{SolrFilterQueryBuilder, SolrFormatStyle};
pub use definition::{SolrQueryDefinition, DEFAULT_MAIN_QUERY};
pub use field::{is_valid_name, SolrQueryField};
pub use filter::{SolrConditionType, SolrFilterQuery};

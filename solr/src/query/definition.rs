use super::filter::SolrFilterQuery;
use serde::Serialize;
use std::fmt;

pub const DEFAULT_MAIN_QUERY: &str = "*:*";

/// Result of a conversion: the main query plus the filter queries narrowing it down
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolrQueryDefinition {
    main_query_string: String,
    filter_queries: Vec<SolrFilterQuery>,
    unique_key_field_name: String,
}

impl SolrQueryDefinition {
    /// Filter queries are sorted by query string, duplicates removed.
    pub fn new(main_query_string: impl Into<String>, mut filter_queries: Vec<SolrFilterQuery>, unique_key_field_name: impl Into<String>) -> Self {
        filter_queries.sort();
        filter_queries.dedup();
        Self { main_query_string: main_query_string.into(), filter_queries, unique_key_field_name: unique_key_field_name.into() }
    }

    pub fn main_query_string(&self) -> &str { &self.main_query_string }

    pub fn filter_queries(&self) -> &[SolrFilterQuery] { &self.filter_queries }

    pub fn unique_key_field_name(&self) -> &str { &self.unique_key_field_name }

    /// The filter query strings, as they would be passed in `fq` parameters
    pub fn filter_query_strings(&self) -> Vec<&str> { self.filter_queries.iter().map(|fq| fq.query_string()).collect() }
}

impl fmt::Display for SolrQueryDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q={}", self.main_query_string)?;
        for fq in &self.filter_queries {
            write!(f, "\nfq={}", fq.query_string())?;
        }
        Ok(())
    }
}

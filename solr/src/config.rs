//! Immutable conversion configuration shared by all conversions of a converter.

use crate::mapping::SolrMappingConfig;
use crate::query::SolrFormatStyle;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Global variable holding a comma-separated list of directives, e.g. `DISABLE_CONTAINS, DISABLE_LT_GT`
pub const DIRECTIVES_VARIABLE: &str = "directives";

/// Switches restricting what a conversion may produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConversionDirective {
    DisableContains,
    DisableLessThanGreaterThan,
    DisableReferenceMatching,
    DisableDateTimeAlignment,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown conversion directive: {0}")]
pub struct UnknownDirective(pub String);

impl ConversionDirective {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionDirective::DisableContains => "DISABLE_CONTAINS",
            ConversionDirective::DisableLessThanGreaterThan => "DISABLE_LT_GT",
            ConversionDirective::DisableReferenceMatching => "DISABLE_REFERENCE_MATCHING",
            ConversionDirective::DisableDateTimeAlignment => "DISABLE_DATE_TIME_ALIGNMENT",
        }
    }

    /// Parses a comma-separated directive list. Unknown entries are logged and skipped.
    pub fn parse_list(list: &str) -> BTreeSet<ConversionDirective> {
        list.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| match entry.parse() {
                Ok(directive) => Some(directive),
                Err(e) => {
                    tracing::warn!("Ignoring directive: {}", e);
                    None
                }
            })
            .collect()
    }
}

impl FromStr for ConversionDirective {
    type Err = UnknownDirective;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DISABLE_CONTAINS" => Ok(ConversionDirective::DisableContains),
            "DISABLE_LT_GT" => Ok(ConversionDirective::DisableLessThanGreaterThan),
            "DISABLE_REFERENCE_MATCHING" => Ok(ConversionDirective::DisableReferenceMatching),
            "DISABLE_DATE_TIME_ALIGNMENT" => Ok(ConversionDirective::DisableDateTimeAlignment),
            _ => Err(UnknownDirective(s.to_string())),
        }
    }
}

impl fmt::Display for ConversionDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Mapping, default global variables, directives and output style.
///
/// Each conversion works on a [`crate::SolrConversionProcessContext`] created from this template, so
/// variables set for one call never leak into the next.
#[derive(Debug, Clone)]
pub struct SolrConversionConfig {
    mapping: Arc<dyn SolrMappingConfig>,
    global_variables: HashMap<String, String>,
    directives: BTreeSet<ConversionDirective>,
    style: SolrFormatStyle,
}

impl SolrConversionConfig {
    pub fn new(mapping: impl SolrMappingConfig + 'static) -> Self { Self::with_shared_mapping(Arc::new(mapping)) }

    pub fn with_shared_mapping(mapping: Arc<dyn SolrMappingConfig>) -> Self {
        Self { mapping, global_variables: HashMap::new(), directives: BTreeSet::new(), style: SolrFormatStyle::default() }
    }

    pub fn with_global_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.global_variables.insert(name.into(), value.into());
        self
    }

    pub fn with_directive(mut self, directive: ConversionDirective) -> Self {
        self.directives.insert(directive);
        self
    }

    pub fn with_style(mut self, style: SolrFormatStyle) -> Self {
        self.style = style;
        self
    }

    pub fn mapping(&self) -> &dyn SolrMappingConfig { self.mapping.as_ref() }

    pub fn global_variables(&self) -> &HashMap<String, String> { &self.global_variables }

    pub fn directives(&self) -> &BTreeSet<ConversionDirective> { &self.directives }

    pub fn style(&self) -> SolrFormatStyle { self.style }
}

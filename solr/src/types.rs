//! Logical argument types and the Solr field types they are stored in.

use crate::error::ConversionError;
use crate::format::{escape, parse_date_time};
use audlang::MatchOperator;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Type of an Audlang argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdlType {
    String,
    Integer,
    Decimal,
    Bool,
    Date,
}

/// Built-in Solr field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefaultSolrType {
    SolrString,
    SolrInteger,
    SolrLong,
    SolrFloat,
    SolrDouble,
    SolrBoolean,
    SolrDate,
}

impl AdlType {
    pub fn is_numeric(&self) -> bool { matches!(self, AdlType::Integer | AdlType::Decimal) }

    /// Whether values of this argument type can be stored in a field of the given type
    pub fn is_compatible_with(&self, field_type: DefaultSolrType) -> bool {
        use DefaultSolrType::*;
        match self {
            AdlType::String => field_type == SolrString,
            AdlType::Integer => matches!(field_type, SolrInteger | SolrLong | SolrFloat | SolrDouble),
            AdlType::Decimal => matches!(field_type, SolrFloat | SolrDouble),
            AdlType::Bool => matches!(field_type, SolrBoolean | SolrInteger | SolrLong),
            AdlType::Date => matches!(field_type, SolrDate | SolrLong | SolrInteger),
        }
    }
}

impl DefaultSolrType {
    pub fn supports_contains(&self) -> bool { matches!(self, DefaultSolrType::SolrString) }

    pub fn supports_less_than_greater_than(&self) -> bool { !matches!(self, DefaultSolrType::SolrBoolean) }

    /// Function queries can only order numeric and date values
    pub fn supports_function_ordering(&self) -> bool { !matches!(self, DefaultSolrType::SolrString | DefaultSolrType::SolrBoolean) }

    /// Types holding a point in time with sub-day precision, which need day alignment for date arguments
    pub fn is_timestamp(&self) -> bool { matches!(self, DefaultSolrType::SolrDate | DefaultSolrType::SolrLong) }

    /// Formats a value for a query against a field of this type, escaped and ready to be inlined.
    pub fn format_value(&self, arg_name: &str, arg_type: AdlType, value: &str, operator: MatchOperator) -> Result<String, ConversionError> {
        let native = self.native_value(arg_name, arg_type, value)?;
        Ok(match operator {
            MatchOperator::Contains => format!("*{}*", escape(&native)),
            _ => escape(&native).into_owned(),
        })
    }

    fn native_value(&self, arg_name: &str, arg_type: AdlType, value: &str) -> Result<String, ConversionError> {
        use DefaultSolrType::*;
        if value.trim().is_empty() {
            return Err(ConversionError::formatting(arg_name, value, "blank value"));
        }
        let invalid = |expected: &str| ConversionError::formatting(arg_name, value, format!("expected {expected}"));
        let trimmed = value.trim();

        match (arg_type, self) {
            (AdlType::String, _) => Ok(value.to_string()),
            (AdlType::Integer, SolrInteger) => trimmed.parse::<i32>().map(|v| v.to_string()).map_err(|_| invalid("a 32-bit integer")),
            (AdlType::Integer, _) => {
                let parsed = trimmed.parse::<i64>().map_err(|_| invalid("an integer"))?;
                Ok(parsed.to_string())
            }
            (AdlType::Decimal, _) => match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(trimmed.to_string()),
                _ => Err(invalid("a decimal number")),
            },
            (AdlType::Bool, _) => {
                let flag = match trimmed.to_ascii_lowercase().as_str() {
                    "1" | "true" => true,
                    "0" | "false" => false,
                    _ => return Err(invalid("a boolean (1, 0, true, false)")),
                };
                Ok(match self {
                    SolrBoolean => flag.to_string(),
                    _ => (flag as u8).to_string(),
                })
            }
            (AdlType::Date, SolrLong) => Ok(parse_date_time(arg_name, value)?.and_utc().timestamp_millis().to_string()),
            (AdlType::Date, SolrInteger) => Ok(parse_date_time(arg_name, value)?.format("%Y%m%d").to_string()),
            (AdlType::Date, _) => Ok(parse_date_time(arg_name, value)?.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        }
    }
}

/// Formats a value of an argument for the query, replacing the built-in formatting of a field type
pub trait SolrValueFormatter: fmt::Debug + Send + Sync {
    fn format(&self, arg_name: &str, value: &str, operator: MatchOperator) -> Result<String, ConversionError>;
}

/// A Solr field type with an optional custom formatter
#[derive(Clone)]
pub struct SolrType {
    base: DefaultSolrType,
    formatter: Option<Arc<dyn SolrValueFormatter>>,
}

impl SolrType {
    pub fn new(base: DefaultSolrType) -> Self { Self { base, formatter: None } }

    pub fn with_formatter(base: DefaultSolrType, formatter: Arc<dyn SolrValueFormatter>) -> Self { Self { base, formatter: Some(formatter) } }

    pub fn base(&self) -> DefaultSolrType { self.base }

    pub fn format_value(&self, arg_name: &str, arg_type: AdlType, value: &str, operator: MatchOperator) -> Result<String, ConversionError> {
        match &self.formatter {
            Some(formatter) => formatter.format(arg_name, value, operator),
            None => self.base.format_value(arg_name, arg_type, value, operator),
        }
    }
}

impl From<DefaultSolrType> for SolrType {
    fn from(base: DefaultSolrType) -> Self { Self::new(base) }
}

impl PartialEq for SolrType {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
            && match (&self.formatter, &other.formatter) {
                (None, None) => true,
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
    }
}

impl Eq for SolrType {}

impl fmt::Debug for SolrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.formatter {
            Some(formatter) => write!(f, "{:?} (formatter: {:?})", self.base, formatter),
            None => write!(f, "{:?}", self.base),
        }
    }
}

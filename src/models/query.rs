//! Listing, filtering and pagination types.

use super::customer::Customer;
use crate::domain::ValidationError;
use crate::search::SearchTerm;
use serde::Serialize;
use std::cmp::Ordering;
use std::str::FromStr;

/// Sentinel filter field meaning "no field filter".
pub const FILTER_ALL: &str = "all";

/// Default sort field when none is given.
pub const DEFAULT_SORT_FIELD: &str = "name";

/// Raw listing parameters as they arrive from a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerQuery {
    /// Free-text search box value
    pub search: Option<String>,

    /// Number of records to skip
    pub offset: Option<usize>,

    /// Page size (defaults and limits come from configuration)
    pub page_size: Option<usize>,

    /// Flat field to filter on (`all` disables the filter)
    pub filter_field: Option<String>,

    /// Exact value for `filter_field`; empty means "field is non-empty"
    pub filter_value: Option<String>,

    /// `field:asc` or `field:desc`
    pub sort: Option<String>,
}

/// A filter on a single flat field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldFilter {
    /// Field equals the given string value
    Equals { field: String, value: String },

    /// Field is a string greater than `""` (present and non-empty)
    NonEmpty { field: String },
}

impl FieldFilter {
    pub fn field(&self) -> &str {
        match self {
            Self::Equals { field, .. } | Self::NonEmpty { field } => field,
        }
    }
}

/// The combined filter a repository applies before counting or paging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFilter {
    pub field: Option<FieldFilter>,
    pub keyword: Option<SearchTerm>,
}

impl CustomerFilter {
    /// Build a filter from the raw filter and search parameters.
    ///
    /// # Errors
    ///
    /// Rejects field names that are not plain identifiers.
    pub fn from_params(
        filter_field: Option<&str>,
        filter_value: Option<&str>,
        search: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let field = match filter_field.map(str::trim) {
            None | Some("") | Some(FILTER_ALL) => None,
            Some(name) => {
                validate_field_name(name)?;
                match filter_value {
                    Some(value) if !value.is_empty() => Some(FieldFilter::Equals {
                        field: name.to_string(),
                        value: value.to_string(),
                    }),
                    _ => Some(FieldFilter::NonEmpty {
                        field: name.to_string(),
                    }),
                }
            }
        };

        Ok(Self {
            field,
            keyword: search.and_then(SearchTerm::parse),
        })
    }

    /// Filter on exact equality of one field.
    pub fn equals(field: &str, value: &str) -> Self {
        Self {
            field: Some(FieldFilter::Equals {
                field: field.to_string(),
                value: value.to_string(),
            }),
            keyword: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.field.is_none() && self.keyword.is_none()
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Apply this direction to an ascending ordering.
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// Sort order on one flat field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: DEFAULT_SORT_FIELD.to_string(),
            direction: SortDirection::Ascending,
        }
    }
}

impl FromStr for SortSpec {
    type Err = ValidationError;

    /// Parse `field:desc`, `field:asc` or `field`; anything but `desc` is ascending.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, order) = match s.split_once(':') {
            Some((field, order)) => (field.trim(), order.trim()),
            None => (s.trim(), ""),
        };
        validate_field_name(field)?;

        let direction = if order.eq_ignore_ascii_case("desc") {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };

        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }
}

/// Field names must be plain identifiers so they can be used as field paths.
fn validate_field_name(name: &str) -> Result<(), ValidationError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidField(name.to_string()))
    }
}

/// One page of a customer listing.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPage {
    pub customers: Vec<Customer>,

    /// Offset of the next page, or `None` when this page was the last
    pub new_offset: Option<usize>,

    /// Matching records before pagination
    pub total_customers: usize,

    pub page_size: usize,
}

impl CustomerPage {
    /// Assemble a page; a short page means there is nothing after it.
    pub fn new(customers: Vec<Customer>, offset: usize, limit: usize, total: usize) -> Self {
        let new_offset = if customers.len() < limit {
            None
        } else {
            Some(offset + limit)
        };
        Self {
            customers,
            new_offset,
            total_customers: total,
            page_size: limit,
        }
    }
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CustomerStats {
    pub total_customers: usize,
    pub active_customers: usize,
    pub inactive_customers: usize,
}

impl CustomerStats {
    pub fn new(total: usize, active: usize) -> Self {
        Self {
            total_customers: total,
            active_customers: active,
            inactive_customers: total.saturating_sub(active),
        }
    }
}

//! Filter - Client-side filtering of data source results
//!
//! Data sources fetch an unfiltered list from the platform, then narrow it
//! with `filter` blocks of the form `{ name, values, regex }`. All filters
//! must match (AND); within a filter any value may match (OR).

use regex::Regex;

use crate::provider::{ProviderError, ProviderResult};
use crate::resource::{Attributes, Value};
use crate::schema::{AttributeSchema, AttributeType, ResourceSchema};

/// Name of the filter attribute on every filterable data source
pub const FILTER_ATTRIBUTE: &str = "filter";

/// Schema of the `filter` attribute
pub fn filter_attribute() -> AttributeSchema {
    AttributeSchema::new(
        FILTER_ATTRIBUTE,
        AttributeType::list_of_objects(vec![
            AttributeSchema::new("name", AttributeType::String).required(),
            AttributeSchema::new(
                "values",
                AttributeType::List(Box::new(AttributeType::String)),
            )
            .required(),
            AttributeSchema::new("regex", AttributeType::Bool),
        ]),
    )
    .with_description("Client-side filters applied to the listed results")
}

/// A single parsed filter block
#[derive(Debug, Clone)]
pub struct Filter {
    pub name: String,
    pub values: Vec<String>,
    pub regex: bool,
}

impl Filter {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
            regex: false,
        }
    }

    pub fn with_regex(mut self, regex: bool) -> Self {
        self.regex = regex;
        self
    }
}

/// Read the `filter` attribute out of a data source configuration
pub fn parse_filters(attributes: &Attributes) -> ProviderResult<Vec<Filter>> {
    let Some(value) = attributes.get(FILTER_ATTRIBUTE) else {
        return Ok(Vec::new());
    };
    let items = value
        .as_list()
        .ok_or_else(|| ProviderError::new("filter must be a list of blocks"))?;

    items
        .iter()
        .map(|item| {
            let block = item
                .as_map()
                .ok_or_else(|| ProviderError::new("filter entries must be blocks"))?;
            let name = block
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| ProviderError::new("filter.name is required"))?;
            let values = block
                .get("values")
                .and_then(Value::as_list)
                .ok_or_else(|| ProviderError::new("filter.values is required"))?
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            let regex = block.get("regex").and_then(Value::as_bool).unwrap_or(false);
            Ok(Filter::new(name, values).with_regex(regex))
        })
        .collect()
}

/// Keep the items matching every filter.
///
/// Filter names must refer to scalar attributes of `schema`.
pub fn apply_filters(
    filters: &[Filter],
    items: Vec<Attributes>,
    schema: &ResourceSchema,
) -> ProviderResult<Vec<Attributes>> {
    let mut compiled = Vec::with_capacity(filters.len());
    for filter in filters {
        match schema.get(&filter.name).map(|a| &a.attr_type) {
            None => {
                return Err(ProviderError::new(format!(
                    "filter name '{}' is not an attribute of {}",
                    filter.name, schema.resource_type
                )));
            }
            Some(AttributeType::List(_) | AttributeType::Map(_) | AttributeType::Object(_)) => {
                return Err(ProviderError::new(format!(
                    "filter name '{}' does not refer to a scalar attribute",
                    filter.name
                )));
            }
            Some(_) => {}
        }
        compiled.push(CompiledFilter::new(filter)?);
    }

    Ok(items
        .into_iter()
        .filter(|item| compiled.iter().all(|f| f.matches(item)))
        .collect())
}

/// Require exactly one result for a singular data source
pub fn validate_one_result(count: usize) -> ProviderResult<()> {
    match count {
        0 => Err(ProviderError::new(
            "no matching result found, please change your search criteria and try again",
        )),
        1 => Ok(()),
        n => Err(ProviderError::new(format!(
            "more than one result found ({}), please change your search criteria and try again",
            n
        ))),
    }
}

enum Matcher {
    Exact(Vec<String>),
    Regex(Vec<Regex>),
}

struct CompiledFilter<'a> {
    name: &'a str,
    matcher: Matcher,
}

impl<'a> CompiledFilter<'a> {
    fn new(filter: &'a Filter) -> ProviderResult<Self> {
        let matcher = if filter.regex {
            let patterns = filter
                .values
                .iter()
                .map(|v| {
                    Regex::new(v).map_err(|e| {
                        ProviderError::new(format!("invalid filter regex '{}'", v)).with_cause(e)
                    })
                })
                .collect::<ProviderResult<Vec<_>>>()?;
            Matcher::Regex(patterns)
        } else {
            Matcher::Exact(filter.values.clone())
        };
        Ok(Self {
            name: &filter.name,
            matcher,
        })
    }

    fn matches(&self, item: &Attributes) -> bool {
        let Some(actual) = item.get(self.name).and_then(Value::to_scalar_string) else {
            return false;
        };
        match &self.matcher {
            Matcher::Exact(values) => values.iter().any(|v| *v == actual),
            Matcher::Regex(patterns) => patterns.iter().any(|p| p.is_match(&actual)),
        }
    }
}

//! Helpers for reading typed values out of attribute maps

use ncloud_core::provider::{ProviderError, ProviderResult};
use ncloud_core::resource::{Attributes, Value};

use crate::client::ApiError;

/// Wrap a remote failure, keeping the API error as the cause
pub fn api_error(operation: &str, err: ApiError) -> ProviderError {
    ProviderError::new(format!("{} failed", operation)).with_cause(err)
}

pub fn required_string(attrs: &Attributes, name: &str) -> ProviderResult<String> {
    optional_string(attrs, name)
        .ok_or_else(|| ProviderError::new(format!("'{}' is required", name)))
}

pub fn optional_string(attrs: &Attributes, name: &str) -> Option<String> {
    attrs.get(name).and_then(Value::as_str).map(str::to_string)
}

pub fn required_int(attrs: &Attributes, name: &str) -> ProviderResult<i64> {
    optional_int(attrs, name).ok_or_else(|| ProviderError::new(format!("'{}' is required", name)))
}

pub fn optional_int(attrs: &Attributes, name: &str) -> Option<i64> {
    attrs.get(name).and_then(Value::as_int)
}

pub fn required_i32(attrs: &Attributes, name: &str) -> ProviderResult<i32> {
    optional_i32(attrs, name)?
        .ok_or_else(|| ProviderError::new(format!("'{}' is required", name)))
}

/// Explicitly set values are kept even when zero
pub fn optional_i32(attrs: &Attributes, name: &str) -> ProviderResult<Option<i32>> {
    optional_int(attrs, name)
        .map(|n| {
            i32::try_from(n).map_err(|_| {
                ProviderError::new(format!("'{}' does not fit in a 32-bit integer", name))
            })
        })
        .transpose()
}

pub fn optional_bool(attrs: &Attributes, name: &str) -> Option<bool> {
    attrs.get(name).and_then(Value::as_bool)
}

/// Nested block
pub fn block<'a>(attrs: &'a Attributes, name: &str) -> Option<&'a Attributes> {
    attrs.get(name).and_then(Value::as_map)
}

pub fn required_block<'a>(attrs: &'a Attributes, name: &str) -> ProviderResult<&'a Attributes> {
    block(attrs, name).ok_or_else(|| ProviderError::new(format!("block '{}' is required", name)))
}

/// Repeated nested blocks
pub fn blocks<'a>(attrs: &'a Attributes, name: &str) -> Vec<&'a Attributes> {
    attrs
        .get(name)
        .and_then(Value::as_list)
        .map(|items| items.iter().filter_map(Value::as_map).collect())
        .unwrap_or_default()
}

pub fn string_list(attrs: &Attributes, name: &str) -> Vec<String> {
    attrs
        .get(name)
        .and_then(Value::as_list)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Insert only when the platform returned a value
pub fn insert_opt<V: Into<Value>>(attrs: &mut Attributes, name: &str, value: Option<V>) {
    if let Some(v) = value {
        attrs.insert(name.to_string(), v.into());
    }
}

/// Build a `Value::Map` from pairs
pub fn map_value<I, K>(pairs: I) -> Value
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    Value::Map(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn attrs() -> Attributes {
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::from("scale-out"));
        attrs.insert("cooldown".to_string(), Value::Int(0));
        attrs.insert("huge".to_string(), Value::Int(i64::MAX));
        attrs.insert(
            "cmd".to_string(),
            map_value([(
                "build",
                Value::List(vec![Value::from("make"), Value::from("make test")]),
            )]),
        );
        attrs
    }

    #[test]
    fn reads_scalars() {
        let attrs = attrs();
        assert_eq!(required_string(&attrs, "name").unwrap(), "scale-out");
        assert!(required_string(&attrs, "missing").is_err());
        assert_eq!(optional_string(&attrs, "missing"), None);
    }

    #[test]
    fn explicit_zero_is_kept() {
        assert_eq!(optional_i32(&attrs(), "cooldown").unwrap(), Some(0));
        assert_eq!(optional_i32(&attrs(), "missing").unwrap(), None);
    }

    #[test]
    fn out_of_range_int_is_an_error() {
        assert!(optional_i32(&attrs(), "huge").is_err());
    }

    #[test]
    fn reads_nested_lists() {
        let attrs = attrs();
        let cmd = block(&attrs, "cmd").unwrap();
        assert_eq!(string_list(cmd, "build"), vec!["make", "make test"]);
        assert!(string_list(cmd, "post_build").is_empty());
        assert!(blocks(&attrs, "cmd").is_empty());
    }

    #[test]
    fn insert_opt_skips_none() {
        let mut attrs = HashMap::new();
        insert_opt(&mut attrs, "a", Some("x"));
        insert_opt::<&str>(&mut attrs, "b", None);
        assert_eq!(attrs.len(), 1);
    }
}

use std::str::FromStr;

use crate::core::ParseError;

/// One comma-separated field of a query, kept as raw text until a converter
/// asks for a typed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryElement {
    values: Vec<String>,
}

impl QueryElement {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    pub fn single(value: &str) -> Self {
        Self {
            values: vec![value.to_string()],
        }
    }

    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    pub fn value(&self, index: usize) -> Result<&str, ParseError> {
        self.values
            .get(index)
            .map(String::as_str)
            .ok_or(ParseError::ValueIndex {
                index,
                len: self.values.len(),
            })
    }

    pub fn is_value_empty(&self, index: usize) -> Result<bool, ParseError> {
        Ok(self.value(index)?.is_empty())
    }

    pub fn value_as<T: FromStr>(&self, index: usize) -> Result<T, ParseError> {
        let raw = self.value(index)?;
        raw.parse::<T>().map_err(|_| ParseError::InvalidNumber {
            value: raw.to_string(),
            type_name: std::any::type_name::<T>(),
        })
    }
}

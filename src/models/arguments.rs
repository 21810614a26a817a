//! Positional call arguments.
//!
//! Arguments are carried as `serde_json::Value`s so that every stage can
//! inspect them uniformly: the cache renders them into keys, audit logs
//! them, validation walks them, and fallbacks receive them unchanged.

use crate::error::ArgumentError;
use crate::validation::{FieldRule, Validated};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// One positional argument plus the structural rules declared by its type.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    value: Value,
    rules: Vec<FieldRule>,
}

impl Argument {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            rules: Vec::new(),
        }
    }

    pub fn with_rules(value: Value, rules: Vec<FieldRule>) -> Self {
        Self { value, rules }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    items: Vec<Argument>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            items: values.into_iter().map(Argument::new).collect(),
        }
    }

    /// Append an argument.
    pub fn with<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, ArgumentError> {
        let value = serde_json::to_value(value).map_err(ArgumentError::Encode)?;
        self.items.push(Argument::new(value));
        Ok(self)
    }

    /// Append an argument whose type declares validation rules.
    pub fn with_validated<T: Serialize + Validated>(
        mut self,
        value: &T,
    ) -> Result<Self, ArgumentError> {
        let value = serde_json::to_value(value).map_err(ArgumentError::Encode)?;
        self.items.push(Argument::with_rules(value, T::field_rules()));
        Ok(self)
    }

    pub fn push(&mut self, argument: Argument) {
        self.items.push(argument);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.items.iter()
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.items.get(index).map(Argument::value)
    }

    /// Decode the argument at `index` back into a typed value.
    pub fn decode<T: DeserializeOwned>(&self, index: usize) -> Result<T, ArgumentError> {
        let value = self
            .value(index)
            .ok_or(ArgumentError::Missing { index })?;
        serde_json::from_value(value.clone()).map_err(|source| ArgumentError::Decode { index, source })
    }

    /// Render as a list for audit records, e.g. `[42, "abc", null]`.
    pub fn describe(&self) -> String {
        let rendered: Vec<String> = self.items.iter().map(|a| a.value.to_string()).collect();
        format!("[{}]", rendered.join(", "))
    }
}

impl FromIterator<Value> for Arguments {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from_values(iter)
    }
}

//! Structural argument validation.
//!
//! Argument types declare field rules through [`Validated`]; the rules travel
//! with the encoded argument and are checked against its JSON form before the
//! pipeline does anything else. The first violation wins.

use crate::error::ValidationError;
use crate::models::Arguments;
use serde_json::Value;

/// A single structural constraint on a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Present, not null, and not a blank string.
    Required,
    /// If present, not an empty string, array or object.
    NonEmpty,
    /// If present, string length (in chars) or array length is at least this.
    MinLength(usize),
    /// If present, string length (in chars) or array length is at most this.
    MaxLength(usize),
    /// If present, a number within `[min, max]`.
    Range { min: f64, max: f64 },
}

/// A constraint bound to a dotted field path (`""` targets the argument itself).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub field: String,
    pub constraint: Constraint,
}

impl FieldRule {
    pub fn new(field: impl Into<String>, constraint: Constraint) -> Self {
        Self {
            field: field.into(),
            constraint,
        }
    }

    pub fn required(field: impl Into<String>) -> Self {
        Self::new(field, Constraint::Required)
    }

    pub fn non_empty(field: impl Into<String>) -> Self {
        Self::new(field, Constraint::NonEmpty)
    }

    pub fn min_length(field: impl Into<String>, min: usize) -> Self {
        Self::new(field, Constraint::MinLength(min))
    }

    pub fn max_length(field: impl Into<String>, max: usize) -> Self {
        Self::new(field, Constraint::MaxLength(max))
    }

    pub fn range(field: impl Into<String>, min: f64, max: f64) -> Self {
        Self::new(field, Constraint::Range { min, max })
    }

    /// Check this rule against an argument value.
    pub fn check(&self, argument: &Value) -> Result<(), ValidationError> {
        let target = lookup(argument, &self.field);
        let field = self.display_name();

        match &self.constraint {
            Constraint::Required => match target {
                None | Some(Value::Null) => Err(required(field)),
                Some(Value::String(s)) if s.trim().is_empty() => Err(required(field)),
                _ => Ok(()),
            },
            Constraint::NonEmpty => match target {
                Some(value) if length_of(value) == Some(0) => Err(ValidationError::new(
                    field,
                    format!("The {field} field must not be empty."),
                )),
                _ => Ok(()),
            },
            Constraint::MinLength(min) => match target.and_then(length_of) {
                Some(len) if len < *min => Err(ValidationError::new(
                    field,
                    format!("The {field} field must have a minimum length of {min}."),
                )),
                _ => Ok(()),
            },
            Constraint::MaxLength(max) => match target.and_then(length_of) {
                Some(len) if len > *max => Err(ValidationError::new(
                    field,
                    format!("The {field} field must have a maximum length of {max}."),
                )),
                _ => Ok(()),
            },
            Constraint::Range { min, max } => match target {
                None | Some(Value::Null) => Ok(()),
                Some(Value::Number(n)) => match n.as_f64() {
                    Some(v) if v >= *min && v <= *max => Ok(()),
                    _ => Err(ValidationError::new(
                        field,
                        format!("The {field} field must be between {min} and {max}."),
                    )),
                },
                Some(_) => Err(ValidationError::new(
                    field,
                    format!("The {field} field must be a number."),
                )),
            },
        }
    }

    fn display_name(&self) -> &str {
        if self.field.is_empty() {
            "value"
        } else {
            &self.field
        }
    }
}

/// Types that declare structural rules for their serialized form.
pub trait Validated {
    fn field_rules() -> Vec<FieldRule>;
}

/// Check every non-null argument against its declared rules.
pub fn validate_arguments(arguments: &Arguments) -> Result<(), ValidationError> {
    for argument in arguments.iter().filter(|a| !a.is_null()) {
        for rule in argument.rules() {
            rule.check(argument.value())?;
        }
    }
    Ok(())
}

fn required(field: &str) -> ValidationError {
    ValidationError::new(field, format!("The {field} field is required."))
}

fn lookup<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.')
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => Some(map.len()),
        _ => None,
    }
}

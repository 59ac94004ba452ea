//! Typed request validation.
//!
//! Request payloads deserialize into loose DTOs (every field optional) and are
//! turned into typed commands through [`Validate`]. Handlers only ever pass the
//! validated command on to domain code.

use crate::payroll::calculator::MAX_MONEY;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Field name to list of human readable messages.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Records `message` for `field` when the value is missing.
    pub fn require<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.add(field, format!("The {field} field is required."));
        }
        value
    }

    /// Records `message` for `field` when the string is missing or blank.
    pub fn require_text(&mut self, field: &str, value: Option<String>) -> Option<String> {
        match value.map(|v| v.trim().to_string()) {
            Some(v) if !v.is_empty() => Some(v),
            _ => {
                self.add(field, format!("The {field} field is required."));
                None
            }
        }
    }

    /// Parses a closed-set string value (role, leave type, ...).
    pub fn parse_choice<T: std::str::FromStr>(
        &mut self,
        field: &str,
        value: Option<String>,
        allowed: &[&str],
    ) -> Option<T> {
        let raw = self.require_text(field, value)?;
        match raw.to_lowercase().parse::<T>() {
            Ok(v) => Some(v),
            Err(_) => {
                self.add(
                    field,
                    format!("The selected {field} is invalid. Allowed: {}", allowed.join(", ")),
                );
                None
            }
        }
    }

    /// Money must be positive, in cents and within the column range.
    /// `label` is the human readable field name used in messages.
    pub fn check_money(&mut self, field: &str, label: &str, value: Decimal) -> Option<Decimal> {
        let before = self.0.get(field).map_or(0, Vec::len);
        if value <= Decimal::ZERO {
            self.add(field, format!("The {label} must be greater than 0."));
        } else if value > MAX_MONEY {
            self.add(field, format!("The {label} may not be greater than {MAX_MONEY}."));
        }
        if value.normalize().scale() > 2 {
            self.add(field, format!("The {label} may not have more than 2 decimal places."));
        }
        (self.0.get(field).map_or(0, Vec::len) == before).then_some(value)
    }

    pub fn into_result<T>(self, value: impl FnOnce() -> Option<T>) -> Result<T, FieldErrors> {
        if !self.is_empty() {
            return Err(self);
        }
        match value() {
            Some(v) => Ok(v),
            None => Err(FieldErrors::single("body", "The request is incomplete.")),
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Turns a loosely typed payload into a typed command.
pub trait Validate {
    type Output;

    fn validate(self) -> Result<Self::Output, FieldErrors>;
}

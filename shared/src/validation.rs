//! Validation utilities for the directory service
//!
//! Validators collect every failure instead of stopping at the first one, so a
//! single response can report all invalid fields together.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::types::GeoPoint;

// ============================================================================
// Error Accumulator
// ============================================================================

/// Field name to message mapping of failed checks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[serde(transparent)]
#[error("{} field(s) failed validation", .0.len())]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field` unless one is already present
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    /// Record an error for `field` when `ok` is false
    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) {
        if !ok {
            self.add(field, message);
        }
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    /// `Ok(value)` when nothing failed, otherwise the collected errors
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

// ============================================================================
// Field Validations
// ============================================================================

/// Validate email format: `local@domain.tld`
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err("not a valid email");
    };
    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    let tld_ok = domain
        .rsplit_once('.')
        .map(|(host, tld)| {
            !host.is_empty()
                && host
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
                && tld.len() >= 2
                && tld.chars().all(|c| c.is_ascii_alphabetic())
        })
        .unwrap_or(false);

    if local_ok && tld_ok {
        Ok(())
    } else {
        Err("not a valid email")
    }
}

/// Validate local phone number: 10 digits starting with 09 or 07
pub fn validate_phone_number(phone: &str) -> Result<(), &'static str> {
    let valid = phone.len() == 10
        && (phone.starts_with("09") || phone.starts_with("07"))
        && phone.chars().all(|c| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err("phone number must start with 07 or 09 and must be 10 digits long")
    }
}

/// Validate a `"longitude latitude"` coordinate
pub fn validate_coordinate(coordinate: &str) -> Result<GeoPoint, String> {
    coordinate.parse::<GeoPoint>().map_err(|e| e.to_string())
}

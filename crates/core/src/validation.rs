//! Field rules for product payloads.
//!
//! Request bodies are decoded into a [`ProductCandidate`] that keeps every
//! field as raw JSON, so type mismatches are reported as violations instead of
//! decode failures. `TryFrom` checks a candidate with create rules (both
//! fields required) or update rules (absent fields skipped) and yields the
//! typed inputs the repository accepts. Every violation is collected in one
//! pass.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::product::{CreateProductInput, UpdateProductInput, NAME_MAX_CHARS, PRICE_MIN};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationRule {
    Required,
    Type,
    Empty,
    Min,
    MaxLength,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub rule: ViolationRule,
    pub message: String,
}

impl Violation {
    pub fn required(field: &str) -> Self {
        Self::new(field, ViolationRule::Required, format!("\"{field}\" is required"))
    }

    pub fn type_mismatch(field: &str, expected: &str) -> Self {
        Self::new(field, ViolationRule::Type, format!("\"{field}\" must be {expected}"))
    }

    pub fn empty(field: &str) -> Self {
        Self::new(field, ViolationRule::Empty, format!("\"{field}\" is not allowed to be empty"))
    }

    pub fn min(field: &str, limit: f64) -> Self {
        Self::new(
            field,
            ViolationRule::Min,
            format!("\"{field}\" must be greater than or equal to {limit}"),
        )
    }

    pub fn max_length(field: &str, limit: usize) -> Self {
        Self::new(
            field,
            ViolationRule::MaxLength,
            format!("\"{field}\" length must be less than or equal to {limit} characters long"),
        )
    }

    fn new(field: &str, rule: ViolationRule, message: String) -> Self {
        Self { field: field.to_string(), rule, message }
    }
}

/// Non-empty set of violations, serialized as `{"errors": [...]}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Error, Serialize)]
#[error("payload failed validation with {} violation(s)", .errors.len())]
pub struct ValidationErrors {
    pub errors: Vec<Violation>,
}

impl ValidationErrors {
    pub fn single(violation: Violation) -> Self {
        Self { errors: vec![violation] }
    }

    pub fn has(&self, field: &str, rule: ViolationRule) -> bool {
        self.errors.iter().any(|violation| violation.field == field && violation.rule == rule)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ValidationMode {
    Create,
    Update,
}

/// Raw product payload. Fields other than `name` and `price` are dropped on
/// decode; an explicit JSON `null` counts as present.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ProductCandidate {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub price: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl ProductCandidate {
    /// Decodes a request body. An empty body is an empty object.
    pub fn from_json_slice(body: &[u8]) -> Result<Self, ValidationErrors> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let value = serde_json::from_slice::<Value>(body).map_err(|_| {
            ValidationErrors::single(Violation::type_mismatch("body", "valid JSON"))
        })?;
        if !value.is_object() {
            return Err(ValidationErrors::single(Violation::type_mismatch("body", "an object")));
        }

        serde_json::from_value(value)
            .map_err(|_| ValidationErrors::single(Violation::type_mismatch("body", "an object")))
    }

    fn check(&self, mode: ValidationMode) -> (Option<String>, Option<f64>, Vec<Violation>) {
        let mut errors = Vec::new();
        let name = check_name(self.name.as_ref(), mode, &mut errors);
        let price = check_price(self.price.as_ref(), mode, &mut errors);
        (name, price, errors)
    }
}

fn check_name(
    value: Option<&Value>,
    mode: ValidationMode,
    errors: &mut Vec<Violation>,
) -> Option<String> {
    match value {
        None => {
            if mode == ValidationMode::Create {
                errors.push(Violation::required("name"));
            }
            None
        }
        Some(Value::String(name)) if name.is_empty() => {
            errors.push(Violation::empty("name"));
            None
        }
        Some(Value::String(name)) if name.contains('\0') => {
            errors.push(Violation::type_mismatch("name", "a string without NUL characters"));
            None
        }
        Some(Value::String(name)) if name.chars().count() > NAME_MAX_CHARS => {
            errors.push(Violation::max_length("name", NAME_MAX_CHARS));
            None
        }
        Some(Value::String(name)) => Some(name.clone()),
        Some(_) => {
            errors.push(Violation::type_mismatch("name", "a string"));
            None
        }
    }
}

fn check_price(
    value: Option<&Value>,
    mode: ValidationMode,
    errors: &mut Vec<Violation>,
) -> Option<f64> {
    match value {
        None => {
            if mode == ValidationMode::Create {
                errors.push(Violation::required("price"));
            }
            None
        }
        Some(Value::Number(number)) => match number.as_f64().filter(|price| price.is_finite()) {
            Some(price) if price < PRICE_MIN => {
                errors.push(Violation::min("price", PRICE_MIN));
                None
            }
            Some(price) => Some(price),
            None => {
                errors.push(Violation::type_mismatch("price", "a number"));
                None
            }
        },
        Some(_) => {
            errors.push(Violation::type_mismatch("price", "a number"));
            None
        }
    }
}

impl TryFrom<ProductCandidate> for CreateProductInput {
    type Error = ValidationErrors;

    fn try_from(candidate: ProductCandidate) -> Result<Self, Self::Error> {
        match candidate.check(ValidationMode::Create) {
            (Some(name), Some(price), errors) if errors.is_empty() => Ok(Self { name, price }),
            (_, _, errors) => Err(ValidationErrors { errors }),
        }
    }
}

impl TryFrom<ProductCandidate> for UpdateProductInput {
    type Error = ValidationErrors;

    fn try_from(candidate: ProductCandidate) -> Result<Self, Self::Error> {
        let (name, price, errors) = candidate.check(ValidationMode::Update);
        if errors.is_empty() {
            Ok(Self { name, price })
        } else {
            Err(ValidationErrors { errors })
        }
    }
}

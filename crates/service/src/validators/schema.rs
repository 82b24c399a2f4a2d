use models::{EntityKind, FieldSpec, FieldType, Record};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::{Rejection, ValidationContext, Validator};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@]+@[^@]+\.[^@]+$").expect("email pattern compiles")
});

pub fn is_email_valid(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Field presence and value domains from the entity's schema.
#[derive(Clone, Copy, Debug)]
pub struct SchemaValidator {
    kind: EntityKind,
}

impl SchemaValidator {
    pub fn new(kind: EntityKind) -> Self {
        Self { kind }
    }
}

impl Validator for SchemaValidator {
    fn validate(&self, _ctx: &ValidationContext<'_>, candidate: &Record) -> Result<(), Rejection> {
        for spec in self.kind.fields() {
            match candidate.get(spec.name) {
                None if spec.required => {
                    return Err(Rejection::invalid(format!("missing required field: {}", spec.name)));
                }
                None => {}
                Some(value) => check_field(spec, value)?,
            }
        }
        Ok(())
    }
}

fn check_field(spec: &FieldSpec, value: &Value) -> Result<(), Rejection> {
    let name = spec.name;
    let ok = match spec.ty {
        FieldType::Text => value.as_str().is_some_and(|s| !s.trim().is_empty()),
        FieldType::Email => {
            return match value.as_str() {
                Some(s) if is_email_valid(s) => Ok(()),
                Some(_) => Err(Rejection::invalid(format!("{name} has an invalid email format"))),
                None => Err(Rejection::invalid(format!("{name} must be a string"))),
            };
        }
        FieldType::Count => value.as_u64().is_some(),
        FieldType::Amount => value.as_f64().is_some_and(|n| n.is_finite() && n >= 0.0),
        FieldType::Number => value.as_f64().is_some_and(f64::is_finite),
        FieldType::Rating => value.as_u64().is_some_and(|n| (1..=5).contains(&n)),
        FieldType::TextList => value
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string)),
        FieldType::Flag => value.is_boolean(),
    };
    if ok {
        return Ok(());
    }
    let expected = match spec.ty {
        FieldType::Text => "a non-empty string",
        FieldType::Email => "an email address",
        FieldType::Count => "a non-negative integer",
        FieldType::Amount => "a non-negative number",
        FieldType::Number => "a number",
        FieldType::Rating => "an integer between 1 and 5",
        FieldType::TextList => "a list of strings",
        FieldType::Flag => "a boolean",
    };
    Err(Rejection::invalid(format!("{name} must be {expected}")))
}

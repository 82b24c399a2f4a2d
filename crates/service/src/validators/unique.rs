use models::Record;
use serde_json::Value;

use super::{Rejection, ValidationContext, Validator};

/// Field (or field tuple) whose values may appear on one record only.
/// Comparison is exact, so string matches are case-sensitive.
#[derive(Clone, Debug)]
pub struct Unique {
    fields: Vec<&'static str>,
}

impl Unique {
    pub fn new<I: IntoIterator<Item = &'static str>>(fields: I) -> Self {
        Self { fields: fields.into_iter().collect() }
    }

    fn key<'r>(&self, record: &'r Record) -> Option<Vec<&'r Value>> {
        self.fields.iter().map(|f| record.get(f)).collect()
    }
}

impl Validator for Unique {
    fn validate(&self, ctx: &ValidationContext<'_>, candidate: &Record) -> Result<(), Rejection> {
        // partial keys are left to the schema check
        let Some(key) = self.key(candidate) else {
            return Ok(());
        };
        let taken = ctx.others().any(|other| self.key(other).as_ref() == Some(&key));
        if !taken {
            return Ok(());
        }
        let shown: Vec<String> = key
            .iter()
            .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
            .collect();
        Err(Rejection::conflict(format!(
            "{} '{}' already exists in {}",
            self.fields.join(", "),
            shown.join("', '"),
            ctx.collection
        )))
    }
}

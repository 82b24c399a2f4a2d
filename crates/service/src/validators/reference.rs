use models::{record::ID, Record, Reference};
use serde_json::Value;

use super::{Rejection, ValidationContext, Validator};

/// A field that must name an existing record in another collection.
///
/// The field may hold one key or a list of keys; every key must resolve.
#[derive(Clone, Debug)]
pub struct ForeignKey {
    pub field: &'static str,
    pub target: &'static str,
    pub target_field: &'static str,
}

impl ForeignKey {
    pub fn new(field: &'static str, target: &'static str, target_field: &'static str) -> Self {
        Self { field, target, target_field }
    }

    fn resolves(&self, ctx: &ValidationContext<'_>, key: &str) -> bool {
        let Some(target) = ctx.collection(self.target) else {
            return false;
        };
        if self.target_field == ID {
            return target.contains_key(key);
        }
        target.values().any(|r| r.get_str(self.target_field) == Some(key))
    }

    fn unresolved(&self, key: &str) -> Rejection {
        Rejection::invalid(format!(
            "{} '{key}' does not match any {}.{}",
            self.field, self.target, self.target_field
        ))
    }
}

impl From<Reference> for ForeignKey {
    fn from(r: Reference) -> Self {
        Self::new(r.field, r.target.collection(), r.target_field)
    }
}

impl Validator for ForeignKey {
    fn validate(&self, ctx: &ValidationContext<'_>, candidate: &Record) -> Result<(), Rejection> {
        match candidate.get(self.field) {
            None => Ok(()),
            Some(Value::String(key)) => {
                if self.resolves(ctx, key) { Ok(()) } else { Err(self.unresolved(key)) }
            }
            Some(Value::Array(keys)) => {
                for key in keys {
                    let Some(key) = key.as_str() else {
                        return Err(Rejection::invalid(format!("{} must only hold strings", self.field)));
                    };
                    if !self.resolves(ctx, key) {
                        return Err(self.unresolved(key));
                    }
                }
                Ok(())
            }
            Some(_) => Err(Rejection::invalid(format!("{} must be a string reference", self.field))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::test_util::{collections, record};
    use crate::validators::WriteMode;
    use serde_json::json;

    #[test]
    fn country_code_resolves_by_code() {
        let all = collections(&[("countries", json!({"id": "k1", "name": "Canada", "code": "CA"}))]);
        let ctx = ValidationContext::new(&all, "cities", WriteMode::Create);
        let fk = ForeignKey::new("country_code", "countries", "code");

        assert!(fk.validate(&ctx, &record(json!({"name": "X", "country_code": "CA"}))).is_ok());
        let err = fk.validate(&ctx, &record(json!({"name": "X", "country_code": "ZZ"}))).unwrap_err();
        assert!(matches!(err, Rejection::Invalid(_)));
        assert!(err.reason().contains("ZZ"));
    }

    #[test]
    fn every_listed_amenity_must_exist() {
        let all = collections(&[
            ("amenities", json!({"id": "a1", "name": "Wifi"})),
            ("amenities", json!({"id": "a2", "name": "Pool"})),
        ]);
        let ctx = ValidationContext::new(&all, "places", WriteMode::Create);
        let fk = ForeignKey::new("amenity_ids", "amenities", "id");

        assert!(fk.validate(&ctx, &record(json!({"amenity_ids": ["a1", "a2"]}))).is_ok());
        assert!(fk.validate(&ctx, &record(json!({"amenity_ids": []}))).is_ok());
        assert!(fk.validate(&ctx, &record(json!({"amenity_ids": ["a1", "a9"]}))).is_err());
    }

    #[test]
    fn missing_target_collection_never_resolves() {
        let all = collections(&[]);
        let ctx = ValidationContext::new(&all, "reviews", WriteMode::Create);
        let fk = ForeignKey::new("place_id", "places", "id");
        assert!(fk.validate(&ctx, &record(json!({"place_id": "p1"}))).is_err());
        assert!(fk.validate(&ctx, &record(json!({"place_id": 7}))).is_err());
    }
}

//! Entity kinds and their field schemas.
//!
//! Every collection in the store is tagged with an [`EntityKind`]; the kind
//! carries the explicit field-type map the validators check records against,
//! plus the unique keys and cross-collection references of that kind.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Users,
    Countries,
    Cities,
    Amenities,
    Places,
    Reviews,
}

/// Value domain of a schema field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    /// Non-empty string.
    Text,
    /// Non-empty string in `local@domain.tld` form.
    Email,
    /// Non-negative integer.
    Count,
    /// Non-negative number.
    Amount,
    /// Any number; range checks live in dedicated validators.
    Number,
    /// Integer in 1..=5.
    Rating,
    /// List of strings.
    TextList,
    Flag,
}

#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
}

/// A field holding the key of a record in another collection.
#[derive(Clone, Copy, Debug)]
pub struct Reference {
    pub field: &'static str,
    pub target: EntityKind,
    /// Field matched in the target; `id` unless the target has a natural key.
    pub target_field: &'static str,
}

const fn req(name: &'static str, ty: FieldType) -> FieldSpec {
    FieldSpec { name, ty, required: true }
}

const fn opt(name: &'static str, ty: FieldType) -> FieldSpec {
    FieldSpec { name, ty, required: false }
}

const fn refers(field: &'static str, target: EntityKind, target_field: &'static str) -> Reference {
    Reference { field, target, target_field }
}

use FieldType::*;

const USER_FIELDS: &[FieldSpec] = &[
    req("email", Email),
    req("first_name", Text),
    req("last_name", Text),
    opt("password", Text),
    opt("is_admin", Flag),
];

const COUNTRY_FIELDS: &[FieldSpec] = &[req("name", Text), req("code", Text)];

const CITY_FIELDS: &[FieldSpec] = &[req("name", Text), req("country_code", Text)];

const AMENITY_FIELDS: &[FieldSpec] = &[req("name", Text)];

const PLACE_FIELDS: &[FieldSpec] = &[
    req("name", Text),
    req("host_id", Text),
    req("city_id", Text),
    req("latitude", Number),
    req("longitude", Number),
    req("number_of_rooms", Count),
    req("number_of_bathrooms", Count),
    req("max_guests", Count),
    req("price_per_night", Amount),
    opt("description", Text),
    opt("address", Text),
    opt("amenity_ids", TextList),
];

const REVIEW_FIELDS: &[FieldSpec] = &[
    req("place_id", Text),
    req("user_id", Text),
    req("rating", Rating),
    req("text", Text),
];

const PLACE_REFERENCES: &[Reference] = &[
    refers("host_id", EntityKind::Users, "id"),
    refers("city_id", EntityKind::Cities, "id"),
    refers("amenity_ids", EntityKind::Amenities, "id"),
];

const CITY_REFERENCES: &[Reference] = &[refers("country_code", EntityKind::Countries, "code")];

const REVIEW_REFERENCES: &[Reference] = &[
    refers("place_id", EntityKind::Places, "id"),
    refers("user_id", EntityKind::Users, "id"),
];

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Users,
        EntityKind::Countries,
        EntityKind::Cities,
        EntityKind::Amenities,
        EntityKind::Places,
        EntityKind::Reviews,
    ];

    /// Collection name used in storage and in URL paths.
    pub fn collection(self) -> &'static str {
        match self {
            EntityKind::Users => "users",
            EntityKind::Countries => "countries",
            EntityKind::Cities => "cities",
            EntityKind::Amenities => "amenities",
            EntityKind::Places => "places",
            EntityKind::Reviews => "reviews",
        }
    }

    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            EntityKind::Users => USER_FIELDS,
            EntityKind::Countries => COUNTRY_FIELDS,
            EntityKind::Cities => CITY_FIELDS,
            EntityKind::Amenities => AMENITY_FIELDS,
            EntityKind::Places => PLACE_FIELDS,
            EntityKind::Reviews => REVIEW_FIELDS,
        }
    }

    /// Field groups whose combined values must be unique in the collection.
    pub fn unique_keys(self) -> &'static [&'static [&'static str]] {
        match self {
            EntityKind::Users => &[&["email"]],
            EntityKind::Countries => &[&["code"]],
            EntityKind::Cities => &[&["name", "country_code"]],
            EntityKind::Amenities => &[&["name"]],
            EntityKind::Places | EntityKind::Reviews => &[],
        }
    }

    pub fn references(self) -> &'static [Reference] {
        match self {
            EntityKind::Cities => CITY_REFERENCES,
            EntityKind::Places => PLACE_REFERENCES,
            EntityKind::Reviews => REVIEW_REFERENCES,
            _ => &[],
        }
    }

    /// Field accepted in place of `id` when fetching a single record.
    pub fn natural_key(self) -> Option<&'static str> {
        match self {
            EntityKind::Countries => Some("code"),
            _ => None,
        }
    }

    /// Whether records of this kind carry a latitude/longitude pair.
    pub fn has_coordinates(self) -> bool {
        matches!(self, EntityKind::Places)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

impl FromStr for EntityKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.collection() == s)
            .ok_or_else(|| ModelError::UnknownCollection(s.to_string()))
    }
}

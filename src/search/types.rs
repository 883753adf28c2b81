use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Default number of listings returned per search
pub const DEFAULT_LIMIT: u32 = 12;
/// Upper bound for the `$top` row cap
pub const MAX_LIMIT: u32 = 100;

/// A single untrusted input value: either a plain string or a list (multiselects)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Single(String),
    Many(Vec<String>),
}

impl RawValue {
    /// True when the value carries nothing worth filtering on
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Single(s) => {
                let s = s.trim();
                s.is_empty() || s == "any"
            }
            RawValue::Many(items) => items.iter().all(|s| {
                let s = s.trim();
                s.is_empty() || s == "any"
            }),
        }
    }

    /// First string of the value, if any
    pub fn first(&self) -> Option<&str> {
        match self {
            RawValue::Single(s) => Some(s.as_str()),
            RawValue::Many(items) => items.first().map(String::as_str),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Single(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Single(s)
    }
}

impl From<Vec<String>> for RawValue {
    fn from(items: Vec<String>) -> Self {
        RawValue::Many(items)
    }
}

/// Untrusted key/value map as submitted by a search form or URL.
///
/// Ordered so that two maps holding the same entries serialize identically.
pub type RawParams = BTreeMap<String, RawValue>;

/// Property categories understood by the upstream API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    ForSale,
    ForRent,
    CommercialSale,
    CommercialRent,
    Land,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::ForSale => "for_sale",
            PropertyType::ForRent => "for_rent",
            PropertyType::CommercialSale => "commercial_sale",
            PropertyType::CommercialRent => "commercial_rent",
            PropertyType::Land => "land",
        }
    }
}

impl FromStr for PropertyType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "for_sale" => Ok(PropertyType::ForSale),
            "for_rent" => Ok(PropertyType::ForRent),
            "commercial_sale" => Ok(PropertyType::CommercialSale),
            "commercial_rent" => Ok(PropertyType::CommercialRent),
            "land" => Ok(PropertyType::Land),
            _ => Err(()),
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sanitized search parameters.
///
/// Only [`crate::search::sanitize`] builds these; every optional field is
/// `None` when the caller left it empty, sent `"any"`, or sent garbage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Cities to match (any of)
    pub city: Vec<String>,
    /// Minimum list price
    pub min_price: Option<i64>,
    /// Maximum list price
    pub max_price: Option<i64>,
    /// Minimum number of bedrooms
    pub bedrooms: Option<i64>,
    /// Minimum number of bathrooms
    pub bathrooms: Option<i64>,
    /// Listing category
    pub property_type: Option<PropertyType>,
    /// Free text matched against the listing remarks
    pub keywords: Option<String>,
    /// Row cap, 1..=100
    pub limit: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            city: Vec::new(),
            min_price: None,
            max_price: None,
            bedrooms: None,
            bathrooms: None,
            property_type: None,
            keywords: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

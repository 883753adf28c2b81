use crate::search::types::{PropertyType, SearchParams};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Upstream resource that holds listings
pub const PROPERTY_ENDPOINT: &str = "Property";

/// Fields requested for search result cards
pub const SEARCH_SELECT: &str = "ListingKey,ListingId,ListPrice,BedroomsTotal,BathroomsTotalInteger,LivingArea,City,StateOrProvince,UnparsedAddress,PublicRemarks,PropertyType,Media,PhotosCount,StandardStatus";

/// Fields requested for a single listing
pub const DETAIL_SELECT: &str = "ListingKey,ListingId,ListPrice,BedroomsTotal,BathroomsTotalInteger,LivingArea,LotSizeArea,YearBuilt,City,StateOrProvince,PostalCode,UnparsedAddress,PublicRemarks,PropertyType,PropertySubType,Media,PhotosCount,StandardStatus,ListingContractDate,ModificationTimestamp";

const ORDER_BY: &str = "ModificationTimestamp desc";

const BASE_CLAUSES: [&str; 2] = ["StandardStatus eq 'Active'", "PhotosCount gt 0"];

/// Ordered list of clauses ANDed together into an OData `$filter`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterExpression {
    clauses: Vec<String>,
}

impl FilterExpression {
    pub fn clauses(&self) -> &[String] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    fn push(&mut self, clause: impl Into<String>) {
        self.clauses.push(clause.into());
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.clauses.join(" and "))
    }
}

/// Full parameter set for one upstream request, minus the credential.
///
/// Keys are kept sorted so the serialized form is canonical and can be
/// fingerprinted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct CompiledQuery {
    params: BTreeMap<String, String>,
}

impl CompiledQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Stable JSON rendering used for fingerprinting
    pub fn canonical(&self) -> String {
        serde_json::to_string(&self.params).unwrap_or_default()
    }
}

/// Escape a value for use inside a single-quoted OData literal
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

fn property_type_clause(kind: PropertyType) -> &'static str {
    match kind {
        PropertyType::ForSale => "PropertyType eq 'Residential'",
        PropertyType::ForRent => "(PropertyType eq 'Residential Lease' or PropertyType eq 'Rental')",
        PropertyType::CommercialSale => "PropertyType eq 'Commercial Sale'",
        PropertyType::CommercialRent => "PropertyType eq 'Commercial Lease'",
        PropertyType::Land => "PropertyType eq 'Land'",
    }
}

/// Translate sanitized parameters into a filter expression.
///
/// Invalid values are left out rather than rejected so a partially garbled
/// form still produces a usable search.
pub fn compile(params: &SearchParams) -> FilterExpression {
    let mut filter = FilterExpression::default();
    for clause in BASE_CLAUSES {
        filter.push(clause);
    }

    // Sorted and de-duplicated so equivalent selections compile identically
    let cities: BTreeSet<&str> = params
        .city
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    if !cities.is_empty() {
        let tests: Vec<String> = cities
            .iter()
            .map(|c| format!("City eq '{}'", escape_literal(c)))
            .collect();
        filter.push(format!("({})", tests.join(" or ")));
    }

    if let Some(min) = params.min_price.filter(|n| *n >= 0) {
        filter.push(format!("ListPrice ge {}", min));
    }
    if let Some(max) = params.max_price.filter(|n| *n >= 0) {
        filter.push(format!("ListPrice le {}", max));
    }

    if let Some(beds) = params.bedrooms.filter(|n| *n >= 0) {
        filter.push(format!("BedroomsTotal ge {}", beds));
    }
    if let Some(baths) = params.bathrooms.filter(|n| *n >= 0) {
        filter.push(format!("BathroomsTotalInteger ge {}", baths));
    }

    if let Some(kind) = params.property_type {
        filter.push(property_type_clause(kind));
    }

    if let Some(keywords) = params.keywords.as_deref().filter(|k| !k.is_empty()) {
        filter.push(format!(
            "contains(PublicRemarks, '{}')",
            escape_literal(keywords)
        ));
    }

    filter
}

/// Build the complete upstream query for a listing search
pub fn compile_query(params: &SearchParams) -> CompiledQuery {
    let filter = compile(params);
    CompiledQuery::new()
        .with("$select", SEARCH_SELECT)
        .with("$top", params.limit.to_string())
        .with("$orderby", ORDER_BY)
        .with("$filter", filter.to_string())
}

/// Query matching exactly one listing by a key field
pub fn single_key_query(field: &str, value: &str) -> CompiledQuery {
    CompiledQuery::new()
        .with("$filter", format!("{} eq '{}'", field, escape_literal(value)))
        .with("$select", DETAIL_SELECT)
}

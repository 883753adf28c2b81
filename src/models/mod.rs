use crate::search::photos::extract_photos;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Upstream listing record with its derived photo list.
///
/// Every upstream field is kept as-is; `Photos` is recomputed from `Media`
/// whenever a listing is built, never cached on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(rename = "Photos", default)]
    pub photos: Vec<String>,
}

impl Listing {
    /// Build from a raw upstream record; non-object records yield `None`
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let mut fields = raw.as_object()?.clone();
        fields.remove("Photos");
        Some(Self {
            photos: extract_photos(raw),
            fields,
        })
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn listing_key(&self) -> Option<&str> {
        self.text("ListingKey")
    }

    pub fn listing_id(&self) -> Option<&str> {
        self.text("ListingId")
    }

    pub fn address(&self) -> Option<&str> {
        self.text("UnparsedAddress")
    }

    pub fn city(&self) -> Option<&str> {
        self.text("City")
    }

    pub fn price(&self) -> Option<f64> {
        self.fields.get("ListPrice").and_then(Value::as_f64)
    }

    pub fn bedrooms(&self) -> Option<i64> {
        self.fields.get("BedroomsTotal").and_then(Value::as_i64)
    }

    pub fn bathrooms(&self) -> Option<i64> {
        self.fields.get("BathroomsTotalInteger").and_then(Value::as_i64)
    }

    pub fn living_area(&self) -> Option<f64> {
        self.fields.get("LivingArea").and_then(Value::as_f64)
    }
}

/// Listings returned by one search
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchResults {
    pub listings: Vec<Listing>,
    pub count: usize,
}

impl SearchResults {
    /// Decorate every record of an upstream payload's `value` array;
    /// `None` when the payload has no such array
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let listings: Vec<Listing> = payload
            .get("value")?
            .as_array()?
            .iter()
            .filter_map(Listing::from_raw)
            .collect();

        Some(Self {
            count: listings.len(),
            listings,
        })
    }
}

/// What the rendering side receives: results or a displayable message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchReply {
    Results(SearchResults),
    Error { error: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_records_gain_photos() {
        let payload = json!({
            "value": [
                {
                    "ListingKey": "k1",
                    "ListPrice": 450000,
                    "City": "Boston",
                    "Media": [
                        { "MediaCategory": "Photo", "MediaURL": "https://img.test/2.jpg", "Order": 2 },
                        { "MediaCategory": "Photo", "MediaURL": "https://img.test/1.jpg", "Order": 1 }
                    ]
                },
                "not a record"
            ]
        });

        let results = SearchResults::from_payload(&payload).unwrap();
        assert_eq!(results.count, 1);
        let listing = &results.listings[0];
        assert_eq!(listing.listing_key(), Some("k1"));
        assert_eq!(listing.price(), Some(450000.0));
        assert_eq!(listing.photos, vec!["https://img.test/1.jpg", "https://img.test/2.jpg"]);

        let flat = serde_json::to_value(listing).unwrap();
        assert_eq!(flat["City"], "Boston");
        assert_eq!(flat["Photos"][0], "https://img.test/1.jpg");
    }

    #[test]
    fn value_array_is_required() {
        assert_eq!(SearchResults::from_payload(&json!({ "@odata.count": 0 })), None);
        assert_eq!(SearchResults::from_payload(&json!([])), None);
        assert_eq!(
            SearchResults::from_payload(&json!({ "error": { "message": "nope" } })),
            None
        );
        assert_eq!(
            SearchResults::from_payload(&json!({ "value": [] })),
            Some(SearchResults::default())
        );
    }

    #[test]
    fn reply_serializes_both_shapes() {
        let error = SearchReply::Error {
            error: "Server error occurred. Please try again later.".into(),
        };
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({ "error": "Server error occurred. Please try again later." })
        );

        let ok = SearchReply::Results(SearchResults::default());
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({ "listings": [], "count": 0 })
        );
    }
}

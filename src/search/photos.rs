use reqwest::Url;
use serde_json::Value;

/// Derive the ordered photo URLs of a raw upstream listing.
///
/// Only `Photo` media with a valid http(s) URL are kept. Entries are sorted by
/// their `Order`; entries without one go last in their original order.
pub fn extract_photos(listing: &Value) -> Vec<String> {
    let Some(media) = listing.get("Media").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut photos: Vec<(Option<i64>, &str)> = media
        .iter()
        .filter(|item| item.get("MediaCategory").and_then(Value::as_str) == Some("Photo"))
        .filter_map(|item| {
            let url = item.get("MediaURL").and_then(Value::as_str)?.trim();
            is_valid_url(url).then(|| (order_of(item), url))
        })
        .collect();

    // sort_by_key is stable, which keeps unordered entries in input order
    photos.sort_by_key(|(order, _)| match order {
        Some(n) => (false, *n),
        None => (true, 0),
    });

    photos.into_iter().map(|(_, url)| url.to_string()).collect()
}

fn order_of(item: &Value) -> Option<i64> {
    match item.get("Order")? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn is_valid_url(candidate: &str) -> bool {
    if candidate.is_empty() {
        return false;
    }
    match Url::parse(candidate) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn photo(url: &str, order: Option<i64>) -> Value {
        match order {
            Some(n) => json!({ "MediaCategory": "Photo", "MediaURL": url, "Order": n }),
            None => json!({ "MediaCategory": "Photo", "MediaURL": url }),
        }
    }

    #[test]
    fn explicit_orders_first_then_input_order() {
        let listing = json!({
            "Media": [
                photo("https://img.test/a.jpg", Some(2)),
                photo("https://img.test/b.jpg", None),
                photo("https://img.test/c.jpg", Some(1)),
            ]
        });
        let photos = extract_photos(&listing);
        assert_eq!(
            photos,
            vec![
                "https://img.test/c.jpg",
                "https://img.test/a.jpg",
                "https://img.test/b.jpg",
            ]
        );
        // extracting from the same record again yields the same list
        assert_eq!(extract_photos(&listing), photos);
    }

    #[test]
    fn unordered_entries_keep_relative_order() {
        let listing = json!({
            "Media": [
                photo("https://img.test/1.jpg", None),
                photo("https://img.test/2.jpg", Some(5000)),
                photo("https://img.test/3.jpg", None),
                photo("https://img.test/4.jpg", Some(0)),
            ]
        });
        assert_eq!(
            extract_photos(&listing),
            vec![
                "https://img.test/4.jpg",
                "https://img.test/2.jpg",
                "https://img.test/1.jpg",
                "https://img.test/3.jpg",
            ]
        );
    }

    #[test]
    fn filters_category_and_bad_urls() {
        let listing = json!({
            "Media": [
                { "MediaCategory": "Video", "MediaURL": "https://img.test/v.mp4", "Order": 1 },
                { "MediaCategory": "Photo", "MediaURL": "", "Order": 2 },
                { "MediaCategory": "Photo", "MediaURL": "not a url", "Order": 3 },
                { "MediaCategory": "Photo", "Order": 4 },
                { "MediaCategory": "Photo", "MediaURL": "https://img.test/ok.jpg", "Order": "7" },
            ]
        });
        assert_eq!(extract_photos(&listing), vec!["https://img.test/ok.jpg"]);
    }

    #[test]
    fn missing_media_is_empty() {
        assert!(extract_photos(&json!({ "ListingKey": "1" })).is_empty());
        assert!(extract_photos(&json!({ "Media": null })).is_empty());
    }
}

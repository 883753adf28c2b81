//! Mapping between search parameters and the page URL's query string.

use crate::search::types::{RawParams, RawValue};
use reqwest::Url;
use std::fmt;

/// Query parameters the search owns in the page URL
pub const URL_PARAMS: [&str; 7] = [
    "city",
    "min_price",
    "max_price",
    "bedrooms",
    "bathrooms",
    "property_type",
    "keywords",
];

/// Drop empty, `"any"` and empty-list values the way the search form does
pub fn clean(params: &RawParams) -> RawParams {
    params
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                RawValue::Single(s) => RawValue::Single(s.trim().to_string()),
                RawValue::Many(items) => RawValue::Many(
                    items
                        .iter()
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty() && s != "any")
                        .collect(),
                ),
            };
            (!value.is_blank()).then(|| (key.clone(), value))
        })
        .collect()
}

/// Content identity of a client search, used for duplicate suppression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchKey(String);

impl SearchKey {
    /// Keys are sorted by the map; list values are sorted here so selection
    /// order does not matter
    pub fn of(params: &RawParams) -> Self {
        let canonical: RawParams = params
            .iter()
            .map(|(k, v)| {
                let v = match v {
                    RawValue::Many(items) => {
                        let mut items = items.clone();
                        items.sort();
                        items.dedup();
                        RawValue::Many(items)
                    }
                    single => single.clone(),
                };
                (k.clone(), v)
            })
            .collect();
        Self(serde_json::to_string(&canonical).unwrap_or_default())
    }
}

impl fmt::Display for SearchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rewrite the search-owned query parameters of `url`, keeping any others
pub fn write_to_url(url: &Url, params: &RawParams) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !URL_PARAMS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut next = url.clone();
    next.set_query(None);

    let searched: Vec<(&str, String)> = URL_PARAMS
        .iter()
        .filter_map(|key| {
            let value = match params.get(*key)? {
                RawValue::Single(s) => s.clone(),
                RawValue::Many(items) => items.join(","),
            };
            Some((*key, value))
        })
        .collect();

    if !kept.is_empty() || !searched.is_empty() {
        let mut pairs = next.query_pairs_mut();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        for (k, v) in &searched {
            pairs.append_pair(k, v);
        }
    }
    next
}

/// Read search parameters back out of a URL; `city` is split on commas
pub fn read_from_url(url: &Url) -> RawParams {
    let mut params = RawParams::new();
    for (key, value) in url.query_pairs() {
        if !URL_PARAMS.contains(&key.as_ref()) {
            continue;
        }
        let value = if key == "city" {
            RawValue::Many(
                value
                    .split(',')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect(),
            )
        } else {
            RawValue::Single(value.trim().to_string())
        };
        params.insert(key.into_owned(), value);
    }
    clean(&params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boston_salem() -> RawParams {
        let mut params = RawParams::new();
        params.insert(
            "city".into(),
            RawValue::Many(vec!["Boston".into(), "Salem".into()]),
        );
        params.insert("min_price".into(), "300000".into());
        params
    }

    #[test]
    fn clean_drops_blank_values() {
        let mut params = boston_salem();
        params.insert("bedrooms".into(), "any".into());
        params.insert("keywords".into(), "  ".into());
        params.insert("bathrooms".into(), RawValue::Many(vec![]));
        assert_eq!(clean(&params), boston_salem());
    }

    #[test]
    fn key_ignores_list_order() {
        let mut reversed = boston_salem();
        reversed.insert(
            "city".into(),
            RawValue::Many(vec!["Salem".into(), "Boston".into()]),
        );
        assert_eq!(SearchKey::of(&boston_salem()), SearchKey::of(&reversed));

        let mut other = boston_salem();
        other.insert("min_price".into(), "1".into());
        assert_ne!(SearchKey::of(&boston_salem()), SearchKey::of(&other));
    }

    #[test]
    fn url_round_trip_keeps_foreign_params() {
        let page = Url::parse("https://homes.test/search?page_id=7&city=Old&keywords=x").unwrap();
        let next = write_to_url(&page, &boston_salem());
        assert_eq!(
            next.as_str(),
            "https://homes.test/search?page_id=7&city=Boston%2CSalem&min_price=300000"
        );
        assert_eq!(read_from_url(&next), boston_salem());
    }

    #[test]
    fn empty_search_clears_query() {
        let page = Url::parse("https://homes.test/search?city=Boston").unwrap();
        assert_eq!(
            write_to_url(&page, &RawParams::new()).as_str(),
            "https://homes.test/search"
        );
    }

    #[test]
    fn city_is_trimmed_on_read() {
        let url = Url::parse("https://homes.test/?city=%20Boston%20,%20Salem,&bedrooms=any").unwrap();
        let params = read_from_url(&url);
        assert_eq!(
            params.get("city"),
            Some(&RawValue::Many(vec!["Boston".into(), "Salem".into()]))
        );
        assert!(params.get("bedrooms").is_none());
    }
}

use crate::search::types::{PropertyType, RawParams, RawValue, SearchParams, MAX_LIMIT};
use tracing::debug;

/// Normalize untrusted input into [`SearchParams`].
///
/// Unrecognized keys are ignored, unparsable numbers are dropped (never
/// zeroed) and `"any"`/empty values are removed. This never fails: the worst
/// case is an empty parameter set with the default limit.
pub fn sanitize(raw: &RawParams, default_limit: u32) -> SearchParams {
    let mut params = SearchParams {
        limit: default_limit.clamp(1, MAX_LIMIT),
        ..SearchParams::default()
    };

    for (key, value) in raw {
        match key.as_str() {
            "city" => params.city = cities(value),
            "min_price" => params.min_price = integer(key, value),
            "max_price" => params.max_price = integer(key, value),
            "bedrooms" => params.bedrooms = integer(key, value),
            "bathrooms" => params.bathrooms = integer(key, value),
            "limit" => {
                if let Some(limit) = integer(key, value) {
                    params.limit = limit.clamp(1, MAX_LIMIT as i64) as u32;
                }
            }
            "property_type" => {
                params.property_type = value
                    .first()
                    .map(str::trim)
                    .filter(|s| !s.is_empty() && *s != "any")
                    .and_then(|s| match s.parse::<PropertyType>() {
                        Ok(kind) => Some(kind),
                        Err(()) => {
                            debug!("Ignoring unknown property type {:?}", s);
                            None
                        }
                    });
            }
            "keywords" => {
                params.keywords = value
                    .first()
                    .map(clean_text)
                    .filter(|s| !s.is_empty() && s != "any");
            }
            other => debug!("Ignoring unrecognized search field {:?}", other),
        }
    }

    params
}

/// City input arrives as a list (multiselect) or as one comma-joined string (URL)
fn cities(value: &RawValue) -> Vec<String> {
    let pieces: Vec<&str> = match value {
        RawValue::Single(s) => s.split(',').collect(),
        RawValue::Many(items) => items.iter().map(String::as_str).collect(),
    };

    pieces
        .into_iter()
        .map(clean_text)
        .filter(|c| !c.is_empty() && c != "any")
        .collect()
}

fn integer(key: &str, value: &RawValue) -> Option<i64> {
    let text = value.first()?.trim();
    if text.is_empty() || text == "any" {
        return None;
    }
    match text.parse::<i64>() {
        Ok(n) => Some(n),
        Err(_) => {
            debug!("Dropping non-integer value {:?} for {}", text, key);
            None
        }
    }
}

/// Strip markup tags and control characters, collapse whitespace
pub(crate) fn clean_text(input: &str) -> String {
    let mut stripped = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            c if c.is_control() => stripped.push(' '),
            c => stripped.push(c),
        }
    }

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::types::DEFAULT_LIMIT;

    fn raw(pairs: &[(&str, &str)]) -> RawParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), RawValue::from(*v)))
            .collect()
    }

    #[test]
    fn drops_non_numeric_and_any() {
        let params = sanitize(
            &raw(&[("min_price", "abc"), ("bedrooms", "any"), ("bathrooms", "2")]),
            DEFAULT_LIMIT,
        );
        assert_eq!(params.min_price, None);
        assert_eq!(params.bedrooms, None);
        assert_eq!(params.bathrooms, Some(2));
    }

    #[test]
    fn fractional_numbers_are_not_integers() {
        let params = sanitize(&raw(&[("max_price", "3.5")]), DEFAULT_LIMIT);
        assert_eq!(params.max_price, None);
    }

    #[test]
    fn city_accepts_string_or_list() {
        let params = sanitize(&raw(&[("city", " Boston , Salem,,any")]), DEFAULT_LIMIT);
        assert_eq!(params.city, vec!["Boston", "Salem"]);

        let mut list = RawParams::new();
        list.insert(
            "city".into(),
            RawValue::Many(vec!["  Quincy ".into(), "".into(), "Lynn".into()]),
        );
        assert_eq!(sanitize(&list, DEFAULT_LIMIT).city, vec!["Quincy", "Lynn"]);
    }

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(sanitize(&RawParams::new(), DEFAULT_LIMIT).limit, 12);
        assert_eq!(sanitize(&raw(&[("limit", "500")]), DEFAULT_LIMIT).limit, 100);
        assert_eq!(sanitize(&raw(&[("limit", "0")]), DEFAULT_LIMIT).limit, 1);
        assert_eq!(sanitize(&raw(&[("limit", "x")]), 24).limit, 24);
    }

    #[test]
    fn unknown_keys_and_types_are_ignored() {
        let params = sanitize(
            &raw(&[("property_type", "castle"), ("sort", "price"), ("foo", "bar")]),
            DEFAULT_LIMIT,
        );
        assert_eq!(params, SearchParams::default());
    }

    #[test]
    fn keywords_are_cleaned() {
        let params = sanitize(
            &raw(&[("keywords", "  <b>ocean</b>\tview\n ")]),
            DEFAULT_LIMIT,
        );
        assert_eq!(params.keywords.as_deref(), Some("ocean view"));

        let blank = sanitize(&raw(&[("keywords", "<br>")]), DEFAULT_LIMIT);
        assert_eq!(blank.keywords, None);
    }

    #[test]
    fn any_keywords_mean_no_keywords() {
        let params = sanitize(&raw(&[("keywords", " any ")]), DEFAULT_LIMIT);
        assert_eq!(params.keywords, None);
        assert_eq!(params, SearchParams::default());
    }
}

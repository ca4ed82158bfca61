//! Field deserializers that accept either a native value or its string form.
//!
//! Form bodies and query strings carry every value as text, while JSON bodies
//! may send `"3"` or `3`, `"true"` or `true`. Use with
//! `#[serde(default, deserialize_with = "lenient::option")]`.

use std::fmt::Display;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOr<T> {
    Text(String),
    Native(T),
}

impl<T> TextOr<T>
where
    T: FromStr,
    T::Err: Display,
{
    fn resolve<E: de::Error>(self) -> Result<T, E> {
        match self {
            TextOr::Native(value) => Ok(value),
            TextOr::Text(raw) => raw
                .trim()
                .parse()
                .map_err(|e| E::custom(format!("invalid value {raw:?}: {e}"))),
        }
    }
}

/// Required field: native value or a string parsed with `FromStr`.
pub fn required<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: Display,
{
    TextOr::<T>::deserialize(deserializer)?.resolve()
}

/// Optional field: absent or `null` becomes `None`.
pub fn option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: Display,
{
    match Option::<TextOr<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(value) => value.resolve().map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "required")]
        count: u32,
        #[serde(default, deserialize_with = "option")]
        flag: Option<bool>,
    }

    #[test]
    fn test_json_native_values() {
        let p: Sample = serde_json::from_str(r#"{"count": 3, "flag": true}"#).unwrap();
        assert_eq!(p.count, 3);
        assert_eq!(p.flag, Some(true));
    }

    #[test]
    fn test_json_string_values() {
        let p: Sample = serde_json::from_str(r#"{"count": "7", "flag": "false"}"#).unwrap();
        assert_eq!(p.count, 7);
        assert_eq!(p.flag, Some(false));
    }

    #[test]
    fn test_json_missing_and_null_optional() {
        let p: Sample = serde_json::from_str(r#"{"count": 1}"#).unwrap();
        assert_eq!(p.flag, None);
        let p: Sample = serde_json::from_str(r#"{"count": 1, "flag": null}"#).unwrap();
        assert_eq!(p.flag, None);
    }

    #[test]
    fn test_form_values() {
        let p: Sample = serde_urlencoded::from_str("count=12&flag=true").unwrap();
        assert_eq!(p.count, 12);
        assert_eq!(p.flag, Some(true));
    }

    #[test]
    fn test_uncoercible_values_fail() {
        assert!(serde_urlencoded::from_str::<Sample>("count=twelve").is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"count": 1, "flag": "maybe"}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"count": -1}"#).is_err());
    }
}

//! Helpers for partial updates.

use serde::{Deserialize, Deserializer};

/// Deserialize a present field (including `null`) as `Some(..)`.
///
/// Combined with `#[serde(default)]` on an `Option<Option<T>>` field this
/// separates "absent" (`None`) from "set to null" (`Some(None)`).
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        note: Option<Option<String>>,
    }

    #[test]
    fn absent_null_and_value_are_distinct() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"note": null}"#).unwrap();
        let value: Patch = serde_json::from_str(r#"{"note": "hi"}"#).unwrap();
        assert_eq!(absent.note, None);
        assert_eq!(null.note, Some(None));
        assert_eq!(value.note, Some(Some("hi".to_string())));
    }
}

//! Form-friendly serde helpers.
//!
//! The browser forms post every field as a string, including blanks for
//! fields the user skipped. These helpers let request types accept both
//! `5` and `"5"`, and treat `""` as absent.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Deserializes an optional value, mapping `null` and blank strings to `None`.
///
/// ```rust
/// use hisaab_core::money::Money;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Form {
///     #[serde(default, deserialize_with = "hisaab_core::lenient::blank_as_none")]
///     total: Option<Money>,
/// }
///
/// let form: Form = serde_json::from_str(r#"{"total": ""}"#).unwrap();
/// assert!(form.total.is_none());
/// ```
pub fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => serde_json::from_value(value).map(Some).map_err(de::Error::custom),
    }
}

/// Deserializes an optional integer given as a number or numeric string.
///
/// Fractional values such as `"2.5"` are rejected rather than truncated.
pub fn optional_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(v) => Ok(Some(v)),
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Some(f as i64)),
                _ => Err(de::Error::custom(format!("expected a whole number, got {}", n))),
            },
        },
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<i64>()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("expected a whole number, got '{}'", s)))
        }
        Some(other) => Err(de::Error::custom(format!(
            "expected a whole number, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "optional_integer")]
        quantity: Option<i64>,
        #[serde(default, deserialize_with = "blank_as_none")]
        note: Option<String>,
    }

    #[test]
    fn test_integer_from_number_or_string() {
        let f: Form = serde_json::from_str(r#"{"quantity": 5}"#).unwrap();
        assert_eq!(f.quantity, Some(5));

        let f: Form = serde_json::from_str(r#"{"quantity": "12"}"#).unwrap();
        assert_eq!(f.quantity, Some(12));

        let f: Form = serde_json::from_str(r#"{"quantity": 3.0}"#).unwrap();
        assert_eq!(f.quantity, Some(3));
    }

    #[test]
    fn test_blank_and_missing_are_none() {
        let f: Form = serde_json::from_str(r#"{"quantity": "", "note": "  "}"#).unwrap();
        assert_eq!(f.quantity, None);
        assert_eq!(f.note, None);

        let f: Form = serde_json::from_str("{}").unwrap();
        assert_eq!(f.quantity, None);
    }

    #[test]
    fn test_fractional_quantity_rejected() {
        assert!(serde_json::from_str::<Form>(r#"{"quantity": "2.5"}"#).is_err());
        assert!(serde_json::from_str::<Form>(r#"{"quantity": 2.5}"#).is_err());
    }
}

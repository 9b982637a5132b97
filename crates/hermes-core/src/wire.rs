//! Wire encoding shared by server and client.
//!
//! Path, query and header values travel as text. Scalars use their plain
//! text form; [`TypeDesc::Json`] values travel as compact JSON text. Body
//! fields travel as JSON values and are only type-checked.
//!
//! Both sides call the same functions here, so a value the client encodes
//! is always one the server decodes back to the same JSON value.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};
use thiserror::Error;

use crate::contract::TypeDesc;

/// A value that does not fit its declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// The JSON value has the wrong shape.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// Declared type.
        expected: TypeDesc,
        /// JSON kind actually found.
        found: &'static str,
    },

    /// The text form could not be parsed.
    #[error("cannot parse `{text}` as {expected}: {reason}")]
    Parse {
        /// Declared type.
        expected: TypeDesc,
        /// The offending text.
        text: String,
        /// Parser message.
        reason: String,
    },
}

/// Returns the JSON kind name of `value`.
#[must_use]
pub const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The JSON media type.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// True when `content_type` names JSON: `application/json` or any `+json`
/// suffix, parameters ignored.
#[must_use]
pub fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == JSON_MEDIA_TYPE || essence.ends_with("+json")
}

/// Checks that `value` has the shape of `ty`.
///
/// # Errors
///
/// Returns [`WireError::TypeMismatch`] when it does not. `null` never
/// matches; callers deal with absent values before checking.
pub fn check_value(ty: TypeDesc, value: &Value) -> Result<(), WireError> {
    let ok = match (ty, value) {
        (_, Value::Null) => false,
        (TypeDesc::Json, _)
        | (TypeDesc::String, Value::String(_))
        | (TypeDesc::Boolean, Value::Bool(_))
        | (TypeDesc::Float, Value::Number(_)) => true,
        (TypeDesc::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(WireError::TypeMismatch {
            expected: ty,
            found: kind_of(value),
        })
    }
}

/// Renders `value` as the text sent in a path, query or header slot.
///
/// # Errors
///
/// Returns [`WireError::TypeMismatch`] if `value` does not fit `ty`.
///
/// ```rust
/// use hermes_core::contract::TypeDesc;
/// use hermes_core::wire::to_wire_string;
/// use serde_json::json;
///
/// assert_eq!(to_wire_string(TypeDesc::Integer, &json!(7)).unwrap(), "7");
/// assert_eq!(to_wire_string(TypeDesc::String, &json!("a b")).unwrap(), "a b");
/// assert_eq!(to_wire_string(TypeDesc::Json, &json!([1, 2])).unwrap(), "[1,2]");
/// ```
pub fn to_wire_string(ty: TypeDesc, value: &Value) -> Result<String, WireError> {
    check_value(ty, value)?;
    Ok(match (ty, value) {
        (TypeDesc::String, Value::String(s)) => s.clone(),
        (TypeDesc::Integer | TypeDesc::Float, Value::Number(n)) => n.to_string(),
        (TypeDesc::Boolean, Value::Bool(b)) => b.to_string(),
        _ => value.to_string(),
    })
}

/// Parses text received in a path, query or header slot.
///
/// # Errors
///
/// Returns [`WireError::Parse`] if `text` is not a valid `ty`.
pub fn from_wire_string(ty: TypeDesc, text: &str) -> Result<Value, WireError> {
    let parse_error = |reason: String| WireError::Parse {
        expected: ty,
        text: text.to_string(),
        reason,
    };

    match ty {
        TypeDesc::String => Ok(Value::String(text.to_string())),
        TypeDesc::Integer => {
            let trimmed = text.trim();
            if let Ok(n) = trimmed.parse::<i64>() {
                Ok(Value::from(n))
            } else {
                trimmed
                    .parse::<u64>()
                    .map(Value::from)
                    .map_err(|e| parse_error(e.to_string()))
            }
        }
        TypeDesc::Float => {
            // Integral text stays integral so `3` comes back as `3`, not `3.0`.
            let trimmed = text.trim();
            if let Ok(n) = trimmed.parse::<i64>() {
                return Ok(Value::from(n));
            }
            if let Ok(n) = trimmed.parse::<u64>() {
                return Ok(Value::from(n));
            }
            let n = trimmed
                .parse::<f64>()
                .map_err(|e| parse_error(e.to_string()))?;
            Number::from_f64(n)
                .map(Value::Number)
                .ok_or_else(|| parse_error("not a finite number".to_string()))
        }
        TypeDesc::Boolean => match text.trim() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(parse_error("expected `true` or `false`".to_string())),
        },
        TypeDesc::Json => serde_json::from_str(text).map_err(|e| parse_error(e.to_string())),
    }
}

/// A type with its own text form.
///
/// Wrap a value in [`AsString`] to send it through its text form instead of
/// its structural JSON form, typically for path, query and header slots
/// declared as [`TypeDesc::String`].
pub trait StringCodec: Sized {
    /// Error produced when decoding fails.
    type Err: std::fmt::Display;

    /// Renders the value as text.
    fn encode(&self) -> String;

    /// Parses the value from text.
    fn decode(text: &str) -> Result<Self, Self::Err>;
}

/// Serializes `T` as a JSON string through [`StringCodec`].
///
/// ```rust
/// use hermes_core::wire::{AsString, StringCodec};
///
/// #[derive(Debug, PartialEq)]
/// struct Version(u32, u32);
///
/// impl StringCodec for Version {
///     type Err = String;
///     fn encode(&self) -> String {
///         format!("{}.{}", self.0, self.1)
///     }
///     fn decode(text: &str) -> Result<Self, String> {
///         let (a, b) = text.split_once('.').ok_or("missing `.`")?;
///         Ok(Version(
///             a.parse().map_err(|_| "bad major")?,
///             b.parse().map_err(|_| "bad minor")?,
///         ))
///     }
/// }
///
/// let json = serde_json::to_value(AsString(Version(1, 2))).unwrap();
/// assert_eq!(json, "1.2");
/// let back: AsString<Version> = serde_json::from_value(json).unwrap();
/// assert_eq!(back.0, Version(1, 2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AsString<T>(pub T);

impl<T> AsString<T> {
    /// Unwraps the inner value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: StringCodec> Serialize for AsString<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.encode())
    }
}

impl<'de, T: StringCodec> Deserialize<'de> for AsString<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        T::decode(&text).map(AsString).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_check_value() {
        assert!(check_value(TypeDesc::Integer, &json!(3)).is_ok());
        assert!(check_value(TypeDesc::Integer, &json!(u64::MAX)).is_ok());
        assert!(check_value(TypeDesc::Integer, &json!(3.5)).is_err());
        assert!(check_value(TypeDesc::Float, &json!(3)).is_ok());
        assert!(check_value(TypeDesc::String, &json!(3)).is_err());
        assert!(check_value(TypeDesc::Json, &json!({"a": 1})).is_ok());
        assert_eq!(
            check_value(TypeDesc::Boolean, &Value::Null),
            Err(WireError::TypeMismatch {
                expected: TypeDesc::Boolean,
                found: "null"
            })
        );
    }

    #[test]
    fn test_json_media_type() {
        assert!(is_json_media_type("application/json"));
        assert!(is_json_media_type("Application/JSON; charset=utf-8"));
        assert!(is_json_media_type("application/problem+json"));
        assert!(!is_json_media_type("text/markdown"));
        assert!(!is_json_media_type("text/plain; charset=utf-8"));
    }

    #[test]
    fn test_to_wire_string() {
        assert_eq!(to_wire_string(TypeDesc::Boolean, &json!(true)).unwrap(), "true");
        assert_eq!(to_wire_string(TypeDesc::Float, &json!(1.5)).unwrap(), "1.5");
        assert_eq!(
            to_wire_string(TypeDesc::Json, &json!({"k": "v"})).unwrap(),
            r#"{"k":"v"}"#
        );
        assert!(to_wire_string(TypeDesc::Integer, &json!("7")).is_err());
    }

    #[test]
    fn test_from_wire_string() {
        assert_eq!(from_wire_string(TypeDesc::Integer, "7").unwrap(), json!(7));
        assert_eq!(from_wire_string(TypeDesc::Integer, "-7").unwrap(), json!(-7));
        assert_eq!(
            from_wire_string(TypeDesc::Integer, "18446744073709551615").unwrap(),
            json!(u64::MAX)
        );
        assert_eq!(from_wire_string(TypeDesc::Float, "2.25").unwrap(), json!(2.25));
        assert_eq!(from_wire_string(TypeDesc::Float, "3").unwrap(), json!(3));
        assert_eq!(from_wire_string(TypeDesc::Float, "3.0").unwrap(), json!(3.0));
        assert_eq!(from_wire_string(TypeDesc::Boolean, "false").unwrap(), json!(false));
        assert_eq!(from_wire_string(TypeDesc::String, " x ").unwrap(), json!(" x "));
        assert_eq!(
            from_wire_string(TypeDesc::Json, "[1,\"a\"]").unwrap(),
            json!([1, "a"])
        );
    }

    #[test]
    fn test_from_wire_string_errors() {
        assert!(matches!(
            from_wire_string(TypeDesc::Integer, "seven"),
            Err(WireError::Parse { expected: TypeDesc::Integer, .. })
        ));
        assert!(from_wire_string(TypeDesc::Boolean, "yes").is_err());
        assert!(from_wire_string(TypeDesc::Float, "NaN").is_err());
        assert!(from_wire_string(TypeDesc::Json, "{").is_err());
    }

    #[test]
    fn test_text_form_is_lossless_for_scalars() {
        let cases = [
            (TypeDesc::Integer, json!(-42)),
            (TypeDesc::Float, json!(0.1)),
            (TypeDesc::Float, json!(3)),
            (TypeDesc::Float, json!(3.0)),
            (TypeDesc::Boolean, json!(true)),
            (TypeDesc::String, json!("slash/and space")),
            (TypeDesc::Json, json!({"nested": [1, null, "x"]})),
        ];
        for (ty, value) in cases {
            let text = to_wire_string(ty, &value).unwrap();
            assert_eq!(from_wire_string(ty, &text).unwrap(), value, "{ty}");
        }
    }

    #[derive(Debug, PartialEq)]
    struct Hex(u32);

    impl StringCodec for Hex {
        type Err = std::num::ParseIntError;

        fn encode(&self) -> String {
            format!("{:x}", self.0)
        }

        fn decode(text: &str) -> Result<Self, Self::Err> {
            u32::from_str_radix(text, 16).map(Hex)
        }
    }

    #[test]
    fn test_as_string_codec() {
        let value = serde_json::to_value(AsString(Hex(255))).unwrap();
        assert_eq!(value, json!("ff"));

        let back: AsString<Hex> = serde_json::from_value(json!("ff")).unwrap();
        assert_eq!(back.into_inner(), Hex(255));

        let err = serde_json::from_value::<AsString<Hex>>(json!("zz")).unwrap_err();
        assert!(err.to_string().contains("invalid digit"));
    }
}

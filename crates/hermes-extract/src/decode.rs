//! Per-origin argument decoding.
//!
//! [`decode_arguments`] walks a [`CompiledRoute`]'s input buckets and reads
//! every wire parameter from the place the compiler assigned it:
//!
//! | Origin | Read from | Text form |
//! |--------|-----------|-----------|
//! | Path   | matched placeholder, percent-decoded | [`from_wire_string`] |
//! | Query  | first value of the query field | [`from_wire_string`] |
//! | Header | request header | [`from_wire_string`] |
//! | Body   | field of the JSON body object | JSON value, type-checked |
//!
//! Absent values fall back to the parameter's default, `null` when it is
//! optional without a default, and an error when it is required. Computed
//! parameters are left to the server, which owns the resolvers.

use hermes_core::wire::{check_value, from_wire_string, is_json_media_type, kind_of, JSON_MEDIA_TYPE};
use hermes_core::{CompiledParameter, CompiledRoute, Origin};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::{ExtractionContext, ExtractionError, ExtractionSource};

/// Content type expected on request bodies.
pub const JSON_CONTENT_TYPE: &str = JSON_MEDIA_TYPE;

/// Decoded argument values keyed by declared parameter name, in the order
/// they were decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: IndexMap<String, Value>,
}

impl Arguments {
    /// Creates an empty argument set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Returns the value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// True when a value for `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when there are no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates name/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Decodes every wire input of `route` from `ctx`.
///
/// # Errors
///
/// Returns the first [`ExtractionError`] met, in path, query, header, body
/// order.
pub fn decode_arguments(
    route: &CompiledRoute,
    ctx: &ExtractionContext,
    max_body_bytes: usize,
) -> Result<Arguments, ExtractionError> {
    let mut args = Arguments::new();

    for param in route.inputs(Origin::Path) {
        let value = match ctx.path_params().get(param.wire_name()) {
            Some(raw) => {
                let text = urlencoding::decode(raw).map_err(|e| {
                    ExtractionError::invalid(ExtractionSource::Path, param.wire_name(), e)
                })?;
                Some(parse_text(param, ExtractionSource::Path, &text)?)
            }
            None => None,
        };
        insert(&mut args, param, ExtractionSource::Path, value)?;
    }

    for param in route.inputs(Origin::Query) {
        let value = ctx
            .query_value(param.wire_name())
            .map(|text| parse_text(param, ExtractionSource::Query, &text))
            .transpose()?;
        insert(&mut args, param, ExtractionSource::Query, value)?;
    }

    for param in route.inputs(Origin::Header) {
        let value = match ctx.headers().get(param.wire_name()) {
            Some(raw) => {
                let text = raw.to_str().map_err(|e| {
                    ExtractionError::invalid(ExtractionSource::Header, param.wire_name(), e)
                })?;
                Some(parse_text(param, ExtractionSource::Header, text)?)
            }
            None => None,
        };
        insert(&mut args, param, ExtractionSource::Header, value)?;
    }

    if route.has_body() {
        let body = read_body_object(ctx, max_body_bytes)?;
        for param in route.inputs(Origin::Body) {
            let value = match body.get(param.wire_name()) {
                Some(Value::Null) | None => None,
                Some(value) => {
                    check_value(param.ty, value).map_err(|e| {
                        ExtractionError::invalid(ExtractionSource::Body, param.wire_name(), e)
                    })?;
                    Some(value.clone())
                }
            };
            insert(&mut args, param, ExtractionSource::Body, value)?;
        }
    }

    Ok(args)
}

/// Reads the request body as a JSON object.
///
/// An empty body reads as `{}`.
///
/// # Errors
///
/// Fails when the body is too large, declared as something other than
/// JSON, or not a JSON object.
pub fn read_body_object(
    ctx: &ExtractionContext,
    max_body_bytes: usize,
) -> Result<Map<String, Value>, ExtractionError> {
    let body = ctx.body();
    if body.len() > max_body_bytes {
        return Err(ExtractionError::payload_too_large(max_body_bytes, body.len()));
    }
    if ctx.is_body_empty() {
        return Ok(Map::new());
    }
    if let Some(content_type) = ctx.content_type() {
        if !is_json_media_type(content_type) {
            return Err(ExtractionError::unsupported_media_type(
                JSON_CONTENT_TYPE,
                Some(content_type),
            ));
        }
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ExtractionError::not_an_object(format_args!(
            "found {}",
            kind_of(&other)
        ))),
        Err(e) => Err(ExtractionError::not_an_object(e)),
    }
}

fn parse_text(
    param: &CompiledParameter,
    source: ExtractionSource,
    text: &str,
) -> Result<Value, ExtractionError> {
    from_wire_string(param.ty, text)
        .map_err(|e| ExtractionError::invalid(source, param.wire_name(), e))
}

fn insert(
    args: &mut Arguments,
    param: &CompiledParameter,
    source: ExtractionSource,
    value: Option<Value>,
) -> Result<(), ExtractionError> {
    let value = match value {
        Some(value) => value,
        None => param
            .absent_value()
            .ok_or_else(|| ExtractionError::missing(source, param.wire_name()))?,
    };
    args.insert(param.name.clone(), value);
    Ok(())
}

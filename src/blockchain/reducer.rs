use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ReduceError;

/// Field name -> value mapping used by the dynamic reducer surface.
pub type FieldMap = serde_json::Map<String, Value>;

/// A record shape that can be decomposed into a field map and rebuilt from one.
///
/// `FIELDS` is the complete field set of the shape. Implementations must emit
/// exactly these keys from `to_fields` and require all of them in
/// `from_fields`.
pub trait Record: Sized {
    const FIELDS: &'static [&'static str];

    fn to_fields(&self) -> Result<FieldMap, ReduceError>;

    fn from_fields(fields: FieldMap) -> Result<Self, ReduceError>;
}

/// Build a new record from `prior` with `overrides` applied on top.
///
/// Every field takes the override's value when one is given and the prior's
/// value otherwise. An empty override set yields a copy of `prior`.
pub fn reduce<R: Record>(prior: Option<&R>, overrides: FieldMap) -> Result<R, ReduceError> {
    let prior = prior.ok_or(ReduceError::MissingPriorState)?;
    merge::<R>(prior.to_fields()?, overrides)
}

/// Build a record from a literal default mapping, with no typed prior.
pub fn from_defaults<R: Record>(defaults: FieldMap) -> Result<R, ReduceError> {
    merge::<R>(defaults, FieldMap::new())
}

fn merge<R: Record>(mut base: FieldMap, overrides: FieldMap) -> Result<R, ReduceError> {
    ensure_known::<R>(&base)?;
    ensure_known::<R>(&overrides)?;

    base.extend(overrides);
    R::from_fields(base)
}

fn ensure_known<R: Record>(fields: &FieldMap) -> Result<(), ReduceError> {
    match fields.keys().find(|key| !R::FIELDS.contains(&key.as_str())) {
        Some(key) => Err(ReduceError::UnknownField(key.clone())),
        None => Ok(()),
    }
}

/// Unwrap a `json!({...})` literal into a field map.
pub(crate) fn field_map(value: Value) -> FieldMap {
    match value {
        Value::Object(map) => map,
        _ => FieldMap::new(),
    }
}

pub(crate) fn put_field<T: Serialize>(
    fields: &mut FieldMap,
    name: &str,
    value: &T,
) -> Result<(), ReduceError> {
    let value = serde_json::to_value(value).map_err(|source| ReduceError::InvalidField {
        field: name.to_string(),
        source,
    })?;
    fields.insert(name.to_string(), value);
    Ok(())
}

pub(crate) fn take_field<T: DeserializeOwned>(
    fields: &mut FieldMap,
    name: &str,
) -> Result<T, ReduceError> {
    let value = fields
        .remove(name)
        .ok_or_else(|| ReduceError::MissingField(name.to_string()))?;
    serde_json::from_value(value).map_err(|source| ReduceError::InvalidField {
        field: name.to_string(),
        source,
    })
}

//! Coercion of raw extractor output into a candidate record.
//!
//! The language model returns best-effort JSON: sometimes a list of
//! candidates, sometimes the field map wrapped in an outer object,
//! sometimes with numbers encoded as strings. This module is the single
//! place that polymorphism is handled; everything downstream works on a
//! plain [`Candidate`].

use serde_json::{Map, Value};

use crate::{EngineError, ResultEngine};

const FIELDS: [&str; 9] = [
    "name",
    "description",
    "movement_type",
    "amount",
    "source_name",
    "source_type",
    "category",
    "datetime",
    "timestamp",
];

/// A raw candidate movement. Every field is optional and unvalidated; the
/// normalizer decides what is acceptable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Candidate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub movement_type: Option<String>,
    pub amount: Option<f64>,
    pub source_name: Option<String>,
    pub source_type: Option<String>,
    pub category: Option<String>,
    pub datetime: Option<String>,
}

impl Candidate {
    /// Coerces an arbitrary JSON value into a candidate field map.
    ///
    /// A list takes its first element; an object that carries none of the
    /// known fields but wraps exactly one inner object is flattened one
    /// level. Anything else fails with `MalformedExtraction`.
    pub fn from_value(value: Value) -> ResultEngine<Self> {
        let mut map = field_map(value)?;

        Ok(Self {
            name: take_string(&mut map, "name")?,
            description: take_string(&mut map, "description")?,
            movement_type: take_string(&mut map, "movement_type")?,
            amount: take_number(&mut map, "amount")?,
            source_name: take_string(&mut map, "source_name")?,
            source_type: take_string(&mut map, "source_type")?,
            category: take_string(&mut map, "category")?,
            datetime: match take_string(&mut map, "datetime")? {
                Some(value) => Some(value),
                None => take_string(&mut map, "timestamp")?,
            },
        })
    }
}

fn field_map(value: Value) -> ResultEngine<Map<String, Value>> {
    let value = match value {
        Value::Array(mut items) => {
            if items.is_empty() {
                return Err(EngineError::MalformedExtraction(
                    "empty candidate list".to_string(),
                ));
            }
            items.swap_remove(0)
        }
        other => other,
    };

    let map = match value {
        Value::Object(map) => map,
        other => {
            return Err(EngineError::MalformedExtraction(format!(
                "extraction is not a field map: {other}"
            )));
        }
    };

    if map.keys().any(|key| FIELDS.contains(&key.as_str())) {
        return Ok(map);
    }

    // Wrapper object: one entry holding the real field map.
    if map.len() == 1 {
        if let Some((_, Value::Object(inner))) = map.into_iter().next() {
            return Ok(inner);
        }
        return Err(EngineError::MalformedExtraction(
            "extraction is not a field map".to_string(),
        ));
    }

    Err(EngineError::MalformedExtraction(
        "extraction carries no known fields".to_string(),
    ))
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> ResultEngine<Option<String>> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(other) => Err(EngineError::MalformedExtraction(format!(
            "field `{key}` is not a string: {other}"
        ))),
    }
}

fn take_number(map: &mut Map<String, Value>, key: &str) -> ResultEngine<Option<f64>> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(value)) => value.as_f64().map(Some).ok_or_else(|| {
            EngineError::MalformedExtraction(format!("field `{key}` is not a finite number"))
        }),
        Some(Value::String(value)) => value.trim().parse::<f64>().map(Some).map_err(|_| {
            EngineError::MalformedExtraction(format!("field `{key}` is not numeric: {value}"))
        }),
        Some(other) => Err(EngineError::MalformedExtraction(format!(
            "field `{key}` is not numeric: {other}"
        ))),
    }
}

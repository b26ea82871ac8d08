//! Loosely-shaped values returned by an orchestrator.
//!
//! An [`Orchestrator`](crate::Orchestrator) finishes a run by handing back a
//! result object whose shape is only loosely specified: depending on the
//! orchestration backend it may expose named attributes, behave like a
//! dictionary, wrap per-node results in further objects, or carry values that
//! are not JSON primitives at all (enumerated statuses, timestamps, raw
//! bytes). [`RawValue`] is the crate's defensive model of that object: a
//! tagged union that every probe in the
//! [`normalize`](crate::swarmserve::normalize) module can walk without ever
//! failing.
//!
//! # Example
//!
//! ```
//! use swarmserve::RawValue;
//!
//! let result = RawValue::record(
//!     "SwarmResult",
//!     vec![
//!         ("status".into(), RawValue::Symbol("COMPLETED".into())),
//!         ("output".into(), RawValue::Text("All done.".into())),
//!     ],
//! );
//!
//! assert_eq!(
//!     result.get("output"),
//!     Some(&RawValue::Text("All done.".into()))
//! );
//! // Records stringify to an opaque placeholder, like a default repr.
//! assert_eq!(result.to_string(), "<SwarmResult object>");
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::fmt;

/// A value of loosely-specified shape produced by an external orchestrator.
///
/// `Map` preserves insertion order (entries are kept as a plain vector);
/// probe order over keys is part of the normalization contract, so a sorted
/// map would change behavior. `Record` models an object exposing named
/// attributes — its string form is the angle-bracket placeholder
/// `<TypeName object>`, which the output extractor treats as "no usable
/// text".
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Raw binary payload; decoded best-effort to UTF-8 wherever text is needed.
    Bytes(Vec<u8>),
    /// An enumerated/symbolic value (e.g. a status enum member), rendered by name.
    Symbol(String),
    Timestamp(DateTime<Utc>),
    List(Vec<RawValue>),
    /// Insertion-ordered string-keyed mapping.
    Map(Vec<(String, RawValue)>),
    /// An object exposing named attributes, with a type name for its placeholder repr.
    Record {
        type_name: String,
        fields: Vec<(String, RawValue)>,
    },
}

impl RawValue {
    /// Convenience constructor for a [`RawValue::Record`].
    pub fn record(type_name: impl Into<String>, fields: Vec<(String, RawValue)>) -> Self {
        RawValue::Record {
            type_name: type_name.into(),
            fields,
        }
    }

    /// Convenience constructor for an insertion-ordered [`RawValue::Map`].
    pub fn map(entries: Vec<(String, RawValue)>) -> Self {
        RawValue::Map(entries)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// Look up a named attribute (for records) or key (for maps).
    ///
    /// Any other shape has no named members and yields `None`.
    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.entries()
            .and_then(|entries| entries.iter().find(|(k, _)| k == name))
            .map(|(_, v)| v)
    }

    /// The "to mapping" view of this value: its named entries in order.
    ///
    /// Present for maps and records, absent for everything else.
    pub fn entries(&self) -> Option<&[(String, RawValue)]> {
        match self {
            RawValue::Map(entries) => Some(entries),
            RawValue::Record { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// Total conversion into a [`serde_json::Value`].
    ///
    /// Never fails: symbols render as their name, timestamps as RFC 3339
    /// text, bytes decode best-effort to text, records become objects of
    /// their fields, and non-finite floats degrade to `null`.
    ///
    /// ```
    /// use swarmserve::RawValue;
    /// use serde_json::json;
    ///
    /// let value = RawValue::map(vec![
    ///     ("status".into(), RawValue::Symbol("FAILED".into())),
    ///     ("bytes".into(), RawValue::Bytes(b"hi".to_vec())),
    /// ]);
    /// assert_eq!(value.to_json(), json!({"status": "FAILED", "bytes": "hi"}));
    /// ```
    pub fn to_json(&self) -> Value {
        match self {
            RawValue::Null => Value::Null,
            RawValue::Bool(b) => Value::Bool(*b),
            RawValue::Int(n) => Value::Number((*n).into()),
            RawValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            RawValue::Text(s) => Value::String(s.clone()),
            RawValue::Bytes(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
            RawValue::Symbol(name) => Value::String(name.clone()),
            RawValue::Timestamp(ts) => {
                Value::String(ts.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            RawValue::List(items) => Value::Array(items.iter().map(RawValue::to_json).collect()),
            RawValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            RawValue::Record { fields, .. } => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for RawValue {
    /// Total stringification, the last-resort coercion used by the output
    /// extractor. Records render as an opaque `<TypeName object>` placeholder.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => write!(f, "null"),
            RawValue::Bool(b) => write!(f, "{}", b),
            RawValue::Int(n) => write!(f, "{}", n),
            RawValue::Float(x) => write!(f, "{}", x),
            RawValue::Text(s) => write!(f, "{}", s),
            RawValue::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            RawValue::Symbol(name) => write!(f, "{}", name),
            RawValue::Timestamp(ts) => {
                write!(f, "{}", ts.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            RawValue::List(_) | RawValue::Map(_) => write!(f, "{}", self.to_json()),
            RawValue::Record { type_name, .. } => write!(f, "<{} object>", type_name),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        RawValue::Int(n)
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Bool(b)
    }
}

// Tagged attribute values for heterogeneous Terraform resource bags

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// JSON marker key for the `Unresolved` variant. A literal string value is
/// always `Str`, so `"${...}"`-shaped user data never collides with a
/// sentinel.
const UNRESOLVED_KEY: &str = "$unresolved";

/// One Terraform attribute value.
///
/// Resource attributes mix scalars, nested mappings, and ordered sequences.
/// Expressions the loader could not evaluate (references to variables, data
/// sources, or values unknown until apply) are a dedicated `Unresolved`
/// variant holding the interpolation text, e.g. `"${var.instance_type}"`,
/// so the mocker can detect them without ever confusing them with literal
/// string values.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    Num(f64),
    Str(String),
    List(Vec<AttrValue>),
    Map(BTreeMap<String, AttrValue>),
    Unresolved(String),
}

impl AttrValue {
    /// Sentinel for an expression the loader could not resolve.
    pub fn unresolved(expr: impl Into<String>) -> Self {
        AttrValue::Unresolved(format!("${{{}}}", expr.into()))
    }

    /// True when this value is an unresolved-expression sentinel.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, AttrValue::Unresolved(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric view. Strings that parse as numbers are accepted because
    /// Terraform frequently quotes numeric attributes.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Num(n) => Some(*n),
            AttrValue::Str(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            AttrValue::Str(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, AttrValue>> {
        match self {
            AttrValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            AttrValue::List(l) => Some(l.as_slice()),
            _ => None,
        }
    }

    /// Nested lookup inside a mapping value.
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Convert a plan-JSON value. Nulls yield `None`; callers skip them so
    /// absent and null attributes are indistinguishable downstream. Plan
    /// values are concrete, so strings always convert to `Str`, never to a
    /// sentinel.
    pub fn from_json(value: &serde_json::Value) -> Option<AttrValue> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(AttrValue::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(AttrValue::Num),
            serde_json::Value::String(s) => Some(AttrValue::Str(s.clone())),
            serde_json::Value::Array(items) => Some(AttrValue::List(
                items.iter().filter_map(AttrValue::from_json).collect(),
            )),
            serde_json::Value::Object(fields) => {
                let mut map = BTreeMap::new();
                for (k, v) in fields {
                    if let Some(converted) = AttrValue::from_json(v) {
                        map.insert(k.clone(), converted);
                    }
                }
                Some(AttrValue::Map(map))
            }
        }
    }

    /// Canonical text form used by the input fingerprint. Maps iterate in
    /// key order, so equal values always canonicalize identically.
    pub fn canonical(&self) -> String {
        match self {
            AttrValue::Bool(b) => format!("b:{b}"),
            AttrValue::Num(n) => format!("n:{n}"),
            AttrValue::Str(s) => format!("s:{s}"),
            AttrValue::List(items) => {
                let inner: Vec<String> = items.iter().map(AttrValue::canonical).collect();
                format!("l:[{}]", inner.join(","))
            }
            AttrValue::Map(map) => {
                let inner: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{k}={}", v.canonical()))
                    .collect();
                format!("m:{{{}}}", inner.join(","))
            }
            AttrValue::Unresolved(expr) => format!("u:{expr}"),
        }
    }
}

// Scalars, lists, and maps serialize as plain JSON; `Unresolved` becomes a
// single-entry marker object so the variant survives a round trip.
impl Serialize for AttrValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttrValue::Bool(b) => serializer.serialize_bool(*b),
            AttrValue::Num(n) => serializer.serialize_f64(*n),
            AttrValue::Str(s) => serializer.serialize_str(s),
            AttrValue::List(items) => items.serialize(serializer),
            AttrValue::Map(map) => map.serialize(serializer),
            AttrValue::Unresolved(expr) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(UNRESOLVED_KEY, expr)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for AttrValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bool(bool),
            Num(f64),
            Str(String),
            List(Vec<AttrValue>),
            Map(BTreeMap<String, AttrValue>),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Bool(b) => AttrValue::Bool(b),
            Repr::Num(n) => AttrValue::Num(n),
            Repr::Str(s) => AttrValue::Str(s),
            Repr::List(items) => AttrValue::List(items),
            Repr::Map(map) => match unresolved_marker(&map) {
                Some(expr) => AttrValue::Unresolved(expr),
                None => AttrValue::Map(map),
            },
        })
    }
}

fn unresolved_marker(map: &BTreeMap<String, AttrValue>) -> Option<String> {
    if map.len() != 1 {
        return None;
    }
    match map.get(UNRESOLVED_KEY) {
        Some(AttrValue::Str(expr)) => Some(expr.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_is_a_distinct_variant() {
        let v = AttrValue::unresolved("var.instance_type");
        assert!(v.is_unresolved());
        assert_eq!(v, AttrValue::Unresolved("${var.instance_type}".into()));
        // Sentinels are not string values; adapters never read them as data.
        assert_eq!(v.as_str(), None);
    }

    #[test]
    fn interpolation_shaped_literals_stay_strings() {
        // An IAM policy variable stored verbatim is user data, not a
        // sentinel.
        let v = AttrValue::Str("${aws:username}".into());
        assert!(!v.is_unresolved());
        assert_eq!(v.as_str(), Some("${aws:username}"));
    }

    #[test]
    fn unresolved_round_trips_through_json() {
        let v = AttrValue::unresolved("data.aws_ami.ubuntu.id");
        let json = serde_json::to_string(&v).unwrap();
        let back: AttrValue = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);

        let literal = AttrValue::Str("${aws:username}".into());
        let json = serde_json::to_string(&literal).unwrap();
        let back: AttrValue = serde_json::from_str(&json).unwrap();
        assert_eq!(literal, back);
    }

    #[test]
    fn numeric_strings_parse() {
        assert_eq!(AttrValue::Str("100".into()).as_f64(), Some(100.0));
        assert_eq!(AttrValue::Num(8.0).as_f64(), Some(8.0));
        assert_eq!(AttrValue::Str("gp3".into()).as_f64(), None);
    }

    #[test]
    fn from_json_drops_nulls_and_never_makes_sentinels() {
        let json = serde_json::json!({"a": null, "b": 1, "c": {"d": null, "e": "${var.x}"}});
        let attr = AttrValue::from_json(&json).unwrap();
        assert!(attr.get("a").is_none());
        assert_eq!(attr.get("b").and_then(|v| v.as_f64()), Some(1.0));
        let e = attr.get("c").and_then(|c| c.get("e")).unwrap();
        assert!(!e.is_unresolved());
        assert_eq!(e.as_str(), Some("${var.x}"));
    }

    #[test]
    fn canonical_is_key_ordered() {
        let mut m1 = BTreeMap::new();
        m1.insert("b".to_string(), AttrValue::Num(2.0));
        m1.insert("a".to_string(), AttrValue::Num(1.0));
        let mut m2 = BTreeMap::new();
        m2.insert("a".to_string(), AttrValue::Num(1.0));
        m2.insert("b".to_string(), AttrValue::Num(2.0));
        assert_eq!(AttrValue::Map(m1).canonical(), AttrValue::Map(m2).canonical());
    }
}

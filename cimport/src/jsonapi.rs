//! JSON:API envelope types used by the contact service
//!
//! Only the pieces this client reads or writes are modelled: a single
//! primary resource with attributes and to-one relationships.

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Response document with a single primary resource
#[derive(Debug, Clone, Deserialize)]
pub struct Document<A> {
    pub data: Resource<A>,
}

/// Primary resource object
#[derive(Debug, Clone, Deserialize)]
pub struct Resource<A> {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub attributes: Option<A>,
}

/// Request document creating a new resource
#[derive(Debug, Clone, Serialize)]
pub struct NewResourceDocument<A, R> {
    pub data: NewResource<A, R>,
}

/// Resource object without an id (assigned by the server)
#[derive(Debug, Clone, Serialize)]
pub struct NewResource<A, R> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub attributes: A,
    pub relationships: R,
}

/// To-one relationship
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToOne {
    pub data: ResourceIdentifier,
}

/// `{type, id}` pointer to another resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

impl ToOne {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            data: ResourceIdentifier {
                kind: kind.into(),
                id: id.into(),
            },
        }
    }
}

/// Name/value pairs encoded as an array of single-key objects
///
/// `[{"a": "1"}, {"b": "2"}]` decodes to `[("a", "1"), ("b", "2")]`. Array
/// order is kept, and an object carrying several keys contributes them in
/// document order. Numbers and booleans are taken as their JSON text
/// (`204`, `true`); objects, arrays and `null` are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedPairs(Vec<(String, String)>);

impl OrderedPairs {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> Vec<(String, String)> {
        self.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OrderedPairs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<'de> Deserialize<'de> for OrderedPairs {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(PairsVisitor)
    }
}

struct PairsVisitor;

impl<'de> Visitor<'de> for PairsVisitor {
    type Value = OrderedPairs;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an array of single-key objects with scalar values")
    }

    fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
    where
        S: SeqAccess<'de>,
    {
        let mut pairs = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(entry) = seq.next_element::<PairObject>()? {
            pairs.extend(entry.0);
        }
        Ok(OrderedPairs(pairs))
    }
}

/// One element of the array; keeps keys in document order
struct PairObject(Vec<(String, String)>);

impl<'de> Deserialize<'de> for PairObject {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ObjectVisitor;

        impl<'de> Visitor<'de> for ObjectVisitor {
            type Value = PairObject;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object with scalar values")
            }

            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(1));
                while let Some((key, value)) = map.next_entry::<String, ScalarText>()? {
                    entries.push((key, value.0));
                }
                if entries.is_empty() {
                    return Err(de::Error::invalid_length(0, &"at least one key"));
                }
                Ok(PairObject(entries))
            }
        }

        deserializer.deserialize_map(ObjectVisitor)
    }
}

/// String, number or boolean value rendered as text
struct ScalarText(String);

impl<'de> Deserialize<'de> for ScalarText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ScalarVisitor;

        impl<'de> Visitor<'de> for ScalarVisitor {
            type Value = ScalarText;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string, number or boolean")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(ScalarText(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(ScalarText(v))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(ScalarText(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(ScalarText(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(ScalarText(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(ScalarText(v.to_string()))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

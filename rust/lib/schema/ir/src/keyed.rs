//! Serde glue for IR collections stored as ordered `Vec`s but written to
//! JSON as objects keyed by name (`"Fields"`, `"Indices"`, `"Models"`).
//!
//! Serializing walks the `Vec` in order, so the JSON object keeps
//! declaration order without an ordered-map dependency.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// An IR element whose JSON key is held outside its JSON value.
pub trait Keyed {
    fn key(&self) -> &str;
    fn set_key(&mut self, key: String);
}

#[allow(clippy::ptr_arg)]
pub fn serialize<S, T>(items: &Vec<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Keyed + Serialize,
{
    let mut map = serializer.serialize_map(Some(items.len()))?;
    for item in items {
        map.serialize_entry(item.key(), item)?;
    }
    map.end()
}

pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Keyed + Deserialize<'de>,
{
    struct KeyedVisitor<T>(PhantomData<T>);

    impl<'de, T> Visitor<'de> for KeyedVisitor<T>
    where
        T: Keyed + Deserialize<'de>,
    {
        type Value = Vec<T>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an object of named entries")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((key, mut value)) = access.next_entry::<String, T>()? {
                value.set_key(key);
                items.push(value);
            }
            Ok(items)
        }
    }

    deserializer.deserialize_map(KeyedVisitor(PhantomData))
}

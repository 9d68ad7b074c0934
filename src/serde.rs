use core::fmt;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::marker::PhantomData;

use serde::Deserialize;
use serde::Serialize;
use serde::de::Error as _;
use serde::de::MapAccess;
use serde::de::Visitor;
use serde::ser::SerializeMap;

use crate::HashMap;

/// Largest number of entries preallocated from an untrusted size hint.
const MAX_PREALLOCATED: usize = 4096;

impl<K, V, H> Serialize for HashMap<K, V, H>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;

        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }

        map.end()
    }
}

impl<'de, K, V, H> Deserialize<'de> for HashMap<K, V, H>
where
    K: Deserialize<'de> + Hash + Eq,
    V: Deserialize<'de>,
    H: BuildHasher + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(HashMapVisitor::new())
    }
}

struct HashMapVisitor<K, V, H> {
    _marker: PhantomData<fn() -> HashMap<K, V, H>>,
}

impl<K, V, H> HashMapVisitor<K, V, H> {
    fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<'de, K, V, H> Visitor<'de> for HashMapVisitor<K, V, H>
where
    K: Deserialize<'de> + Hash + Eq,
    V: Deserialize<'de>,
    H: BuildHasher + Default,
{
    type Value = HashMap<K, V, H>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let capacity = access.size_hint().unwrap_or(8).min(MAX_PREALLOCATED);
        let mut map = HashMap::with_capacity_and_hasher(capacity, H::default());

        // Repeated keys keep their first value.
        while let Some((key, value)) = access.next_entry()? {
            map.try_insert(key, value).map_err(M::Error::custom)?;
        }

        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec::Vec;

    use crate::HashMap;

    #[test]
    fn serialize_in_insertion_order() {
        let mut map = HashMap::new();
        map.insert("zebra".to_string(), 1);
        map.insert("apple".to_string(), 2);
        map.insert("mango".to_string(), 3);

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"zebra":1,"apple":2,"mango":3}"#);
    }

    #[test]
    fn deserialize_round_trip() {
        let mut map = HashMap::new();
        for i in 0..100u32 {
            map.insert(i.to_string(), i);
        }

        let json = serde_json::to_string(&map).unwrap();
        let back: HashMap<String, u32> = serde_json::from_str(&json).unwrap();

        assert_eq!(back, map);
        assert_eq!(
            back.keys().collect::<Vec<_>>(),
            map.keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn deserialize_repeated_key_keeps_first_value() {
        let map: HashMap<String, i32> = serde_json::from_str(r#"{"a":1,"b":2,"a":3}"#).unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some(&1));
        assert_eq!(map.get("b"), Some(&2));
    }

    #[test]
    fn deserialize_rejects_non_map() {
        let result: Result<HashMap<String, i32>, _> = serde_json::from_str("[1, 2, 3]");
        assert!(result.is_err());
    }
}

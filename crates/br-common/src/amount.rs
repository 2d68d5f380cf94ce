//! Balance and burn amounts.
//!
//! Amounts are unsigned 128-bit integers. At the data boundary they travel
//! as decimal strings, since JSON consumers commonly lose precision on
//! integers above 2^53. The serde adapters below accept either a decimal
//! string or a plain JSON integer on input and always emit strings.

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;

/// A non-negative balance, burn total, or rate.
pub type Amount = u128;

/// Parse a decimal amount, tolerating surrounding whitespace and `_` separators.
pub fn parse_amount(s: &str) -> Option<Amount> {
    let cleaned: String = s.trim().chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    cleaned.parse::<u128>().ok()
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative decimal integer (string or number)")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        parse_amount(v).ok_or_else(|| E::custom(format!("invalid amount: {:?}", v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(v as Amount)
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        u128::try_from(v).map_err(|_| E::custom(format!("negative amount: {}", v)))
    }
}

/// Serde adapter: `u128` as a decimal string.
///
/// Use with `#[serde(with = "br_common::amount::decimal")]`.
pub mod decimal {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

/// Serde adapter: `Option<u128>` as a decimal string or `null`.
pub mod decimal_opt {
    use super::*;
    use serde::Deserialize;

    pub fn serialize<S: Serializer>(value: &Option<Amount>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_none(),
        }
    }

    struct Wrapped(Amount);

    impl<'de> Deserialize<'de> for Wrapped {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            d.deserialize_any(AmountVisitor).map(Wrapped)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Amount>, D::Error> {
        Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|w| w.0))
    }
}

/// Render an amount with a K/M/B/T suffix for terminal output.
pub fn format_compact(value: Amount) -> String {
    const UNITS: [(Amount, &str); 4] = [
        (1_000_000_000_000, "T"),
        (1_000_000_000, "B"),
        (1_000_000, "M"),
        (1_000, "K"),
    ];
    for (scale, suffix) in UNITS {
        if value >= scale {
            return format!("{:.2}{}", value as f64 / scale as f64, suffix);
        }
    }
    value.to_string()
}

/// Serde adapter: `BTreeMap<K, u128>` with decimal-string values.
pub mod decimal_map {
    use super::*;
    use serde::de::MapAccess;
    use serde::ser::SerializeMap;
    use serde::Deserialize;
    use std::collections::BTreeMap;
    use std::marker::PhantomData;

    pub fn serialize<K, S>(map: &BTreeMap<K, Amount>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: serde::Serialize,
        S: Serializer,
    {
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (k, v) in map {
            out.serialize_entry(k, &v.to_string())?;
        }
        out.end()
    }

    struct Wrapped(Amount);

    impl<'de> Deserialize<'de> for Wrapped {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            d.deserialize_any(AmountVisitor).map(Wrapped)
        }
    }

    struct MapVisitor<K>(PhantomData<K>);

    impl<'de, K: Deserialize<'de> + Ord> Visitor<'de> for MapVisitor<K> {
        type Value = BTreeMap<K, Amount>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of decimal amounts")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut map = BTreeMap::new();
            while let Some((k, Wrapped(v))) = access.next_entry::<K, Wrapped>()? {
                map.insert(k, v);
            }
            Ok(map)
        }
    }

    pub fn deserialize<'de, K, D>(deserializer: D) -> Result<BTreeMap<K, Amount>, D::Error>
    where
        K: Deserialize<'de> + Ord,
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(MapVisitor(PhantomData))
    }
}

//! File-backed balance source for offline and scripted collection.

use super::{BalanceSource, CollectError};
use br_common::amount::decimal_map;
use br_common::{Amount, EntityId};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Balances read from a JSON object of `entity_id → "decimal"`.
///
/// Status queries look the entity up; summary queries return the whole map.
/// The file is read once, at construction.
#[derive(Debug, Clone)]
pub struct FileBalanceSource {
    path: PathBuf,
    balances: BTreeMap<EntityId, Amount>,
}

impl FileBalanceSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CollectError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CollectError::Source(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content).map(|mut source| {
            source.path = path.to_path_buf();
            source
        })
    }

    pub fn from_json(json: &str) -> Result<Self, CollectError> {
        let mut de = serde_json::Deserializer::from_str(json);
        let balances = decimal_map::deserialize(&mut de)
            .and_then(|map| de.end().map(|_| map))
            .map_err(|e| CollectError::Source(format!("invalid balances: {}", e)))?;
        Ok(FileBalanceSource {
            path: PathBuf::new(),
            balances,
        })
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

impl BalanceSource for FileBalanceSource {
    fn query_status(&self, proxy: &str, entity: &EntityId) -> Result<Amount, CollectError> {
        self.balances
            .get(entity)
            .copied()
            .ok_or_else(|| CollectError::Proxy {
                proxy: proxy.to_string(),
                message: format!("no balance for {} in {}", entity, self.path.display()),
            })
    }

    fn query_summary(&self, _proxy: &str) -> Result<HashMap<EntityId, Amount>, CollectError> {
        Ok(self
            .balances
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_json_accepts_strings_and_numbers() {
        let source = FileBalanceSource::from_json(r#"{"a": "100000000000000", "b": 5}"#).unwrap();
        assert_eq!(source.len(), 2);
        assert_eq!(
            source.query_status("p", &EntityId::from("a")).unwrap(),
            100_000_000_000_000
        );
        assert_eq!(source.query_summary("p").unwrap()[&EntityId::from("b")], 5);
    }

    #[test]
    fn test_unknown_entity_is_proxy_error() {
        let source = FileBalanceSource::from_json("{}").unwrap();
        assert!(source.is_empty());
        let err = source.query_status("p", &EntityId::from("zz")).unwrap_err();
        assert!(matches!(err, CollectError::Proxy { .. }));
    }

    #[test]
    fn test_rejects_negative_and_trailing() {
        assert!(FileBalanceSource::from_json(r#"{"a": -1}"#).is_err());
        assert!(FileBalanceSource::from_json(r#"{"a": "1"} x"#).is_err());
    }

    #[test]
    fn test_open_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"a": "7"}}"#).unwrap();
        let source = FileBalanceSource::open(file.path()).unwrap();
        assert_eq!(source.query_status("p", &EntityId::from("a")).unwrap(), 7);
        assert!(FileBalanceSource::open("/nonexistent/balances.json").is_err());
    }
}

use super::KnownConnections;
use crate::config::KNOWN_CONNECTIONS_KEY;
use crate::db::Database;

/// Persistence port for the known-connections set.
pub trait KnownConnectionsStore: Send + Sync {
    /// `None` when nothing usable is cached. Malformed content counts as nothing.
    fn load_known_connections(&self) -> anyhow::Result<Option<KnownConnections>>;
    fn save_known_connections(&self, known: &KnownConnections) -> anyhow::Result<()>;
    fn clear_known_connections(&self) -> anyhow::Result<bool>;
}

impl KnownConnectionsStore for Database {
    fn load_known_connections(&self) -> anyhow::Result<Option<KnownConnections>> {
        let Some(entry) = self.get_cache_entry(KNOWN_CONNECTIONS_KEY)? else {
            return Ok(None);
        };
        match KnownConnections::from_cache_json(&entry.value) {
            Some(known) => Ok(Some(known)),
            None => {
                tracing::warn!(
                    "Discarding malformed '{}' cache entry (updated {})",
                    entry.key,
                    entry.updated_at
                );
                Ok(None)
            }
        }
    }

    fn save_known_connections(&self, known: &KnownConnections) -> anyhow::Result<()> {
        self.set_cache_entry(KNOWN_CONNECTIONS_KEY, &known.to_cache_json()?)
    }

    fn clear_known_connections(&self) -> anyhow::Result<bool> {
        self.delete_cache_entry(KNOWN_CONNECTIONS_KEY)
    }
}

#[cfg(test)]
pub mod memory {
    use std::sync::Mutex;

    use super::*;

    /// Holds the raw cached JSON so malformed payloads can be simulated.
    #[derive(Default)]
    pub struct MemoryStore {
        pub raw: Mutex<Option<String>>,
        pub saves: Mutex<usize>,
    }

    impl MemoryStore {
        pub fn with_raw(raw: &str) -> Self {
            Self {
                raw: Mutex::new(Some(raw.to_string())),
                saves: Mutex::new(0),
            }
        }

        pub fn cached(&self) -> Option<KnownConnections> {
            self.raw
                .lock()
                .unwrap()
                .as_deref()
                .and_then(KnownConnections::from_cache_json)
        }
    }

    impl KnownConnectionsStore for MemoryStore {
        fn load_known_connections(&self) -> anyhow::Result<Option<KnownConnections>> {
            Ok(self.cached())
        }

        fn save_known_connections(&self, known: &KnownConnections) -> anyhow::Result<()> {
            *self.raw.lock().unwrap() = Some(known.to_cache_json()?);
            *self.saves.lock().unwrap() += 1;
            Ok(())
        }

        fn clear_known_connections(&self) -> anyhow::Result<bool> {
            Ok(self.raw.lock().unwrap().take().is_some())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_store_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.load_known_connections().unwrap().is_none());

        let known = KnownConnections::from_ids(["101", "202"]);
        db.save_known_connections(&known).unwrap();
        assert_eq!(db.load_known_connections().unwrap(), Some(known));

        assert!(db.clear_known_connections().unwrap());
        assert!(db.load_known_connections().unwrap().is_none());
    }

    #[test]
    fn test_database_store_discards_malformed() {
        let db = Database::open_in_memory().unwrap();
        db.set_cache_entry(KNOWN_CONNECTIONS_KEY, r#"["101", 7]"#)
            .unwrap();
        assert!(db.load_known_connections().unwrap().is_none());

        db.set_cache_entry(KNOWN_CONNECTIONS_KEY, "{not json").unwrap();
        assert!(db.load_known_connections().unwrap().is_none());
    }
}

use std::sync::Arc;
use tracing::{debug, warn};

use super::types::{SessionCollection, SessionSummary};
use crate::constants::{
    CHATS_STORAGE_KEY, DARK_MODE_DISABLED, DARK_MODE_ENABLED, DARK_MODE_STORAGE_KEY,
};
use crate::storage::KeyValueStorage;
use crate::utils::Result;

/// Persists the whole session collection as one blob.
///
/// Every save is a full snapshot overwrite of the `aiChats` key, never an
/// append. Loading is fail-soft: anything unreadable comes back as an empty
/// collection.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Read the persisted collection, empty if absent or corrupt
    pub fn load(&self) -> SessionCollection {
        let blob = match self.storage.get(CHATS_STORAGE_KEY) {
            Ok(Some(blob)) => blob,
            Ok(None) => return SessionCollection::new(),
            Err(e) => {
                warn!("Failed to read stored chats, starting empty: {}", e);
                return SessionCollection::new();
            }
        };

        match serde_json::from_str::<SessionCollection>(&blob) {
            Ok(collection) if collection.is_well_formed() => {
                debug!("Loaded {} stored sessions", collection.len());
                collection
            }
            Ok(_) => {
                warn!("Stored chats contain a malformed turn, starting empty");
                SessionCollection::new()
            }
            Err(e) => {
                warn!("Stored chats are malformed, starting empty: {}", e);
                SessionCollection::new()
            }
        }
    }

    /// Serialize the entire collection and overwrite the stored blob
    pub fn save(&self, collection: &SessionCollection) -> Result<()> {
        let blob = serde_json::to_string(collection)?;
        self.storage.set(CHATS_STORAGE_KEY, &blob)
    }

    /// Erase the stored blob
    pub fn clear(&self) -> Result<()> {
        self.storage.remove(CHATS_STORAGE_KEY)
    }

    /// Whether dark mode was left enabled
    pub fn load_dark_mode(&self) -> bool {
        match self.storage.get(DARK_MODE_STORAGE_KEY) {
            Ok(value) => value.as_deref() == Some(DARK_MODE_ENABLED),
            Err(e) => {
                warn!("Failed to read dark mode preference: {}", e);
                false
            }
        }
    }

    pub fn save_dark_mode(&self, enabled: bool) -> Result<()> {
        let value = if enabled {
            DARK_MODE_ENABLED
        } else {
            DARK_MODE_DISABLED
        };
        self.storage.set(DARK_MODE_STORAGE_KEY, value)
    }
}

/// History list entries, newest session first
pub fn list_sessions_descending(collection: &SessionCollection) -> Vec<SessionSummary> {
    collection
        .iter_descending()
        .map(|(id, session)| SessionSummary {
            id: id.clone(),
            title: session.title.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::{ImageRef, Session, SessionId, Turn};
    use crate::storage::{FileStorage, MemoryStorage};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn memory_store() -> (Arc<MemoryStorage>, SessionStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone());
        (storage, store)
    }

    fn sample_collection() -> SessionCollection {
        let mut collection = SessionCollection::new();

        let mut first = Session::new();
        first.title = "hello".to_string();
        first.history.push(Turn::user("hello"));
        first.history.push(Turn::model("hi there", None));
        collection.insert(SessionId::from("chat_1"), first);

        let mut second = Session::new();
        second.title = "draw a cat".to_string();
        second.history.push(Turn::user("draw a cat"));
        second
            .history
            .push(Turn::model("", Some(ImageRef::Inline(vec![137, 80, 78, 71]))));
        second.history.push(Turn::model(
            "here",
            Some(ImageRef::Url("https://example.com/cat.png".to_string())),
        ));
        collection.insert(SessionId::from("chat_2"), second);

        collection
    }

    #[test]
    fn test_load_absent_is_empty() {
        let (_, store) = memory_store();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_load_malformed_is_empty() {
        let (storage, store) = memory_store();

        storage.set(CHATS_STORAGE_KEY, "{not json").unwrap();
        assert!(store.load().is_empty());

        storage.set(CHATS_STORAGE_KEY, "[1, 2, 3]").unwrap();
        assert!(store.load().is_empty());

        storage
            .set(
                CHATS_STORAGE_KEY,
                r#"{"chat_1": {"title": "x", "history": [{"role": "user", "parts": []}]}}"#,
            )
            .unwrap();
        assert!(store.load().is_empty());

        storage
            .set(
                CHATS_STORAGE_KEY,
                r#"{"chat_1": {"title": "x", "history": [{"role": "model", "parts": [{"text": ""}]}]}}"#,
            )
            .unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_load_round_trip() {
        let (_, store) = memory_store();
        let collection = sample_collection();

        store.save(&collection).unwrap();
        let loaded = store.load();
        assert_eq!(loaded, collection);

        store.save(&loaded).unwrap();
        assert_eq!(store.load(), collection);
    }

    #[test]
    fn test_save_overwrites_whole_snapshot() {
        let (_, store) = memory_store();
        store.save(&sample_collection()).unwrap();

        let mut smaller = SessionCollection::new();
        smaller.insert(SessionId::from("chat_9"), Session::new());
        store.save(&smaller).unwrap();

        assert_eq!(store.load(), smaller);
    }

    #[test]
    fn test_round_trip_through_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(Arc::new(FileStorage::new(temp_dir.path()).unwrap()));
        let collection = sample_collection();

        store.save(&collection).unwrap();

        let reopened = SessionStore::new(Arc::new(FileStorage::new(temp_dir.path()).unwrap()));
        assert_eq!(reopened.load(), collection);
    }

    #[test]
    fn test_reads_browser_era_blob() {
        let (storage, store) = memory_store();
        storage
            .set(
                CHATS_STORAGE_KEY,
                r#"{"chat_1700000000000":{"title":"New Conversation","history":[]},
                    "chat_1700000000001":{"title":"hi","history":[
                        {"role":"user","parts":[{"text":"hi"}]},
                        {"role":"model","parts":[{"text":"","image_base64":"iVBORw=="}]}]}}"#,
            )
            .unwrap();

        let collection = store.load();
        assert_eq!(collection.len(), 2);
        let session = collection
            .get(&SessionId::from("chat_1700000000001"))
            .unwrap();
        assert!(matches!(session.history[1].image(), Some(ImageRef::Inline(_))));
    }

    #[test]
    fn test_clear_removes_blob() {
        let (storage, store) = memory_store();
        store.save(&sample_collection()).unwrap();

        store.clear().unwrap();
        assert_eq!(storage.get(CHATS_STORAGE_KEY).unwrap(), None);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_list_sessions_descending() {
        let mut collection = SessionCollection::new();
        for (id, title) in [("chat_1", "one"), ("chat_5", "five"), ("chat_3", "three")] {
            let mut session = Session::new();
            session.title = title.to_string();
            collection.insert(SessionId::from(id), session);
        }

        let listed: Vec<(String, String)> = list_sessions_descending(&collection)
            .into_iter()
            .map(|s| (s.id.to_string(), s.title))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("chat_5".to_string(), "five".to_string()),
                ("chat_3".to_string(), "three".to_string()),
                ("chat_1".to_string(), "one".to_string()),
            ]
        );
    }

    #[test]
    fn test_dark_mode_preference() {
        let (storage, store) = memory_store();
        assert!(!store.load_dark_mode());

        store.save_dark_mode(true).unwrap();
        assert!(store.load_dark_mode());
        assert_eq!(
            storage.get(DARK_MODE_STORAGE_KEY).unwrap().as_deref(),
            Some("enabled")
        );

        store.save_dark_mode(false).unwrap();
        assert!(!store.load_dark_mode());

        storage.set(DARK_MODE_STORAGE_KEY, "yes").unwrap();
        assert!(!store.load_dark_mode());
    }
}

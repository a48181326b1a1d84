//! Session state shared by every request issued through the client.
//!
//! The [`SessionStore`] is the only mutable state shared across concurrent
//! requests.  It is backed by a [`SessionStorage`], a key/value store that
//! survives restarts, and rehydrates from it on creation.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "accessToken";
/// Storage key holding the JSON-encoded user record.
pub const USER_KEY: &str = "user";

/////////////////////////////////////////////// Session ////////////////////////////////////////////

/// The client-held record of the current authentication state.
///
/// A session without a token never carries a user.
#[derive(Clone, Default, PartialEq)]
pub struct Session {
    token: Option<String>,
    user: Option<Value>,
}

impl Session {
    /// The unauthenticated session.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A session holding `token` and, optionally, the user it belongs to.
    pub fn authenticated(token: impl Into<String>, user: Option<Value>) -> Self {
        Self {
            token: Some(token.into()),
            user,
        }
    }

    /// The bearer token, if authenticated.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The opaque user record, if authenticated and known.
    pub fn user(&self) -> Option<&Value> {
        self.user.as_ref()
    }

    /// Returns true if a token is present.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("user", &self.user)
            .finish()
    }
}

/////////////////////////////////////////////// Storage ////////////////////////////////////////////

/// Durable key/value storage for the session.
pub trait SessionStorage: Send + Sync {
    /// Read the value stored under `key`.
    fn get_item(&self, key: &str) -> io::Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> io::Result<()>;

    /// Remove `key`.  Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> io::Result<()>;
}

/// In-memory storage.  Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage pre-populated with `items`.
    pub fn with_items<K: Into<String>, V: Into<String>>(
        items: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        let items = items
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            items: Mutex::new(items),
        }
    }

    fn items(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.items().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> io::Result<()> {
        self.items().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> io::Result<()> {
        self.items().remove(key);
        Ok(())
    }
}

/// Storage kept as a JSON object in a single file.
///
/// Every mutation rewrites the file before returning.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Use the file at `path`.  The file is created on first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> io::Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e),
        }
    }

    fn store(&self, items: &BTreeMap<String, String>) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(items)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, content)
    }

    fn modify(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> io::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut items = self.load()?;
        f(&mut items);
        self.store(&items)
    }
}

impl SessionStorage for FileStorage {
    fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.load()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> io::Result<()> {
        self.modify(|items| {
            items.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> io::Result<()> {
        self.modify(|items| {
            items.remove(key);
        })
    }
}

//////////////////////////////////////////// SessionStore //////////////////////////////////////////

struct SessionState {
    session: Session,
    // True once the current expiry episode has been invalidated.
    expired: bool,
}

struct Inner {
    storage: Box<dyn SessionStorage>,
    state: Mutex<SessionState>,
}

/// Shared holder of the current [`Session`].
///
/// Cloning the store yields another handle onto the same session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    /// Create a store over `storage`, rehydrating any persisted session.
    pub fn create(storage: impl SessionStorage + 'static) -> Self {
        let session = rehydrate(&storage);
        Self {
            inner: Arc::new(Inner {
                storage: Box::new(storage),
                state: Mutex::new(SessionState {
                    session,
                    expired: false,
                }),
            }),
        }
    }

    /// Create a store that persists nothing.
    pub fn in_memory() -> Self {
        Self::create(MemoryStorage::new())
    }

    /// The current session.
    pub fn get(&self) -> Session {
        self.state().session.clone()
    }

    /// Replace the session and persist it.  Opens a new expiry episode.
    pub fn set(&self, token: impl Into<String>, user: Option<Value>) {
        let session = Session::authenticated(token, user);
        let mut state = self.state();
        self.persist(&session);
        state.session = session;
        state.expired = false;
    }

    /// Reset to the empty session.  Idempotent.
    pub fn clear(&self) {
        let mut state = self.state();
        self.persist(&Session::empty());
        state.session = Session::empty();
    }

    /// Clear the session on behalf of a rejected request.
    ///
    /// Returns true only for the first invalidation of the current expiry
    /// episode, no matter how many requests are rejected concurrently.
    pub fn expire(&self) -> bool {
        let mut state = self.state();
        self.persist(&Session::empty());
        state.session = Session::empty();
        let first = !state.expired;
        state.expired = true;
        first
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, session: &Session) {
        let storage = &self.inner.storage;
        let result = match (session.token(), session.user()) {
            (Some(token), user) => storage.set_item(TOKEN_KEY, token).and_then(|_| match user {
                Some(user) => storage.set_item(USER_KEY, &user.to_string()),
                None => storage.remove_item(USER_KEY),
            }),
            (None, _) => storage
                .remove_item(TOKEN_KEY)
                .and_then(|_| storage.remove_item(USER_KEY)),
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, "could not persist session");
        }
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &self.get())
            .finish()
    }
}

fn rehydrate(storage: &dyn SessionStorage) -> Session {
    let token = match storage.get_item(TOKEN_KEY) {
        Ok(Some(token)) if !token.is_empty() => token,
        Ok(_) => return Session::empty(),
        Err(err) => {
            tracing::warn!(error = %err, "could not read persisted session");
            return Session::empty();
        }
    };
    let user = match storage.get_item(USER_KEY) {
        Ok(Some(user)) => match serde_json::from_str::<Value>(&user) {
            Ok(user) => Some(user),
            Err(err) => {
                tracing::warn!(error = %err, "discarding unparseable persisted user");
                None
            }
        },
        Ok(None) => None,
        Err(err) => {
            tracing::warn!(error = %err, "could not read persisted user");
            None
        }
    };
    Session::authenticated(token, user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn starts_empty() {
        let store = SessionStore::in_memory();
        assert_eq!(store.get(), Session::empty());
        assert!(!store.get().is_authenticated());
    }

    #[test]
    fn set_then_get() {
        let store = SessionStore::in_memory();
        store.set("tok-1", Some(json!({"id": 7, "role": "ShopOwner"})));
        let session = store.get();
        assert_eq!(session.token(), Some("tok-1"));
        assert_eq!(session.user(), Some(&json!({"id": 7, "role": "ShopOwner"})));
    }

    #[test]
    fn clear_is_idempotent() {
        let store = SessionStore::in_memory();
        store.set("tok-1", Some(json!({"id": 7})));
        store.clear();
        let once = store.get();
        store.clear();
        assert_eq!(store.get(), once);
        assert_eq!(once, Session::empty());
    }

    #[test]
    fn handles_share_state() {
        let store = SessionStore::in_memory();
        let other = store.clone();
        store.set("tok-1", None);
        assert_eq!(other.get().token(), Some("tok-1"));
        other.clear();
        assert!(!store.get().is_authenticated());
    }

    #[test]
    fn expire_reports_first_invalidation_once_per_episode() {
        let store = SessionStore::in_memory();
        store.set("tok-1", None);
        assert!(store.expire());
        assert!(!store.expire());
        assert_eq!(store.get(), Session::empty());
        store.set("tok-2", None);
        assert!(store.expire());
        assert!(!store.expire());
    }

    #[test]
    fn rehydrates_from_storage() {
        let storage = MemoryStorage::with_items([
            (TOKEN_KEY, "persisted"),
            (USER_KEY, r#"{"username":"linh"}"#),
        ]);
        let store = SessionStore::create(storage);
        let session = store.get();
        assert_eq!(session.token(), Some("persisted"));
        assert_eq!(session.user(), Some(&json!({"username": "linh"})));
    }

    #[test]
    fn user_without_token_is_not_rehydrated() {
        let storage = MemoryStorage::with_items([(USER_KEY, r#"{"username":"linh"}"#)]);
        let store = SessionStore::create(storage);
        assert_eq!(store.get(), Session::empty());
    }

    #[test]
    fn bad_user_json_keeps_token() {
        let storage = MemoryStorage::with_items([(TOKEN_KEY, "persisted"), (USER_KEY, "{oops")]);
        let session = SessionStore::create(storage).get();
        assert_eq!(session.token(), Some("persisted"));
        assert_eq!(session.user(), None);
    }

    #[test]
    fn debug_redacts_token() {
        let session = Session::authenticated("secret-token", None);
        let debug = format!("{session:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn file_storage_survives_reload() {
        let path = std::env::temp_dir().join(format!(
            "flyora-session-{}-{}.json",
            std::process::id(),
            line!()
        ));
        let _ = fs::remove_file(&path);

        let store = SessionStore::create(FileStorage::new(&path));
        store.set("on-disk", Some(json!({"id": 3})));
        drop(store);

        let reloaded = SessionStore::create(FileStorage::new(&path));
        assert_eq!(reloaded.get().token(), Some("on-disk"));
        assert_eq!(reloaded.get().user(), Some(&json!({"id": 3})));

        reloaded.clear();
        let cleared = SessionStore::create(FileStorage::new(&path));
        assert_eq!(cleared.get(), Session::empty());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn file_storage_missing_file_reads_empty() {
        let storage = FileStorage::new(std::env::temp_dir().join("flyora-does-not-exist.json"));
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
    }
}

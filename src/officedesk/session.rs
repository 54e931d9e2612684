//! Authentication session.
//!
//! The bearer token lives in a [`TokenStore`] owned by a [`Session`], which is
//! created at startup and handed to the HTTP client when it is built. There is
//! no ambient/global token: whoever holds the session decides where the token
//! is kept and when it goes away.

use crate::error::Result;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// Persistence for the bearer token. Only read/write/clear are needed.
pub trait TokenStore: Send + Sync {
    fn read(&self) -> Result<Option<String>>;
    fn write(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Keeps the token for the lifetime of the process only.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn read(&self) -> Result<Option<String>> {
        Ok(lock(&self.token).clone())
    }

    fn write(&self, token: &str) -> Result<()> {
        *lock(&self.token) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *lock(&self.token) = None;
        Ok(())
    }
}

/// Keeps the token in a single file (one line, no framing).
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

struct SessionInner {
    store: Box<dyn TokenStore>,
    login_route: String,
    redirect: Mutex<Option<String>>,
}

/// Shared handle to the token store plus the pending login redirect.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    pub fn new(store: impl TokenStore + 'static, login_route: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                store: Box::new(store),
                login_route: login_route.into(),
                redirect: Mutex::new(None),
            }),
        }
    }

    /// A session with an in-memory store and the default `/login` route.
    pub fn in_memory() -> Self {
        Self::new(MemoryTokenStore::new(), "/login")
    }

    pub fn token(&self) -> Result<Option<String>> {
        self.inner.store.read()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.token(), Ok(Some(_)))
    }

    pub fn login(&self, token: &str) -> Result<()> {
        self.inner.store.write(token)?;
        *lock(&self.inner.redirect) = None;
        info!("session token stored");
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        self.inner.store.clear()?;
        info!("session token cleared");
        Ok(())
    }

    /// Called on a 401: forget the token and ask the UI to go to the login route.
    ///
    /// Returns the login route. A failure to clear the store is logged, not
    /// returned; the redirect is recorded either way.
    pub fn expire(&self) -> String {
        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "failed to clear token store on expiry");
        }
        let route = self.inner.login_route.clone();
        *lock(&self.inner.redirect) = Some(route.clone());
        info!(route = %route, "session expired, login redirect requested");
        route
    }

    pub fn login_route(&self) -> &str {
        &self.inner.login_route
    }

    pub fn pending_redirect(&self) -> Option<String> {
        lock(&self.inner.redirect).clone()
    }

    pub fn take_redirect(&self) -> Option<String> {
        lock(&self.inner.redirect).take()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.read().unwrap(), None);
        store.write("abc").unwrap();
        assert_eq!(store.read().unwrap().as_deref(), Some("abc"));
        store.clear().unwrap();
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn file_store_persists_and_clears() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("token");
        let store = FileTokenStore::new(&path);

        assert_eq!(store.read().unwrap(), None);
        store.write("tok-1").unwrap();
        assert_eq!(FileTokenStore::new(&path).read().unwrap().as_deref(), Some("tok-1"));

        store.clear().unwrap();
        assert!(!path.exists());
        // Clearing twice is fine.
        store.clear().unwrap();
    }

    #[test]
    fn blank_token_file_reads_as_none() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("token");
        fs::write(&path, "  \n").unwrap();
        assert_eq!(FileTokenStore::new(&path).read().unwrap(), None);
    }

    #[test]
    fn expire_clears_token_and_records_redirect() {
        let session = Session::new(MemoryTokenStore::with_token("abc"), "/acceso");
        assert!(session.is_authenticated());

        let route = session.expire();
        assert_eq!(route, "/acceso");
        assert!(!session.is_authenticated());
        assert_eq!(session.pending_redirect().as_deref(), Some("/acceso"));
        assert_eq!(session.take_redirect().as_deref(), Some("/acceso"));
        assert_eq!(session.pending_redirect(), None);
    }

    #[test]
    fn login_cancels_pending_redirect() {
        let session = Session::in_memory();
        session.expire();
        session.login("fresh").unwrap();
        assert_eq!(session.pending_redirect(), None);
        assert_eq!(session.token().unwrap().as_deref(), Some("fresh"));
    }
}

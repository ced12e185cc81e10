//! The injected save operation and its notification hooks.
//!
//! The controller knows nothing about networks or disks: everything it
//! persists goes through a [`SaveHandler`].

use std::future::Future;
use std::sync::Arc;

use autosave_core::{KeyValueStore, SaveError};
use serde::Serialize;

/// Persists one complete form snapshot. Enables mock injection for testing.
///
/// Must resolve `Ok` on success and `Err` with a human-readable message on
/// failure. The controller never calls it concurrently for one session.
pub trait SaveHandler<T>: Send + Sync + 'static {
    fn save(&self, payload: T) -> impl Future<Output = Result<(), SaveError>> + Send;
}

impl<T, F, Fut> SaveHandler<T> for F
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), SaveError>> + Send,
{
    fn save(&self, payload: T) -> impl Future<Output = Result<(), SaveError>> + Send {
        self(payload)
    }
}

/// Writes each snapshot as JSON under one key of a [`KeyValueStore`].
pub struct StoreSaveHandler<S> {
    store: Arc<S>,
    key: String,
}

impl<S: KeyValueStore + 'static> StoreSaveHandler<S> {
    pub fn new(store: Arc<S>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<T, S> SaveHandler<T> for StoreSaveHandler<S>
where
    T: Serialize + Send + 'static,
    S: KeyValueStore + 'static,
{
    async fn save(&self, payload: T) -> Result<(), SaveError> {
        let json = serde_json::to_string(&payload).map_err(SaveError::from_source)?;
        let store = Arc::clone(&self.store);
        let key = self.key.clone();
        // Stores may block on file IO.
        tokio::task::spawn_blocking(move || store.set(&key, &json))
            .await
            .map_err(SaveError::from_source)?
            .map_err(SaveError::from)
    }
}

type SuccessHook = Arc<dyn Fn() + Send + Sync>;
type ErrorHook = Arc<dyn Fn(&SaveError) + Send + Sync>;

/// Fire-and-forget notifications, invoked once per save attempt.
#[derive(Clone, Default)]
pub struct SaveHooks {
    on_success: Option<SuccessHook>,
    on_error: Option<ErrorHook>,
}

impl SaveHooks {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_success(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn on_error(mut self, hook: impl Fn(&SaveError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(hook));
        self
    }

    pub(crate) fn success(&self) {
        if let Some(hook) = &self.on_success {
            hook();
        }
    }

    pub(crate) fn error(&self, err: &SaveError) {
        if let Some(hook) = &self.on_error {
            hook(err);
        }
    }
}

impl std::fmt::Debug for SaveHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveHooks")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

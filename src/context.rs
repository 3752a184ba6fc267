//! Per-request scratch space shared between middleware and the handler.
//!
//! Every request owns exactly one [`RequestContext`], created by the
//! dispatcher and carried inside [`Request`](crate::Request). There is no
//! process-wide registry: a context is only reachable through the request it
//! was created for, so two concurrent requests can never see each other's
//! entries, and locking is per request rather than global.
//!
//! The handle is a cheap `Arc` clone. Middleware that must act after the
//! inner chain has consumed the request (see
//! [`clear_context`](crate::middleware::clear_context)) keep a clone.
//!
//! ```rust
//! use steep::context::RequestContext;
//!
//! let ctx = RequestContext::new();
//! ctx.set("user", String::from("jemo"));
//!
//! assert_eq!(ctx.get::<String>("user").as_deref().map(String::as_str), Some("jemo"));
//! assert!(ctx.get::<u32>("user").is_none());
//!
//! ctx.clear();
//! assert!(ctx.get::<String>("user").is_none());
//! ```

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Well-known context keys written by the built-in router and middleware.
pub mod keys {
    /// Path parameters captured by the router, a [`Params`](crate::Params).
    pub const PARAMS: &str = "params";
    /// Decoded request body, written by [`json_body`](crate::middleware::json_body).
    pub const BODY: &str = "body";
    /// Authenticated principal, a [`User`](crate::middleware::User).
    pub const USER: &str = "user";
}

type Value = Arc<dyn Any + Send + Sync>;

/// Key/value bag scoped to one in-flight request.
#[derive(Clone, Default)]
pub struct RequestContext {
    entries: Arc<Mutex<HashMap<String, Value>>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set<T>(&self, key: impl Into<String>, value: T)
    where
        T: Any + Send + Sync,
    {
        self.lock().insert(key.into(), Arc::new(value));
    }

    /// Returns the value under `key` if present and of type `T`.
    ///
    /// Absence and a type mismatch both yield `None`; use
    /// [`require`](Self::require) when the caller needs to tell them apart.
    pub fn get<T>(&self, key: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.require(key).ok()
    }

    /// Like [`get`](Self::get), but reports why the value is unavailable.
    pub fn require<T>(&self, key: &str) -> Result<Arc<T>, ContextError>
    where
        T: Any + Send + Sync,
    {
        let value = self
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| ContextError::Missing { key: key.to_owned() })?;

        value.downcast::<T>().map_err(|_| ContextError::TypeMismatch {
            key: key.to_owned(),
            expected: type_name::<T>(),
        })
    }

    /// Removes and returns the value under `key`, cloning only if another
    /// handle to it is still alive.
    pub fn take<T>(&self, key: &str) -> Result<T, ContextError>
    where
        T: Any + Send + Sync + Clone,
    {
        let value = self.require::<T>(key)?;
        self.lock().remove(key);
        Ok(Arc::unwrap_or_clone(value))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops every entry. Safe to call more than once.
    pub fn clear(&self) {
        self.lock().clear();
    }

    // A panic while the lock is held cannot leave the map half-written, so a
    // poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Value>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.lock();
        let mut keys: Vec<&str> = entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("RequestContext").field("keys", &keys).finish()
    }
}

/// Why a context value could not be read.
///
/// Both cases are programming errors (a handler registered without the
/// middleware that feeds it, or reading with the wrong type). Converting into
/// [`ApiError`](crate::ApiError) logs the detail and answers 500.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("no value stored under `{key}`")]
    Missing { key: String },

    #[error("value under `{key}` is not a `{expected}`")]
    TypeMismatch { key: String, expected: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_on_absent_key_is_none() {
        let ctx = RequestContext::new();
        assert!(ctx.get::<String>("nope").is_none());
        assert_eq!(
            ctx.require::<String>("nope").unwrap_err(),
            ContextError::Missing { key: "nope".into() }
        );
    }

    #[test]
    fn require_reports_type_mismatch() {
        let ctx = RequestContext::new();
        ctx.set(keys::USER, 7_u64);

        let err = ctx.require::<String>(keys::USER).unwrap_err();
        assert!(matches!(err, ContextError::TypeMismatch { ref key, .. } if key == "user"));
        assert_eq!(*ctx.require::<u64>(keys::USER).unwrap(), 7);
    }

    #[test]
    fn clones_share_entries() {
        let ctx = RequestContext::new();
        let handle = ctx.clone();
        handle.set("k", "v".to_owned());

        assert!(ctx.contains("k"));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn clear_is_idempotent() {
        let ctx = RequestContext::new();
        ctx.set(keys::BODY, vec![1_u8, 2, 3]);

        ctx.clear();
        ctx.clear();

        assert!(ctx.is_empty());
        assert!(ctx.get::<Vec<u8>>(keys::BODY).is_none());
    }

    #[test]
    fn take_removes_the_entry() {
        let ctx = RequestContext::new();
        ctx.set(keys::BODY, String::from("payload"));

        assert_eq!(ctx.take::<String>(keys::BODY).unwrap(), "payload");
        assert!(!ctx.contains(keys::BODY));
    }

    #[test]
    fn separate_contexts_are_isolated() {
        let a = RequestContext::new();
        let b = RequestContext::new();
        a.set("only-a", 1_i32);

        assert!(b.get::<i32>("only-a").is_none());
    }

    #[test]
    fn debug_lists_keys_only() {
        let ctx = RequestContext::new();
        ctx.set("b", 1_u8);
        ctx.set("a", 2_u8);
        assert_eq!(format!("{ctx:?}"), r#"RequestContext { keys: ["a", "b"] }"#);
    }
}

//! Stored handwritten signature used to sign generated reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::storage::KeyValueStore;

/// Storage key for the current user's signature.
pub const SIGNATURE_KEY: &str = "userSignature";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSignature {
    /// Image as a `data:image/...` URL.
    pub signature: String,
    /// Server-side object key, once uploaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_key: Option<String>,
    /// Printed name under the signature.
    pub name: String,
    pub timestamp: DateTime<Utc>,
}

impl StoredSignature {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.signature.is_empty() {
            return Err(CoreError::InvalidSignature("empty image".into()));
        }
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidSignature("empty name".into()));
        }
        if !self.signature.starts_with("data:image/") {
            return Err(CoreError::InvalidSignature(
                "image must be a data:image/ URL".into(),
            ));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

pub struct SignatureStore<S> {
    store: S,
}

impl<S: KeyValueStore> SignatureStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn save(
        &self,
        signature: impl Into<String>,
        name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<StoredSignature, CoreError> {
        let record = StoredSignature {
            signature: signature.into(),
            signature_key: None,
            name: name.into(),
            timestamp: now,
        };
        record.validate()?;
        self.store.set(SIGNATURE_KEY, &serde_json::to_string(&record)?)?;
        Ok(record)
    }

    /// Corrupt entries read as absent.
    pub fn get(&self) -> Result<Option<StoredSignature>, CoreError> {
        let Some(raw) = self.store.get(SIGNATURE_KEY)? else {
            return Ok(None);
        };
        Ok(serde_json::from_str(&raw).ok())
    }

    pub fn exists(&self) -> Result<bool, CoreError> {
        Ok(self.get()?.is_some())
    }

    pub fn remove(&self) -> Result<(), CoreError> {
        self.store.remove(SIGNATURE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-02T09:00:00Z")
            .expect("valid RFC3339")
            .with_timezone(&Utc)
    }

    #[test]
    fn save_then_get() {
        let signatures = SignatureStore::new(MemoryStore::new());
        assert!(!signatures.exists().expect("exists"));

        let saved = signatures.save(PNG, "Ana Pérez", t0()).expect("save");
        let loaded = signatures.get().expect("get").expect("present");
        assert_eq!(loaded, saved);
        assert!(signatures.exists().expect("exists"));
    }

    #[test]
    fn stored_json_is_camel_case() {
        let store = MemoryStore::new();
        let signatures = SignatureStore::new(&store);
        signatures.save(PNG, "Ana", t0()).expect("save");

        let raw = store.get(SIGNATURE_KEY).expect("get").expect("present");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["name"], "Ana");
        assert!(value.get("signatureKey").is_none());
        assert!(value["timestamp"].as_str().is_some());
    }

    #[test]
    fn rejects_non_image_payload() {
        let signatures = SignatureStore::new(MemoryStore::new());
        let err = signatures.save("hello", "Ana", t0()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidSignature(_)));
        assert!(!signatures.exists().expect("exists"));
    }

    #[test]
    fn rejects_blank_name() {
        let signatures = SignatureStore::new(MemoryStore::new());
        assert!(signatures.save(PNG, "  ", t0()).is_err());
    }

    #[test]
    fn corrupt_entry_reads_as_absent() {
        let store = MemoryStore::new();
        store.set(SIGNATURE_KEY, "{not json").expect("set");
        let signatures = SignatureStore::new(&store);
        assert!(signatures.get().expect("get").is_none());
    }

    #[test]
    fn remove_clears() {
        let signatures = SignatureStore::new(MemoryStore::new());
        signatures.save(PNG, "Ana", t0()).expect("save");
        signatures.remove().expect("remove");
        assert!(signatures.get().expect("get").is_none());
    }
}

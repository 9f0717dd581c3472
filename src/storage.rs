//! Local persisted state: a key/value store of JSON files under a data
//! directory, and the saved resume and session user kept in it.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, error};
use tempfile::NamedTempFile;

use crate::error::StoreError;
use crate::model::ResumeDocument;
use crate::session::{SessionContext, UserProfile};
use crate::validation::validate_json;

pub const SAVED_RESUME_KEY: &str = "savedResume";
pub const USER_KEY: &str = "user";

/// One `<key>.json` file per item.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the item atomically.
    pub fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(self.path_for(key)).map_err(|e| e.error)?;
        debug!("stored `{key}` ({} bytes)", value.len());
        Ok(())
    }

    /// Removing a missing item succeeds.
    pub fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// The saved resume draft and the session user.
#[derive(Debug, Clone)]
pub struct ResumeStore {
    storage: LocalStorage,
}

impl ResumeStore {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    /// The saved resume, validated. Fails with [`StoreError::Invalid`] when
    /// the stored value does not satisfy the schema.
    pub fn try_load(&self) -> Result<Option<ResumeDocument>, StoreError> {
        let Some(raw) = self.storage.get_item(SAVED_RESUME_KEY)? else {
            return Ok(None);
        };
        Ok(Some(validate_json(&raw)?))
    }

    /// The saved resume. An invalid entry is logged, removed and treated as
    /// absent.
    pub fn load(&self) -> Result<Option<ResumeDocument>, StoreError> {
        match self.try_load() {
            Err(StoreError::Invalid(e)) => {
                error!("discarding saved resume: {e}");
                self.storage.remove_item(SAVED_RESUME_KEY)?;
                Ok(None)
            }
            other => other,
        }
    }

    pub fn save(&self, document: &ResumeDocument) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(document)?;
        self.storage.set_item(SAVED_RESUME_KEY, &json)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.storage.remove_item(SAVED_RESUME_KEY)
    }

    /// Session restored from the stored user, if any.
    pub fn load_session(&self) -> Result<SessionContext, StoreError> {
        let user = match self.storage.get_item(USER_KEY)? {
            Some(raw) => Some(serde_json::from_str::<UserProfile>(&raw)?),
            None => None,
        };
        Ok(SessionContext::new(user))
    }

    /// Persist the session user, or forget it when signed out.
    pub fn save_session(&self, session: &SessionContext) -> Result<(), StoreError> {
        match session.user() {
            Some(user) => self.storage.set_item(USER_KEY, &serde_json::to_string(user)?),
            None => self.storage.remove_item(USER_KEY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Experience;
    use crate::session::AuthEvent;

    fn store() -> (tempfile::TempDir, ResumeStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ResumeStore::new(LocalStorage::new(dir.path().join("data")));
        (dir, store)
    }

    fn doc() -> ResumeDocument {
        let mut doc = ResumeDocument::empty();
        doc.personal_info.first_name = "Jane".into();
        doc.personal_info.last_name = "Doe".into();
        doc.personal_info.email = "jane@example.com".into();
        doc.personal_info.phone = "555-0100".into();
        doc.add_experience(Experience::new("Acme", "Engineer", "2020-01"));
        doc
    }

    #[test]
    fn items_round_trip() {
        let (_dir, store) = store();
        let storage = store.storage();
        assert_eq!(storage.get_item("k").unwrap(), None);
        storage.set_item("k", "v1").unwrap();
        storage.set_item("k", "v2").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v2"));
        storage.remove_item("k").unwrap();
        storage.remove_item("k").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);
    }

    #[test]
    fn saved_resume_round_trips() {
        let (_dir, store) = store();
        assert!(store.load().unwrap().is_none());
        let doc = doc();
        store.save(&doc).unwrap();
        assert_eq!(store.load().unwrap(), Some(doc));
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn invalid_saved_resume_is_removed() {
        let (_dir, store) = store();
        store
            .storage()
            .set_item(SAVED_RESUME_KEY, r#"{"personalInfo":{"firstName":"J"}}"#)
            .unwrap();
        assert!(matches!(store.try_load(), Err(StoreError::Invalid(_))));
        assert!(store.load().unwrap().is_none());
        assert_eq!(store.storage().get_item(SAVED_RESUME_KEY).unwrap(), None);
    }

    #[test]
    fn session_user_persists() {
        let (_dir, store) = store();
        let mut session = store.load_session().unwrap();
        assert!(!session.is_signed_in());

        session.apply(AuthEvent::SignedIn(UserProfile {
            name: "Jane".into(),
            email: "jane@example.com".into(),
        }));
        store.save_session(&session).unwrap();
        assert_eq!(store.load_session().unwrap(), session);

        session.apply(AuthEvent::SignedOut);
        store.save_session(&session).unwrap();
        assert!(!store.load_session().unwrap().is_signed_in());
    }
}

//! Persisted profile state: the signed-in session and accessibility
//! preferences.
//!
//! One flat JSON record per concern, read once at startup and written on
//! change. There is no schema versioning; losing forward compatibility on a
//! format change is an accepted risk.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;

const SESSION_FILE: &str = "session.json";
const ACCESSIBILITY_FILE: &str = "accessibility.json";

/// Who is signed in on this device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Passenger,
    Conductor,
    Operator,
}

/// The "current session" record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub role: Role,
    pub username: String,
}

/// Accessibility preferences. Kept across logout so the UI stays usable for
/// the same rider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccessibilityPrefs {
    pub high_contrast: bool,
    pub large_text: bool,
    pub voice_guidance: bool,
}

/// Key-value profile storage over a directory.
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read_record<T: for<'de> Deserialize<'de>>(
        &self,
        file: &str,
    ) -> Result<Option<T>, CoreError> {
        let path = self.dir.join(file);
        if !path.exists() {
            debug!(file, "no profile record on disk");
            return Ok(None);
        }
        let data = fs::read(&path).map_err(|err| storage_error(&path, err))?;
        let record = serde_json::from_slice(&data)
            .map_err(|err| CoreError::Storage(format!("{}: {err}", path.display())))?;
        Ok(Some(record))
    }

    fn write_record<T: Serialize>(&self, file: &str, record: &T) -> Result<(), CoreError> {
        fs::create_dir_all(&self.dir).map_err(|err| storage_error(&self.dir, err))?;
        let path = self.dir.join(file);
        let data = serde_json::to_vec_pretty(record)
            .map_err(|err| CoreError::Storage(err.to_string()))?;
        fs::write(&path, data).map_err(|err| storage_error(&path, err))
    }

    /// The persisted session, if someone is signed in.
    pub fn load_session(&self) -> Result<Option<SessionRecord>, CoreError> {
        self.read_record(SESSION_FILE)
    }

    pub fn save_session(&self, session: &SessionRecord) -> Result<(), CoreError> {
        self.write_record(SESSION_FILE, session)
    }

    /// Sign out: removes the session record, keeps accessibility prefs.
    pub fn clear_session(&self) -> Result<(), CoreError> {
        let path = self.dir.join(SESSION_FILE);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(storage_error(&path, err)),
        }
    }

    /// Persisted accessibility preferences; all-off defaults when absent.
    pub fn load_accessibility(&self) -> Result<AccessibilityPrefs, CoreError> {
        Ok(self
            .read_record(ACCESSIBILITY_FILE)?
            .unwrap_or_default())
    }

    pub fn save_accessibility(&self, prefs: &AccessibilityPrefs) -> Result<(), CoreError> {
        self.write_record(ACCESSIBILITY_FILE, prefs)
    }
}

fn storage_error(path: &Path, err: std::io::Error) -> CoreError {
    CoreError::Storage(format!("{}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ProfileStore::new(dir.path());

        assert_eq!(store.load_session().expect("load"), None);

        let session = SessionRecord {
            role: Role::Passenger,
            username: "felix".to_string(),
        };
        store.save_session(&session).expect("save");
        assert_eq!(store.load_session().expect("load"), Some(session));
    }

    #[test]
    fn clear_session_keeps_accessibility() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ProfileStore::new(dir.path());

        store
            .save_session(&SessionRecord {
                role: Role::Conductor,
                username: "ramon".to_string(),
            })
            .expect("save session");
        let prefs = AccessibilityPrefs {
            high_contrast: true,
            large_text: false,
            voice_guidance: true,
        };
        store.save_accessibility(&prefs).expect("save prefs");

        store.clear_session().expect("clear");
        assert_eq!(store.load_session().expect("load"), None);
        assert_eq!(store.load_accessibility().expect("load"), prefs);

        // Clearing again is fine.
        store.clear_session().expect("clear again");
    }

    #[test]
    fn accessibility_defaults_to_all_off() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ProfileStore::new(dir.path());

        assert_eq!(
            store.load_accessibility().expect("load"),
            AccessibilityPrefs::default()
        );
    }

    #[test]
    fn malformed_record_surfaces_storage_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(SESSION_FILE), b"not json").expect("write");
        let store = ProfileStore::new(dir.path());

        assert!(matches!(
            store.load_session(),
            Err(CoreError::Storage(_))
        ));
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Operator).expect("serialize");
        assert_eq!(json, "\"operator\"");
    }
}

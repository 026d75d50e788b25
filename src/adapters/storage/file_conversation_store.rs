//! File-based Conversation Store Adapter
//!
//! Stores each conversation as a YAML file under
//! `<base>/<business_unit>/<person_id>.yaml`. Writes go to a temporary file
//! in the same directory and are renamed into place, so a reader never sees
//! a partially written record.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::domain::conversation::ConversationState;
use crate::domain::foundation::ConversationKey;
use crate::ports::{check_version, ConversationStore, StoreError};

/// File-based storage for conversation records
#[derive(Debug)]
pub struct FileConversationStore {
    base_path: PathBuf,
    /// Serializes the read-check-write sequence of saves in this process.
    write_lock: Mutex<()>,
}

impl FileConversationStore {
    /// Create a new file store rooted at `base_path`
    ///
    /// # Example
    /// ```ignore
    /// let store = FileConversationStore::new("./data/conversations");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    fn unit_dir(&self, key: &ConversationKey) -> Result<PathBuf, StoreError> {
        Ok(self.base_path.join(single_segment(key.business_unit.as_str())?))
    }

    fn record_path(&self, key: &ConversationKey) -> Result<PathBuf, StoreError> {
        let file = format!("{}.yaml", single_segment(key.person_id.as_str())?);
        Ok(self.unit_dir(key)?.join(file))
    }

    async fn read_record(&self, key: &ConversationKey) -> Result<Option<ConversationState>, StoreError> {
        let path = self.record_path(key)?;
        let yaml = match fs::read_to_string(&path).await {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };

        let state = serde_yaml::from_str(&yaml)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Some(state))
    }
}

/// Accepts a key part only if it names exactly one entry directly under its
/// parent directory.
fn single_segment(part: &str) -> Result<&str, StoreError> {
    let mut components = Path::new(part).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !part.contains('\\') => Ok(part),
        _ => Err(StoreError::InvalidKey(format!(
            "'{}' does not name a single path segment",
            part
        ))),
    }
}

#[async_trait]
impl ConversationStore for FileConversationStore {
    async fn load(&self, key: &ConversationKey) -> Result<Option<ConversationState>, StoreError> {
        self.read_record(key).await
    }

    async fn save(&self, state: &ConversationState) -> Result<(), StoreError> {
        let key = state.key();
        let _guard = self.write_lock.lock().await;

        let stored = self.read_record(&key).await?.map(|r| r.version);
        check_version(&key, stored, state.version)?;

        let yaml = serde_yaml::to_string(state)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let dir = self.unit_dir(&key)?;
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        let final_path = self.record_path(&key)?;
        let temp_path = final_path.with_extension("yaml.tmp");
        fs::write(&temp_path, yaml)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        fs::rename(&temp_path, &final_path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, key: &ConversationKey) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(self.record_path(key)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e.to_string())),
        }
    }
}

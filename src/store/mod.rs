pub mod keys;
pub mod operations;
pub mod trees;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Db;
use thiserror::Error;

/// Document store: one sled tree per collection, JSON-encoded documents.
#[derive(Debug)]
pub struct Store {
    db: Db,
    pub users: sled::Tree,
    pub diagnostics: sled::Tree,
    pub sessions: sled::Tree,
    pub homework: sled::Tree,
    pub lesson_progress: sled::Tree,
    pub lesson_cache: sled::Tree,
    pub schedule_logs: sled::Tree,
    pub schedule_alerts: sled::Tree,
    pub push_subscriptions: sled::Tree,
    pub notification_dispatch: sled::Tree,
    pub adaptations: sled::Tree,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Store {
    pub fn open(sled_path: &str) -> Result<Self, StoreError> {
        let db = sled::open(sled_path)?;
        let users = db.open_tree(trees::USERS)?;
        let diagnostics = db.open_tree(trees::DIAGNOSTICS)?;
        let sessions = db.open_tree(trees::SESSIONS)?;
        let homework = db.open_tree(trees::HOMEWORK)?;
        let lesson_progress = db.open_tree(trees::LESSON_PROGRESS)?;
        let lesson_cache = db.open_tree(trees::LESSON_CACHE)?;
        let schedule_logs = db.open_tree(trees::SCHEDULE_LOGS)?;
        let schedule_alerts = db.open_tree(trees::SCHEDULE_ALERTS)?;
        let push_subscriptions = db.open_tree(trees::PUSH_SUBSCRIPTIONS)?;
        let notification_dispatch = db.open_tree(trees::NOTIFICATION_DISPATCH)?;
        let adaptations = db.open_tree(trees::ADAPTATIONS)?;

        Ok(Self {
            db,
            users,
            diagnostics,
            sessions,
            homework,
            lesson_progress,
            lesson_cache,
            schedule_logs,
            schedule_alerts,
            push_subscriptions,
            notification_dispatch,
            adaptations,
        })
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    pub fn raw_db(&self) -> &Db {
        &self.db
    }

    pub(crate) fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(value)?)
    }

    pub(crate) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

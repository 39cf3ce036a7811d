//! Application state shared by every API request.
//!
//! Holds the resolved configuration and the in-memory session registry.
//! Database connections are opened per call, never shared.

use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::AppConfig;
use crate::db;
use crate::session::SessionStore;

pub struct CoreState {
    config: AppConfig,
    sessions: RwLock<SessionStore>,
}

impl CoreState {
    pub fn new(config: AppConfig) -> Self {
        let sessions = SessionStore::with_hours(config.security_settings.token_expiration_hours);
        Self {
            config,
            sessions: RwLock::new(sessions),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn db_path(&self) -> &Path {
        &self.config.database_path
    }

    /// Open a fresh database connection (migrations are idempotent).
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(self.db_path()).map_err(CoreError::Database)
    }

    pub fn read_sessions(&self) -> Result<RwLockReadGuard<'_, SessionStore>, CoreError> {
        self.sessions.read().map_err(|_| CoreError::LockPoisoned)
    }

    pub fn write_sessions(&self) -> Result<RwLockWriteGuard<'_, SessionStore>, CoreError> {
        self.sessions.write().map_err(|_| CoreError::LockPoisoned)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(db::DatabaseError),
}

/// State backed by a throwaway database file, for tests.
#[cfg(test)]
pub(crate) fn test_state() -> (CoreState, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("clinic.db");
    (CoreState::new(AppConfig::with_database(db_path)), dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::tests::make_user_value;
    use crate::models::UserRole;

    #[test]
    fn open_db_creates_schema() {
        let (state, _dir) = test_state();
        let conn = state.open_db().unwrap();
        assert!(db::test_connection(&conn));
        assert!(state.db_path().exists());
    }

    #[test]
    fn connections_see_each_others_writes() {
        let (state, _dir) = test_state();
        let user = make_user_value("admin", UserRole::Admin);
        db::insert_user(&state.open_db().unwrap(), &user).unwrap();
        assert_eq!(db::count_users(&state.open_db().unwrap()).unwrap(), 1);
    }

    #[test]
    fn session_ttl_follows_config() {
        let (state, _dir) = test_state();
        let token = state
            .write_sessions()
            .unwrap()
            .issue(&make_user_value("admin", UserRole::Admin));
        assert!(state.write_sessions().unwrap().validate(&token).is_some());
        assert_eq!(state.read_sessions().unwrap().len(), 1);
    }
}

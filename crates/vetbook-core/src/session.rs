//! Signed-in identity.
//!
//! [`SessionStore`] is the only place that reads or writes the persisted
//! `token`, `user` and `user_id` keys. Everything downstream receives a
//! [`Session`] value.

use serde_json::Value;
use thiserror::Error;
use vetbook_api::{AccessToken, RawRecord};

use crate::db::{self, DbError, SharedDatabase, KEY_TOKEN, KEY_USER, KEY_USER_ID};

/// Keys on the cached user object that may carry the user id.
const USER_ID_FIELDS: &[&str] = &["id", "user_id", "_id"];

/// Session errors.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Signed in but no user id is available")]
    MissingUserId,

    #[error("Invalid session: {0}")]
    Invalid(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Credentials and identity for one signed-in user.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: AccessToken,
    /// Cached user object as returned at sign-in.
    pub user: Option<Value>,
    /// Acting id: customer id for the customer list, doctor id for the
    /// doctor list.
    pub user_id: String,
}

impl Session {
    pub fn new(token: AccessToken, user_id: impl Into<String>) -> Self {
        Self {
            token,
            user: None,
            user_id: user_id.into(),
        }
    }

    pub fn with_user(mut self, user: Value) -> Self {
        self.user = Some(user);
        self
    }

    /// Build a session from a token and a user object, taking the id from
    /// the object's own id fields.
    pub fn from_user(token: AccessToken, user: Value) -> SessionResult<Self> {
        let user_id = user_id_from(&user).ok_or(SessionError::MissingUserId)?;
        Ok(Self {
            token,
            user: Some(user),
            user_id,
        })
    }
}

fn user_id_from(user: &Value) -> Option<String> {
    RawRecord::from_value(user.clone())?.first_of(USER_ID_FIELDS)
}

/// Persistence boundary for the session keys.
#[derive(Clone)]
pub struct SessionStore {
    db: SharedDatabase,
}

impl SessionStore {
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    /// Load the stored session, if any.
    ///
    /// `user_id` falls back to the cached user object when the dedicated key
    /// is missing. A cached user that does not parse is dropped with a
    /// warning.
    pub fn load(&self) -> SessionResult<Option<Session>> {
        let (token, user_raw, user_id) = {
            let conn = db::lock(&self.db)?;
            (
                conn.get_value(KEY_TOKEN)?,
                conn.get_value(KEY_USER)?,
                conn.get_value(KEY_USER_ID)?,
            )
        };

        let Some(token) = token.map(AccessToken::new).filter(|t| !t.is_empty()) else {
            return Ok(None);
        };

        let user = user_raw.and_then(|raw| match serde_json::from_str::<Value>(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                tracing::warn!(error = %err, "cached user is unreadable, ignoring it");
                None
            }
        });

        let user_id = user_id
            .filter(|id| !id.trim().is_empty())
            .or_else(|| user.as_ref().and_then(user_id_from))
            .ok_or(SessionError::MissingUserId)?;

        Ok(Some(Session {
            token,
            user,
            user_id,
        }))
    }

    /// Load the stored session or fail with [`SessionError::NotSignedIn`].
    pub fn require(&self) -> SessionResult<Session> {
        self.load()?.ok_or(SessionError::NotSignedIn)
    }

    pub fn save(&self, session: &Session) -> SessionResult<()> {
        if session.token.is_empty() {
            return Err(SessionError::Invalid("empty token".into()));
        }
        if session.user_id.trim().is_empty() {
            return Err(SessionError::MissingUserId);
        }

        let user = session
            .user
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(DbError::from)?;

        let mut conn = db::lock(&self.db)?;
        conn.set_values(&[
            (KEY_TOKEN, Some(session.token.as_str())),
            (KEY_USER, user.as_deref()),
            (KEY_USER_ID, Some(session.user_id.as_str())),
        ])?;
        tracing::info!(user_id = %session.user_id, "session saved");
        Ok(())
    }

    pub fn clear(&self) -> SessionResult<()> {
        let mut conn = db::lock(&self.db)?;
        conn.set_values(&[(KEY_TOKEN, None), (KEY_USER, None), (KEY_USER_ID, None)])?;
        tracing::info!("session cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use serde_json::json;

    fn setup() -> (SharedDatabase, SessionStore) {
        let db = Database::open_in_memory().unwrap().into_shared();
        (db.clone(), SessionStore::new(db))
    }

    #[test]
    fn test_no_session() {
        let (_, store) = setup();
        assert!(store.load().unwrap().is_none());
        assert!(matches!(store.require(), Err(SessionError::NotSignedIn)));
    }

    #[test]
    fn test_save_and_load() {
        let (_, store) = setup();
        let session = Session::new(AccessToken::new("tok"), "u-1")
            .with_user(json!({"id": "u-1", "name": "Rina"}));

        store.save(&session).unwrap();
        let loaded = store.require().unwrap();

        assert_eq!(loaded.token.as_str(), "tok");
        assert_eq!(loaded.user_id, "u-1");
        assert_eq!(loaded.user.unwrap()["name"], "Rina");
    }

    #[test]
    fn test_user_id_falls_back_to_cached_user() {
        let (db, store) = setup();
        {
            let conn = db::lock(&db).unwrap();
            conn.set_value(KEY_TOKEN, "tok").unwrap();
            conn.set_value(KEY_USER, r#"{"_id": 42}"#).unwrap();
        }

        assert_eq!(store.require().unwrap().user_id, "42");
    }

    #[test]
    fn test_token_without_any_id() {
        let (db, store) = setup();
        db::lock(&db).unwrap().set_value(KEY_TOKEN, "tok").unwrap();

        assert!(matches!(store.load(), Err(SessionError::MissingUserId)));
    }

    #[test]
    fn test_unreadable_user_is_dropped() {
        let (db, store) = setup();
        {
            let conn = db::lock(&db).unwrap();
            conn.set_value(KEY_TOKEN, "tok").unwrap();
            conn.set_value(KEY_USER, "{oops").unwrap();
            conn.set_value(KEY_USER_ID, "u-9").unwrap();
        }

        let session = store.require().unwrap();
        assert!(session.user.is_none());
        assert_eq!(session.user_id, "u-9");
    }

    #[test]
    fn test_clear_removes_everything() {
        let (db, store) = setup();
        store
            .save(&Session::new(AccessToken::new("tok"), "u-1").with_user(json!({})))
            .unwrap();

        store.clear().unwrap();

        assert!(store.load().unwrap().is_none());
        assert_eq!(db::lock(&db).unwrap().get_value(KEY_USER).unwrap(), None);
    }

    #[test]
    fn test_from_user_reads_id_fields() {
        let session =
            Session::from_user(AccessToken::new("tok"), json!({"user_id": "c-3"})).unwrap();
        assert_eq!(session.user_id, "c-3");

        let err = Session::from_user(AccessToken::new("tok"), json!({"name": "x"})).unwrap_err();
        assert!(matches!(err, SessionError::MissingUserId));
    }
}

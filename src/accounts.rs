//! Staff accounts: creation with hashed passwords, credential checks and
//! first-run seeding.

use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::crypto::{self, CryptoError};
use crate::db::{self, DatabaseError};
use crate::models::{User, UserInput, UserRole};
use crate::validation::{self, ValidationError};

pub const SEED_ADMIN_USERNAME: &str = "admin";
const SEED_PASSWORD_LENGTH: usize = 16;

#[derive(Error, Debug)]
pub enum AccountError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Password hashing failed: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Validate `input`, hash its password and insert the account.
pub fn create_user(conn: &Connection, input: &UserInput) -> Result<User, AccountError> {
    validation::validate_user(input, true)?;
    let password = input.password.as_deref().unwrap_or_default();
    let user = User {
        id: Uuid::new_v4(),
        username: input.username.trim().to_string(),
        password_hash: crypto::hash_password(password),
        role: input.role,
        full_name: input.full_name.trim().to_string(),
        email: input.email.trim().to_string(),
        is_active: input.is_active,
        created_at: db::now_timestamp(),
    };
    db::insert_user(conn, &user)?;
    tracing::info!(username = %user.username, role = %user.role, "User created");
    Ok(user)
}

/// Apply `input` to an existing account. The stored password is replaced
/// only when a non-empty one is supplied.
pub fn update_user(conn: &Connection, id: &Uuid, input: &UserInput) -> Result<User, AccountError> {
    validation::validate_user(input, false)?;
    let mut user = db::get_user(conn, id)?.ok_or_else(|| DatabaseError::not_found("User", id))?;

    user.username = input.username.trim().to_string();
    user.role = input.role;
    user.full_name = input.full_name.trim().to_string();
    user.email = input.email.trim().to_string();
    user.is_active = input.is_active;
    if let Some(password) = input.password.as_deref().filter(|p| !p.is_empty()) {
        user.password_hash = crypto::hash_password(password);
    }
    db::update_user(conn, &user)?;
    Ok(user)
}

/// The active account matching the credentials, or `None`.
///
/// Unknown usernames, wrong passwords and inactive accounts are
/// indistinguishable to the caller.
pub fn authenticate_user(
    conn: &Connection,
    username: &str,
    password: &str,
) -> Result<Option<User>, AccountError> {
    let Some(user) = db::get_user_by_username(conn, username)? else {
        return Ok(None);
    };
    if !user.is_active {
        return Ok(None);
    }
    match crypto::verify_password(password, &user.password_hash) {
        Ok(true) => Ok(Some(user)),
        Ok(false) => Ok(None),
        Err(e) => {
            tracing::error!(username = %user.username, "Unreadable password hash: {e}");
            Ok(None)
        }
    }
}

/// Create the initial administrator when no accounts exist. Returns the
/// generated password so it can be shown once.
pub fn seed_admin(conn: &Connection) -> Result<Option<String>, AccountError> {
    if db::count_users(conn)? > 0 {
        return Ok(None);
    }
    let password = crypto::generate_password(SEED_PASSWORD_LENGTH);
    create_user(
        conn,
        &UserInput {
            username: SEED_ADMIN_USERNAME.to_string(),
            password: Some(password.clone()),
            role: UserRole::Admin,
            full_name: "Administrator".to_string(),
            email: String::new(),
            is_active: true,
        },
    )?;
    Ok(Some(password))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    fn input(username: &str, password: Option<&str>) -> UserInput {
        UserInput {
            username: username.into(),
            password: password.map(str::to_string),
            role: UserRole::Receptionist,
            full_name: "Front Desk".into(),
            email: String::new(),
            is_active: true,
        }
    }

    #[test]
    fn create_then_authenticate() {
        let conn = open_memory_database().unwrap();
        let user = create_user(&conn, &input("desk", Some("secret1"))).unwrap();
        assert!(user.password_hash.starts_with("pbkdf2$"));

        let found = authenticate_user(&conn, "desk", "secret1").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(authenticate_user(&conn, "desk", "wrong!!").unwrap().is_none());
        assert!(authenticate_user(&conn, "nobody", "secret1").unwrap().is_none());
    }

    #[test]
    fn create_requires_password() {
        let conn = open_memory_database().unwrap();
        let err = create_user(&conn, &input("desk", None)).unwrap_err();
        assert!(matches!(err, AccountError::Validation(ValidationError::Required("Password"))));
    }

    #[test]
    fn inactive_user_cannot_log_in() {
        let conn = open_memory_database().unwrap();
        let mut i = input("desk", Some("secret1"));
        i.is_active = false;
        create_user(&conn, &i).unwrap();
        assert!(authenticate_user(&conn, "desk", "secret1").unwrap().is_none());
    }

    #[test]
    fn update_keeps_password_unless_given() {
        let conn = open_memory_database().unwrap();
        let user = create_user(&conn, &input("desk", Some("secret1"))).unwrap();

        let mut change = input("desk", None);
        change.role = UserRole::Doctor;
        let updated = update_user(&conn, &user.id, &change).unwrap();
        assert_eq!(updated.role, UserRole::Doctor);
        assert!(authenticate_user(&conn, "desk", "secret1").unwrap().is_some());

        update_user(&conn, &user.id, &input("desk", Some("another1"))).unwrap();
        assert!(authenticate_user(&conn, "desk", "secret1").unwrap().is_none());
        assert!(authenticate_user(&conn, "desk", "another1").unwrap().is_some());
    }

    #[test]
    fn seed_runs_once() {
        let conn = open_memory_database().unwrap();
        let password = seed_admin(&conn).unwrap().unwrap();
        let admin = authenticate_user(&conn, SEED_ADMIN_USERNAME, &password)
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert!(seed_admin(&conn).unwrap().is_none());
    }
}

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::convert::*;
use crate::db::DatabaseError;
use crate::models::*;

const USER_COLUMNS: &str =
    "id, username, password_hash, role, full_name, email, is_active, created_at";

struct UserRow {
    id: String,
    username: String,
    password_hash: String,
    role: String,
    full_name: String,
    email: String,
    is_active: bool,
    created_at: String,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        role: row.get(3)?,
        full_name: row.get(4)?,
        email: row.get(5)?,
        is_active: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn user_from_row(row: UserRow) -> Result<User, DatabaseError> {
    Ok(User {
        id: parse_uuid("users.id", &row.id)?,
        username: row.username,
        password_hash: row.password_hash,
        role: row.role.parse()?,
        full_name: row.full_name,
        email: row.email,
        is_active: row.is_active,
        created_at: parse_timestamp("users.created_at", &row.created_at)?,
    })
}

fn username_taken(username: &str) -> DatabaseError {
    DatabaseError::ConstraintViolation(format!("Username '{username}' is already taken"))
}

fn map_unique(err: rusqlite::Error, username: &str) -> DatabaseError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            username_taken(username)
        }
        _ => err.into(),
    }
}

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, username, password_hash, role, full_name, email, is_active,
         created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user.id.to_string(),
            user.username,
            user.password_hash,
            user.role.as_str(),
            user.full_name,
            user.email,
            user.is_active,
            timestamp_to_sql(user.created_at),
        ],
    )
    .map_err(|e| map_unique(e, &user.username))?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    let row = conn
        .query_row(&sql, params![id.to_string()], read_row)
        .optional()?;
    row.map(user_from_row).transpose()
}

pub fn get_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>, DatabaseError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
    let row = conn
        .query_row(&sql, params![username.trim()], read_row)
        .optional()?;
    row.map(user_from_row).transpose()
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>, DatabaseError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY username");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], read_row)?;
    let mut users = Vec::new();
    for row in rows {
        users.push(user_from_row(row?)?);
    }
    Ok(users)
}

pub fn count_users(conn: &Connection) -> Result<u32, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(count)
}

/// Update profile fields and the stored hash as given.
pub fn update_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    let affected = conn
        .execute(
            "UPDATE users SET username = ?2, password_hash = ?3, role = ?4, full_name = ?5,
             email = ?6, is_active = ?7
             WHERE id = ?1",
            params![
                user.id.to_string(),
                user.username,
                user.password_hash,
                user.role.as_str(),
                user.full_name,
                user.email,
                user.is_active,
            ],
        )
        .map_err(|e| map_unique(e, &user.username))?;
    if affected == 0 {
        return Err(DatabaseError::not_found("User", user.id));
    }
    Ok(())
}

pub fn delete_user(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let affected = conn.execute("DELETE FROM users WHERE id = ?1", params![id.to_string()])?;
    if affected == 0 {
        return Err(DatabaseError::not_found("User", id));
    }
    Ok(())
}

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::repository::Entity;

/// Marker for the `users` table
pub struct Users;

impl Entity for Users {
    type Record = User;
    type New = NewUser;
    type Changes = UserChanges;
}

/// Row as selected from `users`. The password hash is never selected.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i32,
    pub username: String,
    pub created_at: NaiveDateTime,
}

/// Public user record. Has no hash field, so no response can carry one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            created_at: row.created_at.and_utc(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct UserChanges {
    pub username: String,
    /// `None` keeps the stored hash
    pub password_hash: Option<String>,
}

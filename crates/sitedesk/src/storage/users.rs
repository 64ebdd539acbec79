//! User accounts: lookup, login check, creation and bulk import.

use std::collections::HashSet;
use std::fmt;

use rand::Rng;
use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::Storage;
use crate::error::{Error, Result};
use crate::model::{NewUser, User, UserRole};

const USER_COLUMNS: &str = "id, name, role, username, password, email, phone";

/// Alphabet for generated user ids.
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of generated user ids.
const ID_LEN: usize = 9;

/// Why a row of a bulk import was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RowError {
    /// Name, username or password was empty.
    MissingFields {
        /// 1-based row number.
        row: usize,
    },
    /// The username exists already, or earlier in the same batch.
    UsernameExists {
        /// 1-based row number.
        row: usize,
        /// The duplicate username.
        username: String,
    },
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFields { row } => {
                write!(f, "row {row}: missing name, username or password")
            }
            Self::UsernameExists { row, username } => {
                write!(f, "row {row}: username \"{username}\" already exists")
            }
        }
    }
}

/// Result of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Number of accounts created.
    pub created: usize,
    /// Rows that were skipped.
    pub errors: Vec<RowError>,
}

impl Storage {
    /// Get all users in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn users(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY rowid");
        let mut stmt = self.conn.prepare(&sql)?;
        let users = stmt
            .query_map([], row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn user_by_id(&self, id: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        Ok(self.conn.query_row(&sql, [id], row_to_user).optional()?)
    }

    /// Get a user by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
        Ok(self.conn.query_row(&sql, [username], row_to_user).optional()?)
    }

    /// Find the account behind an inbound sender address.
    ///
    /// All whitespace is stripped from `identifier` and it is lower-cased.
    /// A user matches if their lower-cased email equals the result, or their
    /// phone with whitespace stripped does.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_user_by_contact(&self, identifier: &str) -> Result<Option<User>> {
        let clean = strip_whitespace(identifier).to_lowercase();
        if clean.is_empty() {
            return Ok(None);
        }

        let found = self.users()?.into_iter().find(|u| {
            let email_match = u
                .email
                .as_deref()
                .is_some_and(|e| e.to_lowercase() == clean);
            let phone_match = u
                .phone
                .as_deref()
                .is_some_and(|p| strip_whitespace(p) == clean);
            email_match || phone_match
        });

        debug!(identifier, found = found.is_some(), "Contact lookup");
        Ok(found)
    }

    /// Check a username and password.
    ///
    /// Returns the matching user, or `None` if either is wrong.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        Ok(self
            .user_by_username(username)?
            .filter(|u| u.password == password))
    }

    /// Create a resident account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UsernameTaken`] if the username exists, or an error if
    /// the database operation fails.
    pub fn create_user(&self, new_user: &NewUser) -> Result<User> {
        if self.user_by_username(&new_user.username)?.is_some() {
            return Err(Error::UsernameTaken {
                username: new_user.username.clone(),
            });
        }

        let user = self.build_user(new_user)?;
        self.insert_user(&user)?;
        info!(username = %user.username, id = %user.id, "Created user");
        Ok(user)
    }

    /// Create many resident accounts at once.
    ///
    /// Rows with missing fields or a username that already exists (in the
    /// store or earlier in the batch) are reported and skipped; the other
    /// rows are inserted in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn create_users_batch(&self, rows: &[NewUser]) -> Result<BatchReport> {
        let mut taken: HashSet<String> = self.users()?.into_iter().map(|u| u.username).collect();
        let mut report = BatchReport::default();
        let mut accepted = Vec::new();

        for (index, row) in rows.iter().enumerate() {
            let row_number = index + 1;
            if !row.is_complete() {
                report.errors.push(RowError::MissingFields { row: row_number });
                continue;
            }
            if !taken.insert(row.username.clone()) {
                report.errors.push(RowError::UsernameExists {
                    row: row_number,
                    username: row.username.clone(),
                });
                continue;
            }
            accepted.push(self.build_user(row)?);
        }

        if !accepted.is_empty() {
            let tx = self.conn.unchecked_transaction()?;
            for user in &accepted {
                self.insert_user(user)?;
            }
            tx.commit()?;
        }

        report.created = accepted.len();
        if !report.errors.is_empty() {
            warn!(skipped = report.errors.len(), "Bulk import skipped rows");
        }
        info!(created = report.created, "Bulk import finished");
        Ok(report)
    }

    /// Replace a user's password.
    ///
    /// Returns `false` if no user has this username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn reset_password(&self, username: &str, new_password: &str) -> Result<bool> {
        let affected = self.conn.execute(
            "UPDATE users SET password = ?1 WHERE username = ?2",
            params![new_password, username],
        )?;
        if affected > 0 {
            info!(username, "Password reset");
        }
        Ok(affected > 0)
    }

    /// Insert a fully-formed user row.
    pub(super) fn insert_user(&self, user: &User) -> Result<()> {
        self.conn.execute(
            "INSERT INTO users (id, name, role, username, password, email, phone)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user.id,
                user.name,
                user.role.as_str(),
                user.username,
                user.password,
                user.email,
                user.phone,
            ],
        )?;
        Ok(())
    }

    fn build_user(&self, new_user: &NewUser) -> Result<User> {
        Ok(User {
            id: self.fresh_user_id()?,
            name: new_user.name.clone(),
            role: UserRole::Resident,
            username: new_user.username.clone(),
            password: new_user.password.clone(),
            email: non_blank(new_user.email.as_deref()),
            phone: non_blank(new_user.phone.as_deref()),
        })
    }

    fn fresh_user_id(&self) -> Result<String> {
        loop {
            let id = generate_id();
            if self.user_by_id(&id)?.is_none() {
                return Ok(id);
            }
        }
    }
}

fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LEN)
        .map(|_| char::from(ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())]))
        .collect()
}

fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let role_str: String = row.get(2)?;
    let role = role_str.parse().unwrap_or_else(|_| {
        warn!("Unknown role: {}, defaulting to resident", role_str);
        UserRole::Resident
    });

    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        role,
        username: row.get(3)?,
        password: row.get(4)?,
        email: row.get(5)?,
        phone: row.get(6)?,
    })
}

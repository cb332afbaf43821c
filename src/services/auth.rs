//! Account management: login, registration, user administration and the
//! legacy credential migration.

use bcrypt::{hash, verify};
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{Role, UserAccount};

/// Prefix marking a bcrypt hash whose input is a legacy SHA-256 hex digest
const LEGACY_PREFIX: &str = "legacy-sha256$";

/// Username reserved for the bootstrap administrator
const BOOTSTRAP_USERNAME: &str = "admin";

#[derive(Debug, Deserialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    pub role: Role,
}

/// Credential-bearing user row, private to this service
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    role: Role,
    created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AuthService {
    db: SqlitePool,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(db: SqlitePool, bcrypt_cost: u32) -> Self {
        Self { db, bcrypt_cost }
    }

    /// Verify credentials. Unknown usernames and wrong passwords fail the
    /// same way. A credential stored in the wrapped legacy form is
    /// upgraded to a plain bcrypt hash on successful login.
    pub async fn login(&self, input: &Credentials) -> AppResult<UserAccount> {
        input.validate()?;
        let username = input.username.trim();

        let user: UserRow = sqlx::query_as(
            "SELECT id, username, password_hash, role, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        if user.password_hash.starts_with(LEGACY_PREFIX) {
            let upgraded = self.hash_password(&input.password)?;
            sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
                .bind(&upgraded)
                .bind(user.id)
                .execute(&self.db)
                .await?;
        }

        Ok(UserAccount {
            id: user.id,
            username: user.username,
            role: user.role,
            created_at: user.created_at,
        })
    }

    /// Self-service registration. New accounts are always staff.
    pub async fn register(&self, input: &Credentials) -> AppResult<UserAccount> {
        input.validate()?;
        self.insert_user(input.username.trim(), &input.password, Role::Staff)
            .await
    }

    /// Admin user creation with an explicit role
    pub async fn create_user(&self, input: &NewUser) -> AppResult<UserAccount> {
        input.validate()?;
        self.insert_user(input.username.trim(), &input.password, input.role)
            .await
    }

    async fn insert_user(&self, username: &str, password: &str, role: Role) -> AppResult<UserAccount> {
        if username.is_empty() {
            return Err(AppError::Validation {
                field: "username".to_string(),
                message: "Username is required".to_string(),
            });
        }

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = $1")
            .bind(username)
            .fetch_one(&self.db)
            .await?;
        if existing > 0 {
            return Err(AppError::Conflict {
                resource: "user".to_string(),
                message: "Username already exists".to_string(),
            });
        }

        let password_hash = self.hash_password(password)?;
        let user = sqlx::query_as::<_, UserAccount>(
            "INSERT INTO users (username, password_hash, role, created_at) \
             VALUES ($1, $2, $3, $4) RETURNING id, username, role, created_at",
        )
        .bind(username)
        .bind(&password_hash)
        .bind(role)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        Ok(user)
    }

    /// Delete an account. Admins cannot delete themselves.
    pub async fn delete_user(&self, acting_user_id: i64, target_id: i64) -> AppResult<()> {
        if acting_user_id == target_id {
            return Err(AppError::Validation {
                field: "user_id".to_string(),
                message: "You cannot delete your own account".to_string(),
            });
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(target_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }
        Ok(())
    }

    pub async fn list_users(&self) -> AppResult<Vec<UserAccount>> {
        let users = sqlx::query_as("SELECT id, username, role, created_at FROM users ORDER BY id")
            .fetch_all(&self.db)
            .await?;
        Ok(users)
    }

    /// Replace a user's password
    pub async fn change_password(&self, user_id: i64, new_password: &str) -> AppResult<()> {
        if new_password.is_empty() {
            return Err(AppError::Validation {
                field: "new_password".to_string(),
                message: "Password is required".to_string(),
            });
        }

        let password_hash = self.hash_password(new_password)?;
        let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(&password_hash)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }
        Ok(())
    }

    /// Wrap stored unsalted SHA-256 digests in bcrypt so every credential
    /// at rest is salted. Wrapped hashes upgrade to plain bcrypt the next
    /// time their owner logs in. Returns the number of migrated rows.
    pub async fn migrate_legacy_credentials(&self) -> AppResult<u64> {
        let rows: Vec<(i64, String)> = sqlx::query_as("SELECT id, password_hash FROM users")
            .fetch_all(&self.db)
            .await?;

        let mut migrated = 0;
        let mut tx = self.db.begin().await?;
        for (id, stored) in rows {
            if !is_legacy_digest(&stored) {
                continue;
            }
            let wrapped = format!("{}{}", LEGACY_PREFIX, self.hash_password(&stored)?);
            sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
                .bind(&wrapped)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            migrated += 1;
        }
        tx.commit().await?;

        Ok(migrated)
    }

    /// One-time creation of the bootstrap administrator. Does nothing when
    /// the account already exists; an existing credential is never reset.
    pub async fn bootstrap_admin(&self, configured_password: Option<&str>) -> AppResult<()> {
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = $1")
            .bind(BOOTSTRAP_USERNAME)
            .fetch_one(&self.db)
            .await?;
        if existing > 0 {
            return Ok(());
        }

        let generated;
        let (password, from_config) = match configured_password {
            Some(p) if !p.is_empty() => (p, true),
            _ => {
                generated = random_password(20);
                (generated.as_str(), false)
            }
        };

        let password_hash = self.hash_password(password)?;
        sqlx::query(
            "INSERT INTO users (username, password_hash, role, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(BOOTSTRAP_USERNAME)
        .bind(&password_hash)
        .bind(Role::Admin)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;

        if from_config {
            tracing::info!("Created bootstrap admin account '{}'", BOOTSTRAP_USERNAME);
        } else {
            // Surfaced exactly once; the hash is all that is stored.
            tracing::warn!(
                "Created bootstrap admin account '{}' with generated password: {}",
                BOOTSTRAP_USERNAME,
                password
            );
        }

        Ok(())
    }

    fn hash_password(&self, password: &str) -> AppResult<String> {
        hash(password, self.bcrypt_cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }
}

/// Check a password against a stored hash, transparently handling hashes
/// produced by the legacy-credential migration.
fn verify_password(password: &str, stored: &str) -> AppResult<bool> {
    let (candidate, hash) = match stored.strip_prefix(LEGACY_PREFIX) {
        Some(wrapped) => (sha256_hex(password), wrapped),
        None => (password.to_string(), stored),
    };
    verify(candidate, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

/// A stored value is a legacy credential when it is exactly what the old
/// system wrote: a 64-character lowercase SHA-256 hex digest.
fn is_legacy_digest(stored: &str) -> bool {
    stored.len() == 64 && stored.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}

fn sha256_hex(input: &str) -> String {
    Sha256::digest(input.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn random_password(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_matches_known_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn legacy_digest_detection() {
        assert!(is_legacy_digest(&sha256_hex("password")));
        assert!(!is_legacy_digest("$2b$12$abcdefghijklmnopqrstuv"));
        assert!(!is_legacy_digest(&format!("{}x", sha256_hex("password"))));
        assert!(!is_legacy_digest(""));
    }

    #[test]
    fn plain_bcrypt_verification() {
        let stored = hash("hunter2", 4).unwrap();
        assert!(verify_password("hunter2", &stored).unwrap());
        assert!(!verify_password("wrong", &stored).unwrap());
    }

    #[test]
    fn wrapped_legacy_verification() {
        let digest = sha256_hex("hunter2");
        let stored = format!("{}{}", LEGACY_PREFIX, hash(&digest, 4).unwrap());
        assert!(verify_password("hunter2", &stored).unwrap());
        assert!(!verify_password("wrong", &stored).unwrap());
    }

    #[test]
    fn random_password_length_and_charset() {
        let password = random_password(20);
        assert_eq!(password.len(), 20);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}

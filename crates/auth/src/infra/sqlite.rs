//! SQLite Repository Implementation
//!
//! Durable store shared between processes (two terminals against the same
//! database file). The failed-login increment is a single conditional
//! `UPDATE`, never a read-modify-write pair, so concurrent failed logins
//! cannot lose updates or extend an existing lock-expiry.

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

use crate::domain::entity::User;
use crate::domain::repository::CredentialStore;
use crate::domain::value_object::{UserName, UserRole};
use crate::error::{AuthError, AuthResult};

/// Default accounts installed on first run
///
/// All three carry the forced-change flag so the defaults cannot survive
/// past the first login.
const DEFAULT_USERS: &[(&str, &str, UserRole)] = &[
    ("operator", "1234", UserRole::Operator),
    ("supervisor", "1234", UserRole::Supervisor),
    ("admin", "admin123", UserRole::Administrator),
];

/// SQLite-backed credential store
#[derive(Clone)]
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the users table and index if missing
    pub async fn initialize(&self) -> AuthResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password_hash TEXT NOT NULL,
                role INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                last_login_at TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                failed_login_attempts INTEGER NOT NULL DEFAULT 0,
                locked_until TEXT,
                force_password_change INTEGER NOT NULL DEFAULT 0,
                last_password_change TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_username ON users(username)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Install the default accounts when the table is empty
    ///
    /// Returns true when seeding happened. First-run only; an existing
    /// installation is never touched.
    pub async fn seed_default_users(&self, now: DateTime<Utc>) -> AuthResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        if count > 0 {
            return Ok(false);
        }

        for (name, password, role) in DEFAULT_USERS {
            let clear = platform::password::ClearTextPassword::new(password.to_string())
                .map_err(|e| AuthError::Internal(e.to_string()))?;
            let encoded = clear.hash().to_storage_string();

            let username =
                UserName::new(name).map_err(|e| AuthError::Internal(e.to_string()))?;
            let mut user = User::new(username, encoded, *role, now);
            user.force_password_change = true;
            self.insert(&user).await?;
        }

        tracing::warn!(
            users = DEFAULT_USERS.len(),
            "Seeded default accounts; passwords must be changed at first login"
        );
        Ok(true)
    }

    fn expect_row(&self, result: sqlx::sqlite::SqliteQueryResult) -> AuthResult<()> {
        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound);
        }
        Ok(())
    }
}

impl CredentialStore for SqliteCredentialStore {
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, role, created_at, last_login_at,
                   is_active, failed_login_attempts, locked_until,
                   force_password_change, last_password_change
            FROM users
            WHERE username = ?1 COLLATE NOCASE AND is_active = 1
            "#,
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn list_active(&self) -> AuthResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, role, created_at, last_login_at,
                   is_active, failed_login_attempts, locked_until,
                   force_password_change, last_password_change
            FROM users
            WHERE is_active = 1
            ORDER BY username
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_user()).collect()
    }

    async fn record_successful_login(&self, username: &str, at: DateTime<Utc>) -> AuthResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET last_login_at = ?1,
                failed_login_attempts = 0,
                locked_until = NULL
            WHERE username = ?2 COLLATE NOCASE AND is_active = 1
            "#,
        )
        .bind(at)
        .bind(username.trim())
        .execute(&self.pool)
        .await?;

        self.expect_row(result)
    }

    async fn record_failed_login(
        &self,
        username: &str,
        max_attempts: u32,
        lockout: Duration,
        at: DateTime<Utc>,
    ) -> AuthResult<()> {
        // Single conditional write. An unexpired expiry is never pushed
        // further into the future; a lapsed one is replaced so the account
        // can lock again on the next burst.
        let result = sqlx::query(
            r#"
            UPDATE users
            SET failed_login_attempts = failed_login_attempts + 1,
                locked_until = CASE
                    WHEN failed_login_attempts + 1 >= ?1
                         AND (locked_until IS NULL OR locked_until <= ?2)
                    THEN ?3
                    ELSE locked_until
                END
            WHERE username = ?4 COLLATE NOCASE AND is_active = 1
            "#,
        )
        .bind(max_attempts)
        .bind(at)
        .bind(at + lockout)
        .bind(username.trim())
        .execute(&self.pool)
        .await?;

        self.expect_row(result)
    }

    async fn is_locked(&self, username: &str, now: DateTime<Utc>) -> AuthResult<bool> {
        let locked_until: Option<Option<DateTime<Utc>>> = sqlx::query_scalar(
            "SELECT locked_until FROM users WHERE username = ?1 COLLATE NOCASE AND is_active = 1",
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(matches!(locked_until, Some(Some(until)) if now < until))
    }

    async fn update_password(
        &self,
        username: &str,
        encoded_hash: &str,
        at: DateTime<Utc>,
    ) -> AuthResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?1,
                failed_login_attempts = 0,
                locked_until = NULL,
                force_password_change = 0,
                last_password_change = ?2
            WHERE username = ?3 COLLATE NOCASE AND is_active = 1
            "#,
        )
        .bind(encoded_hash)
        .bind(at)
        .bind(username.trim())
        .execute(&self.pool)
        .await?;

        self.expect_row(result)
    }

    async fn replace_hash(&self, username: &str, encoded_hash: &str) -> AuthResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?1
            WHERE username = ?2 COLLATE NOCASE AND is_active = 1
            "#,
        )
        .bind(encoded_hash)
        .bind(username.trim())
        .execute(&self.pool)
        .await?;

        self.expect_row(result)
    }

    async fn insert(&self, user: &User) -> AuthResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (
                username, password_hash, role, created_at, last_login_at,
                is_active, failed_login_attempts, locked_until,
                force_password_change, last_password_change
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(user.username.original())
        .bind(&user.password_hash)
        .bind(user.role.id())
        .bind(user.created_at)
        .bind(user.last_login_at)
        .bind(user.is_active)
        .bind(user.failed_login_attempts)
        .bind(user.locked_until)
        .bind(user.force_password_change)
        .bind(user.last_password_change)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.as_database_error().is_some_and(|d| d.is_unique_violation()) => {
                Err(AuthError::DuplicateUsername)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set_role(&self, username: &str, role: UserRole) -> AuthResult<()> {
        let result = sqlx::query(
            "UPDATE users SET role = ?1 WHERE username = ?2 COLLATE NOCASE AND is_active = 1",
        )
        .bind(role.id())
        .bind(username.trim())
        .execute(&self.pool)
        .await?;

        self.expect_row(result)
    }

    async fn set_force_password_change(&self, username: &str, force: bool) -> AuthResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET force_password_change = ?1
            WHERE username = ?2 COLLATE NOCASE AND is_active = 1
            "#,
        )
        .bind(force)
        .bind(username.trim())
        .execute(&self.pool)
        .await?;

        self.expect_row(result)
    }

    async fn soft_delete(&self, username: &str) -> AuthResult<()> {
        let result = sqlx::query(
            "UPDATE users SET is_active = 0 WHERE username = ?1 COLLATE NOCASE AND is_active = 1",
        )
        .bind(username.trim())
        .execute(&self.pool)
        .await?;

        self.expect_row(result)
    }
}

// ============================================================================
// Row Mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    role: i64,
    created_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
    is_active: bool,
    failed_login_attempts: i64,
    locked_until: Option<DateTime<Utc>>,
    force_password_change: bool,
    last_password_change: Option<DateTime<Utc>>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let username = UserName::new(&self.username)
            .map_err(|e| AuthError::Internal(format!("Invalid stored username: {e}")))?;
        let role = UserRole::from_id(self.role as i16)
            .ok_or_else(|| AuthError::Internal(format!("Invalid stored role id: {}", self.role)))?;

        Ok(User {
            id: self.id,
            username,
            role,
            password_hash: self.password_hash,
            created_at: self.created_at,
            last_login_at: self.last_login_at,
            is_active: self.is_active,
            failed_login_attempts: self.failed_login_attempts.max(0) as u32,
            locked_until: self.locked_until,
            force_password_change: self.force_password_change,
            last_password_change: self.last_password_change,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::CredentialStore;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn store() -> SqliteCredentialStore {
        // One connection so every query sees the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteCredentialStore::new(pool);
        store.initialize().await.unwrap();
        store
    }

    fn user(name: &str, role: UserRole) -> User {
        User::new(
            UserName::new(name).unwrap(),
            "100000:c2FsdA==:aGFzaA==".to_string(),
            role,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_insert_and_case_insensitive_find() {
        let store = store().await;
        store.insert(&user("Operator", UserRole::Operator)).await.unwrap();

        let found = store.find_by_username("OPERATOR").await.unwrap().unwrap();
        assert_eq!(found.username.original(), "Operator");
        assert_eq!(found.role, UserRole::Operator);
        assert!(found.id > 0);
    }

    #[tokio::test]
    async fn test_duplicate_insert_maps_to_typed_error() {
        let store = store().await;
        store.insert(&user("operator", UserRole::Operator)).await.unwrap();

        let err = store
            .insert(&user("OPERATOR", UserRole::Supervisor))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateUsername));
    }

    #[tokio::test]
    async fn test_failed_login_increment_and_lock() {
        let store = store().await;
        store.insert(&user("operator", UserRole::Operator)).await.unwrap();
        let now = Utc::now();

        for _ in 0..5 {
            store
                .record_failed_login("operator", 5, Duration::minutes(5), now)
                .await
                .unwrap();
        }

        assert!(store.is_locked("operator", now).await.unwrap());
        let found = store.find_by_username("operator").await.unwrap().unwrap();
        assert_eq!(found.failed_login_attempts, 5);

        // Lock expires implicitly once now passes the expiry
        assert!(
            !store
                .is_locked("operator", now + Duration::minutes(6))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_failure_while_locked_keeps_expiry() {
        let store = store().await;
        store.insert(&user("operator", UserRole::Operator)).await.unwrap();
        let now = Utc::now();

        for _ in 0..5 {
            store
                .record_failed_login("operator", 5, Duration::minutes(5), now)
                .await
                .unwrap();
        }
        let first = store
            .find_by_username("operator")
            .await
            .unwrap()
            .unwrap()
            .locked_until;

        store
            .record_failed_login("operator", 5, Duration::minutes(5), now + Duration::minutes(3))
            .await
            .unwrap();
        let after = store
            .find_by_username("operator")
            .await
            .unwrap()
            .unwrap()
            .locked_until;
        assert_eq!(first, after);
    }

    #[tokio::test]
    async fn test_relock_after_expiry_lapses() {
        let store = store().await;
        store.insert(&user("operator", UserRole::Operator)).await.unwrap();
        let now = Utc::now();

        for _ in 0..5 {
            store
                .record_failed_login("operator", 5, Duration::minutes(5), now)
                .await
                .unwrap();
        }
        let later = now + Duration::minutes(6);
        assert!(!store.is_locked("operator", later).await.unwrap());

        // A lapsed expiry must not block locking the next burst of failures
        for _ in 0..5 {
            store
                .record_failed_login("operator", 5, Duration::minutes(5), later)
                .await
                .unwrap();
        }
        assert!(store.is_locked("operator", later).await.unwrap());

        let found = store.find_by_username("operator").await.unwrap().unwrap();
        assert_eq!(found.locked_until, Some(later + Duration::minutes(5)));
    }

    #[tokio::test]
    async fn test_successful_login_resets_state() {
        let store = store().await;
        store.insert(&user("operator", UserRole::Operator)).await.unwrap();
        let now = Utc::now();

        for _ in 0..5 {
            store
                .record_failed_login("operator", 5, Duration::minutes(5), now)
                .await
                .unwrap();
        }
        store.record_successful_login("operator", now).await.unwrap();

        let found = store.find_by_username("operator").await.unwrap().unwrap();
        assert_eq!(found.failed_login_attempts, 0);
        assert!(found.locked_until.is_none());
        assert_eq!(found.last_login_at, Some(now));
        assert!(!store.is_locked("operator", now).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_password_clears_lock_and_flag() {
        let store = store().await;
        store.insert(&user("operator", UserRole::Operator)).await.unwrap();
        let now = Utc::now();
        store
            .set_force_password_change("operator", true)
            .await
            .unwrap();
        store
            .record_failed_login("operator", 1, Duration::minutes(5), now)
            .await
            .unwrap();

        store
            .update_password("operator", "100000:bmV3:bmV3", now)
            .await
            .unwrap();

        let found = store.find_by_username("operator").await.unwrap().unwrap();
        assert_eq!(found.password_hash, "100000:bmV3:bmV3");
        assert_eq!(found.failed_login_attempts, 0);
        assert!(found.locked_until.is_none());
        assert!(!found.force_password_change);
        assert_eq!(found.last_password_change, Some(now));
    }

    #[tokio::test]
    async fn test_replace_hash_preserves_flags() {
        let store = store().await;
        store.insert(&user("operator", UserRole::Operator)).await.unwrap();
        store
            .set_force_password_change("operator", true)
            .await
            .unwrap();

        store.replace_hash("operator", "100000:bQ==:bQ==").await.unwrap();

        let found = store.find_by_username("operator").await.unwrap().unwrap();
        assert_eq!(found.password_hash, "100000:bQ==:bQ==");
        assert!(found.force_password_change);
        assert!(found.last_password_change.is_none());
    }

    #[tokio::test]
    async fn test_soft_delete_and_listing() {
        let store = store().await;
        store.insert(&user("bob", UserRole::Operator)).await.unwrap();
        store.insert(&user("alice", UserRole::Supervisor)).await.unwrap();

        store.soft_delete("bob").await.unwrap();

        let names: Vec<String> = store
            .list_active()
            .await
            .unwrap()
            .iter()
            .map(|u| u.username.canonical().to_string())
            .collect();
        assert_eq!(names, ["alice"]);
        assert!(store.find_by_username("bob").await.unwrap().is_none());

        // The row remains, so the name cannot be reused
        assert!(matches!(
            store.insert(&user("bob", UserRole::Operator)).await,
            Err(AuthError::DuplicateUsername)
        ));
    }

    #[tokio::test]
    async fn test_mutations_on_unknown_user_fail() {
        let store = store().await;
        assert!(matches!(
            store.set_role("ghost", UserRole::Supervisor).await,
            Err(AuthError::UserNotFound)
        ));
        assert!(!store.is_locked("ghost", Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_seed_runs_once() {
        let store = store().await;
        let now = Utc::now();

        assert!(store.seed_default_users(now).await.unwrap());
        assert!(!store.seed_default_users(now).await.unwrap());

        let users = store.list_active().await.unwrap();
        assert_eq!(users.len(), 3);
        assert!(users.iter().all(|u| u.force_password_change));

        let admin = store.find_by_username("admin").await.unwrap().unwrap();
        assert_eq!(admin.role, UserRole::Administrator);
    }
}

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::{Role, User};

/// Fields needed to persist a freshly registered account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub verification_code: String,
}

/// Persistence seam for user accounts.
///
/// `consume_verification_code` must be atomic: of any number of concurrent
/// calls with the same code, at most one returns true.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new: NewUser) -> anyhow::Result<User>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn set_role(&self, id: Uuid, role: Role) -> anyhow::Result<()>;
    async fn consume_verification_code(&self, id: Uuid, code: &str) -> anyhow::Result<bool>;
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    role: Option<String>,
    is_verified: bool,
    verification_code: Option<String>,
    created_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.role.as_deref().map(str::parse::<Role>).transpose()?;
        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            role,
            is_verified: row.is_verified,
            verification_code: row.verification_code,
            created_at: row.created_at,
        })
    }
}

const USER_COLUMNS: &str =
    "id, email, password_hash, role, is_verified, verification_code, created_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new: NewUser) -> anyhow::Result<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (email, password_hash, is_verified, verification_code)
            VALUES ($1, $2, FALSE, $3)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.verification_code)
        .fetch_one(&self.db)
        .await?;
        row.try_into()
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"SELECT {USER_COLUMNS} FROM users WHERE email = $1"#,
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"SELECT {USER_COLUMNS} FROM users WHERE id = $1"#,
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn set_role(&self, id: Uuid, role: Role) -> anyhow::Result<()> {
        sqlx::query(r#"UPDATE users SET role = $2 WHERE id = $1"#)
            .bind(id)
            .bind(role.as_str())
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn consume_verification_code(&self, id: Uuid, code: &str) -> anyhow::Result<bool> {
        // Single conditional update: the WHERE clause matches on the stored
        // code, so only one of any concurrent calls can flip the flag.
        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_verified = TRUE, verification_code = NULL
            WHERE id = $1 AND verification_code = $2 AND is_verified = FALSE
            "#,
        )
        .bind(id)
        .bind(code)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

/// In-memory store backing `AppState::fake()`; mirrors the conditional
/// update semantics of the Postgres implementation.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new: NewUser) -> anyhow::Result<User> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == new.email) {
            anyhow::bail!("duplicate email: {}", new.email);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            password_hash: new.password_hash,
            role: None,
            is_verified: false,
            verification_code: Some(new.verification_code),
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.get(&id).cloned())
    }

    async fn set_role(&self, id: Uuid, role: Role) -> anyhow::Result<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.get_mut(&id) {
            user.role = Some(role);
        }
        Ok(())
    }

    async fn consume_verification_code(&self, id: Uuid, code: &str) -> anyhow::Result<bool> {
        let mut users = self.users.lock().unwrap();
        match users.get_mut(&id) {
            Some(user)
                if !user.is_verified && user.verification_code.as_deref() == Some(code) =>
            {
                user.is_verified = true;
                user.verification_code = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "$argon2id$fake".into(),
            verification_code: Uuid::new_v4().to_string(),
        }
    }

    #[tokio::test]
    async fn create_starts_unverified_with_code_and_no_role() {
        let store = MemoryUserStore::default();
        let user = store.create(new_user("a@example.com")).await.unwrap();
        assert!(!user.is_verified);
        assert!(user.verification_code.is_some());
        assert!(user.role.is_none());
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let store = MemoryUserStore::default();
        store.create(new_user("a@example.com")).await.unwrap();
        assert!(store.create(new_user("a@example.com")).await.is_err());
    }

    #[tokio::test]
    async fn consume_succeeds_exactly_once() {
        let store = MemoryUserStore::default();
        let user = store.create(new_user("a@example.com")).await.unwrap();
        let code = user.verification_code.clone().unwrap();

        assert!(store.consume_verification_code(user.id, &code).await.unwrap());
        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.is_verified);
        assert!(stored.verification_code.is_none());

        // The consumed code can never be replayed.
        assert!(!store.consume_verification_code(user.id, &code).await.unwrap());
    }

    #[tokio::test]
    async fn consume_with_wrong_code_is_a_noop() {
        let store = MemoryUserStore::default();
        let user = store.create(new_user("a@example.com")).await.unwrap();

        assert!(!store
            .consume_verification_code(user.id, "not-the-code")
            .await
            .unwrap());
        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert!(!stored.is_verified);
        assert!(stored.verification_code.is_some());
    }

    #[tokio::test]
    async fn consume_for_unknown_user_is_a_noop() {
        let store = MemoryUserStore::default();
        assert!(!store
            .consume_verification_code(Uuid::new_v4(), "whatever")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn set_role_is_visible_on_lookup() {
        let store = MemoryUserStore::default();
        let user = store.create(new_user("a@example.com")).await.unwrap();
        store.set_role(user.id, Role::Recruiter).await.unwrap();
        let stored = store.find_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(stored.role, Some(Role::Recruiter));
    }
}

// Repository pattern - isolates all database side effects for user rows
use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};

use crate::db::error::RepositoryError;
use crate::db::models::{NewUser, User};
use crate::state::DbPool;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, firstname, lastname, picture, description, created_at";

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user and return the stored row.
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, RepositoryError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// Returns false when no user has the given id.
    async fn update_username(&self, id: &str, username: &str) -> Result<bool, RepositoryError>;

    /// Returns false when no user has the given id.
    async fn update_password_hash(&self, id: &str, hash: &str) -> Result<bool, RepositoryError>;
}

/// SQLite implementation
pub struct SqliteUserRepository {
    pool: DbPool,
}

impl SqliteUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn find_one(&self, column: &str, value: &str) -> Result<Option<User>, RepositoryError> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
                params![value],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        firstname: row.get(4)?,
        lastname: row.get(5)?,
        picture: row.get(6)?,
        description: row.get(7)?,
        created_at: row.get(8)?,
    })
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError> {
        let conn = self.pool.get()?;
        let id = uuid::Uuid::now_v7().to_string();

        let stored = conn.query_row(
            &format!(
                "INSERT INTO users (id, username, email, password_hash, firstname, lastname)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 RETURNING {USER_COLUMNS}"
            ),
            params![
                id,
                user.username,
                user.email,
                user.password_hash,
                user.firstname,
                user.lastname
            ],
            user_from_row,
        )?;

        Ok(stored)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        self.find_one("id", id)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        self.find_one("username", username)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.find_one("email", email)
    }

    async fn update_username(&self, id: &str, username: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE users SET username = ?1 WHERE id = ?2",
            params![username, id],
        )?;
        Ok(rows > 0)
    }

    async fn update_password_hash(&self, id: &str, hash: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE users SET password_hash = ?1 WHERE id = ?2",
            params![hash, id],
        )?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
pub(crate) fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password_hash: "$2b$04$notarealhash".to_string(),
        firstname: "First".to_string(),
        lastname: "Last".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn insert_assigns_id_and_round_trips() {
        let repo = SqliteUserRepository::new(test_pool());
        let stored = repo.insert(new_user("alice")).await.unwrap();
        assert!(!stored.id.is_empty());
        assert!(uuid::Uuid::parse_str(&stored.id).is_ok());
        assert!(!stored.created_at.is_empty());

        let by_id = repo.find_by_id(&stored.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
        let by_name = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, stored.id);
        let by_email = repo.find_by_email("alice@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, stored.id);
    }

    #[tokio::test]
    async fn missing_user_is_none() {
        let repo = SqliteUserRepository::new(test_pool());
        assert!(repo.find_by_id("nope").await.unwrap().is_none());
        assert!(repo.find_by_username("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_typed_violation() {
        let repo = SqliteUserRepository::new(test_pool());
        repo.insert(new_user("alice")).await.unwrap();

        let mut dup = new_user("alice");
        dup.email = "other@example.com".to_string();
        match repo.insert(dup).await {
            Err(RepositoryError::UniqueViolation { column }) => assert_eq!(column, "username"),
            other => panic!("expected username violation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_typed_violation() {
        let repo = SqliteUserRepository::new(test_pool());
        repo.insert(new_user("alice")).await.unwrap();

        let mut dup = new_user("bob");
        dup.email = "alice@example.com".to_string();
        match repo.insert(dup).await {
            Err(RepositoryError::UniqueViolation { column }) => assert_eq!(column, "email"),
            other => panic!("expected email violation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn updates_report_missing_rows() {
        let repo = SqliteUserRepository::new(test_pool());
        let alice = repo.insert(new_user("alice")).await.unwrap();

        assert!(repo.update_username(&alice.id, "alice2").await.unwrap());
        assert!(!repo.update_username("ghost", "whoever").await.unwrap());
        assert!(repo.update_password_hash(&alice.id, "h2").await.unwrap());

        let reloaded = repo.find_by_id(&alice.id).await.unwrap().unwrap();
        assert_eq!(reloaded.username, "alice2");
        assert_eq!(reloaded.password_hash, "h2");
    }
}

// Follow edges between users. Uniqueness and referential integrity live in the schema.
use async_trait::async_trait;
use rusqlite::params;

use crate::db::error::RepositoryError;
use crate::db::models::FollowerInfo;
use crate::state::DbPool;

#[async_trait]
pub trait FollowRepository: Send + Sync {
    async fn is_following(&self, follower: &str, followed: &str) -> Result<bool, RepositoryError>;

    /// Fails with `UniqueViolation` for an existing edge and `ForeignKeyViolation`
    /// when either user does not exist.
    async fn follow(&self, follower: &str, followed: &str) -> Result<(), RepositoryError>;

    /// Returns false when there was no edge to remove.
    async fn unfollow(&self, follower: &str, followed: &str) -> Result<bool, RepositoryError>;

    /// Followers of `user_id`, oldest edge first.
    async fn list_followers(&self, user_id: &str) -> Result<Vec<FollowerInfo>, RepositoryError>;
}

pub struct SqliteFollowRepository {
    pool: DbPool,
}

impl SqliteFollowRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FollowRepository for SqliteFollowRepository {
    async fn is_following(&self, follower: &str, followed: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let following = conn.query_row(
            "SELECT COUNT(*) > 0 FROM followers WHERE follower_id = ?1 AND following_id = ?2",
            params![follower, followed],
            |row| row.get(0),
        )?;
        Ok(following)
    }

    async fn follow(&self, follower: &str, followed: &str) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO followers (follower_id, following_id) VALUES (?1, ?2)",
            params![follower, followed],
        )?;
        Ok(())
    }

    async fn unfollow(&self, follower: &str, followed: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "DELETE FROM followers WHERE follower_id = ?1 AND following_id = ?2",
            params![follower, followed],
        )?;
        Ok(rows > 0)
    }

    async fn list_followers(&self, user_id: &str) -> Result<Vec<FollowerInfo>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT u.id, u.username
             FROM followers f
             JOIN users u ON u.id = f.follower_id
             WHERE f.following_id = ?1
             ORDER BY f.created_at, u.username",
        )?;

        let followers = stmt
            .query_map(params![user_id], |row| {
                Ok(FollowerInfo {
                    id: row.get(0)?,
                    username: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(followers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::repository::{new_user, SqliteUserRepository, UserRepository};
    use crate::db::test_pool;

    async fn setup() -> (SqliteFollowRepository, String, String) {
        let pool = test_pool();
        let users = SqliteUserRepository::new(pool.clone());
        let a = users.insert(new_user("alice")).await.unwrap().id;
        let b = users.insert(new_user("bob")).await.unwrap().id;
        (SqliteFollowRepository::new(pool), a, b)
    }

    #[tokio::test]
    async fn follow_then_unfollow() {
        let (repo, a, b) = setup().await;
        assert!(!repo.is_following(&a, &b).await.unwrap());

        repo.follow(&a, &b).await.unwrap();
        assert!(repo.is_following(&a, &b).await.unwrap());
        assert!(!repo.is_following(&b, &a).await.unwrap());

        assert!(repo.unfollow(&a, &b).await.unwrap());
        assert!(!repo.is_following(&a, &b).await.unwrap());
        assert!(!repo.unfollow(&a, &b).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_edge_is_unique_violation() {
        let (repo, a, b) = setup().await;
        repo.follow(&a, &b).await.unwrap();
        assert!(matches!(
            repo.follow(&a, &b).await,
            Err(RepositoryError::UniqueViolation { .. })
        ));
        assert_eq!(repo.list_followers(&b).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_user_is_foreign_key_violation() {
        let (repo, a, _) = setup().await;
        assert!(matches!(
            repo.follow(&a, "ghost").await,
            Err(RepositoryError::ForeignKeyViolation)
        ));
    }

    #[tokio::test]
    async fn followers_are_listed_with_usernames() {
        let (repo, a, b) = setup().await;
        assert!(repo.list_followers(&b).await.unwrap().is_empty());

        repo.follow(&a, &b).await.unwrap();
        let followers = repo.list_followers(&b).await.unwrap();
        assert_eq!(
            followers,
            vec![FollowerInfo {
                id: a.clone(),
                username: "alice".into()
            }]
        );
        assert!(repo.list_followers(&a).await.unwrap().is_empty());
    }
}

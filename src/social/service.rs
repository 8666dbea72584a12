use std::sync::Arc;

use crate::accounts::repository::UserRepository;
use crate::db::error::RepositoryError;
use crate::db::models::{FollowerInfo, PublicProfile};
use crate::error::{AppError, AppResult};
use crate::social::repository::FollowRepository;

pub struct SocialService {
    follows: Arc<dyn FollowRepository>,
    users: Arc<dyn UserRepository>,
}

impl SocialService {
    pub fn new(follows: Arc<dyn FollowRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { follows, users }
    }

    pub async fn public_profile(&self, user_id: &str) -> AppResult<PublicProfile> {
        require_id(user_id)?;
        self.users
            .find_by_id(user_id)
            .await?
            .map(PublicProfile::from)
            .ok_or_else(user_not_found)
    }

    /// `follower` starts following `followed`. Returns the success message.
    pub async fn follow(&self, follower: &str, followed: &str) -> AppResult<String> {
        require_id(followed)?;
        if follower == followed {
            return Err(AppError::BadRequest("You cannot follow yourself.".into()));
        }

        if self.follows.is_following(follower, followed).await? {
            return Err(already_following(follower, followed));
        }

        // A concurrent follow can still win between the check and the insert.
        self.follows
            .follow(follower, followed)
            .await
            .map_err(|e| match e {
                RepositoryError::UniqueViolation { .. } => already_following(follower, followed),
                RepositoryError::ForeignKeyViolation => user_not_found(),
                other => other.into(),
            })?;

        tracing::info!(follower, followed, "Follow edge created");
        Ok(format!("User {} followed successfully", followed))
    }

    pub async fn unfollow(&self, follower: &str, followed: &str) -> AppResult<String> {
        require_id(followed)?;

        if !self.follows.unfollow(follower, followed).await? {
            return Err(AppError::Conflict(format!(
                "User {} is already not being followed by user {}",
                followed, follower
            )));
        }

        tracing::info!(follower, followed, "Follow edge removed");
        Ok(format!("User {} has successfully unfollowed", followed))
    }

    pub async fn followers(&self, user_id: &str) -> AppResult<Vec<FollowerInfo>> {
        require_id(user_id)?;
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(user_not_found());
        }
        Ok(self.follows.list_followers(user_id).await?)
    }
}

fn require_id(id: &str) -> AppResult<()> {
    if id.trim().is_empty() {
        return Err(AppError::BadRequest("No ID provided".into()));
    }
    Ok(())
}

fn already_following(follower: &str, followed: &str) -> AppError {
    AppError::Conflict(format!(
        "User {} is already being followed by user {}",
        followed, follower
    ))
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found.".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::repository::{new_user, SqliteUserRepository};
    use crate::db::test_pool;
    use crate::social::repository::SqliteFollowRepository;

    async fn setup() -> (SocialService, String, String) {
        let pool = test_pool();
        let users = Arc::new(SqliteUserRepository::new(pool.clone()));
        let a = users.insert(new_user("alice")).await.unwrap().id;
        let b = users.insert(new_user("bob")).await.unwrap().id;
        let follows = Arc::new(SqliteFollowRepository::new(pool));
        (SocialService::new(follows, users), a, b)
    }

    #[tokio::test]
    async fn follow_twice_conflicts() {
        let (social, a, b) = setup().await;
        let msg = social.follow(&a, &b).await.unwrap();
        assert_eq!(msg, format!("User {} followed successfully", b));

        match social.follow(&a, &b).await {
            Err(AppError::Conflict(msg)) => assert_eq!(
                msg,
                format!("User {} is already being followed by user {}", b, a)
            ),
            other => panic!("expected conflict, got {:?}", other),
        }
        assert_eq!(social.followers(&b).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unfollow_twice_conflicts() {
        let (social, a, b) = setup().await;
        social.follow(&a, &b).await.unwrap();

        let msg = social.unfollow(&a, &b).await.unwrap();
        assert_eq!(msg, format!("User {} has successfully unfollowed", b));
        assert!(matches!(
            social.unfollow(&a, &b).await,
            Err(AppError::Conflict(_))
        ));
        assert!(social.followers(&b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn self_follow_is_rejected() {
        let (social, a, _) = setup().await;
        match social.follow(&a, &a).await {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "You cannot follow yourself."),
            other => panic!("expected bad request, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn following_unknown_user_is_not_found() {
        let (social, a, _) = setup().await;
        assert!(matches!(
            social.follow(&a, "ghost").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn zero_followers_is_an_empty_list() {
        let (social, a, _) = setup().await;
        assert!(social.followers(&a).await.unwrap().is_empty());
        assert!(matches!(
            social.followers("ghost").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn public_profile_hides_private_fields() {
        let (social, a, _) = setup().await;
        let profile = social.public_profile(&a).await.unwrap();
        assert_eq!(profile.username, "alice");

        assert!(matches!(
            social.public_profile("").await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            social.public_profile("ghost").await,
            Err(AppError::NotFound(_))
        ));
    }
}

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::accounts::repository::SqliteUserRepository;
use crate::accounts::service::AccountService;
use crate::auth::token::TokenService;
use crate::config::Config;
use crate::social::repository::SqliteFollowRepository;
use crate::social::service::SocialService;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub accounts: Arc<AccountService>,
    pub social: Arc<SocialService>,
}

impl AppState {
    /// Wire the services over an already-migrated pool.
    pub fn new(config: &Config, pool: DbPool) -> anyhow::Result<Self> {
        let tokens = Arc::new(TokenService::new(
            config.auth.jwt_secret.as_bytes(),
            config.token_ttl(),
        )?);
        let users = Arc::new(SqliteUserRepository::new(pool.clone()));
        let follows = Arc::new(SqliteFollowRepository::new(pool));

        let accounts = Arc::new(AccountService::new(
            users.clone(),
            tokens.clone(),
            config.auth.bcrypt_cost,
        ));
        let social = Arc::new(SocialService::new(follows, users));

        Ok(Self {
            tokens,
            accounts,
            social,
        })
    }
}

use async_trait::async_trait;
use fiscalia_application::ProfileListRefresher;
use fiscalia_core::AppResult;
use fiscalia_domain::UserId;
use tracing::info;

/// List refresher for surfaces without a live user list; records the request in logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingListRefresher;

#[async_trait]
impl ProfileListRefresher for LoggingListRefresher {
    async fn request_refresh(&self, user_id: UserId) -> AppResult<()> {
        info!(user_id = %user_id, "user profile list refresh requested");
        Ok(())
    }
}

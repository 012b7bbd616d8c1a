use std::collections::HashSet;

use redis::AsyncCommands;
use redis::Client;

use crate::error::AppResult;

/// Ids already recommended to a user, kept across expansion sessions
///
/// Stored as one Redis set per user. Failures never reach the caller: a missing
/// history only means a user may see a repeat.
#[derive(Clone)]
pub struct RecommendationHistory {
    redis_client: Client,
}

fn history_key(user_id: &str) -> String {
    format!("history:{}", user_id)
}

impl RecommendationHistory {
    pub fn new(redis_client: Client) -> Self {
        Self { redis_client }
    }

    /// Everything recommended to `user_id` so far, empty if Redis is unreachable
    pub async fn load(&self, user_id: &str) -> HashSet<String> {
        match self.try_load(user_id).await {
            Ok(ids) => {
                tracing::debug!(user_id, count = ids.len(), "Loaded recommendation history");
                ids
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Failed to load recommendation history");
                HashSet::new()
            }
        }
    }

    async fn try_load(&self, user_id: &str) -> AppResult<HashSet<String>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let ids: HashSet<String> = conn.smembers(history_key(user_id)).await?;
        Ok(ids)
    }

    /// Adds ids to the user's history
    pub async fn record(&self, user_id: &str, ids: &[String]) {
        if ids.is_empty() {
            return;
        }

        if let Err(e) = self.try_record(user_id, ids).await {
            tracing::warn!(user_id, error = %e, "Failed to record recommendation history");
        }
    }

    async fn try_record(&self, user_id: &str, ids: &[String]) -> AppResult<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.sadd(history_key(user_id), ids).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_redis_client;

    #[test]
    fn test_history_key() {
        assert_eq!(history_key("user-42"), "history:user-42");
    }

    #[tokio::test]
    async fn test_unreachable_redis_yields_empty_history() {
        // Nothing listens on port 1
        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let history = RecommendationHistory::new(client);

        history.record("user", &["a".to_string()]).await;
        assert!(history.load("user").await.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn test_record_then_load() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let client = create_redis_client(&redis_url).unwrap();
        let history = RecommendationHistory::new(client.clone());
        let user = format!("test-{}", uuid::Uuid::new_v4());

        history
            .record(&user, &["a".to_string(), "b".to_string()])
            .await;
        history.record(&user, &["b".to_string()]).await;

        let ids = history.load(&user).await;
        assert_eq!(ids, HashSet::from(["a".to_string(), "b".to_string()]));

        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let _: () = conn.del(history_key(&user)).await.unwrap();
    }
}

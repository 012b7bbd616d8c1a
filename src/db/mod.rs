pub mod redis;

pub use redis::create_redis_client;
pub use redis::Cache;
pub use redis::CacheWriterHandle;
pub use redis::CacheKey;
pub use redis::RecommendationHistory;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::db::RecommendationHistory;
use crate::models::LibraryItem;
use crate::services::{CatalogService, ExpansionSession, ExpansionSettings};

/// An open expansion session
///
/// The mutex serializes page requests; each page depends on the previous one.
#[derive(Clone)]
pub struct SessionEntry {
    pub user_id: Option<String>,
    pub session: Arc<Mutex<ExpansionSession>>,
}

struct SessionSlot {
    entry: SessionEntry,
    last_access: Instant,
}

impl SessionSlot {
    fn is_idle(&self, now: Instant, timeout: Duration) -> bool {
        now.duration_since(self.last_access) >= timeout
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogService>,
    pub history: Option<RecommendationHistory>,
    pub settings: ExpansionSettings,
    sessions: Arc<RwLock<HashMap<Uuid, SessionSlot>>>,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn CatalogService>,
        history: Option<RecommendationHistory>,
        settings: ExpansionSettings,
    ) -> Self {
        Self {
            catalog,
            history,
            settings,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Opens a session, seeded with the user's history when there is one
    pub async fn open_session(
        &self,
        user_id: Option<String>,
        library: &[LibraryItem],
    ) -> (Uuid, SessionEntry) {
        self.purge_idle_sessions().await;

        let previously_recommended = match (&self.history, &user_id) {
            (Some(history), Some(user_id)) => history.load(user_id).await,
            _ => HashSet::new(),
        };

        let session = ExpansionSession::open(
            Arc::clone(&self.catalog),
            library,
            previously_recommended,
            self.settings.clone(),
        );

        let id = Uuid::new_v4();
        let entry = SessionEntry {
            user_id,
            session: Arc::new(Mutex::new(session)),
        };
        self.sessions.write().await.insert(
            id,
            SessionSlot {
                entry: entry.clone(),
                last_access: Instant::now(),
            },
        );

        (id, entry)
    }

    /// Looks up a live session and marks it as used
    ///
    /// A session idle past the timeout is dropped here and reported as missing.
    pub async fn session(&self, id: &Uuid) -> Option<SessionEntry> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        if sessions
            .get(id)
            .is_some_and(|slot| slot.is_idle(now, self.settings.session_idle_timeout))
        {
            sessions.remove(id);
            tracing::info!(session_id = %id, "Expansion session expired");
            return None;
        }

        let slot = sessions.get_mut(id)?;
        slot.last_access = now;
        Some(slot.entry.clone())
    }

    pub async fn close_session(&self, id: &Uuid) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops every session idle past the timeout, returning how many went
    pub async fn purge_idle_sessions(&self) -> usize {
        let now = Instant::now();
        let timeout = self.settings.session_idle_timeout;
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, slot| !slot.is_idle(now, timeout));
        let purged = before - sessions.len();

        if purged > 0 {
            tracing::info!(purged, remaining = sessions.len(), "Idle expansion sessions dropped");
        }
        purged
    }

    /// Purges idle sessions once per timeout period for as long as the server runs
    pub fn spawn_session_sweeper(&self) -> JoinHandle<()> {
        let state = self.clone();
        let period = self.settings.session_idle_timeout.max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                state.purge_idle_sessions().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockCatalogService;

    fn state_with_idle_timeout(timeout: Duration) -> AppState {
        let mut mock = MockCatalogService::new();
        mock.expect_fetch_top_tracks().returning(|_| Ok(vec![]));
        let settings = ExpansionSettings {
            session_idle_timeout: timeout,
            ..Default::default()
        };
        AppState::new(Arc::new(mock), None, settings)
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let state = state_with_idle_timeout(Duration::from_secs(60));

        let (id, entry) = state.open_session(Some("user".to_string()), &[]).await;
        assert_eq!(entry.user_id.as_deref(), Some("user"));
        assert_eq!(state.session_count().await, 1);
        assert!(state.session(&id).await.is_some());

        assert!(state.close_session(&id).await);
        assert!(!state.close_session(&id).await);
        assert!(state.session(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_idle_session_expires_on_lookup() {
        let state = state_with_idle_timeout(Duration::from_millis(40));
        let (id, _) = state.open_session(None, &[]).await;

        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(state.session(&id).await.is_none());
        assert_eq!(state.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_purge_keeps_recently_used_sessions() {
        let state = state_with_idle_timeout(Duration::from_millis(150));
        let (stale, _) = state.open_session(None, &[]).await;
        let (active, _) = state.open_session(None, &[]).await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(state.session(&active).await.is_some());
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(state.purge_idle_sessions().await, 1);
        assert!(state.session(&stale).await.is_none());
        assert!(state.session(&active).await.is_some());
    }
}

//! In-memory stores for sessions and report exports
//!
//! Nothing here outlives the process.

use crate::config::DEFAULT_MAX_STORED_REPORTS;
use crate::error::ResearchError;
use crate::models::ChatTurn;
use crate::session::SessionContext;
use crate::tables::TableExport;
use crate::Result;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

/// Shared handle to one session. Hold the lock for the whole
/// read-modify-write so concurrent requests on a session never lose turns.
pub type SessionHandle = Arc<Mutex<SessionContext>>;

/// Session id → session context
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Handle to a session, creating it if unknown
    pub async fn get_or_create(&self, session_id: Uuid) -> SessionHandle {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(&session_id) {
                return Arc::clone(session);
            }
        }

        let mut sessions = self.sessions.write().await;
        Arc::clone(
            sessions
                .entry(session_id)
                .or_insert_with(|| Arc::new(Mutex::new(SessionContext::new(session_id)))),
        )
    }

    pub async fn history(&self, session_id: Uuid) -> Result<Vec<ChatTurn>> {
        let session = {
            let sessions = self.sessions.read().await;
            sessions
                .get(&session_id)
                .map(Arc::clone)
                .ok_or_else(|| ResearchError::NotFound(format!("session {}", session_id)))?
        };

        let session = session.lock().await;
        Ok(session.messages().to_vec())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Report id → CSV exports of that report's tables, oldest first.
/// Holds at most `capacity` reports.
pub struct ReportStore {
    exports: Arc<RwLock<IndexMap<Uuid, Vec<TableExport>>>>,
    capacity: usize,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_STORED_REPORTS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            exports: Arc::new(RwLock::new(IndexMap::new())),
            capacity: capacity.max(1),
        }
    }

    pub async fn insert(&self, report_id: Uuid, exports: Vec<TableExport>) {
        let mut stored = self.exports.write().await;
        stored.insert(report_id, exports);

        while stored.len() > self.capacity {
            if let Some((evicted, _)) = stored.shift_remove_index(0) {
                debug!(report_id = %evicted, "Evicting oldest stored report");
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.exports.read().await.len()
    }

    pub async fn export(&self, report_id: Uuid, file_name: &str) -> Result<TableExport> {
        let stored = self.exports.read().await;

        stored
            .get(&report_id)
            .ok_or_else(|| ResearchError::NotFound(format!("report {}", report_id)))?
            .iter()
            .find(|e| e.file_name == file_name)
            .cloned()
            .ok_or_else(|| ResearchError::NotFound(format!("{} in report {}", file_name, report_id)))
    }
}

impl Default for ReportStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatRole;

    fn csv_export(body: &[u8]) -> Vec<TableExport> {
        vec![TableExport {
            label: "Table 1".to_string(),
            file_name: "table_1.csv".to_string(),
            mime: "text/csv".to_string(),
            bytes: body.to_vec(),
        }]
    }

    #[tokio::test]
    async fn test_session_turns_are_visible_in_history() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();

        let handle = store.get_or_create(id).await;
        handle.lock().await.push_turn(ChatRole::User, "hi");

        let history = store.history(id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "hi");
    }

    #[tokio::test]
    async fn test_same_id_shares_one_session() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();

        let first = store.get_or_create(id).await;
        let second = store.get_or_create(id).await;
        assert!(Arc::ptr_eq(&first, &second));

        let (a, b) = (Arc::clone(&first), Arc::clone(&second));
        let left = tokio::spawn(async move {
            a.lock().await.push_turn(ChatRole::User, "left");
        });
        let right = tokio::spawn(async move {
            b.lock().await.push_turn(ChatRole::User, "right");
        });
        left.await.unwrap();
        right.await.unwrap();

        assert_eq!(store.history(id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_session_history_is_not_found() {
        let store = SessionStore::new();
        let result = store.history(Uuid::new_v4()).await;
        assert!(matches!(result, Err(ResearchError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_report_export_lookup() {
        let store = ReportStore::new();
        let id = Uuid::new_v4();
        store.insert(id, csv_export(b"A\n1\n")).await;

        let export = store.export(id, "table_1.csv").await.unwrap();
        assert_eq!(export.bytes, b"A\n1\n".to_vec());
        assert!(store.export(id, "table_2.csv").await.is_err());
    }

    #[test]
    fn test_oldest_report_is_evicted_at_capacity() {
        let store = ReportStore::with_capacity(2);
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();

        tokio_test::block_on(async {
            for id in &ids {
                store.insert(*id, csv_export(b"A\n1\n")).await;
            }

            assert_eq!(store.len().await, 2);
            assert!(matches!(
                store.export(ids[0], "table_1.csv").await,
                Err(ResearchError::NotFound(_))
            ));
            assert!(store.export(ids[1], "table_1.csv").await.is_ok());
            assert!(store.export(ids[2], "table_1.csv").await.is_ok());
        });
    }
}

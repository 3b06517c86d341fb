//! In-memory session store with a hard cap on the number of live sessions.
//!
//! Every anonymous visit to `/` starts a login and so creates a session. When
//! the cap is reached, expired records go first, then the anonymous record
//! closest to expiry, and only then a signed-in one.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, SessionStore};

use crate::models::keys;

#[derive(Clone, Debug)]
pub struct BoundedMemoryStore {
    records: Arc<Mutex<HashMap<Id, Record>>>,
    max_sessions: usize,
}

impl BoundedMemoryStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            max_sessions: max_sessions.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Drops every expired record and returns how many were removed.
    pub async fn delete_expired(&self) -> usize {
        let mut records = self.records.lock().await;
        purge_expired(&mut records)
    }

    /// Sweeps expired records every `period`. Runs until the task is dropped.
    pub async fn continuously_delete_expired(self, period: std::time::Duration) {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let removed = self.delete_expired().await;
            let live = self.len().await;
            metrics::gauge!("sessions_active").set(live as f64);
            if removed > 0 {
                tracing::debug!(removed, live, "Deleted expired sessions");
            }
        }
    }

    fn make_room(&self, records: &mut HashMap<Id, Record>) {
        if records.len() < self.max_sessions {
            return;
        }

        purge_expired(records);

        while records.len() >= self.max_sessions {
            let Some(victim) = eviction_candidate(records) else {
                break;
            };
            records.remove(&victim);
            metrics::counter!("sessions_evicted_total").increment(1);
            tracing::debug!(max_sessions = self.max_sessions, "Evicted session at capacity");
        }
    }
}

fn is_active(record: &Record, now: OffsetDateTime) -> bool {
    record.expiry_date > now
}

fn is_authenticated(record: &Record) -> bool {
    record.data.contains_key(keys::IDENTITY)
}

fn purge_expired(records: &mut HashMap<Id, Record>) -> usize {
    let now = OffsetDateTime::now_utc();
    let before = records.len();
    records.retain(|_, record| is_active(record, now));
    before - records.len()
}

/// Anonymous records before signed-in ones, earliest expiry first.
fn eviction_candidate(records: &HashMap<Id, Record>) -> Option<Id> {
    records
        .values()
        .min_by_key(|record| (is_authenticated(record), record.expiry_date))
        .map(|record| record.id)
}

#[async_trait]
impl SessionStore for BoundedMemoryStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let mut records = self.records.lock().await;
        while records.contains_key(&record.id) {
            record.id = Id::default();
        }
        self.make_room(&mut records);
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let mut records = self.records.lock().await;
        if !records.contains_key(&record.id) {
            self.make_room(&mut records);
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let mut records = self.records.lock().await;
        let now = OffsetDateTime::now_utc();
        match records.get(session_id) {
            Some(record) if is_active(record, now) => Ok(Some(record.clone())),
            Some(_) => {
                records.remove(session_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.records.lock().await.remove(session_id);
        Ok(())
    }
}

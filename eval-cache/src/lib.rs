//! Short-lived store of in-flight evaluations.
//!
//! Entries are written once at evaluation creation and read on every poll.
//! Payloads are kept as JSON and decoded at read time; an entry that cannot
//! be decoded is indistinguishable from an absent one, since both mean the
//! caller cannot proceed.

use poll_api::evaluation::PendingEvaluation;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct Entry {
    payload: String,
    expires_at: Instant,
    finalized: bool,
}

pub struct EvalCache {
    entries: tokio::sync::Mutex<HashMap<String, Entry>>,
    ttl: Duration,
}

impl EvalCache {
    pub fn new(ttl: Duration) -> EvalCache {
        EvalCache {
            entries: tokio::sync::Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Stores an evaluation under `id`, replacing any previous entry.
    pub async fn put(&self, id: &str, eval: &PendingEvaluation) -> Result<(), serde_json::Error> {
        let payload = serde_json::to_string(eval)?;
        self.put_raw(id, payload).await;
        Ok(())
    }

    /// Stores an arbitrary payload. Decoding happens on `get`, so a payload
    /// that is not a valid evaluation behaves like a missing entry.
    pub async fn put_raw(&self, id: &str, payload: String) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            id.to_string(),
            Entry {
                payload,
                expires_at: Instant::now() + self.ttl,
                finalized: false,
            },
        );
    }

    /// Returns the evaluation stored under `id`. Absent, expired and
    /// undecodable entries all read as `None`.
    pub async fn get(&self, id: &str) -> Option<PendingEvaluation> {
        let mut entries = self.entries.lock().await;
        let expired = entries.get(id)?.expires_at <= Instant::now();
        if expired {
            entries.remove(id);
            return None;
        }
        let entry = entries.get(id)?;
        match serde_json::from_str(&entry.payload) {
            Ok(eval) => Some(eval),
            Err(err) => {
                tracing::warn!(id, %err, "cached evaluation failed to decode");
                None
            }
        }
    }

    /// Sets the finalization marker for `id`, returning true only on the
    /// first call. Gates the ledger write so a terminal re-poll does not
    /// persist the submission twice. If the entry has already expired there
    /// is nothing left to dedupe against and the caller may proceed.
    pub async fn mark_finalized(&self, id: &str) -> bool {
        let mut entries = self.entries.lock().await;
        match entries.get_mut(id) {
            Some(entry) if entry.finalized => false,
            Some(entry) => {
                entry.finalized = true;
                true
            }
            None => true,
        }
    }

    pub async fn remove(&self, id: &str) {
        self.entries.lock().await.remove(id);
    }

    /// Evicts expired entries. The service runs this periodically; expiry is
    /// also enforced lazily on `get`.
    pub async fn sweep(&self) {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .retain(|_, entry| entry.expires_at > now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poll_api::evaluation::ExecutionFlag;

    fn eval() -> PendingEvaluation {
        PendingEvaluation {
            problem_id: "p1".to_string(),
            user_id: "u1".to_string(),
            code: "print(1)".to_string(),
            language: "python".to_string(),
            problem_title: "two-sum".to_string(),
            flag: ExecutionFlag::Submit,
            token: "tok".to_string(),
        }
    }

    #[tokio::test]
    async fn round_trips_an_evaluation() {
        let cache = EvalCache::new(Duration::from_secs(60));
        cache.put("id-1", &eval()).await.unwrap();
        let got = cache.get("id-1").await.unwrap();
        assert_eq!(got.token, "tok");
        assert_eq!(got.flag, ExecutionFlag::Submit);
    }

    #[tokio::test]
    async fn expired_entries_read_as_absent() {
        let cache = EvalCache::new(Duration::from_millis(20));
        cache.put("id-1", &eval()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.get("id-1").await.is_none());
    }

    #[tokio::test]
    async fn corrupt_payloads_read_as_absent() {
        let cache = EvalCache::new(Duration::from_secs(60));
        cache.put_raw("id-1", "{\"not\": \"an evaluation\"}".to_string()).await;
        assert!(cache.get("id-1").await.is_none());
    }

    #[tokio::test]
    async fn finalization_marker_fires_once() {
        let cache = EvalCache::new(Duration::from_secs(60));
        cache.put("id-1", &eval()).await.unwrap();
        assert!(cache.mark_finalized("id-1").await);
        assert!(!cache.mark_finalized("id-1").await);
    }

    #[tokio::test]
    async fn sweep_evicts_expired_entries() {
        let cache = EvalCache::new(Duration::from_millis(20));
        cache.put("id-1", &eval()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        cache.sweep().await;
        assert!(cache.entries.lock().await.is_empty());
    }
}

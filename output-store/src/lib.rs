//! Read-only lookup of per-test-case expected outputs.
//!
//! Each problem ships its expected outputs as static files under
//! `<root>/<title>/output/<i>.txt`, named by 1-based index. The first missing
//! index ends the list; a missing problem directory means no expected data
//! exists and comparison must degrade rather than fail.

use std::{collections::HashMap, path::PathBuf};

/// Upper bound on test cases per problem.
pub const MAX_TEST_CASES: usize = 10;

/// Stores loaded expected outputs, keyed by problem title.
pub struct Store {
    root: PathBuf,
    /// Only successful lookups are cached, so a problem deployed after a
    /// miss is picked up on the next poll.
    cache: tokio::sync::Mutex<HashMap<String, Vec<String>>>,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Store {
        Store {
            root: root.into(),
            cache: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Returns the ordered expected outputs for `title`, or `None` when the
    /// problem has no output data on disk.
    #[tracing::instrument(skip(self))]
    pub async fn expected(&self, title: &str) -> Option<Vec<String>> {
        let mut cache = self.cache.lock().await;
        if let Some(outputs) = cache.get(title) {
            return Some(outputs.clone());
        }

        let dir = self.root.join(title).join("output");
        let mut outputs = Vec::new();
        for index in 1..=MAX_TEST_CASES {
            match tokio::fs::read_to_string(dir.join(format!("{}.txt", index))).await {
                Ok(data) => outputs.push(data),
                Err(_) => break,
            }
        }
        if outputs.is_empty() {
            tracing::warn!(title, "no expected outputs found");
            return None;
        }
        cache.insert(title.to_string(), outputs.clone());
        Some(outputs)
    }
}

//! Bounded fan-out for bulk generation requests.
//!
//! ```text
//! prompts ──▶ JoinSet::spawn × N ──▶ Semaphore(max_concurrency) ──▶ backend
//!                                                                     │
//! results (input order, "[error: …]" per failure) ◀───────────────────┘
//! ```

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::ModelBackend;

/// Concurrency cap used by callers that have no better figure
pub const DEFAULT_BATCH_CONCURRENCY: usize = 5;

fn error_placeholder(reason: impl std::fmt::Display) -> String {
    format!("[error: {reason}]")
}

/// Run every prompt against `backend` with at most `max_concurrency` in flight.
///
/// Results line up with `prompts`. A failed call yields a placeholder string
/// instead of failing the batch.
pub async fn generate_batch(
    backend: Arc<dyn ModelBackend>,
    prompts: Vec<String>,
    max_tokens: u32,
    max_concurrency: usize,
) -> Vec<String> {
    let total = prompts.len();
    let sem = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut join_set: JoinSet<(usize, String)> = JoinSet::new();

    for (idx, prompt) in prompts.into_iter().enumerate() {
        let sem = sem.clone();
        let backend = backend.clone();
        join_set.spawn(async move {
            let _permit = match sem.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return (idx, error_placeholder("batch cancelled")),
            };
            match backend.generate(&prompt, max_tokens).await {
                Ok(text) => (idx, text),
                Err(e) => {
                    debug!(idx, error = %e, "Batch item failed");
                    (idx, error_placeholder(e))
                }
            }
        });
    }

    let mut results: Vec<Option<String>> = vec![None; total];
    while let Some(res) = join_set.join_next().await {
        match res {
            Ok((idx, text)) => results[idx] = Some(text),
            Err(e) => warn!(error = %e, "Batch worker panicked"),
        }
    }

    results
        .into_iter()
        .map(|r| r.unwrap_or_else(|| error_placeholder("worker panicked")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, BackendResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingBackend {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl ModelBackend for CountingBackend {
        fn name(&self) -> String {
            "counting".into()
        }

        async fn generate(&self, prompt: &str, _max_tokens: u32) -> BackendResult<String> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if prompt.contains("fail") {
                Err(BackendError::Request("boom".into()))
            } else {
                Ok(prompt.to_uppercase())
            }
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_batch_caps_concurrency_and_keeps_order() {
        let backend = Arc::new(CountingBackend::default());
        let prompts: Vec<String> = (0..12).map(|i| format!("p{i}")).collect();

        let results = generate_batch(backend.clone(), prompts, 16, 3).await;

        assert_eq!(results.len(), 12);
        assert_eq!(results[0], "P0");
        assert_eq!(results[11], "P11");
        assert!(backend.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_batch_isolates_failures() {
        let backend = Arc::new(CountingBackend::default());
        let prompts = vec!["a".to_string(), "fail".to_string(), "c".to_string()];

        let results = generate_batch(backend, prompts, 16, DEFAULT_BATCH_CONCURRENCY).await;

        assert_eq!(results[0], "A");
        assert_eq!(results[1], "[error: Request failed: boom]");
        assert_eq!(results[2], "C");
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let backend = Arc::new(CountingBackend::default());
        assert!(generate_batch(backend, Vec::new(), 16, 5).await.is_empty());
    }
}

//! Shared request cache: one client per application, holding cached query
//! results and a global hook for failed mutations.

use std::any::Any;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const UNKNOWN_ERROR: &str = "unknown error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPolicy {
    pub refetch_on_window_focus: bool,
    /// Extra attempts after a failed fetch.
    pub retry: u32,
    /// How long a cached value stays fresh. `None` never goes stale.
    pub stale_time: Option<Duration>,
}

impl Default for QueryPolicy {
    fn default() -> Self {
        Self {
            refetch_on_window_focus: false,
            retry: 0,
            stale_time: None,
        }
    }
}

type ErrorHook = Arc<dyn Fn(&str) + Send + Sync>;

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
    invalidated: bool,
}

#[derive(Clone)]
pub struct QueryClient {
    policy: QueryPolicy,
    cache: Arc<Mutex<HashMap<String, CacheEntry>>>,
    on_mutation_error: Option<ErrorHook>,
}

impl QueryClient {
    pub fn new(policy: QueryPolicy) -> Self {
        Self {
            policy,
            cache: Arc::new(Mutex::new(HashMap::new())),
            on_mutation_error: None,
        }
    }

    /// Called with the message of every failed mutation, wherever it was started.
    pub fn with_mutation_error_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_mutation_error = Some(Arc::new(hook));
        self
    }

    pub fn policy(&self) -> &QueryPolicy {
        &self.policy
    }

    fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        if entry.invalidated {
            return false;
        }
        match self.policy.stale_time {
            None => true,
            Some(stale_time) => now.saturating_duration_since(entry.fetched_at) < stale_time,
        }
    }

    fn cached<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let cache = self.cache.lock().ok()?;
        let entry = cache.get(key)?;
        if !self.is_fresh(entry, Instant::now()) {
            return None;
        }
        entry.value.downcast_ref::<T>().cloned()
    }

    /// Returns the cached value for `key` while it is fresh, otherwise runs `fetcher`.
    pub async fn fetch_query<T, E, F, Fut>(&self, key: &str, mut fetcher: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        if let Some(value) = self.cached::<T>(key) {
            log::debug!("Query {key}: cache hit");
            return Ok(value);
        }

        let mut attempt = 0;
        let value = loop {
            match fetcher().await {
                Ok(value) => break value,
                Err(e) if attempt < self.policy.retry => {
                    attempt += 1;
                    log::warn!("Query {key} failed ({e}), retry {attempt}/{}", self.policy.retry);
                }
                Err(e) => return Err(e),
            }
        };

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(
                key.to_string(),
                CacheEntry {
                    value: Arc::new(value.clone()),
                    fetched_at: Instant::now(),
                    invalidated: false,
                },
            );
        }
        Ok(value)
    }

    pub fn invalidate(&self, key: &str) {
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(entry) = cache.get_mut(key) {
                entry.invalidated = true;
            }
        }
    }

    /// Window regained focus. Marks every entry stale when the policy asks for refetching.
    pub fn on_window_focus(&self) {
        if !self.policy.refetch_on_window_focus {
            return;
        }
        if let Ok(mut cache) = self.cache.lock() {
            for entry in cache.values_mut() {
                entry.invalidated = true;
            }
        }
    }

    /// Runs a mutation. Failures go to the global hook before being handed back.
    pub async fn mutate<T, E, Fut>(&self, mutation: Fut) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Error,
    {
        let result = mutation.await;
        if let Err(e) = &result {
            let message = e.to_string();
            let message = if message.is_empty() {
                UNKNOWN_ERROR
            } else {
                message.as_str()
            };
            log::error!("Mutation failed: {message}");
            if let Some(hook) = &self.on_mutation_error {
                hook(message);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct TestError(String);

    fn recording_client(policy: QueryPolicy) -> (QueryClient, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let client = QueryClient::new(policy)
            .with_mutation_error_hook(move |message| sink.lock().unwrap().push(message.to_string()));
        (client, seen)
    }

    #[test]
    fn default_policy_never_refetches_or_retries() {
        let policy = QueryPolicy::default();
        assert!(!policy.refetch_on_window_focus);
        assert_eq!(policy.retry, 0);
        assert_eq!(policy.stale_time, None);
    }

    #[tokio::test]
    async fn cached_values_never_go_stale_by_default() {
        let client = QueryClient::new(QueryPolicy::default());
        let calls = AtomicU32::new(0);

        for _ in 0..3 {
            let value: Result<u32, TestError> = client
                .fetch_query("products", || async {
                    Ok(calls.fetch_add(1, Ordering::SeqCst) + 10)
                })
                .await;
            assert_eq!(value.unwrap(), 10);
        }
        client.on_window_focus();
        let again: Result<u32, TestError> = client
            .fetch_query("products", || async { Ok(99) })
            .await;

        assert_eq!(again.unwrap(), 10);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let client = QueryClient::new(QueryPolicy::default());
        let first: Result<&'static str, TestError> =
            client.fetch_query("k", || async { Ok("old") }).await;
        client.invalidate("k");
        let second: Result<&'static str, TestError> =
            client.fetch_query("k", || async { Ok("new") }).await;

        assert_eq!(first.unwrap(), "old");
        assert_eq!(second.unwrap(), "new");
    }

    #[tokio::test]
    async fn failed_fetch_is_not_retried_by_default() {
        let client = QueryClient::new(QueryPolicy::default());
        let calls = AtomicU32::new(0);

        let result: Result<u32, TestError> = client
            .fetch_query("k", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError("down".into()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_when_policy_allows() {
        let client = QueryClient::new(QueryPolicy {
            retry: 2,
            ..QueryPolicy::default()
        });
        let calls = AtomicU32::new(0);

        let result: Result<u32, TestError> = client
            .fetch_query("k", || async {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 | 1 => Err(TestError("flaky".into())),
                    n => Ok(n),
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
    }

    #[tokio::test]
    async fn failed_mutation_reaches_hook_with_its_message() {
        let (client, seen) = recording_client(QueryPolicy::default());

        let result: Result<(), TestError> = client
            .mutate(async { Err(TestError("Network Error".into())) })
            .await;

        assert!(result.is_err());
        assert_eq!(*seen.lock().unwrap(), vec!["Network Error".to_string()]);
    }

    #[tokio::test]
    async fn empty_error_message_falls_back() {
        let (client, seen) = recording_client(QueryPolicy::default());

        let _: Result<(), TestError> = client.mutate(async { Err(TestError(String::new())) }).await;

        assert_eq!(*seen.lock().unwrap(), vec![UNKNOWN_ERROR.to_string()]);
    }

    #[tokio::test]
    async fn successful_mutation_skips_hook() {
        let (client, seen) = recording_client(QueryPolicy::default());

        let value: Result<u8, TestError> = client.mutate(async { Ok(7) }).await;

        assert_eq!(value.unwrap(), 7);
        assert!(seen.lock().unwrap().is_empty());
    }
}

//! Periodic re-probe loop over the whole registry.

use std::time::Duration;

use tracing::{info, warn};

use super::{Record, RegistryStore, Status};

/// Shortest period between rounds; shorter requests are raised to this.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Re-probe every record once per `interval`.
///
/// The first round runs immediately. `on_round` sees the refreshed records
/// after each successful round. A failed round is logged and the loop keeps
/// going. With `rounds` set the loop returns after that many rounds, otherwise
/// it runs until the task is cancelled. An `interval` below one millisecond,
/// including zero, is raised to one millisecond.
pub async fn run_monitor<F>(
    store: &RegistryStore,
    interval: Duration,
    rounds: Option<usize>,
    mut on_round: F,
) where
    F: FnMut(&[Record]),
{
    let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
    let mut completed = 0usize;

    loop {
        if rounds.is_some_and(|limit| completed >= limit) {
            break;
        }
        ticker.tick().await;
        completed += 1;

        match store.refresh_all().await {
            Ok(records) => {
                let active = records
                    .iter()
                    .filter(|r| r.status == Status::Active)
                    .count();
                info!(
                    round = completed,
                    total = records.len(),
                    active,
                    inactive = records.len() - active,
                    "Registry refreshed"
                );
                on_round(&records);
            }
            Err(e) => {
                warn!(round = completed, error = %e, "Registry refresh failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Prober;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Up;

    #[async_trait]
    impl Prober for Up {
        async fn probe(&self, _endpoint: &str) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_monitor_runs_requested_rounds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("websites.csv");
        std::fs::write(&path, "name,url,status\na,https://a.com,inactive\n").unwrap();
        let store = RegistryStore::new(&path, Arc::new(Up));

        let mut seen = Vec::new();
        run_monitor(&store, Duration::from_millis(10), Some(3), |records| {
            seen.push(records.to_vec())
        })
        .await;

        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0][0].status, Status::Active);
        assert_eq!(store.load()[0].status, Status::Active);
    }

    #[tokio::test]
    async fn test_monitor_survives_failed_rounds() {
        let dir = tempfile::tempdir().unwrap();
        // The store path is a directory, so every rewrite fails.
        let path = dir.path().join("websites.csv");
        std::fs::create_dir_all(&path).unwrap();
        let store = RegistryStore::new(&path, Arc::new(Up));

        let mut calls = 0;
        run_monitor(&store, Duration::from_millis(5), Some(2), |_| calls += 1).await;
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn test_zero_interval_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("websites.csv");
        std::fs::write(&path, "name,url,status\na,https://a.com,inactive\n").unwrap();
        let store = RegistryStore::new(&path, Arc::new(Up));

        let mut calls = 0;
        run_monitor(&store, Duration::ZERO, Some(2), |_| calls += 1).await;
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_monitor_leaves_unreadable_registry_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("websites.csv");
        let content = "nme,url,status\na,https://a.com,inactive\n";
        std::fs::write(&path, content).unwrap();
        let store = RegistryStore::new(&path, Arc::new(Up));

        let mut calls = 0;
        run_monitor(&store, Duration::from_millis(5), Some(2), |_| calls += 1).await;
        assert_eq!(calls, 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }

    #[tokio::test]
    async fn test_zero_rounds_returns_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::new(dir.path().join("websites.csv"), Arc::new(Up));
        run_monitor(&store, Duration::from_secs(3600), Some(0), |_| {}).await;
        assert!(!store.path().exists());
    }
}

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;

use voidcity_api::{CatalogError, CatalogService};
use voidcity_core::models::Serial;

/// Result of a full catalog fetch.
#[derive(Debug, Clone, Default)]
pub struct LoadedCatalog {
    pub serials: Vec<Serial>,
    /// Serials whose episode fetch failed and were loaded with no episodes.
    pub degraded: Vec<String>,
}

/// Summary of a load, for status lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub serials: usize,
    pub episodes: usize,
    pub degraded: Vec<String>,
}

impl LoadedCatalog {
    pub fn report(&self) -> LoadReport {
        LoadReport {
            serials: self.serials.len(),
            episodes: self.serials.iter().map(Serial::episode_count).sum(),
            degraded: self.degraded.clone(),
        }
    }
}

/// Run a remote call, treating anything slower than `deadline` as a network failure.
pub async fn with_deadline<T>(
    deadline: Duration,
    call: impl Future<Output = Result<T, CatalogError>>,
) -> Result<T, CatalogError> {
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(?deadline, "Remote call timed out");
            Err(CatalogError::Timeout(deadline))
        }
    }
}

/// Fetch every serial, then every serial's episodes concurrently.
///
/// Only the listing call can fail the load. Each episode fetch settles on its
/// own; a failed one leaves that serial with an empty episode list.
pub async fn load_catalog<S: CatalogService>(
    service: &S,
    deadline: Duration,
) -> Result<LoadedCatalog, CatalogError> {
    let serials = with_deadline(deadline, service.list_serials()).await?;

    let fetches = serials.into_iter().map(|mut serial| async move {
        let result = with_deadline(deadline, service.list_episodes(&serial.id)).await;
        match result {
            Ok(episodes) => {
                serial.episodes = Some(episodes);
                (serial, false)
            }
            Err(e) => {
                tracing::warn!(serial_id = %serial.id, "Episode fetch failed: {e}");
                serial.episodes = Some(Vec::new());
                (serial, true)
            }
        }
    });

    let mut loaded = LoadedCatalog::default();
    for (serial, failed) in join_all(fetches).await {
        if failed {
            loaded.degraded.push(serial.id.clone());
        }
        loaded.serials.push(serial);
    }

    tracing::info!(
        serials = loaded.serials.len(),
        degraded = loaded.degraded.len(),
        "Catalog loaded"
    );
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeCatalog;

    #[tokio::test]
    async fn test_load_keeps_server_order_and_episodes() {
        let fake = FakeCatalog::with_serials(&["s1", "s2", "s3"]);
        fake.set_episodes("s1", &["e1", "e2"]);
        fake.set_episodes("s3", &["e3"]);

        let loaded = load_catalog(&fake, Duration::from_secs(5)).await.unwrap();
        let ids: Vec<&str> = loaded.serials.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["s1", "s2", "s3"]);
        assert_eq!(loaded.serials[0].episode_count(), 2);
        assert_eq!(loaded.serials[1].episodes, Some(vec![]));
        assert!(loaded.degraded.is_empty());
        assert_eq!(fake.calls("list_episodes"), 3);

        let report = loaded.report();
        assert_eq!(report.serials, 3);
        assert_eq!(report.episodes, 3);
    }

    #[tokio::test]
    async fn test_episode_failure_degrades_one_serial() {
        let fake = FakeCatalog::with_serials(&["s1", "s2"]);
        fake.set_episodes("s1", &["e1"]);
        fake.fail_episodes_for("s2", 500);

        let loaded = load_catalog(&fake, Duration::from_secs(5)).await.unwrap();
        assert_eq!(loaded.serials[0].episode_count(), 1);
        assert_eq!(loaded.serials[1].episodes, Some(vec![]));
        assert_eq!(loaded.degraded, ["s2"]);
    }

    #[tokio::test]
    async fn test_listing_failure_fails_load() {
        let fake = FakeCatalog::with_serials(&["s1"]);
        fake.fail("list_serials", 401);
        let err = load_catalog(&fake, Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, CatalogError::Auth(_)));
        assert_eq!(fake.calls("list_episodes"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_turns_hang_into_timeout() {
        let err = with_deadline(Duration::from_secs(30), async {
            std::future::pending::<()>().await;
            Ok::<(), CatalogError>(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, CatalogError::Timeout(d) if d == Duration::from_secs(30)));
    }
}

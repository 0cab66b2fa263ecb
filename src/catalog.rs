//! TTL-cached catalog snapshots over a release backend
//!
//! The catalog is the only shared mutable state in the system. Each refresh
//! produces an immutable, normalized snapshot that every concurrent request
//! reads without synchronization. Refreshes are single-flight: while one is
//! in progress, concurrent callers either observe the prior snapshot (still
//! within its TTL) or await the one in-flight fetch, never trigger a
//! duplicate. The refresh runs on its own task, so a caller aborted mid-wait
//! cannot leave a half-applied snapshot behind.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::backend::{Backend, BackendError};
use crate::version::channel::channel_of;
use crate::version::types::Version;

/// Immutable catalog snapshot, newest version first
pub type Snapshot = Arc<Vec<Version>>;

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Catalog refresh failed: {0}")]
    Refresh(#[source] Arc<BackendError>),
}

type RefreshResult = Result<Snapshot, Arc<BackendError>>;
type RefreshFuture = Shared<BoxFuture<'static, RefreshResult>>;

#[derive(Default)]
struct State {
    snapshot: Option<(Instant, Snapshot)>,
    inflight: Option<RefreshFuture>,
}

/// Cached view of a backend's published versions
pub struct Catalog {
    backend: Arc<dyn Backend>,
    ttl: Duration,
    state: Arc<Mutex<State>>,
}

impl Catalog {
    pub fn new(backend: Arc<dyn Backend>, ttl: Duration) -> Self {
        Self {
            backend,
            ttl,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Return the current snapshot, refreshing it through the backend when
    /// the cached one has expired
    pub async fn list(&self) -> Result<Snapshot, CatalogError> {
        let refresh = {
            let mut state = self.state.lock().await;

            if let Some((refreshed_at, snapshot)) = &state.snapshot {
                if refreshed_at.elapsed() < self.ttl {
                    debug!("Serving catalog snapshot from cache");
                    return Ok(snapshot.clone());
                }
            }

            match &state.inflight {
                Some(refresh) => {
                    debug!("Awaiting in-flight catalog refresh");
                    refresh.clone()
                }
                None => {
                    let refresh = self.spawn_refresh();
                    state.inflight = Some(refresh.clone());
                    refresh
                }
            }
        };

        refresh.await.map_err(CatalogError::Refresh)
    }

    /// Spawn the refresh on its own task so it completes even when every
    /// awaiting caller is cancelled; the task publishes the snapshot and
    /// releases the in-flight slot itself
    fn spawn_refresh(&self) -> RefreshFuture {
        let backend = self.backend.clone();
        let state = Arc::clone(&self.state);

        let handle = tokio::spawn(async move {
            let result = fetch_snapshot(backend).await.map(Arc::new).map_err(Arc::new);

            let mut state = state.lock().await;
            state.inflight = None;
            if let Ok(snapshot) = &result {
                state.snapshot = Some((Instant::now(), snapshot.clone()));
            }
            result
        });

        async move {
            match handle.await {
                Ok(result) => result,
                Err(err) => Err(Arc::new(BackendError::InvalidResponse(format!(
                    "Catalog refresh task failed: {err}"
                )))),
            }
        }
        .boxed()
        .shared()
    }
}

/// Fetch and normalize the backend's version list
///
/// Versions with unparseable tags are dropped, channels are re-derived from
/// the tags, and the list is ordered newest first.
async fn fetch_snapshot(backend: Arc<dyn Backend>) -> Result<Vec<Version>, BackendError> {
    let versions = backend.list_versions().await?;
    let total = versions.len();

    let mut parsed: Vec<(semver::Version, Version)> = versions
        .into_iter()
        .filter_map(|mut version| match semver::Version::parse(&version.tag) {
            Ok(tag) => {
                version.channel = channel_of(&tag);
                Some((tag, version))
            }
            Err(_) => {
                warn!("Dropping version with invalid tag: {}", version.tag);
                None
            }
        })
        .collect();

    parsed.sort_by(|(a, _), (b, _)| b.cmp(a));

    info!(
        "Catalog refreshed: {} versions ({} dropped)",
        parsed.len(),
        total - parsed.len()
    );
    Ok(parsed.into_iter().map(|(_, version)| version).collect())
}

//! Interceptor chains around named events
//!
//! Embedding servers often need to observe or veto operations like serving a
//! download (analytics, entitlement checks). Rather than implicit dynamic
//! event dispatch, hooks are an explicit, ordered list of interceptors per
//! named event: registration order is invocation order, and any interceptor
//! error short-circuits the rest of the chain and the wrapped operation.

use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

/// Name of the event wrapping asset downloads
pub const DOWNLOAD_EVENT: &str = "download";

/// Name of the event wrapping API calls
pub const API_EVENT: &str = "api";

#[derive(Debug, Clone, Error)]
pub enum HookError {
    #[error("Hook '{event}' aborted: {reason}")]
    Aborted { event: String, reason: String },
}

/// Context handed to every interceptor of an event
#[derive(Debug, Clone, Default)]
pub struct HookEvent {
    /// Event name the interceptor chain is registered under
    pub name: String,
    /// Version tag the operation concerns, when applicable
    pub tag: Option<String>,
    /// Asset filename the operation concerns, when applicable
    pub filename: Option<String>,
    /// Platform identifier the operation concerns, when applicable
    pub platform: Option<String>,
}

impl HookEvent {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn with_filename(mut self, filename: &str) -> Self {
        self.filename = Some(filename.to_string());
        self
    }

    pub fn with_platform(mut self, platform: &str) -> Self {
        self.platform = Some(platform.to_string());
        self
    }
}

/// An interceptor invoked around a named event
///
/// Both phases default to no-ops so implementations only write the side they
/// care about. Returning an error from `before` skips the wrapped operation
/// and all remaining interceptors.
#[async_trait::async_trait]
pub trait Interceptor: Send + Sync {
    /// Invoked before the wrapped operation runs
    async fn before(&self, _event: &HookEvent) -> Result<(), HookError> {
        Ok(())
    }

    /// Invoked after the wrapped operation succeeded
    async fn after(&self, _event: &HookEvent) -> Result<(), HookError> {
        Ok(())
    }
}

/// Registry of interceptor chains keyed by event name
#[derive(Default)]
pub struct Hooks {
    chains: IndexMap<String, Vec<Arc<dyn Interceptor>>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interceptor to an event's chain
    pub fn register(&mut self, event: &str, interceptor: Arc<dyn Interceptor>) {
        self.chains
            .entry(event.to_string())
            .or_default()
            .push(interceptor);
    }

    /// Run `work` wrapped in the event's interceptor chain
    ///
    /// `before` interceptors run in registration order; the first error
    /// short-circuits the chain and `work` never runs. `after` interceptors
    /// run once `work` has succeeded.
    pub async fn perform<T, E, F>(&self, event: &HookEvent, work: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<HookError>,
    {
        let chain = self.chains.get(&event.name);

        if let Some(chain) = chain {
            for interceptor in chain {
                interceptor.before(event).await?;
            }
        }

        let output = work.await?;

        if let Some(chain) = chain {
            for interceptor in chain {
                interceptor.after(event).await?;
            }
        }

        Ok(output)
    }
}

//! The event listener that ties classification, building and dispatch together.

use crate::builders::CallBuilder;
use crate::config::Config;
use crate::event::{classify, AppEvent};
use crate::queue::{Dispatcher, JobQueue, RetryPolicy, TokioQueue};
use crate::session::{resolve, DispatchContext};
use crate::transport::HttpTransport;
use crate::types::AnalyticsCall;
use crate::Error;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// What happened to an event handed to [`Broadcaster::handle`].
#[derive(Debug)]
pub enum Broadcast {
    /// Broadcasting is disabled by configuration.
    Disabled,
    /// The event does not carry the broadcast capability.
    Skipped,
    /// Building or queueing failed; the event itself is unaffected.
    Aborted(Error),
    /// The call was handed to the job queue.
    Queued(AnalyticsCall),
}

impl Broadcast {
    pub fn is_queued(&self) -> bool {
        matches!(self, Broadcast::Queued(_))
    }
}

/// Forwards broadcastable application events to analytics.
///
/// Register [`Broadcaster::handle`] as a listener on the host event bus.
///
/// # Example
///
/// ```rust,no_run
/// use ga_events::{AppEvent, Broadcaster, BroadcastToAnalytics, Config, DispatchContext};
///
/// struct OrderWasCreated;
///
/// impl AppEvent for OrderWasCreated {
///     fn as_broadcast(&self) -> Option<&dyn BroadcastToAnalytics> {
///         Some(self)
///     }
/// }
///
/// impl BroadcastToAnalytics for OrderWasCreated {}
///
/// #[tokio::main]
/// async fn main() -> Result<(), ga_events::Error> {
///     let (broadcaster, queue) = Broadcaster::with_tokio_queue(Config::from_env()?)?;
///
///     broadcaster.handle(&OrderWasCreated, &DispatchContext::detached(Some("555.1".into())));
///
///     queue.shutdown().await;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Broadcaster {
    config: Arc<Config>,
    dispatcher: Dispatcher,
}

impl Broadcaster {
    pub fn new(config: Config, queue: Arc<dyn JobQueue>) -> Self {
        let dispatcher = Dispatcher::new(&config, queue);
        Self {
            config: Arc::new(config),
            dispatcher,
        }
    }

    /// Create a broadcaster delivering through an in-process [`TokioQueue`].
    ///
    /// The returned queue handle should be shut down before exit so queued
    /// hits are delivered. Fails when called outside a tokio runtime.
    pub fn with_tokio_queue(config: Config) -> Result<(Self, Arc<TokioQueue>), Error> {
        let transport = HttpTransport::new(&config)?;
        let queue = Arc::new(TokioQueue::new(transport, RetryPolicy::default())?);
        Ok((Self::new(config, queue.clone()), queue))
    }

    /// Get the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle one application event. Never fails the caller.
    #[instrument(skip_all)]
    pub fn handle(&self, event: &dyn AppEvent, context: &DispatchContext<'_>) -> Broadcast {
        if !self.config.is_enabled() {
            return Broadcast::Disabled;
        }

        let Some(classified) = classify(event) else {
            return Broadcast::Skipped;
        };

        let client_id = resolve(context, self.config.client_id_session_key());
        let call = match CallBuilder::new(&self.config).build(&classified, client_id, context) {
            Ok(call) => call,
            Err(e) => {
                warn!(event = classified.name(), error = %e, "analytics call aborted");
                return Broadcast::Aborted(e);
            }
        };

        match self.dispatcher.dispatch(call.clone()) {
            Ok(true) => {
                debug!(event = classified.name(), action = %call.event_action, "event broadcast");
                Broadcast::Queued(call)
            }
            Ok(false) => Broadcast::Disabled,
            Err(e) => {
                warn!(event = classified.name(), error = %e, "analytics dispatch failed");
                Broadcast::Aborted(e)
            }
        }
    }
}

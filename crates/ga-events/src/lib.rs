//! Forward application events to Google Analytics.
//!
//! Events that implement [`BroadcastToAnalytics`] are turned into
//! measurement protocol event hits by a [`Broadcaster`] and delivered from a
//! background job queue. The [`intake`] router stores the browser's client
//! id in the session so later hits from that user share it.
//!
//! # Example
//!
//! ```rust,ignore
//! use ga_events::{Broadcaster, Config, DispatchContext};
//!
//! let config = Config::from_env()?;
//! let app = ga_events::intake::router(&config);
//! let (broadcaster, queue) = Broadcaster::with_tokio_queue(config)?;
//!
//! // from the event bus
//! broadcaster.handle(&event, &DispatchContext::request(&session));
//!
//! queue.shutdown().await;
//! ```

mod builders;
mod client;
mod config;
mod error;
mod event;
pub mod intake;
mod queue;
mod session;
mod transport;
pub mod types;

pub use builders::CallBuilder;
pub use client::{Broadcast, Broadcaster};
pub use config::{Config, ConfigBuilder};
pub use error::{Error, HookError};
pub use event::{classify, short_type_name, AppEvent, BroadcastToAnalytics, Classified};
pub use queue::{Dispatcher, JobQueue, MemoryQueue, RetryPolicy, SendHitJob, TokioQueue};
pub use session::{resolve, DispatchContext, MemorySession, Session, SessionHandle};
pub use transport::HttpTransport;
pub use types::{AnalyticsCall, ClientId, HitType};

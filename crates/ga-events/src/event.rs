//! Application events and the analytics broadcast capability.

use crate::error::HookError;
use crate::types::AnalyticsCall;

/// An event raised inside the host application.
///
/// Every event the host bus carries implements this. Events that want to be
/// forwarded to analytics also implement [`BroadcastToAnalytics`] and return
/// themselves from [`AppEvent::as_broadcast`].
pub trait AppEvent: Send + Sync + 'static {
    /// The broadcast capability, if this event has it.
    fn as_broadcast(&self) -> Option<&dyn BroadcastToAnalytics> {
        None
    }
}

/// Marker capability: the event is forwarded to analytics.
///
/// Both hooks are optional.
///
/// ```rust
/// use ga_events::{AnalyticsCall, AppEvent, BroadcastToAnalytics, HookError};
///
/// struct OrderWasCreated {
///     total: f64,
/// }
///
/// impl AppEvent for OrderWasCreated {
///     fn as_broadcast(&self) -> Option<&dyn BroadcastToAnalytics> {
///         Some(self)
///     }
/// }
///
/// impl BroadcastToAnalytics for OrderWasCreated {
///     fn with_analytics(&self, call: &mut AnalyticsCall) -> Result<(), HookError> {
///         call.set_event_category("Orders").set_event_value(self.total);
///         Ok(())
///     }
/// }
/// ```
pub trait BroadcastToAnalytics: Send + Sync {
    /// Custom event action. `None` uses the type name.
    fn event_action(&self) -> Option<String> {
        None
    }

    /// Final write access to the call before it is queued.
    fn with_analytics(&self, _call: &mut AnalyticsCall) -> Result<(), HookError> {
        Ok(())
    }

    /// Fully qualified name of the implementing type.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A broadcastable event together with its resolved action.
pub struct Classified<'a> {
    pub event: &'a dyn BroadcastToAnalytics,
    pub action: String,
}

impl Classified<'_> {
    /// Type name without its module path.
    pub fn name(&self) -> &'static str {
        short_type_name(self.event.type_name())
    }
}

/// Decide whether an event is broadcast, and under which action.
pub fn classify(event: &dyn AppEvent) -> Option<Classified<'_>> {
    let event = event.as_broadcast()?;
    let action = event
        .event_action()
        .unwrap_or_else(|| short_type_name(event.type_name()).to_owned());
    Some(Classified { event, action })
}

/// Strip module path and generic arguments from a type name.
pub fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

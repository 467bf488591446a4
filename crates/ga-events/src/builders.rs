//! Assembles the outbound call for a classified event.

use crate::config::Config;
use crate::event::Classified;
use crate::session::DispatchContext;
use crate::types::{AnalyticsCall, ClientId};
use crate::Error;
use tracing::debug;

/// Builds [`AnalyticsCall`]s under a fixed configuration.
#[derive(Debug, Clone, Copy)]
pub struct CallBuilder<'a> {
    config: &'a Config,
}

impl<'a> CallBuilder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Build the call for `event`.
    ///
    /// The event's hook runs last and may overwrite any field except the
    /// configured IP anonymization, which is reapplied after it. If the call
    /// still has neither a client id nor a user id afterwards, a random
    /// client id is generated for this hit only.
    pub fn build(
        &self,
        event: &Classified<'_>,
        client_id: Option<ClientId>,
        context: &DispatchContext<'_>,
    ) -> Result<AnalyticsCall, Error> {
        let mut call = AnalyticsCall::event(event.action.clone());
        call.client_id = client_id;
        call.anonymize_ip = self.config.anonymize_ip();
        call.ip = context.ip();

        if self.config.send_user_id() {
            call.user_id = context.user_id().map(str::to_owned);
        }

        event
            .event
            .with_analytics(&mut call)
            .map_err(|source| Error::Hook {
                event: event.name().to_owned(),
                source,
            })?;
        call.anonymize_ip |= self.config.anonymize_ip();

        if call.client_id.is_none() && call.user_id.is_none() {
            debug!(event = event.name(), "no client id, sending anonymous hit");
            call.client_id = Some(ClientId::generate());
        }

        Ok(call)
    }
}

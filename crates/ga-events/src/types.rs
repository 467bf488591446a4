//! Hit types and wire serialization.

use serde::Serialize;
use std::fmt;
use std::net::IpAddr;

/// Measurement protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Category used when an event does not name one.
pub const DEFAULT_CATEGORY: &str = "App";

/// Opaque identifier grouping a browser's hits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(pub(crate) String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        ClientId(id.into())
    }

    /// Generate a random v4 UUID client id.
    pub fn generate() -> Self {
        ClientId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ClientId {
    fn from(id: String) -> Self {
        ClientId(id)
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        ClientId(id.to_owned())
    }
}

impl From<ClientId> for String {
    fn from(id: ClientId) -> String {
        id.0
    }
}

/// Hit type values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HitType {
    Event,
}

/// A single outbound hit. Built fresh per event and discarded after sending.
///
/// Fields are public so an event's customization hook can rewrite any of them.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsCall {
    pub hit_type: HitType,
    pub event_category: String,
    pub event_action: String,
    pub event_label: Option<String>,
    pub event_value: Option<f64>,
    pub client_id: Option<ClientId>,
    pub user_id: Option<String>,
    pub ip: Option<IpAddr>,
    pub anonymize_ip: bool,
}

impl AnalyticsCall {
    /// Start an event hit with the default category.
    pub fn event(action: impl Into<String>) -> Self {
        Self {
            hit_type: HitType::Event,
            event_category: DEFAULT_CATEGORY.into(),
            event_action: action.into(),
            event_label: None,
            event_value: None,
            client_id: None,
            user_id: None,
            ip: None,
            anonymize_ip: false,
        }
    }

    pub fn set_event_category(&mut self, category: impl Into<String>) -> &mut Self {
        self.event_category = category.into();
        self
    }

    pub fn set_event_action(&mut self, action: impl Into<String>) -> &mut Self {
        self.event_action = action.into();
        self
    }

    pub fn set_event_label(&mut self, label: impl Into<String>) -> &mut Self {
        self.event_label = Some(label.into());
        self
    }

    pub fn set_event_value(&mut self, value: f64) -> &mut Self {
        self.event_value = Some(value);
        self
    }

    pub fn set_client_id(&mut self, id: impl Into<ClientId>) -> &mut Self {
        self.client_id = Some(id.into());
        self
    }

    pub fn set_user_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.user_id = Some(id.into());
        self
    }
}

/// Form body posted to the collection endpoint.
#[derive(Debug, Serialize)]
pub struct CollectPayload<'a> {
    pub v: u8,
    pub tid: &'a str,
    pub t: HitType,
    pub ec: &'a str,
    pub ea: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub el: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ev: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cid: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aip: Option<u8>,
}

impl<'a> CollectPayload<'a> {
    pub fn new(tracking_id: &'a str, call: &'a AnalyticsCall) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            tid: tracking_id,
            t: call.hit_type,
            ec: &call.event_category,
            ea: &call.event_action,
            el: call.event_label.as_deref(),
            ev: call.event_value,
            cid: call.client_id.as_ref().map(ClientId::as_str),
            uid: call.user_id.as_deref(),
            uip: call.ip.map(|ip| ip.to_string()),
            aip: call.anonymize_ip.then_some(1),
        }
    }
}

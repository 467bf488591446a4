//! Broadcaster configuration.

use std::time::Duration;

/// Default collection host.
pub const DEFAULT_COLLECT_HOST: &str = "www.google-analytics.com";

/// Default intake path for browser-generated client ids.
pub const DEFAULT_HTTP_URI: &str = "/gaid";

/// Default session key the client id is stored under.
pub const DEFAULT_SESSION_KEY: &str = "google-analytics-client-id";

/// Queue used when no queue name is configured.
pub const DEFAULT_QUEUE_NAME: &str = "default";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const ENV_PREFIX: &str = "GOOGLE_ANALYTICS_";

/// Process-wide, read-only broadcaster configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) tracking_id: String,
    pub(crate) use_ssl: bool,
    pub(crate) is_enabled: bool,
    pub(crate) anonymize_ip: bool,
    pub(crate) send_user_id: bool,
    pub(crate) debug: bool,
    pub(crate) queue_name: Option<String>,
    pub(crate) client_id_session_key: String,
    pub(crate) http_uri: String,
    pub(crate) api_host: Option<String>,
    pub(crate) timeout: Duration,
}

impl Config {
    /// Create a new builder with the given tracking id.
    pub fn builder(tracking_id: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(tracking_id)
    }

    /// Load configuration from `GOOGLE_ANALYTICS_*` environment variables.
    pub fn from_env() -> Result<Self, crate::Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, crate::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(format!("{ENV_PREFIX}{name}").as_str());
        let flag = |name: &str| -> Result<Option<bool>, crate::Error> {
            var(name).map(|raw| parse_bool(name, &raw)).transpose()
        };

        let mut builder = ConfigBuilder::new(var("TRACKING_ID").unwrap_or_default());
        if let Some(v) = flag("USE_SSL")? {
            builder = builder.use_ssl(v);
        }
        if let Some(v) = flag("IS_ENABLED")? {
            builder = builder.enabled(v);
        }
        if let Some(v) = flag("ANONYMIZE_IP")? {
            builder = builder.anonymize_ip(v);
        }
        if let Some(v) = flag("SEND_USER_ID")? {
            builder = builder.send_user_id(v);
        }
        if let Some(v) = flag("DEBUG")? {
            builder = builder.debug(v);
        }
        if let Some(name) = var("QUEUE_NAME").filter(|s| !s.is_empty()) {
            builder = builder.queue_name(name);
        }
        if let Some(key) = var("CLIENT_ID_SESSION_KEY") {
            builder = builder.client_id_session_key(key);
        }
        if let Some(uri) = var("HTTP_URI") {
            builder = builder.http_uri(uri);
        }
        builder.build()
    }

    /// Get the tracking (property) id.
    pub fn tracking_id(&self) -> &str {
        &self.tracking_id
    }

    /// Whether hits go over https.
    pub fn use_ssl(&self) -> bool {
        self.use_ssl
    }

    /// Whether broadcasting is enabled at all.
    pub fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    /// Whether every hit asks the provider to anonymize the IP.
    pub fn anonymize_ip(&self) -> bool {
        self.anonymize_ip
    }

    /// Whether the authenticated user's id is attached to hits.
    pub fn send_user_id(&self) -> bool {
        self.send_user_id
    }

    /// Whether hits go to the validation endpoint.
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Queue jobs are pushed onto.
    pub fn queue_name(&self) -> &str {
        self.queue_name.as_deref().unwrap_or(DEFAULT_QUEUE_NAME)
    }

    /// Session key holding the client id.
    pub fn client_id_session_key(&self) -> &str {
        &self.client_id_session_key
    }

    /// Path of the client id intake endpoint.
    pub fn http_uri(&self) -> &str {
        &self.http_uri
    }

    /// Get the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Full URL hits are posted to.
    pub fn collect_url(&self) -> String {
        let path = if self.debug {
            "/debug/collect"
        } else {
            "/collect"
        };
        match &self.api_host {
            Some(host) => format!("{}{}", host.trim_end_matches('/'), path),
            None => {
                let scheme = if self.use_ssl { "https" } else { "http" };
                format!("{scheme}://{DEFAULT_COLLECT_HOST}{path}")
            }
        }
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, crate::Error> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(crate::Error::Config(format!(
            "{ENV_PREFIX}{name} is not a boolean: {other:?}"
        ))),
    }
}

/// No `:param` segments, `{capture}`s or `*` wildcards; the router would
/// reject or reinterpret them.
fn is_literal_path(path: &str) -> bool {
    !path.contains(['{', '}', '*']) && !path.split('/').any(|segment| segment.starts_with(':'))
}

/// Builder for [`Config`].
#[derive(Debug)]
pub struct ConfigBuilder {
    tracking_id: String,
    use_ssl: Option<bool>,
    is_enabled: Option<bool>,
    anonymize_ip: Option<bool>,
    send_user_id: Option<bool>,
    debug: Option<bool>,
    queue_name: Option<String>,
    client_id_session_key: Option<String>,
    http_uri: Option<String>,
    api_host: Option<String>,
    timeout: Option<Duration>,
}

impl ConfigBuilder {
    /// Create a new builder with the given tracking id.
    pub fn new(tracking_id: impl Into<String>) -> Self {
        Self {
            tracking_id: tracking_id.into(),
            use_ssl: None,
            is_enabled: None,
            anonymize_ip: None,
            send_user_id: None,
            debug: None,
            queue_name: None,
            client_id_session_key: None,
            http_uri: None,
            api_host: None,
            timeout: None,
        }
    }

    pub fn use_ssl(mut self, use_ssl: bool) -> Self {
        self.use_ssl = Some(use_ssl);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.is_enabled = Some(enabled);
        self
    }

    pub fn anonymize_ip(mut self, anonymize: bool) -> Self {
        self.anonymize_ip = Some(anonymize);
        self
    }

    pub fn send_user_id(mut self, send: bool) -> Self {
        self.send_user_id = Some(send);
        self
    }

    /// Send hits to the validation endpoint instead of the live one.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    pub fn queue_name(mut self, name: impl Into<String>) -> Self {
        self.queue_name = Some(name.into());
        self
    }

    pub fn client_id_session_key(mut self, key: impl Into<String>) -> Self {
        self.client_id_session_key = Some(key.into());
        self
    }

    pub fn http_uri(mut self, uri: impl Into<String>) -> Self {
        self.http_uri = Some(uri.into());
        self
    }

    /// Override the collection host (scheme included), e.g. for a proxy.
    pub fn api_host(mut self, host: impl Into<String>) -> Self {
        self.api_host = Some(host.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<Config, crate::Error> {
        if self.tracking_id.trim().is_empty() {
            return Err(crate::Error::Config("tracking_id cannot be empty".into()));
        }

        let http_uri = self.http_uri.unwrap_or_else(|| DEFAULT_HTTP_URI.into());
        if !http_uri.starts_with('/') {
            return Err(crate::Error::Config(format!(
                "http_uri must start with '/': {http_uri:?}"
            )));
        }
        if !is_literal_path(&http_uri) {
            return Err(crate::Error::Config(format!(
                "http_uri must be a literal path without captures or wildcards: {http_uri:?}"
            )));
        }

        let client_id_session_key = self
            .client_id_session_key
            .unwrap_or_else(|| DEFAULT_SESSION_KEY.into());
        if client_id_session_key.is_empty() {
            return Err(crate::Error::Config(
                "client_id_session_key cannot be empty".into(),
            ));
        }

        Ok(Config {
            tracking_id: self.tracking_id,
            use_ssl: self.use_ssl.unwrap_or(true),
            is_enabled: self.is_enabled.unwrap_or(true),
            anonymize_ip: self.anonymize_ip.unwrap_or(true),
            send_user_id: self.send_user_id.unwrap_or(false),
            debug: self.debug.unwrap_or(false),
            queue_name: self.queue_name,
            client_id_session_key,
            http_uri,
            api_host: self.api_host,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_builder_defaults() {
        let config = ConfigBuilder::new("UA-1234-5").build().unwrap();

        assert_eq!(config.tracking_id(), "UA-1234-5");
        assert!(config.use_ssl());
        assert!(config.is_enabled());
        assert!(config.anonymize_ip());
        assert!(!config.send_user_id());
        assert_eq!(config.queue_name(), DEFAULT_QUEUE_NAME);
        assert_eq!(config.client_id_session_key(), DEFAULT_SESSION_KEY);
        assert_eq!(config.http_uri(), "/gaid");
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(
            config.collect_url(),
            "https://www.google-analytics.com/collect"
        );
    }

    #[test]
    fn test_builder_custom_values() {
        let config = ConfigBuilder::new("UA-1234-5")
            .use_ssl(false)
            .enabled(false)
            .anonymize_ip(false)
            .send_user_id(true)
            .queue_name("analytics")
            .client_id_session_key("ga_cid")
            .http_uri("/analytics/cid")
            .timeout(Duration::from_secs(3))
            .build()
            .unwrap();

        assert!(!config.is_enabled());
        assert!(!config.anonymize_ip());
        assert!(config.send_user_id());
        assert_eq!(config.queue_name(), "analytics");
        assert_eq!(config.client_id_session_key(), "ga_cid");
        assert_eq!(config.http_uri(), "/analytics/cid");
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.collect_url(), "http://www.google-analytics.com/collect");
    }

    #[test]
    fn test_collect_url_debug_and_override() {
        let config = ConfigBuilder::new("UA-1")
            .debug(true)
            .build()
            .unwrap();
        assert_eq!(
            config.collect_url(),
            "https://www.google-analytics.com/debug/collect"
        );

        let config = ConfigBuilder::new("UA-1")
            .api_host("http://127.0.0.1:9000/")
            .build()
            .unwrap();
        assert_eq!(config.collect_url(), "http://127.0.0.1:9000/collect");
    }

    #[test]
    fn test_builder_rejects_invalid_values() {
        assert!(ConfigBuilder::new("").build().is_err());
        assert!(ConfigBuilder::new("  ").build().is_err());
        assert!(ConfigBuilder::new("UA-1").http_uri("gaid").build().is_err());
        assert!(ConfigBuilder::new("UA-1")
            .client_id_session_key("")
            .build()
            .is_err());
    }

    #[test]
    fn test_builder_rejects_route_patterns_in_http_uri() {
        for uri in ["/ga/:id", "/:id", "/ga/{id}", "/ga/{*rest}", "/ga/*", "/ga}"] {
            let result = ConfigBuilder::new("UA-1").http_uri(uri).build();
            assert!(
                matches!(result, Err(crate::Error::Config(_))),
                "{uri} should be rejected"
            );
        }

        for uri in ["/gaid", "/analytics/client-id", "/ga:id"] {
            assert!(ConfigBuilder::new("UA-1").http_uri(uri).build().is_ok());
        }
    }

    #[test]
    fn test_from_lookup_reads_prefixed_variables() {
        let config = Config::from_lookup(env(&[
            ("GOOGLE_ANALYTICS_TRACKING_ID", "UA-99-1"),
            ("GOOGLE_ANALYTICS_IS_ENABLED", "off"),
            ("GOOGLE_ANALYTICS_ANONYMIZE_IP", "0"),
            ("GOOGLE_ANALYTICS_SEND_USER_ID", "Yes"),
            ("GOOGLE_ANALYTICS_QUEUE_NAME", "ga"),
            ("GOOGLE_ANALYTICS_HTTP_URI", "/cid"),
        ]))
        .unwrap();

        assert_eq!(config.tracking_id(), "UA-99-1");
        assert!(!config.is_enabled());
        assert!(!config.anonymize_ip());
        assert!(config.send_user_id());
        assert_eq!(config.queue_name(), "ga");
        assert_eq!(config.http_uri(), "/cid");
    }

    #[test]
    fn test_from_lookup_errors() {
        assert!(Config::from_lookup(env(&[])).is_err());

        let err = Config::from_lookup(env(&[
            ("GOOGLE_ANALYTICS_TRACKING_ID", "UA-99-1"),
            ("GOOGLE_ANALYTICS_USE_SSL", "maybe"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("GOOGLE_ANALYTICS_USE_SSL"));
    }
}

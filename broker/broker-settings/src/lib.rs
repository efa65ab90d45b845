//! The `Settings` record (spec.md §6): `hostname, port, notifyPrefix,
//! groupPrefix, useTLS, certFilename, keyFilename`, plus the ambient
//! engineering fields (statsd, logging, durable-store path, worker
//! cadences) a runnable binary needs but the distilled spec treats as
//! external. Missing required configuration is a fatal startup error
//! (spec.md §7), surfaced here as a `ConfigError` from `with_env_and_config`.
mod app_state;

#[macro_use]
extern crate slog_scope;

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};

pub use app_state::AppState;

pub const ENV_PREFIX: &str = "broker";

/// Application settings, read from an optional config file then the
/// environment (`BROKER__FIELD_NAME`), matching the layered `config`-crate
/// pattern used throughout this workspace's lineage.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// The DNS name of this host, embedded in push endpoint URLs.
    pub hostname: String,
    /// The port the agent-facing WebSocket and HTTP surfaces listen on.
    pub port: u16,
    /// Path prefix preceding a channel or group id in the notify endpoint,
    /// e.g. `/notify/`.
    pub notify_prefix: String,
    /// Path prefix preceding `<add|remove>/<groupID>` in the group admin
    /// endpoint, e.g. `/groups`.
    pub group_prefix: String,
    /// Whether push endpoint URLs (and the listener, in a full deployment)
    /// use `https`/TLS. TLS listener setup itself is out of scope
    /// (spec.md §1); this only affects the scheme embedded in URLs.
    pub use_tls: bool,
    /// TLS certificate file path; required when `use_tls` is set. Reading
    /// and wiring it into a listener is the out-of-scope TLS collaborator.
    pub cert_filename: Option<String>,
    /// TLS private key file path; required when `use_tls` is set.
    pub key_filename: Option<String>,

    /// Where the durable registry snapshot is read from at startup and
    /// written to on every triggering session event.
    pub state_file: String,

    /// Redrive cadence for the Delivery Engine (spec.md's 15s contract).
    #[serde(deserialize_with = "deserialize_u64_to_duration")]
    pub redrive_interval: Duration,
    /// Walk cadence for the Reaper (spec.md's 10s).
    #[serde(deserialize_with = "deserialize_u64_to_duration")]
    pub reap_interval: Duration,
    /// Staleness threshold past which a rendezvous-bearing agent is reaped
    /// (spec.md's 15s).
    #[serde(deserialize_with = "deserialize_u64_to_duration")]
    pub reap_threshold: Duration,

    /// Host to send statsd metrics to; omitted means metrics are a no-op
    /// sink.
    pub statsd_host: Option<String>,
    pub statsd_port: u16,
    pub statsd_label: String,
    /// Use human-readable (non-JSON) log output.
    pub human_logs: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_owned(),
            port: 8080,
            notify_prefix: "/notify/".to_owned(),
            group_prefix: "/groups".to_owned(),
            use_tls: false,
            cert_filename: None,
            key_filename: None,
            state_file: "broker-state.json".to_owned(),
            redrive_interval: Duration::from_secs(15),
            reap_interval: Duration::from_secs(10),
            reap_threshold: Duration::from_secs(15),
            statsd_host: None,
            statsd_port: 8125,
            statsd_label: "broker".to_owned(),
            human_logs: false,
        }
    }
}

impl Settings {
    /// Load settings from config files (applied in order) then the
    /// environment (`BROKER__FIELD`, `__`-separated for nesting), and
    /// validate the result. A missing or malformed required field is a
    /// fatal startup error (spec.md §7).
    pub fn with_env_and_config_files(filenames: &[String]) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        for filename in filenames {
            builder = builder.add_source(File::with_name(filename));
        }
        builder = builder.add_source(Environment::with_prefix(&ENV_PREFIX.to_uppercase()).separator("__"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.notify_prefix.is_empty() {
            return Err(ConfigError::Message(
                "notify_prefix must not be empty".to_owned(),
            ));
        }
        if self.group_prefix.is_empty() {
            return Err(ConfigError::Message(
                "group_prefix must not be empty".to_owned(),
            ));
        }
        if self.use_tls && (self.cert_filename.is_none() || self.key_filename.is_none()) {
            return Err(ConfigError::Message(
                "use_tls requires both cert_filename and key_filename".to_owned(),
            ));
        }
        Ok(())
    }

    /// Scheme chosen by the TLS configuration, per spec.md §6's push
    /// endpoint URL shape.
    pub fn scheme(&self) -> &'static str {
        if self.use_tls {
            "https"
        } else {
            "http"
        }
    }

    /// `<scheme>://<hostname>:<port>`, the base push endpoint URLs are
    /// built against.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme(), self.hostname, self.port)
    }

    pub fn test_settings() -> Self {
        Self::default()
    }
}

fn deserialize_u64_to_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds: u64 = Deserialize::deserialize(deserializer)?;
    Ok(Duration::from_secs(seconds))
}
